use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::{Error, HardwareError};
use crate::hardware::Gpio;

/// Test driver with failure injection and full write recording.
///
/// Clones share the same backing data, so a test keeps a handle on the
/// driver it passed to the code under test and inspects it afterwards.
#[derive(Clone, Debug, Default)]
pub struct MockGpio {
    fail_open: bool,
    fail_write: bool,
    fail_close: bool,
    inner: Arc<RwLock<MockGpioData>>,
}

#[derive(Debug, Default)]
struct MockGpioData {
    pins: HashMap<u16, bool>,
    writes: Vec<(u16, bool)>,
    closes: HashMap<u16, usize>,
}

impl MockGpio {
    pub fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn with_write_failure(mut self) -> Self {
        self.fail_write = true;
        self
    }

    pub fn with_close_failure(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Current level of a pin, or None if it is not open.
    pub fn get_level(&self, pin: u16) -> Option<bool> {
        self.inner.read().pins.get(&pin).copied()
    }

    /// Every successful write, in order.
    pub fn get_writes(&self) -> Vec<(u16, bool)> {
        self.inner.read().writes.clone()
    }

    /// How many times a pin was released.
    pub fn close_count(&self, pin: u16) -> usize {
        self.inner.read().closes.get(&pin).copied().unwrap_or(0)
    }
}

impl Gpio for MockGpio {
    fn open_output(&mut self, pin: u16) -> Result<(), Error> {
        if self.fail_open {
            return Err(HardwareError::OpenFailed {
                pin,
                info: String::from("injected open failure"),
            }
            .into());
        }
        self.inner.write().pins.insert(pin, false);
        Ok(())
    }

    fn write(&mut self, pin: u16, level: bool) -> Result<(), Error> {
        if self.fail_write {
            return Err(HardwareError::WriteFailed {
                pin,
                info: String::from("injected write failure"),
            }
            .into());
        }
        let mut inner = self.inner.write();
        match inner.pins.contains_key(&pin) {
            true => {
                inner.pins.insert(pin, level);
                inner.writes.push((pin, level));
                Ok(())
            }
            false => Err(HardwareError::WriteFailed {
                pin,
                info: String::from("pin is not open"),
            }
            .into()),
        }
    }

    fn close(&mut self, pin: u16) -> Result<(), Error> {
        if self.fail_close {
            return Err(HardwareError::CloseFailed {
                pin,
                info: String::from("injected close failure"),
            }
            .into());
        }
        let mut inner = self.inner.write();
        match inner.pins.remove(&pin) {
            Some(_) => {
                *inner.closes.entry(pin).or_insert(0) += 1;
                Ok(())
            }
            None => Err(HardwareError::CloseFailed {
                pin,
                info: String::from("pin is not open"),
            }
            .into()),
        }
    }
}
