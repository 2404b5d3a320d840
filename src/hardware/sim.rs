use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::errors::{Error, HardwareError};
use crate::hardware::Gpio;

/// In-memory GPIO driver.
///
/// Keeps pin levels in a shared map and logs every transition, which lets
/// the binary dry-run on machines without GPIO hardware. Clones share the
/// same pin map.
#[derive(Clone, Debug, Default)]
pub struct SimGpio {
    pins: Arc<RwLock<HashMap<u16, bool>>>,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current level of a pin, or None if it is not open.
    pub fn get_level(&self, pin: u16) -> Option<bool> {
        self.pins.read().get(&pin).copied()
    }
}

impl Gpio for SimGpio {
    fn open_output(&mut self, pin: u16) -> Result<(), Error> {
        let mut pins = self.pins.write();
        if pins.contains_key(&pin) {
            return Err(HardwareError::OpenFailed {
                pin,
                info: String::from("pin is already open"),
            }
            .into());
        }
        pins.insert(pin, false);
        debug!("[sim] pin {} opened as output (LOW)", pin);
        Ok(())
    }

    fn write(&mut self, pin: u16, level: bool) -> Result<(), Error> {
        let mut pins = self.pins.write();
        match pins.get_mut(&pin) {
            Some(current) => {
                *current = level;
                debug!("[sim] pin {} set {}", pin, if level { "HIGH" } else { "LOW" });
                Ok(())
            }
            None => Err(HardwareError::WriteFailed {
                pin,
                info: String::from("pin is not open"),
            }
            .into()),
        }
    }

    fn close(&mut self, pin: u16) -> Result<(), Error> {
        match self.pins.write().remove(&pin) {
            Some(_) => {
                debug!("[sim] pin {} released", pin);
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
