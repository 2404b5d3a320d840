use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use rppal::gpio::OutputPin;

use crate::errors::{Error, HardwareError};
use crate::hardware::Gpio;

/// Raspberry Pi GPIO driver backed by rppal (BCM numbering).
///
/// Clones share the same claimed-pin map, so a pin claimed through one clone
/// is visible to all.
#[derive(Clone, Debug, Default)]
pub struct RpiGpio {
    pins: Arc<Mutex<HashMap<u16, OutputPin>>>,
}

impl RpiGpio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Gpio for RpiGpio {
    fn open_output(&mut self, pin: u16) -> Result<(), Error> {
        let mut pins = self.pins.lock();
        if pins.contains_key(&pin) {
            return Err(HardwareError::OpenFailed {
                pin,
                info: String::from("pin is already open"),
            }
            .into());
        }
        let output = rppal::gpio::Gpio::new()
            .and_then(|gpio| gpio.get(pin as u8))
            .map_err(|err| HardwareError::OpenFailed {
                pin,
                info: err.to_string(),
            })?
            .into_output_low();
        pins.insert(pin, output);
        debug!("[rpi] pin {} opened as output (LOW)", pin);
        Ok(())
    }

    fn write(&mut self, pin: u16, level: bool) -> Result<(), Error> {
        let mut pins = self.pins.lock();
        let output = pins.get_mut(&pin).ok_or(HardwareError::WriteFailed {
            pin,
            info: String::from("pin is not open"),
        })?;
        if level {
            output.set_high();
        } else {
            output.set_low();
        }
        Ok(())
    }

    fn close(&mut self, pin: u16) -> Result<(), Error> {
        // Dropping the rppal pin resets it to input, releasing the line.
        match self.pins.lock().remove(&pin) {
            Some(_) => {
                debug!("[rpi] pin {} released", pin);
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
