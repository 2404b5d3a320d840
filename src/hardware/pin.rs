use log::warn;

use crate::errors::{Error, HardwareError};
use crate::hardware::Gpio;

/// Exclusive owner of one claimed GPIO pin.
///
/// A handle is obtained through [`PinHandle::open`], is deliberately not
/// `Clone`, and releases the pin exactly once: either through an explicit
/// [`PinHandle::close`] or best-effort on `Drop`.
#[derive(Debug)]
pub struct PinHandle {
    driver: Box<dyn Gpio>,
    id: u16,
    released: bool,
}

impl PinHandle {
    /// Claims `pin` as a digital output on the given driver, initially LOW.
    ///
    /// # Errors
    /// Returns `HardwareError::OpenFailed` if the driver cannot claim the pin.
    pub fn open(mut driver: Box<dyn Gpio>, pin: u16) -> Result<Self, Error> {
        driver.open_output(pin)?;
        Ok(Self {
            driver,
            id: pin,
            released: false,
        })
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    /// Drives the pin HIGH (`true`) or LOW (`false`).
    ///
    /// # Errors
    /// Returns `HardwareError::Released` on a closed handle, or
    /// `HardwareError::WriteFailed` if the driver write fails.
    pub fn write(&mut self, level: bool) -> Result<(), Error> {
        if self.released {
            return Err(HardwareError::Released { pin: self.id }.into());
        }
        self.driver.write(self.id, level)
    }

    /// Releases the pin. Idempotent: subsequent calls are no-ops.
    ///
    /// The handle is marked released before the driver call, so even a failed
    /// release is never retried.
    ///
    /// # Errors
    /// Returns `HardwareError::CloseFailed` if the driver release fails.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.driver.close(self.id)
    }
}

impl Drop for PinHandle {
    fn drop(&mut self) {
        if !self.released {
            if let Err(err) = self.close() {
                warn!("Pin {} release on drop failed: {}", self.id, err);
            }
        }
    }
}
