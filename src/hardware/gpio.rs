use std::any::type_name;
use std::fmt::{Debug, Display};

use dyn_clone::DynClone;

use crate::errors::Error;

/// Driver seam for a digital output backend.
///
/// Implementations own the platform specifics (memory map, chardev, pure
/// simulation); callers see open/write/close on BCM pin numbers only.
pub trait Gpio: DynClone + Send + Sync + Debug {
    /// Returns the driver name (generated from the type name).
    fn get_driver_name(&self) -> &str {
        let type_name = type_name::<Self>();
        type_name.split("::").last().unwrap_or(type_name)
    }

    /// Claims the given pin as a digital output, initially LOW.
    ///
    /// # Errors
    /// Returns `HardwareError::OpenFailed` if the pin cannot be claimed.
    fn open_output(&mut self, pin: u16) -> Result<(), Error>;

    /// Drives the pin HIGH (`true`) or LOW (`false`).
    ///
    /// # Errors
    /// Returns `HardwareError::WriteFailed` if the level cannot be set.
    fn write(&mut self, pin: u16, level: bool) -> Result<(), Error>;

    /// Releases the pin back to the platform.
    ///
    /// # Errors
    /// Returns `HardwareError::CloseFailed` if the release fails.
    fn close(&mut self, pin: u16) -> Result<(), Error>;
}

dyn_clone::clone_trait_object!(Gpio);

impl Display for dyn Gpio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_driver_name())
    }
}

#[cfg(test)]
mod tests {
    use crate::mocks::gpio::MockGpio;

    use super::*;

    #[test]
    fn test_driver_name() {
        let driver = MockGpio::default();
        assert_eq!(driver.get_driver_name(), "MockGpio");

        let boxed: Box<dyn Gpio> = Box::new(MockGpio::default());
        assert_eq!(format!("{}", boxed), "MockGpio");
    }

    #[test]
    fn test_driver_is_clonable() {
        let mut driver = MockGpio::default();
        driver.open_output(6).expect("Pin opens");

        let clone: Box<dyn Gpio> = dyn_clone::clone_box(&driver as &dyn Gpio);
        // The clone shares the same backing pin map.
        assert_eq!(format!("{:?}", clone), format!("{:?}", driver));
    }
}
