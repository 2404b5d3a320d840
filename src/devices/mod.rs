pub use crate::devices::led::{Led, LedState, Stage};

mod led;
