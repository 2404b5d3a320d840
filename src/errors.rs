use log::error;
use snafu::Snafu;

pub use crate::errors::Error::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Hardware error: {source}.
    HardwareError { source: HardwareError },
    /// Store error: {source}.
    StoreError { source: StoreError },
    /// Unknown error: {info}.
    Unknown { info: String },
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        error!("std::io error {:?}", error);
        Self::StoreError {
            source: StoreError::IoException {
                info: error.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::StoreError {
            source: StoreError::MalformedPayload {
                info: error.to_string(),
            },
        }
    }
}

impl From<HardwareError> for Error {
    fn from(value: HardwareError) -> Self {
        Self::HardwareError { source: value }
    }
}

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        Self::StoreError { source: value }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum HardwareError {
    /// Pin ({pin}) could not be opened - {info}
    OpenFailed { pin: u16, info: String },
    /// Pin ({pin}) write failed - {info}
    WriteFailed { pin: u16, info: String },
    /// Pin ({pin}) release failed - {info}
    CloseFailed { pin: u16, info: String },
    /// Pin ({pin}) is already released
    Released { pin: u16 },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// Field '{field}' is missing from document '{path}'
    MissingField { path: String, field: String },
    /// Field '{field}' of document '{path}' is not a boolean
    WrongType { path: String, field: String },
    /// Document '{path}' does not hold an object payload
    NotAnObject { path: String },
    /// Invalid document path '{path}'
    InvalidPath { path: String },
    /// Malformed document payload - {info}
    MalformedPayload { info: String },
    /// {info}
    IoException { info: String },
}
