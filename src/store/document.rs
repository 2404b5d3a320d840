use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::{Error, StoreError};
use crate::utils::state::State;

/// Path of a document inside a store: `<collection>/<id>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DocPath {
    collection: String,
    id: String,
}

impl DocPath {
    pub fn new<C: Into<String>, I: Into<String>>(collection: C, id: I) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl FromStr for DocPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((collection, id)) if !collection.is_empty() && !id.is_empty() => {
                Ok(Self::new(collection, id))
            }
            _ => Err(StoreError::InvalidPath {
                path: s.to_string(),
            }
            .into()),
        }
    }
}

/// A document snapshot: its path plus the payload delivered by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    path: DocPath,
    payload: State,
}

impl Document {
    pub fn new(path: DocPath, payload: State) -> Self {
        Self { path, payload }
    }

    pub fn path(&self) -> &DocPath {
        &self.path
    }

    pub fn payload(&self) -> &State {
        &self.payload
    }

    /// Strictly decodes `field` as a boolean.
    ///
    /// # Errors
    /// * `StoreError::NotAnObject` if the payload is not an object.
    /// * `StoreError::MissingField` if the field is absent.
    /// * `StoreError::WrongType` if the field is not a boolean.
    pub fn get_bool(&self, field: &str) -> Result<bool, Error> {
        let State::Object(_) = &self.payload else {
            return Err(StoreError::NotAnObject {
                path: self.path.to_string(),
            }
            .into());
        };
        match self.payload.get(field) {
            None => Err(StoreError::MissingField {
                path: self.path.to_string(),
                field: field.to_string(),
            }
            .into()),
            Some(State::Boolean(value)) => Ok(*value),
            Some(_) => Err(StoreError::WrongType {
                path: self.path.to_string(),
                field: field.to_string(),
            }
            .into()),
        }
    }
}
