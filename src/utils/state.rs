use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Represents a dynamic document value: the payload carried by store
/// documents. Any JSON value maps onto a `State`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum State {
    #[default]
    Null,
    Boolean(bool),
    Integer(u64),
    Signed(i64),
    Float(f64),
    String(String),
    Array(Vec<State>),
    Object(HashMap<String, State>),
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Null => write!(f, "Null"),
            State::Boolean(b) => write!(f, "{}", b),
            State::Integer(i) => write!(f, "{}", i),
            State::Signed(s) => write!(f, "{}", s),
            State::Float(fl) => write!(f, "{}", fl),
            State::String(s) => write!(f, "\"{}\"", s),
            State::Array(arr) => {
                let elements = arr
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "[{}]", elements)
            }
            State::Object(obj) => {
                let entries = obj
                    .iter()
                    .map(|(key, value)| format!("\"{}\": {}", key, value))
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "{{{}}}", entries)
            }
        }
    }
}

// **********************************************
// Serde
// **********************************************

impl serde::Serialize for State {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self {
            State::Null => serializer.serialize_none(),
            State::Boolean(b) => serializer.serialize_bool(*b),
            State::Integer(i) => serializer.serialize_u64(*i),
            State::Signed(i) => serializer.serialize_i64(*i),
            State::Float(f) => serializer.serialize_f64(*f),
            State::String(s) => serializer.serialize_str(s),
            State::Array(a) => serializer.collect_seq(a),
            State::Object(o) => serializer.collect_map(o),
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for State {
    fn deserialize<D>(de: D) -> Result<State, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        Ok(State::from(serde_json::Value::deserialize(de)?))
    }
}

impl From<serde_json::Value> for State {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => State::Null,
            serde_json::Value::Bool(b) => State::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    State::Integer(u)
                } else if let Some(i) = n.as_i64() {
                    State::Signed(i)
                } else {
                    State::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => State::String(s),
            serde_json::Value::Array(list) => {
                State::Array(list.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => State::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}

// **********************************************
// Extractors: get the value inside State.
// **********************************************
impl State {
    pub fn is_null(&self) -> bool {
        *self == State::Null
    }

    /// Extracts a truthy boolean from any variant (lossy).
    pub fn as_bool(&self) -> bool {
        match self {
            State::Null => false,
            State::Boolean(b) => *b,
            State::Integer(u) => *u > 0,
            State::Signed(i) => *i > 0,
            State::Float(f) => *f > 0.0,
            State::String(s) => !s.is_empty(),
            State::Array(a) => !a.is_empty(),
            State::Object(o) => !o.is_empty(),
        }
    }

    /// Extracts the string of this value if it is a string.
    pub fn as_string(&self) -> String {
        match self {
            State::Integer(u) => format!("{}", u),
            State::Signed(i) => format!("{}", i),
            State::Float(f) => format!("{}", f),
            State::String(s) => s.clone(),
            _ => String::default(),
        }
    }

    /// Extracts the hashmap value if it is a hashmap.
    pub fn as_object(&self) -> HashMap<String, State> {
        match self {
            State::Object(map) => map.clone(),
            _ => HashMap::<String, State>::default(),
        }
    }

    /// Returns the value of a field if this is an object holding it.
    pub fn get(&self, field: &str) -> Option<&State> {
        match self {
            State::Object(map) => map.get(field),
            _ => None,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        State::Boolean(value)
    }
}

impl From<u64> for State {
    fn from(value: u64) -> Self {
        State::Integer(value)
    }
}

impl From<&str> for State {
    fn from(value: &str) -> Self {
        State::String(value.to_string())
    }
}

impl From<String> for State {
    fn from(value: String) -> Self {
        State::String(value)
    }
}

impl From<HashMap<String, State>> for State {
    fn from(value: HashMap<String, State>) -> Self {
        State::Object(value)
    }
}
