//! JSON blob convention with embedded byte sequences.
//!
//! Stored blobs are JSON text. Byte sequences are encoded as
//!
//! ```json
//! {"type": "Buffer", "data": "<base64>"}
//! ```
//!
//! and decoded back to bytes on read. For compatibility with older blobs the
//! reader also accepts `data` as an array of octets.
//!
//! [`StoredValue`] is the dynamic value model for blobs whose shape is not
//! known statically (key-bag entries). Typed records use the [`buffer`] serde
//! helper on their byte fields instead.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Number, Value};

use crate::StoreError;

const BUFFER_TYPE: &str = "Buffer";

/// A decoded blob value: JSON plus first-class byte sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Any JSON number
    Number(Number),
    /// UTF-8 string
    String(String),
    /// Byte sequence (the buffer object on the wire)
    Bytes(Vec<u8>),
    /// Ordered list
    Array(Vec<StoredValue>),
    /// String-keyed map
    Object(BTreeMap<String, StoredValue>),
}

impl StoredValue {
    /// Convert parsed JSON, reviving buffer objects into [`StoredValue::Bytes`].
    ///
    /// An object that claims to be a buffer but carries undecodable data is
    /// kept as a plain object.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => match revive_buffer(&map) {
                Some(bytes) => Self::Bytes(bytes),
                None => Self::Object(map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect()),
            },
        }
    }

    /// Convert to JSON, replacing byte sequences with buffer objects.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Bytes(bytes) => buffer_object(bytes),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            },
        }
    }

    /// Bytes, if this is a byte sequence.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// String contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Map, if this is an object.
    pub fn as_object(&self) -> Option<&BTreeMap<String, StoredValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Whether this is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<Vec<u8>> for StoredValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&str> for StoredValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<u64> for StoredValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for StoredValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for StoredValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl Serialize for StoredValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StoredValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

/// Encode a value as blob bytes.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode blob bytes.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn buffer_object(bytes: &[u8]) -> Value {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::String(BUFFER_TYPE.to_string()));
    map.insert("data".to_string(), Value::String(STANDARD.encode(bytes)));
    Value::Object(map)
}

fn revive_buffer(map: &Map<String, Value>) -> Option<Vec<u8>> {
    if map.get("type").and_then(Value::as_str) != Some(BUFFER_TYPE) {
        return None;
    }

    match map.get("data")? {
        Value::String(encoded) => STANDARD.decode(encoded).ok(),
        Value::Array(octets) => octets
            .iter()
            .map(|octet| octet.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect(),
        _ => None,
    }
}

/// Serde helper for `Vec<u8>` fields stored as buffer objects.
///
/// ```ignore
/// #[serde(with = "sealink_store::buffer_json::buffer")]
/// public: Vec<u8>,
/// ```
pub mod buffer {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use serde_json::Value;

    /// Serialize bytes as `{"type":"Buffer","data":"<base64>"}`.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&super::buffer_object(bytes), serializer)
    }

    /// Deserialize a buffer object (base64 or octet-array data).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => super::revive_buffer(&map)
                .ok_or_else(|| D::Error::custom("expected a Buffer object with base64 or octet data")),
            other => Err(D::Error::custom(format!("expected a Buffer object, found {other}"))),
        }
    }
}
