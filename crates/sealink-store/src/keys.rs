//! Key-bag categories, values and update batches.

use std::{collections::BTreeMap, fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{StoreError, buffer_json::StoredValue};

/// Closed set of key-bag categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyCategory {
    /// One-time pre-keys
    PreKey,
    /// Pairwise sessions
    Session,
    /// Group sender keys
    SenderKey,
    /// Which members hold our sender key
    SenderKeyMemory,
    /// App-state sync keys (decoded as [`AppStateSyncKeyData`])
    AppStateSyncKey,
    /// App-state collection versions
    AppStateSyncVersion,
}

impl KeyCategory {
    /// Every category.
    pub const ALL: [KeyCategory; 6] = [
        KeyCategory::PreKey,
        KeyCategory::Session,
        KeyCategory::SenderKey,
        KeyCategory::SenderKeyMemory,
        KeyCategory::AppStateSyncKey,
        KeyCategory::AppStateSyncVersion,
    ];

    /// Wire name used in backend keys.
    pub fn as_str(self) -> &'static str {
        match self {
            KeyCategory::PreKey => "pre-key",
            KeyCategory::Session => "session",
            KeyCategory::SenderKey => "sender-key",
            KeyCategory::SenderKeyMemory => "sender-key-memory",
            KeyCategory::AppStateSyncKey => "app-state-sync-key",
            KeyCategory::AppStateSyncVersion => "app-state-sync-version",
        }
    }

    /// Split a legacy entry name `"{category}-{id}"`.
    ///
    /// Category names share prefixes (`sender-key`, `sender-key-memory`), so
    /// the longest matching category wins.
    pub fn split_entry_name(name: &str) -> Option<(KeyCategory, &str)> {
        Self::ALL
            .iter()
            .filter_map(|category| {
                let id = name.strip_prefix(category.as_str())?.strip_prefix('-')?;
                Some((*category, id))
            })
            .max_by_key(|(category, _)| category.as_str().len())
    }
}

impl fmt::Display for KeyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyCategory {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| StoreError::UnknownCategory(s.to_string()))
    }
}

/// Fingerprint of an app-state sync key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppStateSyncKeyFingerprint {
    /// Raw key id
    pub raw_id: Option<u32>,
    /// Index of the current key
    pub current_index: Option<u32>,
    /// Device indexes the key was shared with
    pub device_indexes: Vec<u32>,
}

/// Structured app-state sync key record.
///
/// Stored values may be either the raw key bytes or an object with
/// `keyData`, `fingerprint` and `timestamp` fields; both decode to this type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppStateSyncKeyData {
    /// Key material
    pub key_data: Option<Vec<u8>>,
    /// Key fingerprint
    pub fingerprint: Option<AppStateSyncKeyFingerprint>,
    /// Creation time, milliseconds since the Unix epoch
    pub timestamp: Option<i64>,
}

impl AppStateSyncKeyData {
    /// Decode a stored value.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the value is neither bytes nor a well-formed
    ///   record object
    pub fn from_stored(value: &StoredValue) -> Result<Self, StoreError> {
        let map = match value {
            StoredValue::Bytes(bytes) => {
                return Ok(Self { key_data: Some(bytes.clone()), ..Self::default() });
            },
            StoredValue::Object(map) => map,
            other => {
                return Err(StoreError::Serialization(format!(
                    "app-state sync key must be bytes or an object, found {other:?}"
                )));
            },
        };

        let key_data = match present(map, "keyData") {
            None => None,
            Some(StoredValue::Bytes(bytes)) => Some(bytes.clone()),
            Some(StoredValue::String(encoded)) => Some(
                STANDARD
                    .decode(encoded)
                    .map_err(|e| StoreError::Serialization(format!("keyData: {e}")))?,
            ),
            Some(_) => return Err(field_error("keyData", "bytes")),
        };

        let fingerprint = match present(map, "fingerprint") {
            None => None,
            Some(StoredValue::Object(fields)) => Some(AppStateSyncKeyFingerprint {
                raw_id: optional_u32(fields, "rawId")?,
                current_index: optional_u32(fields, "currentIndex")?,
                device_indexes: match present(fields, "deviceIndexes") {
                    None => Vec::new(),
                    Some(StoredValue::Array(items)) => items
                        .iter()
                        .map(|item| as_u32(item).ok_or_else(|| field_error("deviceIndexes", "u32")))
                        .collect::<Result<_, _>>()?,
                    Some(_) => return Err(field_error("deviceIndexes", "array")),
                },
            }),
            Some(_) => return Err(field_error("fingerprint", "object")),
        };

        let timestamp = match present(map, "timestamp") {
            None => None,
            Some(StoredValue::Number(n)) => {
                Some(n.as_i64().ok_or_else(|| field_error("timestamp", "integer"))?)
            },
            Some(StoredValue::String(s)) => {
                Some(s.parse().map_err(|_| field_error("timestamp", "integer"))?)
            },
            Some(_) => return Err(field_error("timestamp", "integer")),
        };

        Ok(Self { key_data, fingerprint, timestamp })
    }

    /// Encode as a stored object, omitting unset fields.
    pub fn to_stored(&self) -> StoredValue {
        let mut map = BTreeMap::new();
        if let Some(key_data) = &self.key_data {
            map.insert("keyData".to_string(), StoredValue::Bytes(key_data.clone()));
        }
        if let Some(fingerprint) = &self.fingerprint {
            let mut fields = BTreeMap::new();
            if let Some(raw_id) = fingerprint.raw_id {
                fields.insert("rawId".to_string(), StoredValue::from(u64::from(raw_id)));
            }
            if let Some(current_index) = fingerprint.current_index {
                fields.insert("currentIndex".to_string(), StoredValue::from(u64::from(current_index)));
            }
            fields.insert(
                "deviceIndexes".to_string(),
                StoredValue::Array(
                    fingerprint.device_indexes.iter().map(|i| StoredValue::from(u64::from(*i))).collect(),
                ),
            );
            map.insert("fingerprint".to_string(), StoredValue::Object(fields));
        }
        if let Some(timestamp) = self.timestamp {
            map.insert("timestamp".to_string(), StoredValue::from(timestamp));
        }
        StoredValue::Object(map)
    }
}

fn present<'a>(map: &'a BTreeMap<String, StoredValue>, field: &str) -> Option<&'a StoredValue> {
    map.get(field).filter(|value| !value.is_null())
}

fn as_u32(value: &StoredValue) -> Option<u32> {
    match value {
        StoredValue::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

fn optional_u32(map: &BTreeMap<String, StoredValue>, field: &str) -> Result<Option<u32>, StoreError> {
    present(map, field).map(|value| as_u32(value).ok_or_else(|| field_error(field, "u32"))).transpose()
}

fn field_error(field: &str, expected: &str) -> StoreError {
    StoreError::Serialization(format!("app-state sync key field {field}: expected {expected}"))
}

/// A key-bag value.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    /// Decoded app-state sync key (the `app-state-sync-key` category)
    AppStateSyncKey(AppStateSyncKeyData),
    /// Any other value, kept as stored
    Stored(StoredValue),
}

impl KeyValue {
    /// Decode a value read from `category`.
    ///
    /// Only the sync-key category is structurally decoded; everything else
    /// passes through.
    pub fn decode(category: KeyCategory, value: StoredValue) -> Result<Self, StoreError> {
        match category {
            KeyCategory::AppStateSyncKey => {
                AppStateSyncKeyData::from_stored(&value).map(Self::AppStateSyncKey)
            },
            _ => Ok(Self::Stored(value)),
        }
    }

    /// Encode for storage.
    pub fn to_stored(&self) -> StoredValue {
        match self {
            Self::AppStateSyncKey(data) => data.to_stored(),
            Self::Stored(value) => value.clone(),
        }
    }

    /// Decoded sync key, if this is one.
    pub fn as_app_state_sync_key(&self) -> Option<&AppStateSyncKeyData> {
        match self {
            Self::AppStateSyncKey(data) => Some(data),
            Self::Stored(_) => None,
        }
    }

    /// Stored value, if this is not a sync key.
    pub fn as_stored(&self) -> Option<&StoredValue> {
        match self {
            Self::Stored(value) => Some(value),
            Self::AppStateSyncKey(_) => None,
        }
    }
}

impl From<StoredValue> for KeyValue {
    fn from(value: StoredValue) -> Self {
        Self::Stored(value)
    }
}

impl From<Vec<u8>> for KeyValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Stored(StoredValue::Bytes(bytes))
    }
}

impl From<AppStateSyncKeyData> for KeyValue {
    fn from(data: AppStateSyncKeyData) -> Self {
        Self::AppStateSyncKey(data)
    }
}

/// Batch of key-bag writes.
///
/// `None` marks an entry for deletion. Setting the same entry twice keeps the
/// last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyBagUpdate {
    entries: BTreeMap<KeyCategory, BTreeMap<String, Option<KeyValue>>>,
}

impl KeyBagUpdate {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry write (`None` deletes).
    pub fn insert(&mut self, category: KeyCategory, id: impl Into<String>, value: Option<KeyValue>) {
        self.entries.entry(category).or_default().insert(id.into(), value);
    }

    /// Builder form of [`KeyBagUpdate::insert`] with a value.
    #[must_use]
    pub fn with(mut self, category: KeyCategory, id: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.insert(category, id, Some(value.into()));
        self
    }

    /// Builder form of [`KeyBagUpdate::insert`] with a deletion.
    #[must_use]
    pub fn with_removal(mut self, category: KeyCategory, id: impl Into<String>) -> Self {
        self.insert(category, id, None);
        self
    }

    /// Number of entry writes.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All writes as `(category, id, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (KeyCategory, &str, Option<&KeyValue>)> {
        self.entries.iter().flat_map(|(category, ids)| {
            ids.iter().map(move |(id, value)| (*category, id.as_str(), value.as_ref()))
        })
    }
}
