//! Category-indexed key material with one backend entry per key.

use std::collections::{BTreeMap, BTreeSet};

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::{
    DurableStore, StoreConfig, StoreError,
    buffer_json::{self, StoredValue},
    keys::{KeyBagUpdate, KeyCategory, KeyValue},
};

/// Key bag over a [`DurableStore`].
///
/// Each `(category, id)` is stored under its own backend key, so batches that
/// touch different entries can run concurrently without losing writes.
#[derive(Clone)]
pub struct KeyBag<S> {
    store: S,
    config: StoreConfig,
}

impl<S: DurableStore> KeyBag<S> {
    /// Key bag for the installation described by `config`.
    pub fn new(store: S, config: StoreConfig) -> Self {
        Self { store, config }
    }

    /// Read one entry. Absent, unreadable and undecodable entries are `None`.
    pub async fn get(&self, category: KeyCategory, id: &str) -> Option<KeyValue> {
        let key = self.config.entry_key(category, id);

        let bytes = match self.store.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(%key, error = %e, "key read failed, treating as absent");
                return None;
            },
        };

        let stored: StoredValue = match buffer_json::from_slice(&bytes) {
            Ok(StoredValue::Null) => return None,
            Ok(stored) => stored,
            Err(e) => {
                warn!(%key, error = %e, "key blob unparseable, treating as absent");
                return None;
            },
        };

        match KeyValue::decode(category, stored) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%key, error = %e, "key value undecodable, treating as absent");
                None
            },
        }
    }

    /// Read several entries of one category concurrently.
    ///
    /// Every requested id appears in the result; duplicates are read once.
    pub async fn get_many<I, T>(&self, category: KeyCategory, ids: I) -> BTreeMap<String, Option<KeyValue>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();

        let reads = ids.into_iter().map(|id| async move {
            let value = self.get(category, &id).await;
            (id, value)
        });

        join_all(reads).await.into_iter().collect()
    }

    /// Apply a batch of writes concurrently. `None` values delete.
    ///
    /// Every write is attempted even if some fail.
    ///
    /// # Errors
    ///
    /// - `Serialization` if a value cannot be encoded (nothing is written)
    /// - The first backend error among the writes
    pub async fn set_many(&self, update: &KeyBagUpdate) -> Result<(), StoreError> {
        let writes = update
            .iter()
            .map(|(category, id, value)| -> Result<_, StoreError> {
                let key = self.config.entry_key(category, id);
                let blob = value.map(|v| buffer_json::to_vec(&v.to_stored())).transpose()?;
                Ok((key, blob))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let results = join_all(writes.iter().map(|(key, blob)| async move {
            match blob {
                Some(bytes) => self.store.set(key, bytes).await,
                None => self.store.remove(key).await,
            }
        }))
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "key bag writes failed");
        }

        results.into_iter().collect()
    }

    /// Move a legacy whole-bag blob into per-entry storage.
    ///
    /// The blob at `{installation}_keys` is an object of `"{category}-{id}"`
    /// entries. Entries already present in per-entry storage are kept, unknown
    /// categories are skipped, and the blob is removed once every entry is
    /// written. Returns the number of entries migrated.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the blob is not a JSON object
    /// - Backend errors on reads or writes (the blob is then kept)
    pub async fn migrate_legacy_bag(&self) -> Result<usize, StoreError> {
        let legacy_key = self.config.legacy_keys_key();
        let Some(bytes) = self.store.get(&legacy_key).await? else {
            return Ok(0);
        };

        let entries = match buffer_json::from_slice::<StoredValue>(&bytes)? {
            StoredValue::Object(entries) => entries,
            StoredValue::Null => BTreeMap::new(),
            _ => {
                return Err(StoreError::Serialization(
                    "legacy key bag is not an object".to_string(),
                ));
            },
        };

        let mut update = KeyBagUpdate::new();
        for (name, value) in entries {
            if value.is_null() {
                continue;
            }
            let Some((category, id)) = KeyCategory::split_entry_name(&name) else {
                warn!(entry = %name, "legacy key entry has unknown category, skipping");
                continue;
            };

            let entry_key = self.config.entry_key(category, id);
            if self.store.get(&entry_key).await?.is_some() {
                debug!(%entry_key, "per-entry value already present, keeping it");
                continue;
            }
            update.insert(category, id, Some(KeyValue::Stored(value)));
        }

        let migrated = update.len();
        self.set_many(&update).await?;
        self.store.remove(&legacy_key).await?;

        debug!(migrated, "legacy key bag migrated");
        Ok(migrated)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{AppStateSyncKeyData, AppStateSyncKeyFingerprint, ChaoticStore, MemoryStore};

    fn bag() -> (MemoryStore, KeyBag<MemoryStore>) {
        let store = MemoryStore::new();
        (store.clone(), KeyBag::new(store, StoreConfig::default()))
    }

    #[tokio::test]
    async fn set_then_get() {
        let (_, bag) = bag();
        let update = KeyBagUpdate::new()
            .with(KeyCategory::Session, "alice.0", vec![1, 2, 3])
            .with(KeyCategory::PreKey, "1", StoredValue::from("pk"));

        bag.set_many(&update).await.unwrap();

        assert_eq!(bag.get(KeyCategory::Session, "alice.0").await, Some(KeyValue::from(vec![1, 2, 3])));
        assert_eq!(bag.get(KeyCategory::PreKey, "1").await, Some(KeyValue::from(StoredValue::from("pk"))));
        assert_eq!(bag.get(KeyCategory::PreKey, "2").await, None);
    }

    #[tokio::test]
    async fn each_entry_has_its_own_backend_key() {
        let (store, bag) = bag();
        let update = KeyBagUpdate::new()
            .with(KeyCategory::Session, "a", vec![1])
            .with(KeyCategory::SenderKeyMemory, "g", vec![2]);

        bag.set_many(&update).await.unwrap();

        assert_eq!(
            store.keys(),
            vec!["sealink_keys/sender-key-memory/g".to_string(), "sealink_keys/session/a".to_string()]
        );
        assert_eq!(store.raw("sealink_keys/session/a").unwrap(), br#"{"data":"AQ==","type":"Buffer"}"#);
    }

    #[tokio::test]
    async fn hyphenated_ids_do_not_alias_other_categories() {
        let (store, bag) = bag();
        let update = KeyBagUpdate::new()
            .with(KeyCategory::SenderKeyMemory, "g", vec![1])
            .with(KeyCategory::SenderKey, "memory-g", vec![2]);

        bag.set_many(&update).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(bag.get(KeyCategory::SenderKeyMemory, "g").await, Some(KeyValue::from(vec![1])));
        assert_eq!(bag.get(KeyCategory::SenderKey, "memory-g").await, Some(KeyValue::from(vec![2])));
    }

    #[tokio::test]
    async fn none_deletes_entry() {
        let (store, bag) = bag();
        bag.set_many(&KeyBagUpdate::new().with(KeyCategory::Session, "a", vec![1])).await.unwrap();

        bag.set_many(&KeyBagUpdate::new().with_removal(KeyCategory::Session, "a")).await.unwrap();

        assert_eq!(bag.get(KeyCategory::Session, "a").await, None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn get_many_reports_every_requested_id() {
        let (_, bag) = bag();
        bag.set_many(&KeyBagUpdate::new().with(KeyCategory::PreKey, "1", vec![1])).await.unwrap();

        let values = bag.get_many(KeyCategory::PreKey, ["1", "2", "1"]).await;

        assert_eq!(values.len(), 2);
        assert_eq!(values["1"], Some(KeyValue::from(vec![1])));
        assert_eq!(values["2"], None);
    }

    #[tokio::test]
    async fn sync_key_decoded_from_raw_bytes() {
        let (store, bag) = bag();
        store.insert_raw(
            "sealink_keys/app-state-sync-key/AAAAAA",
            r#"{"type":"Buffer","data":"AQID"}"#,
        );

        let value = bag.get(KeyCategory::AppStateSyncKey, "AAAAAA").await;

        assert_eq!(
            value,
            Some(KeyValue::AppStateSyncKey(AppStateSyncKeyData {
                key_data: Some(vec![1, 2, 3]),
                ..Default::default()
            }))
        );
    }

    #[tokio::test]
    async fn raw_sync_key_bytes_read_back_as_record() {
        let (_, bag) = bag();
        let raw = vec![7u8; 32];
        bag.set_many(&KeyBagUpdate::new().with(KeyCategory::AppStateSyncKey, "AAAAAJ9x", raw.clone()))
            .await
            .unwrap();

        let values = bag.get_many(KeyCategory::AppStateSyncKey, ["AAAAAJ9x"]).await;

        assert_eq!(
            values["AAAAAJ9x"],
            Some(KeyValue::AppStateSyncKey(AppStateSyncKeyData { key_data: Some(raw), ..Default::default() }))
        );
    }

    #[tokio::test]
    async fn sync_key_record_round_trips() {
        let (_, bag) = bag();
        let record = AppStateSyncKeyData {
            key_data: Some(vec![1, 2, 3]),
            fingerprint: Some(AppStateSyncKeyFingerprint {
                raw_id: Some(42),
                current_index: Some(1),
                device_indexes: vec![0, 3],
            }),
            timestamp: Some(1_700_000_000_000),
        };
        bag.set_many(&KeyBagUpdate::new().with(KeyCategory::AppStateSyncKey, "k", record.clone()))
            .await
            .unwrap();

        let values = bag.get_many(KeyCategory::AppStateSyncKey, ["k", "missing"]).await;

        assert_eq!(values["k"], Some(KeyValue::AppStateSyncKey(record)));
        assert_eq!(values["missing"], None);
    }

    #[tokio::test]
    async fn unparseable_blob_reads_as_absent() {
        let (store, bag) = bag();
        store.insert_raw("sealink_keys/session/a", "{broken");
        store.insert_raw("sealink_keys/app-state-sync-key/b", r#""not a key""#);

        assert_eq!(bag.get(KeyCategory::Session, "a").await, None);
        assert_eq!(bag.get(KeyCategory::AppStateSyncKey, "b").await, None);
    }

    #[tokio::test]
    async fn failed_reads_are_absent_failed_writes_propagate() {
        let store = ChaoticStore::new(MemoryStore::new(), 1.0);
        let bag = KeyBag::new(store, StoreConfig::default());

        assert_eq!(bag.get(KeyCategory::Session, "a").await, None);
        let result = bag.set_many(&KeyBagUpdate::new().with(KeyCategory::Session, "a", vec![1])).await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn migrates_legacy_bag() {
        let (store, bag) = bag();
        let legacy = json!({
            "pre-key-1": {"type": "Buffer", "data": "AQ=="},
            "sender-key-memory-group": {"member": true},
            "session-a": null,
            "mystery-9": "skip me",
        });
        store.insert_raw("sealink_keys", serde_json::to_vec(&legacy).unwrap());

        assert_eq!(bag.migrate_legacy_bag().await, Ok(2));

        assert_eq!(bag.get(KeyCategory::PreKey, "1").await, Some(KeyValue::from(vec![1])));
        let memory = bag.get(KeyCategory::SenderKeyMemory, "group").await.unwrap();
        assert_eq!(memory.as_stored().unwrap().to_json(), json!({"member": true}));
        assert_eq!(store.raw("sealink_keys"), None);

        assert_eq!(bag.migrate_legacy_bag().await, Ok(0));
    }

    #[tokio::test]
    async fn migration_keeps_newer_per_entry_values() {
        let (store, bag) = bag();
        bag.set_many(&KeyBagUpdate::new().with(KeyCategory::PreKey, "1", vec![9])).await.unwrap();
        store.insert_raw("sealink_keys", r#"{"pre-key-1":{"type":"Buffer","data":"AQ=="}}"#);

        assert_eq!(bag.migrate_legacy_bag().await, Ok(0));
        assert_eq!(bag.get(KeyCategory::PreKey, "1").await, Some(KeyValue::from(vec![9])));
    }

    #[tokio::test]
    async fn migration_rejects_non_object_blob() {
        let (store, bag) = bag();
        store.insert_raw("sealink_keys", "[1,2]");

        assert!(matches!(bag.migrate_legacy_bag().await, Err(StoreError::Serialization(_))));
        assert!(store.raw("sealink_keys").is_some());
    }
}
