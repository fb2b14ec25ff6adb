//! Redb-backed durable backend.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety.
//! Blocking database calls run on Tokio's blocking pool.

use std::{fmt::Display, future::Future, path::Path, sync::Arc};

use redb::{Database, TableDefinition};

use super::DurableStore;
use crate::StoreError;

/// Table: kv
/// Key: backend key (UTF-8)
/// Value: blob bytes
const KV: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// Durable backend backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the `kv` table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        let txn = db.begin_write().map_err(io)?;
        {
            let _ = txn.open_table(KV).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn read(db: &Database, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let txn = db.begin_read().map_err(io)?;
        let table = txn.open_table(KV).map_err(io)?;
        let value = table.get(key).map_err(io)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn write(db: &Database, key: &str, value: Option<&[u8]>) -> Result<(), StoreError> {
        let txn = db.begin_write().map_err(io)?;
        {
            let mut table = txn.open_table(KV).map_err(io)?;
            match value {
                Some(bytes) => {
                    table.insert(key, bytes).map_err(io)?;
                },
                None => {
                    table.remove(key).map_err(io)?;
                },
            }
        }
        txn.commit().map_err(io)
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db)).await.map_err(io)?
    }
}

impl DurableStore for RedbStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send {
        let key = key.to_owned();
        self.blocking(move |db| Self::read(db, &key))
    }

    fn set(&self, key: &str, value: &[u8]) -> impl Future<Output = Result<(), StoreError>> + Send {
        let key = key.to_owned();
        let value = value.to_vec();
        self.blocking(move |db| Self::write(db, &key, Some(&value)))
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send {
        let key = key.to_owned();
        self.blocking(move |db| Self::write(db, &key, None))
    }
}

fn io(err: impl Display) -> StoreError {
    StoreError::Io(err.to_string())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        assert_eq!(store.get("a").await, Ok(None));

        store.set("a", b"blob").await.unwrap();
        assert_eq!(store.get("a").await, Ok(Some(b"blob".to_vec())));

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await, Ok(None));

        store.remove("a").await.unwrap();
    }

    #[tokio::test]
    async fn entry_keys_with_separators_are_distinct() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        store.set("sealink_keys/sender-key/memory-g", b"2").await.unwrap();
        store.set("sealink_keys/sender-key-memory/g", b"1").await.unwrap();

        assert_eq!(store.get("sealink_keys/sender-key/memory-g").await, Ok(Some(b"2".to_vec())));
        assert_eq!(store.get("sealink_keys/sender-key-memory/g").await, Ok(Some(b"1".to_vec())));
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            store.set("sealink_creds", b"{}").await.unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("sealink_creds").await, Ok(Some(b"{}".to_vec())));
    }
}
