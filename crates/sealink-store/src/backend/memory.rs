use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};

use super::DurableStore;
use crate::StoreError;

/// In-memory backend for tests and simulation.
///
/// All clones share one map. Operations complete without suspending, so the
/// returned futures resolve on first poll.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Raw blob under `key`, bypassing the async interface.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    /// Store a raw blob, bypassing the async interface.
    ///
    /// Lets tests plant corrupt or legacy data.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.lock().insert(key.into(), value.into());
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.inner.lock().expect("MemoryStore mutex poisoned")
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send {
        let value = self.raw(key);
        std::future::ready(Ok(value))
    }

    fn set(&self, key: &str, value: &[u8]) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.insert_raw(key, value);
        std::future::ready(Ok(()))
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.lock().remove(key);
        std::future::ready(Ok(()))
    }
}
