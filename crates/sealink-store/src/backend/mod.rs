//! Durable key-value backends.
//!
//! The credential store only needs whole-value reads and writes of opaque
//! blobs by string key. [`DurableStore`] captures that surface so the same
//! store logic runs against process memory, an embedded database, or a fault
//! injecting wrapper in tests.

mod chaotic;
mod memory;
mod redb;

use std::future::Future;

pub use chaotic::ChaoticStore;
pub use memory::MemoryStore;
pub use redb::RedbStore;

use crate::StoreError;

/// Asynchronous whole-value key-value backend.
///
/// Implementations must be cheap to clone (shared handles) and safe to call
/// concurrently. No ordering is guaranteed between concurrent calls; a later
/// `set` on the same key wins.
pub trait DurableStore: Clone + Send + Sync + 'static {
    /// Read the blob stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Replace the blob stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}
