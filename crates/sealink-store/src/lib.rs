//! Sealink Credential Store
//!
//! Persists the installation's long-lived [`Credentials`] and the
//! category-indexed [`KeyBag`] of protocol key material on top of any backend
//! that offers whole-value `get`/`set`/`remove` by string key.
//!
//! # Layout
//!
//! ```text
//! {installation}_creds                 Credentials (blob)
//! {installation}_keys/{category}/{id}  one key-bag entry (blob)
//! {installation}_keys                  legacy whole-bag blob, migrated on demand
//! ```
//!
//! Blobs are JSON text in which byte sequences appear as
//! `{"type":"Buffer","data":"<base64>"}`; see [`buffer_json`].
//!
//! # Concurrency
//!
//! Every key-bag entry has its own backend key. Batched reads and writes are
//! issued concurrently, and because no two entries share a blob, concurrent
//! batches touching disjoint entries never clobber each other. Writes to the
//! same entry are last-writer-wins.
//!
//! # Failure Policy
//!
//! Reads never fail: a backend error or an unparseable blob reads as absent
//! and is logged at `warn`. Writes propagate [`StoreError`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod backend;
pub mod buffer_json;
mod config;
mod credential_store;
mod credentials;
mod error;
mod key_bag;
mod keys;

pub use backend::{ChaoticStore, DurableStore, MemoryStore, RedbStore};
pub use buffer_json::StoredValue;
pub use config::StoreConfig;
pub use credential_store::CredentialStore;
pub use credentials::{Contact, Credentials, KeyPair, SignedKeyPair};
pub use error::StoreError;
pub use key_bag::KeyBag;
pub use keys::{
    AppStateSyncKeyData, AppStateSyncKeyFingerprint, KeyBagUpdate, KeyCategory, KeyValue,
};
