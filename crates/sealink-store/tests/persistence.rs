//! Durability and fault tolerance of the credential store
//!
//! - Credentials and key-bag entries survive a database close/reopen
//! - Under injected backend failures reads never error, and every entry reads
//!   as absent or as its last successfully written value

use std::collections::BTreeMap;

use proptest::prelude::*;
use sealink_core::SimEnv;
use sealink_store::{
    ChaoticStore, CredentialStore, KeyBag, KeyBagUpdate, KeyCategory, KeyValue, MemoryStore,
    RedbStore, StoreConfig,
};
use tempfile::tempdir;

#[tokio::test]
async fn credentials_and_keys_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auth.redb");
    let env = SimEnv::new(11);

    let saved = {
        let store = RedbStore::open(&path).unwrap();
        let mut state = CredentialStore::load(store, StoreConfig::default(), &env).await;
        assert!(state.is_fresh());

        let ids = state.credentials_mut().allocate_pre_key_ids(3);
        let mut update = KeyBagUpdate::new();
        for id in ids {
            update.insert(KeyCategory::PreKey, id.to_string(), Some(KeyValue::from(vec![id as u8; 32])));
        }
        state.keys().set_many(&update).await.unwrap();
        state.save_credentials().await.unwrap();
        state.credentials().clone()
    };

    let store = RedbStore::open(&path).unwrap();
    let state = CredentialStore::load(store, StoreConfig::default(), &env).await;

    assert!(!state.is_fresh());
    assert_eq!(state.credentials(), &saved);
    assert_eq!(state.credentials().next_pre_key_id, 4);
    assert!(state.credentials().verify_signed_pre_key());
    assert_eq!(state.keys().get(KeyCategory::PreKey, "2").await, Some(KeyValue::from(vec![2; 32])));
}

#[tokio::test]
async fn unsaved_credential_changes_are_not_persisted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auth.redb");
    let env = SimEnv::new(12);

    {
        let store = RedbStore::open(&path).unwrap();
        let mut state = CredentialStore::load(store, StoreConfig::default(), &env).await;
        state.save_credentials().await.unwrap();
        state.credentials_mut().registered = true;
    }

    let state = CredentialStore::load(RedbStore::open(&path).unwrap(), StoreConfig::default(), &env).await;
    assert!(!state.credentials().registered);
}

#[test]
fn prop_chaotic_reads_are_absent_or_last_written() {
    proptest!(|(
        failure_rate in 0.0..0.9,
        seed in any::<u64>(),
        writes in prop::collection::vec((0u8..8, any::<u8>()), 1..40),
    )| {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let store = ChaoticStore::with_seed(MemoryStore::new(), failure_rate, seed);
            let bag = KeyBag::new(store.clone(), StoreConfig::default());

            let mut committed: BTreeMap<String, u8> = BTreeMap::new();
            for (id, byte) in &writes {
                let update = KeyBagUpdate::new().with(KeyCategory::Session, id.to_string(), vec![*byte]);
                if bag.set_many(&update).await.is_ok() {
                    committed.insert(id.to_string(), *byte);
                }
            }

            // Inspect the inner store so injected failures cannot hide state.
            let clean = KeyBag::new(store.inner().clone(), StoreConfig::default());
            for id in 0u8..8 {
                let expected = committed.get(&id.to_string()).map(|b| KeyValue::from(vec![*b]));
                prop_assert_eq!(clean.get(KeyCategory::Session, &id.to_string()).await, expected.clone());

                let seen = bag.get(KeyCategory::Session, &id.to_string()).await;
                prop_assert!(seen.is_none() || seen == expected);
            }
            Ok(())
        })?;
    });
}
