//! Blob codec properties

use std::collections::BTreeMap;

use proptest::prelude::*;
use sealink_store::{StoredValue, buffer_json};

fn arbitrary_stored_value() -> impl Strategy<Value = StoredValue> {
    let leaf = prop_oneof![
        Just(StoredValue::Null),
        any::<bool>().prop_map(StoredValue::Bool),
        any::<i64>().prop_map(StoredValue::from),
        "[ -~]{0,16}".prop_map(StoredValue::String),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(StoredValue::Bytes),
    ];

    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(StoredValue::Array),
            // "type" is reserved for buffer objects.
            prop::collection::btree_map("[a-z]{1,8}".prop_filter("reserved", |k| k != "type"), inner, 0..8)
                .prop_map(StoredValue::Object),
        ]
    })
}

#[test]
fn prop_blob_roundtrip() {
    proptest!(|(value in arbitrary_stored_value())| {
        let blob = buffer_json::to_vec(&value).unwrap();
        let decoded: StoredValue = buffer_json::from_slice(&blob).unwrap();

        prop_assert_eq!(decoded, value);
    });
}

#[test]
fn prop_octet_array_and_base64_decode_alike() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..128))| {
        let base64 = buffer_json::to_vec(&StoredValue::Bytes(bytes.clone())).unwrap();
        let octets = serde_json::to_vec(&serde_json::json!({"type": "Buffer", "data": bytes.clone()})).unwrap();

        let from_base64: StoredValue = buffer_json::from_slice(&base64).unwrap();
        let from_octets: StoredValue = buffer_json::from_slice(&octets).unwrap();

        prop_assert_eq!(&from_base64, &from_octets);
        prop_assert_eq!(from_base64, StoredValue::Bytes(bytes));
    });
}

#[test]
fn prop_arbitrary_bytes_never_panic() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..256))| {
        let _ = buffer_json::from_slice::<StoredValue>(&bytes);
        let _ = buffer_json::from_slice::<BTreeMap<String, StoredValue>>(&bytes);
    });
}
