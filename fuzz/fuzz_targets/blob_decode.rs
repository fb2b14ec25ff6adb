//! Fuzz target for stored blob decoding
//!
//! Stored blobs come from an external backend and may be truncated or
//! corrupted. Decoding must fail cleanly and never panic, and anything that
//! decodes must encode again.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealink_store::{Credentials, KeyCategory, KeyValue, StoredValue, buffer_json};

fuzz_target!(|data: &[u8]| {
    let _ = buffer_json::from_slice::<Credentials>(data);

    if let Ok(value) = buffer_json::from_slice::<StoredValue>(data) {
        assert!(buffer_json::to_vec(&value).is_ok());

        if let Ok(KeyValue::AppStateSyncKey(key)) =
            KeyValue::decode(KeyCategory::AppStateSyncKey, value)
        {
            assert!(buffer_json::to_vec(&key.to_stored()).is_ok());
        }
    }
});
