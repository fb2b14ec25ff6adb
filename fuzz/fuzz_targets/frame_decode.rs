//! Fuzz target for FrameDecoder::decode
//!
//! Feeds arbitrary transport reads to the decoder, with and without session
//! keys and with either direction, to find:
//! - Parser crashes or panics
//! - Slicing past the end of short bodies
//! - Binary bodies reaching the structural decoder without a valid checksum
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealink_crypto::SessionKeys;
use sealink_proto::{FrameError, Payload, RawDecoder, decode_frame};

#[derive(Debug, Arbitrary)]
struct Input {
    keys: Option<([u8; 32], [u8; 32])>,
    from_me: bool,
    raw: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let keys = input.keys.map(|(mac, enc)| SessionKeys::new(mac, enc));

    match decode_frame(&input.raw, keys.as_ref(), RawDecoder, input.from_me) {
        Ok(frame) => {
            assert!(!frame.tag.contains(','));
            if let Some(Payload::Binary(_)) = frame.payload {
                // Only reachable with keys that authenticated the body.
                assert!(keys.is_some());
            }
            if frame.extra_tags.is_some() {
                assert!(input.from_me);
            }
        },
        Err(FrameError::KeysNotEstablished) => assert!(keys.is_none()),
        Err(_) => {},
    }
});
