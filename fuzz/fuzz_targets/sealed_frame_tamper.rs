//! Fuzz target for tampering with sealed binary frames
//!
//! Seals a frame under arbitrary keys, flips one arbitrary bit after the
//! delimiter, and decodes it again.
//!
//! # Invariants
//!
//! - Untampered frames decode to the sealed plaintext
//! - Any flipped bit in the checksum, IV or ciphertext is rejected as
//!   `ChecksumMismatch` before decryption

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealink_crypto::SessionKeys;
use sealink_proto::{ExtraTags, FrameDecoder, FrameError, Payload, RawDecoder, seal_binary_frame};

#[derive(Debug, Arbitrary)]
struct Scenario {
    mac_key: [u8; 32],
    enc_key: [u8; 32],
    tag: String,
    plaintext: Vec<u8>,
    extra_tags: Option<(u8, u8)>,
    flip_at: usize,
    flip_bit: u8,
}

fuzz_target!(|s: Scenario| {
    let keys = SessionKeys::new(s.mac_key, s.enc_key);
    let extra_tags = s.extra_tags.map(|(metric, flag)| ExtraTags { metric, flag });
    let from_me = extra_tags.is_some();

    let Ok(sealed) = seal_binary_frame(&s.tag, &s.plaintext, &keys, extra_tags) else {
        // Tags containing the delimiter are refused.
        assert!(s.tag.contains(','));
        return;
    };

    // The decoder routes on the first byte after the delimiter, which is the
    // metric byte when extra tags are present. '{' or '[' there means JSON.
    let data_start = s.tag.len() + 1;
    if matches!(sealed[data_start], b'{' | b'[') {
        return;
    }
    let body_start = data_start + if from_me { ExtraTags::SIZE } else { 0 };

    let decoder = FrameDecoder::new(RawDecoder);
    let frame = decoder.decode(&sealed, Some(&keys), from_me).unwrap();
    assert_eq!(frame.payload, Some(Payload::Binary(s.plaintext.clone())));
    assert_eq!(frame.extra_tags, extra_tags);

    let mut tampered = sealed.clone();
    let idx = body_start + s.flip_at % (sealed.len() - body_start);
    tampered[idx] ^= 1 << (s.flip_bit % 8);
    if matches!(tampered[data_start], b'{' | b'[') {
        return;
    }

    assert!(matches!(
        decoder.decode(&tampered, Some(&keys), from_me),
        Err(FrameError::ChecksumMismatch)
    ));
});
