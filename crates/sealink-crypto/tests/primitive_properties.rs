//! Property-based tests for the primitive layer
//!
//! Verifies the cipher and MAC contracts hold for arbitrary inputs, not just
//! the fixed vectors in the unit tests.

use std::collections::HashSet;

use proptest::prelude::*;
use sealink_crypto::{
    CHECKSUM_SIZE, CryptoError, IV_SIZE, KEY_SIZE, decrypt, derive_key, encrypt, sign, verify,
};

fn arbitrary_key() -> impl Strategy<Value = [u8; KEY_SIZE]> {
    any::<[u8; KEY_SIZE]>()
}

#[test]
fn prop_encrypt_decrypt_roundtrip() {
    proptest!(|(
        key in arbitrary_key(),
        plaintext in prop::collection::vec(any::<u8>(), 0..2048),
    )| {
        let encrypted = encrypt(&plaintext, &key).expect("encrypt should succeed");

        // PROPERTY: IV prefix plus block-aligned PKCS#7 body
        prop_assert_eq!(encrypted.len(), IV_SIZE + (plaintext.len() / 16 + 1) * 16);

        let decrypted = decrypt(&encrypted, &key).expect("decrypt should succeed");
        prop_assert_eq!(decrypted, plaintext);
    });
}

#[test]
fn prop_sign_verify_agree() {
    proptest!(|(
        key in prop::collection::vec(any::<u8>(), 0..128),
        data in prop::collection::vec(any::<u8>(), 0..1024),
    )| {
        let checksum = sign(&data, &key);
        prop_assert_eq!(checksum.len(), CHECKSUM_SIZE);
        prop_assert!(verify(&data, &key, &checksum));
    });
}

#[test]
fn prop_checksum_bit_flip_rejected() {
    proptest!(|(
        key in arbitrary_key(),
        data in prop::collection::vec(any::<u8>(), 1..512),
        bit in 0usize..(CHECKSUM_SIZE * 8),
    )| {
        let mut checksum = sign(&data, &key);
        checksum[bit / 8] ^= 1 << (bit % 8);

        prop_assert!(!verify(&data, &key, &checksum));
    });
}

#[test]
fn prop_derive_key_length() {
    proptest!(|(
        secret in prop::collection::vec(any::<u8>(), 0..64),
        len in 0usize..512,
    )| {
        let okm = derive_key(&secret, len, Some(b"prop")).expect("derive should succeed");
        prop_assert_eq!(okm.len(), len);
    });
}

#[test]
fn encrypt_never_reuses_iv() {
    let key = [0x5A; KEY_SIZE];
    let mut ivs = HashSet::with_capacity(10_000);

    for _ in 0..10_000 {
        let encrypted = encrypt(b"same plaintext every time", &key).unwrap();
        let iv: [u8; IV_SIZE] = encrypted[..IV_SIZE].try_into().unwrap();
        assert!(ivs.insert(iv), "IV collision after {} encryptions", ivs.len());
    }
}

#[test]
fn tampered_ciphertext_never_decrypts_to_original() {
    let key = [0x11; KEY_SIZE];
    let plaintext = b"sixteen byte msg and then some more".to_vec();
    let mut encrypted = encrypt(&plaintext, &key).unwrap();

    let last = encrypted.len() - 1;
    encrypted[last] ^= 0x01;

    match decrypt(&encrypted, &key) {
        Ok(decrypted) => assert_ne!(decrypted, plaintext),
        Err(e) => assert_eq!(e, CryptoError::BadPadding),
    }
}
