//! AES-256-CBC with PKCS#7 padding.
//!
//! Two conventions are supported: an explicit IV supplied by the caller, and
//! the IV-prefixed form used on the wire where the first block of the buffer
//! is the IV.

use aes::Aes256;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};

use crate::{CryptoError, random::fill_random};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// CBC IV size in bytes (one AES block).
pub const IV_SIZE: usize = 16;

/// Decrypt a buffer whose first [`IV_SIZE`] bytes are the IV.
///
/// # Errors
///
/// - `CiphertextTooShort` if the buffer cannot hold an IV
/// - `InvalidKeyLength` if `key` is not [`KEY_SIZE`] bytes
/// - `BadPadding` if the ciphertext is not block aligned or the padding is
///   invalid
pub fn decrypt(cipher_with_iv: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if cipher_with_iv.len() < IV_SIZE {
        return Err(CryptoError::CiphertextTooShort { min: IV_SIZE, actual: cipher_with_iv.len() });
    }

    let (iv, ciphertext) = cipher_with_iv.split_at(IV_SIZE);
    decrypt_with_iv(ciphertext, key, iv)
}

/// Decrypt `ciphertext` with an explicit IV.
pub fn decrypt_with_iv(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_key(key)?;
    check_iv(iv)?;

    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: key.len() })?;

    cipher.decrypt_padded_vec_mut::<Pkcs7>(ciphertext).map_err(|_| CryptoError::BadPadding)
}

/// Encrypt with a fresh random IV and return `IV || ciphertext`.
///
/// Every call draws a new IV from the OS CSPRNG, so encrypting the same
/// plaintext twice yields different output.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut iv = [0u8; IV_SIZE];
    fill_random(&mut iv);

    let ciphertext = encrypt_with_iv(plaintext, key, &iv)?;

    let mut out = Vec::with_capacity(IV_SIZE + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);

    debug_assert_eq!(out.len() % IV_SIZE, 0);
    Ok(out)
}

/// Encrypt `plaintext` with an explicit IV. The IV is not prefixed.
pub fn encrypt_with_iv(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_key(key)?;
    check_iv(iv)?;

    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: key.len() })?;

    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn check_key(key: &[u8]) -> Result<(), CryptoError> {
    if key.len() == KEY_SIZE {
        Ok(())
    } else {
        Err(CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: key.len() })
    }
}

fn check_iv(iv: &[u8]) -> Result<(), CryptoError> {
    if iv.len() == IV_SIZE {
        Ok(())
    } else {
        Err(CryptoError::InvalidIvLength { expected: IV_SIZE, actual: iv.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; KEY_SIZE] {
        let mut key = [0u8; KEY_SIZE];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = test_key();
        let encrypted = encrypt(b"Hello, World!", &key).unwrap();
        let decrypted = decrypt(&encrypted, &key).unwrap();

        assert_eq!(decrypted, b"Hello, World!");
    }

    #[test]
    fn encrypt_prefixes_iv_and_pads_to_block() {
        let key = test_key();
        let encrypted = encrypt(b"", &key).unwrap();

        // IV plus one full padding block
        assert_eq!(encrypted.len(), IV_SIZE + 16);
    }

    #[test]
    fn explicit_iv_matches_prefixed_form() {
        let key = test_key();
        let iv = [7u8; IV_SIZE];

        let ciphertext = encrypt_with_iv(b"payload", &key, &iv).unwrap();
        let mut prefixed = iv.to_vec();
        prefixed.extend_from_slice(&ciphertext);

        assert_eq!(decrypt(&prefixed, &key).unwrap(), b"payload");
        assert_eq!(decrypt_with_iv(&ciphertext, &key, &iv).unwrap(), b"payload");
    }

    #[test]
    fn known_answer_vector() {
        // NIST SP 800-38A F.2.5 (CBC-AES256.Encrypt), first block
        let key = hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
            .unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let ciphertext = encrypt_with_iv(&plaintext, &key, &iv).unwrap();

        // First block is the NIST vector, second block is PKCS#7 padding
        assert_eq!(hex::encode(&ciphertext[..16]), "f58c4c04d6e5f1ba779eabfb5f7bfbd6");
        assert_eq!(ciphertext.len(), 32);
    }

    #[test]
    fn decrypt_rejects_short_input() {
        let result = decrypt(&[0u8; 8], &test_key());
        assert_eq!(result, Err(CryptoError::CiphertextTooShort { min: IV_SIZE, actual: 8 }));
    }

    #[test]
    fn decrypt_rejects_unaligned_ciphertext() {
        let result = decrypt(&[0u8; IV_SIZE + 5], &test_key());
        assert_eq!(result, Err(CryptoError::BadPadding));
    }

    #[test]
    fn wrong_key_length_rejected() {
        let result = encrypt(b"data", &[0u8; 16]);
        assert_eq!(result, Err(CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: 16 }));
    }

    #[test]
    fn wrong_iv_length_rejected() {
        let result = encrypt_with_iv(b"data", &test_key(), &[0u8; 12]);
        assert_eq!(result, Err(CryptoError::InvalidIvLength { expected: IV_SIZE, actual: 12 }));
    }

    #[test]
    fn wrong_key_fails_or_garbles() {
        let encrypted = encrypt(b"secret message", &test_key()).unwrap();

        // Wrong key usually breaks padding, and never yields the plaintext
        match decrypt(&encrypted, &[0xAA; KEY_SIZE]) {
            Ok(plaintext) => assert_ne!(plaintext, b"secret message"),
            Err(e) => assert_eq!(e, CryptoError::BadPadding),
        }
    }
}
