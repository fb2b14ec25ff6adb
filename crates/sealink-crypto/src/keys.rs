//! Session key pair used to authenticate and decrypt binary frames.

use zeroize::Zeroize;

use crate::{CryptoError, KEY_SIZE};

/// MAC and encryption keys for one connection session.
///
/// Both keys are produced together by the handshake, so the pair is the unit
/// of presence: a session either has both keys or neither. Key bytes are
/// zeroized on drop and never exposed through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKeys {
    mac_key: [u8; KEY_SIZE],
    enc_key: [u8; KEY_SIZE],
}

impl SessionKeys {
    /// Create a key pair from fixed-size keys.
    pub fn new(mac_key: [u8; KEY_SIZE], enc_key: [u8; KEY_SIZE]) -> Self {
        Self { mac_key, enc_key }
    }

    /// Create a key pair from slices.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength` if either key is not [`KEY_SIZE`] bytes
    pub fn from_slices(mac_key: &[u8], enc_key: &[u8]) -> Result<Self, CryptoError> {
        let mac_key: [u8; KEY_SIZE] = mac_key
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: mac_key.len() })?;
        let enc_key: [u8; KEY_SIZE] = enc_key
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: enc_key.len() })?;

        Ok(Self { mac_key, enc_key })
    }

    /// Key for HMAC-SHA256 frame checksums.
    pub fn mac_key(&self) -> &[u8; KEY_SIZE] {
        &self.mac_key
    }

    /// Key for AES-256-CBC frame bodies.
    pub fn enc_key(&self) -> &[u8; KEY_SIZE] {
        &self.enc_key
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl Drop for SessionKeys {
    fn drop(&mut self) {
        self.mac_key.zeroize();
        self.enc_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slices_accepts_32_byte_keys() {
        let keys = SessionKeys::from_slices(&[1u8; 32], &[2u8; 32]).unwrap();
        assert_eq!(keys.mac_key(), &[1u8; 32]);
        assert_eq!(keys.enc_key(), &[2u8; 32]);
    }

    #[test]
    fn from_slices_rejects_short_keys() {
        let result = SessionKeys::from_slices(&[1u8; 32], &[2u8; 31]);
        assert_eq!(result, Err(CryptoError::InvalidKeyLength { expected: 32, actual: 31 }));
    }

    #[test]
    fn debug_does_not_leak_key_bytes() {
        let keys = SessionKeys::new([0xAB; 32], [0xCD; 32]);
        let rendered = format!("{keys:?}");
        assert!(!rendered.contains("171"));
        assert!(!rendered.contains("205"));
    }
}
