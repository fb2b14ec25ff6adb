//! Error types for cryptographic primitives.

use thiserror::Error;

/// Errors produced by the primitive layer.
///
/// All variants are terminal for the input that produced them: retrying the
/// same bytes with the same key cannot succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key is not 32 bytes (AES-256)
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required key length
        expected: usize,
        /// Supplied key length
        actual: usize,
    },

    /// IV is not one cipher block
    #[error("invalid IV length: expected {expected} bytes, got {actual}")]
    InvalidIvLength {
        /// Required IV length
        expected: usize,
        /// Supplied IV length
        actual: usize,
    },

    /// Input cannot hold a prefixed IV
    #[error("ciphertext too short: need at least {min} bytes, got {actual}")]
    CiphertextTooShort {
        /// Minimum acceptable length
        min: usize,
        /// Supplied length
        actual: usize,
    },

    /// PKCS#7 padding is malformed or ciphertext is not block aligned
    #[error("bad padding")]
    BadPadding,

    /// Requested HKDF output exceeds 255 hash blocks
    #[error("derived key too long: requested {requested} bytes, max {max}")]
    OutputTooLong {
        /// Requested output length
        requested: usize,
        /// Maximum output length for HKDF-SHA256
        max: usize,
    },
}
