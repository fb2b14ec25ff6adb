//! Error types for frame decoding.

use sealink_crypto::CryptoError;
use thiserror::Error;

/// Result type for frame operations
pub type Result<T> = std::result::Result<T, FrameError>;

/// Classified failures of the frame decoder.
///
/// Each failure is fatal to the single inbound read that produced it and
/// does not affect other frames in flight. What to do next (drop the frame,
/// reconnect, terminate the session) is the caller's decision; see
/// [`FrameError::is_security_violation`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// No `,` delimiter; the frame cannot be attributed to any request
    #[error("missing tag: no delimiter in {len}-byte message")]
    MissingTag {
        /// Length of the rejected message
        len: usize,
    },

    /// Outbound tag would break framing
    #[error("invalid tag {tag:?}: tags must not contain the delimiter")]
    InvalidTag {
        /// Rejected tag
        tag: String,
    },

    /// Plaintext body opened like JSON but did not parse
    #[error("malformed JSON body: {reason}")]
    MalformedJson {
        /// Parser message
        reason: String,
    },

    /// Binary frame arrived before the handshake produced session keys
    #[error("encrypted frame received before keys established")]
    KeysNotEstablished,

    /// HMAC over the ciphertext did not match the frame checksum
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Cipher-level failure after a valid checksum (bad padding)
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Structural decoder rejected the authenticated plaintext
    #[error("structural decode failed: {reason}")]
    Decode {
        /// Decoder message
        reason: String,
    },

    /// Plaintext reply carried a numeric `status` outside 2xx
    #[error("unexpected status code: {status}")]
    UnexpectedStatus {
        /// Status as sent by the server
        status: serde_json::Number,
    },
}

impl FrameError {
    /// Returns true if the frame may have been tampered with or corrupted.
    ///
    /// Such frames must be discarded; callers may also tear down the session.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Self::ChecksumMismatch | Self::Crypto(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_violations_are_classified() {
        assert!(FrameError::ChecksumMismatch.is_security_violation());
        assert!(FrameError::Crypto(CryptoError::BadPadding).is_security_violation());

        assert!(!FrameError::MissingTag { len: 0 }.is_security_violation());
        assert!(!FrameError::KeysNotEstablished.is_security_violation());
        assert!(!FrameError::Decode { reason: "bad node".into() }.is_security_violation());
        assert!(!FrameError::UnexpectedStatus { status: 401.into() }.is_security_violation());
    }

    #[test]
    fn display_messages_are_descriptive() {
        assert!(FrameError::KeysNotEstablished.to_string().contains("before keys"));
        assert!(FrameError::MissingTag { len: 12 }.to_string().contains("12-byte"));
        assert_eq!(
            FrameError::UnexpectedStatus { status: 599.into() }.to_string(),
            "unexpected status code: 599"
        );
    }
}
