//! Sealink Frame Protocol
//!
//! Turns one inbound transport read into a correlated, authenticated frame.
//!
//! # Wire Format
//!
//! ```text
//! tag ',' body
//!
//! body = ε                                   (empty response)
//!      | '{' json | '[' json                 (plaintext control frame)
//!      | [metric flag] checksum ciphertext   (binary frame)
//!
//! checksum   = HMAC-SHA256(mac_key, ciphertext)   32 bytes
//! ciphertext = IV || AES-256-CBC(enc_key, IV, plaintext)
//! ```
//!
//! The `[metric flag]` pair is only present on frames the server echoes back
//! for messages this client sent, which the caller signals with `from_me`.
//!
//! # Security
//!
//! The checksum is verified in constant time before decryption is attempted
//! and before any byte of the ciphertext reaches the structural decoder. A
//! [`FrameError::ChecksumMismatch`] therefore means the frame was never
//! decrypted.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod decoder;
pub mod errors;
pub mod frame;

pub use decoder::{RawDecoder, StructuredDecoder};
pub use errors::{FrameError, Result};
pub use frame::{
    DELIMITER, ExtraTags, Frame, FrameDecoder, Payload, decode_frame, encode_json_frame,
    seal_binary_frame,
};
