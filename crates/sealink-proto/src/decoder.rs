//! Structural decoder seam.
//!
//! The binary message format inside an authenticated frame is owned by
//! another component. The frame decoder only hands it verified plaintext.

use std::convert::Infallible;

/// Turns authenticated plaintext into a structured message.
///
/// Implementations are only ever called with bytes whose checksum has been
/// verified and which decrypted cleanly.
pub trait StructuredDecoder {
    /// Decoded message type
    type Message;

    /// Decoder failure, reported as [`crate::FrameError::Decode`]
    type Error: std::fmt::Display;

    /// Decode one plaintext body.
    fn decode(&self, plaintext: &[u8]) -> Result<Self::Message, Self::Error>;
}

/// Decoder that returns the plaintext bytes untouched.
///
/// Useful when structural decoding happens later on another task, and in
/// tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl StructuredDecoder for RawDecoder {
    type Message = Vec<u8>;
    type Error = Infallible;

    fn decode(&self, plaintext: &[u8]) -> Result<Vec<u8>, Infallible> {
        Ok(plaintext.to_vec())
    }
}

impl<D: StructuredDecoder + ?Sized> StructuredDecoder for &D {
    type Message = D::Message;
    type Error = D::Error;

    fn decode(&self, plaintext: &[u8]) -> Result<Self::Message, Self::Error> {
        (**self).decode(plaintext)
    }
}
