//! Frame type and the inbound decode / outbound encode paths.
//!
//! A frame is `tag ',' body`. The body is empty, plaintext JSON, or an
//! encrypt-then-MAC binary blob; see the crate docs for the layout.

use sealink_crypto::{CHECKSUM_SIZE, SessionKeys, decrypt, encrypt, sign, verify};
use tracing::{trace, warn};

use crate::{
    decoder::StructuredDecoder,
    errors::{FrameError, Result},
};

/// Separates the tag from the body.
pub const DELIMITER: u8 = b',';

/// Out-of-band pair echoed on frames this client sent.
///
/// Present only when the caller decodes with `from_me`; stripped before the
/// checksum is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtraTags {
    /// Metric byte
    pub metric: u8,
    /// Flag byte
    pub flag: u8,
}

impl ExtraTags {
    /// Bytes occupied on the wire.
    pub const SIZE: usize = 2;

    fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.metric, self.flag]
    }
}

/// Decoded frame body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<M> {
    /// Plaintext control frame (handshake, server notices)
    Json(serde_json::Value),
    /// Authenticated binary frame after structural decoding
    Binary(M),
}

/// One decoded inbound frame.
///
/// # Invariants
///
/// - `extra_tags` is only `Some` for binary frames decoded with `from_me`
/// - A `Payload::Binary` was checksum-verified before it was decrypted
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<M> {
    /// Correlation tag; matches the tag of the request this answers
    pub tag: String,
    /// Body, `None` for an empty response
    pub payload: Option<Payload<M>>,
    /// Sender-echo pair, if any
    pub extra_tags: Option<ExtraTags>,
}

impl<M> Frame<M> {
    /// Reject plaintext replies whose `status` reports failure.
    ///
    /// Only a JSON object with a non-zero numeric `status` is checked; it
    /// passes when the status is in the 2xx range. Binary, empty and array
    /// bodies always pass.
    ///
    /// # Errors
    ///
    /// - `UnexpectedStatus` if the status is numeric, non-zero and not 2xx
    pub fn check_status(&self) -> Result<()> {
        let Some(Payload::Json(serde_json::Value::Object(body))) = &self.payload else {
            return Ok(());
        };
        let Some(serde_json::Value::Number(status)) = body.get("status") else {
            return Ok(());
        };

        let code = status.as_f64().unwrap_or_default();
        if code == 0.0 || (200.0..300.0).contains(&code) {
            return Ok(());
        }

        warn!(tag = %self.tag, %status, "reply carried non-2xx status");
        Err(FrameError::UnexpectedStatus { status: status.clone() })
    }
}

/// Decodes inbound frames with a fixed structural decoder.
///
/// Holds no session state: keys are passed per call and only read, so one
/// decoder can serve any number of concurrent reads.
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder<D> {
    decoder: D,
}

impl<D: StructuredDecoder> FrameDecoder<D> {
    /// Wrap a structural decoder.
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    /// Structural decoder used for binary bodies.
    pub fn structural(&self) -> &D {
        &self.decoder
    }

    /// Decode one raw transport read.
    ///
    /// `keys` is `None` until the handshake completes; plaintext frames
    /// decode regardless. `from_me` marks frames echoing this client's own
    /// sends, which carry an [`ExtraTags`] prefix.
    ///
    /// # Errors
    ///
    /// - `MissingTag` if there is no delimiter
    /// - `MalformedJson` if a plaintext body does not parse
    /// - `KeysNotEstablished` for a binary body without session keys
    /// - `ChecksumMismatch` if the body is too short to carry a checksum or
    ///   the checksum does not verify; the ciphertext is not decrypted
    /// - `Crypto` if a verified ciphertext fails to decrypt
    /// - `Decode` if the structural decoder rejects the plaintext
    pub fn decode(
        &self,
        raw: &[u8],
        keys: Option<&SessionKeys>,
        from_me: bool,
    ) -> Result<Frame<D::Message>> {
        let delimiter = raw
            .iter()
            .position(|&b| b == DELIMITER)
            .ok_or(FrameError::MissingTag { len: raw.len() })?;

        let tag = String::from_utf8_lossy(&raw[..delimiter]).into_owned();
        let data = &raw[delimiter + 1..];

        if data.is_empty() {
            trace!(%tag, "empty frame");
            return Ok(Frame { tag, payload: None, extra_tags: None });
        }

        if matches!(data[0], b'{' | b'[') {
            let json = serde_json::from_slice(data)
                .map_err(|e| FrameError::MalformedJson { reason: e.to_string() })?;
            trace!(%tag, len = data.len(), "plaintext frame");
            return Ok(Frame { tag, payload: Some(Payload::Json(json)), extra_tags: None });
        }

        let keys = keys.ok_or(FrameError::KeysNotEstablished)?;

        let (extra_tags, data) = if from_me {
            match data {
                [metric, flag, rest @ ..] => (Some(ExtraTags { metric: *metric, flag: *flag }), rest),
                _ => {
                    warn!(%tag, len = data.len(), "echoed frame too short for tag pair");
                    return Err(FrameError::ChecksumMismatch);
                },
            }
        } else {
            (None, data)
        };

        if data.len() < CHECKSUM_SIZE {
            warn!(%tag, len = data.len(), "binary frame too short for checksum");
            return Err(FrameError::ChecksumMismatch);
        }

        let (checksum, ciphertext) = data.split_at(CHECKSUM_SIZE);
        if !verify(ciphertext, keys.mac_key(), checksum) {
            warn!(%tag, len = ciphertext.len(), "checksum mismatch, discarding frame");
            return Err(FrameError::ChecksumMismatch);
        }

        let plaintext = decrypt(ciphertext, keys.enc_key())?;
        let message = self
            .decoder
            .decode(&plaintext)
            .map_err(|e| FrameError::Decode { reason: e.to_string() })?;

        trace!(%tag, len = plaintext.len(), from_me, "binary frame");
        Ok(Frame { tag, payload: Some(Payload::Binary(message)), extra_tags })
    }
}

/// Decode one raw transport read with `decoder`.
///
/// Shorthand for [`FrameDecoder::decode`] without keeping a decoder around.
pub fn decode_frame<D: StructuredDecoder>(
    raw: &[u8],
    keys: Option<&SessionKeys>,
    decoder: D,
    from_me: bool,
) -> Result<Frame<D::Message>> {
    FrameDecoder::new(decoder).decode(raw, keys, from_me)
}

/// Encode a plaintext control frame: `tag ',' json`.
///
/// # Errors
///
/// - `InvalidTag` if `tag` contains the delimiter
pub fn encode_json_frame(tag: &str, body: &serde_json::Value) -> Result<Vec<u8>> {
    check_tag(tag)?;

    let json = body.to_string();
    let mut out = Vec::with_capacity(tag.len() + 1 + json.len());
    out.extend_from_slice(tag.as_bytes());
    out.push(DELIMITER);
    out.extend_from_slice(json.as_bytes());
    Ok(out)
}

/// Encrypt and authenticate `plaintext` into a binary frame:
/// `tag ',' [metric flag] checksum IV ciphertext`.
///
/// # Errors
///
/// - `InvalidTag` if `tag` contains the delimiter
pub fn seal_binary_frame(
    tag: &str,
    plaintext: &[u8],
    keys: &SessionKeys,
    extra_tags: Option<ExtraTags>,
) -> Result<Vec<u8>> {
    check_tag(tag)?;

    let ciphertext = encrypt(plaintext, keys.enc_key())?;
    let checksum = sign(&ciphertext, keys.mac_key());

    let mut out =
        Vec::with_capacity(tag.len() + 1 + ExtraTags::SIZE + CHECKSUM_SIZE + ciphertext.len());
    out.extend_from_slice(tag.as_bytes());
    out.push(DELIMITER);
    if let Some(extra) = extra_tags {
        out.extend_from_slice(&extra.to_bytes());
    }
    out.extend_from_slice(&checksum);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn check_tag(tag: &str) -> Result<()> {
    if tag.as_bytes().contains(&DELIMITER) {
        return Err(FrameError::InvalidTag { tag: tag.to_string() });
    }
    Ok(())
}
