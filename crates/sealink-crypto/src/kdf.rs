//! HKDF-SHA256 key expansion with a fixed zero salt.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::CryptoError;

/// Salt used for every derivation: 32 zero bytes.
const ZERO_SALT: [u8; 32] = [0u8; 32];

/// Largest output HKDF-SHA256 can produce (255 hash blocks).
pub const MAX_DERIVED_LEN: usize = 255 * 32;

/// Expand `secret` into `output_len` bytes of key material.
///
/// `info` is an optional domain-separation label; `None` and an empty label
/// derive the same output.
///
/// # Errors
///
/// - `OutputTooLong` if `output_len` exceeds [`MAX_DERIVED_LEN`]
pub fn derive_key(
    secret: &[u8],
    output_len: usize,
    info: Option<&[u8]>,
) -> Result<Vec<u8>, CryptoError> {
    if output_len > MAX_DERIVED_LEN {
        return Err(CryptoError::OutputTooLong { requested: output_len, max: MAX_DERIVED_LEN });
    }

    let hkdf = Hkdf::<Sha256>::new(Some(&ZERO_SALT), secret);

    let mut okm = vec![0u8; output_len];
    hkdf.expand(info.unwrap_or_default(), &mut okm)
        .map_err(|_| CryptoError::OutputTooLong { requested: output_len, max: MAX_DERIVED_LEN })?;

    Ok(okm)
}
