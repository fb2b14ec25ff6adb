//! HMAC-SHA256 checksums and SHA-256 hashing.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Size of an HMAC-SHA256 tag (and a SHA-256 digest).
pub const CHECKSUM_SIZE: usize = 32;

/// Compute HMAC-SHA256 of `data` under `key`.
///
/// HMAC accepts keys of any length, so this never fails.
pub fn sign(data: &[u8], key: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut mac = new_mac(key);
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Check `checksum` against HMAC-SHA256 of `data` in constant time.
///
/// Returns `false` for a checksum of the wrong length instead of failing, so
/// callers get a single rejection path for every kind of mismatch.
pub fn verify(data: &[u8], key: &[u8], checksum: &[u8]) -> bool {
    let mut mac = new_mac(key);
    mac.update(data);
    mac.verify_slice(checksum).is_ok()
}

/// SHA-256 digest of `data`.
pub fn hash(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    Sha256::digest(data).into()
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    let Ok(mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC accepts keys of any length");
    };
    mac
}
