//! Sealink Cryptographic Primitives
//!
//! Stateless building blocks shared by the frame decoder and the credential
//! store. Every function is pure apart from drawing IVs and key material from
//! the OS CSPRNG, so all of them are safe to call concurrently.
//!
//! # Frame Protection
//!
//! Binary frames are encrypt-then-MAC:
//!
//! ```text
//! plaintext
//!     │
//!     ▼
//! AES-256-CBC (random IV, PKCS#7) → IV || ciphertext
//!     │
//!     ▼
//! HMAC-SHA256(mac_key, IV || ciphertext) → 32-byte checksum
//!     │
//!     ▼
//! checksum || IV || ciphertext
//! ```
//!
//! Receivers verify the checksum in constant time before touching the
//! ciphertext. Padding errors are therefore only reachable with a valid MAC,
//! which closes the CBC padding oracle.
//!
//! # Key Derivation
//!
//! [`derive_key`] is HKDF-SHA256 with a fixed all-zero 32-byte salt. Callers
//! choose the output length and an optional `info` label for domain
//! separation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cipher;
mod error;
mod kdf;
mod keys;
mod mac;
mod random;

pub use cipher::{IV_SIZE, KEY_SIZE, decrypt, decrypt_with_iv, encrypt, encrypt_with_iv};
pub use error::CryptoError;
pub use kdf::{MAX_DERIVED_LEN, derive_key};
pub use keys::SessionKeys;
pub use mac::{CHECKSUM_SIZE, hash, sign, verify};
pub use random::{fill_random, random_bytes};
