//! Long-lived installation credentials.

use std::{fmt, ops::Range};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sealink_core::Environment;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::buffer_json::buffer;

/// Key id of the initial signed pre-key.
const INITIAL_SIGNED_PRE_KEY_ID: u32 = 1;

/// Registration ids are 14-bit.
const REGISTRATION_ID_MASK: u16 = 0x3FFF;

/// Prefix byte of a serialized curve25519 public key.
const KEY_TYPE_DJB: u8 = 0x05;

/// Private/public key pair, stored as buffer objects.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    /// Private key (or signing seed)
    #[serde(with = "buffer")]
    pub private: Vec<u8>,
    /// Public key
    #[serde(with = "buffer")]
    pub public: Vec<u8>,
}

impl KeyPair {
    /// Generate an X25519 key pair from the environment's RNG.
    pub fn generate_x25519<E: Environment>(env: &E) -> Self {
        let mut seed = [0u8; 32];
        env.random_bytes(&mut seed);
        let secret = StaticSecret::from(seed);
        let public = PublicKey::from(&secret);

        Self { private: secret.to_bytes().to_vec(), public: public.as_bytes().to_vec() }
    }

    /// Generate an Ed25519 signing key pair from the environment's RNG.
    ///
    /// `private` holds the 32-byte seed.
    pub fn generate_ed25519<E: Environment>(env: &E) -> Self {
        let mut seed = [0u8; 32];
        env.random_bytes(&mut seed);
        let signing = SigningKey::from_bytes(&seed);

        Self { private: seed.to_vec(), public: signing.verifying_key().to_bytes().to_vec() }
    }

    /// Public key with the curve type prefix, as signed and sent on the wire.
    pub fn prefixed_public(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.public.len());
        out.push(KEY_TYPE_DJB);
        out.extend_from_slice(&self.public);
        out
    }

    fn signing_key(&self) -> Option<SigningKey> {
        let seed: [u8; 32] = self.private.as_slice().try_into().ok()?;
        Some(SigningKey::from_bytes(&seed))
    }

    fn verifying_key(&self) -> Option<VerifyingKey> {
        let public: [u8; 32] = self.public.as_slice().try_into().ok()?;
        VerifyingKey::from_bytes(&public).ok()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &STANDARD.encode(&self.public))
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Key pair signed by the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedKeyPair {
    /// The signed key pair
    pub key_pair: KeyPair,
    /// Ed25519 signature over [`KeyPair::prefixed_public`]
    #[serde(with = "buffer")]
    pub signature: Vec<u8>,
    /// Key id
    pub key_id: u32,
}

impl SignedKeyPair {
    /// Generate an X25519 key pair and sign it with `identity`.
    ///
    /// Returns `None` if `identity` does not hold a 32-byte Ed25519 seed.
    pub fn generate<E: Environment>(env: &E, identity: &KeyPair, key_id: u32) -> Option<Self> {
        let signing = identity.signing_key()?;
        let key_pair = KeyPair::generate_x25519(env);
        let signature = signing.sign(&key_pair.prefixed_public()).to_bytes().to_vec();

        Some(Self { key_pair, signature, key_id })
    }

    /// Check the signature against `identity`'s public key.
    pub fn verify(&self, identity: &KeyPair) -> bool {
        let Some(verifying) = identity.verifying_key() else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&self.signature) else {
            return false;
        };
        verifying.verify(&self.key_pair.prefixed_public(), &signature).is_ok()
    }
}

/// The account this installation is paired with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Account identifier
    pub id: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Installation credentials.
///
/// Created once by [`Credentials::initialize`] and afterwards only mutated by
/// session logic. Persisted as the `{installation}_creds` blob.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Noise handshake static key
    pub noise_key: KeyPair,
    /// Ephemeral key used while pairing
    pub pairing_ephemeral_key_pair: KeyPair,
    /// Long-term identity signing key
    pub signed_identity_key: KeyPair,
    /// Current signed pre-key
    pub signed_pre_key: SignedKeyPair,
    /// 14-bit registration id
    pub registration_id: u16,
    /// Base64 secret for verifying device pairing
    pub adv_secret_key: String,
    /// Next pre-key id to allocate
    pub next_pre_key_id: u32,
    /// First pre-key id not yet uploaded
    pub first_unuploaded_pre_key_id: u32,
    /// App-state sync counter
    pub account_sync_counter: u32,
    /// Whether registration completed
    pub registered: bool,
    /// Paired account, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub me: Option<Contact>,
    /// Platform reported by the paired account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl Credentials {
    /// Create fresh credentials.
    ///
    /// Deterministic given the environment's RNG: the same seed yields the
    /// same credentials.
    pub fn initialize<E: Environment>(env: &E) -> Self {
        let noise_key = KeyPair::generate_x25519(env);
        let pairing_ephemeral_key_pair = KeyPair::generate_x25519(env);
        let signed_identity_key = KeyPair::generate_ed25519(env);

        // A freshly generated Ed25519 key pair always yields a signing key.
        #[allow(clippy::expect_used)]
        let signed_pre_key =
            SignedKeyPair::generate(env, &signed_identity_key, INITIAL_SIGNED_PRE_KEY_ID)
                .expect("generated identity key holds a 32-byte seed");

        let registration_id = (env.random_u64() as u16) & REGISTRATION_ID_MASK;
        let adv_secret_key = STANDARD.encode(env.random_vec(32));

        Self {
            noise_key,
            pairing_ephemeral_key_pair,
            signed_identity_key,
            signed_pre_key,
            registration_id,
            adv_secret_key,
            next_pre_key_id: 1,
            first_unuploaded_pre_key_id: 1,
            account_sync_counter: 0,
            registered: false,
            me: None,
            platform: None,
        }
    }

    /// Whether the signed pre-key carries a valid identity signature.
    pub fn verify_signed_pre_key(&self) -> bool {
        self.signed_pre_key.verify(&self.signed_identity_key)
    }

    /// Reserve `count` consecutive pre-key ids.
    pub fn allocate_pre_key_ids(&mut self, count: u32) -> Range<u32> {
        let start = self.next_pre_key_id;
        self.next_pre_key_id = start.saturating_add(count);
        start..self.next_pre_key_id
    }

    /// Record that every pre-key below `up_to` has been uploaded.
    pub fn mark_pre_keys_uploaded(&mut self, up_to: u32) {
        self.first_unuploaded_pre_key_id = self.first_unuploaded_pre_key_id.max(up_to);
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("noise_key", &self.noise_key)
            .field("signed_identity_key", &self.signed_identity_key)
            .field("signed_pre_key", &self.signed_pre_key.key_id)
            .field("registration_id", &self.registration_id)
            .field("next_pre_key_id", &self.next_pre_key_id)
            .field("first_unuploaded_pre_key_id", &self.first_unuploaded_pre_key_id)
            .field("registered", &self.registered)
            .field("me", &self.me)
            .finish_non_exhaustive()
    }
}
