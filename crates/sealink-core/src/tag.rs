//! Correlation tags and client identifiers.
//!
//! Every outbound request carries a tag; the server echoes it on the
//! response so the session layer can route the reply. Tags are wall-clock
//! milliseconds, so two requests in the same millisecond collide unless the
//! caller adds an epoch suffix. [`TagGenerator::next_message_tag`] does that
//! automatically with a per-generator counter.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::env::Environment;

/// Random bytes in a client id (24 base64 characters).
pub const CLIENT_ID_SIZE: usize = 16;

/// Random bytes in a client message id (20 hex characters).
pub const CLIENT_MESSAGE_ID_SIZE: usize = 10;

/// Generates request tags and client identifiers from an [`Environment`].
///
/// Safe to share between tasks; the epoch counter is atomic.
#[derive(Debug)]
pub struct TagGenerator<E: Environment> {
    env: E,
    epoch: AtomicU64,
}

impl<E: Environment> TagGenerator<E> {
    /// Create a generator whose epoch counter starts at 1.
    pub fn new(env: E) -> Self {
        Self { env, epoch: AtomicU64::new(1) }
    }

    /// Tag for an outbound request: decimal milliseconds since the Unix
    /// epoch, suffixed with `-{epoch}` when a non-zero epoch is supplied.
    /// An epoch of zero is treated as no epoch.
    ///
    /// Without an epoch, calls within the same millisecond return the same
    /// tag.
    pub fn message_tag(&self, epoch: Option<u64>) -> String {
        let millis = self.env.wall_clock_millis();
        match epoch {
            Some(epoch) if epoch != 0 => format!("{millis}-{epoch}"),
            _ => millis.to_string(),
        }
    }

    /// Tag suffixed with this generator's next epoch.
    ///
    /// Never repeats for the lifetime of the generator, even within one
    /// millisecond.
    pub fn next_message_tag(&self) -> String {
        let epoch = self.epoch.fetch_add(1, Ordering::Relaxed);
        self.message_tag(Some(epoch))
    }

    /// Epoch the next call to [`Self::next_message_tag`] will use.
    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::Relaxed)
    }

    /// Identifier for this client instance: 16 random bytes, standard
    /// base64 with padding.
    pub fn client_id(&self) -> String {
        STANDARD.encode(self.env.random_vec(CLIENT_ID_SIZE))
    }

    /// Identifier for an outbound application message: 10 random bytes,
    /// upper-case hex.
    pub fn client_message_id(&self) -> String {
        hex::encode_upper(self.env.random_vec(CLIENT_MESSAGE_ID_SIZE))
    }
}
