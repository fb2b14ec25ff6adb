//! Error types for the core runtime helpers.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the timeout wrappers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError {
    /// The deadline passed before the operation produced a result.
    ///
    /// For [`crate::spawn_with_timeout`] the operation may still complete
    /// afterwards; its side effects must not be assumed absent.
    #[error("timed out after {after:?}")]
    Elapsed {
        /// Deadline that was exceeded
        after: Duration,
    },

    /// The spawned operation panicked or was aborted before finishing.
    #[error("task failed: {reason}")]
    TaskFailed {
        /// Description from the runtime
        reason: String,
    },
}

impl TimeoutError {
    /// Returns true if the deadline passed, as opposed to the task failing.
    pub fn is_elapsed(&self) -> bool {
        matches!(self, Self::Elapsed { .. })
    }
}
