//! Bounding the wall-clock duration of async operations.
//!
//! Two flavours with different cancellation semantics:
//!
//! - [`with_timeout`] owns the operation. When the deadline wins, the
//!   operation future is dropped and stops at its next suspension point.
//! - [`spawn_with_timeout`] runs the operation as a detached task. When the
//!   deadline wins, the caller gets [`TimeoutError::Elapsed`] but the task
//!   keeps running to completion and its result is discarded. Use this when
//!   the operation's side effects must not be torn mid-way (e.g. a backend
//!   write that should land even if nobody waits for it).
//!
//! A zero duration disables the deadline in both cases.

use std::{future::Future, time::Duration};

use tracing::debug;

use crate::{env::Environment, error::TimeoutError};

/// Await `operation`, failing with [`TimeoutError::Elapsed`] if it does not
/// finish within `duration`.
///
/// The operation is polled before the deadline, so an operation that is
/// already complete always wins a tie.
pub async fn with_timeout<E, F>(
    env: &E,
    duration: Duration,
    operation: F,
) -> Result<F::Output, TimeoutError>
where
    E: Environment,
    F: Future,
{
    if duration.is_zero() {
        return Ok(operation.await);
    }

    let started = env.now();
    tokio::select! {
        biased;
        output = operation => Ok(output),
        () = env.sleep(duration) => {
            debug!(?duration, waited = ?(env.now() - started), "operation timed out, cancelling");
            Err(TimeoutError::Elapsed { after: duration })
        }
    }
}

/// Spawn `operation` on the tokio runtime and wait up to `duration` for it.
///
/// On timeout the spawned task is left running; callers must not assume the
/// operation did not happen.
///
/// # Errors
///
/// - `Elapsed` if the deadline passed first
/// - `TaskFailed` if the task panicked or was aborted
pub async fn spawn_with_timeout<E, F>(
    env: &E,
    duration: Duration,
    operation: F,
) -> Result<F::Output, TimeoutError>
where
    E: Environment,
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let mut handle = tokio::spawn(operation);

    if duration.is_zero() {
        return handle.await.map_err(|e| TimeoutError::TaskFailed { reason: e.to_string() });
    }

    let started = env.now();
    tokio::select! {
        biased;
        joined = &mut handle => {
            joined.map_err(|e| TimeoutError::TaskFailed { reason: e.to_string() })
        }
        () = env.sleep(duration) => {
            debug!(?duration, waited = ?(env.now() - started), "operation timed out, leaving task running");
            Err(TimeoutError::Elapsed { after: duration })
        }
    }
}
