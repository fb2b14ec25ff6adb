//! Chaotic backend wrapper for fault injection testing
//!
//! Wraps any [`DurableStore`] and randomly fails operations so tests can
//! check that the credential store degrades to "absent" on failed reads and
//! reports failed writes.

use std::{
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use super::DurableStore;
use crate::StoreError;

/// Chaotic backend wrapper that randomly injects failures
///
/// Delegates to an inner backend but fails each operation with probability
/// `failure_rate`. The RNG is seeded, so a given seed and call sequence
/// reproduces the same failures.
#[derive(Clone)]
pub struct ChaoticStore<S: DurableStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    rng: Arc<Mutex<ChaoticRng>>,
    operation_count: Arc<AtomicUsize>,
}

/// Linear congruential generator for reproducible chaos.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // Numerical Recipes constants
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: DurableStore> ChaoticStore<S> {
    /// Default seed used by [`ChaoticStore::new`].
    pub const DEFAULT_SEED: u64 = 0x1234_5678_9ABC_DEF0;

    /// Wrap `inner`, failing operations with probability `failure_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, Self::DEFAULT_SEED)
    }

    /// Create with explicit seed for reproducible chaos
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Underlying backend (for checking state after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of operations attempted, failed ones included.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    /// Count the operation and decide whether it fails.
    fn inject(&self) -> Result<(), StoreError> {
        self.operation_count.fetch_add(1, Ordering::Relaxed);

        #[allow(clippy::expect_used)]
        let roll = self.rng.lock().expect("ChaoticRng mutex poisoned").next();
        if roll < self.failure_rate {
            return Err(StoreError::Io("chaotic failure injection".to_string()));
        }
        Ok(())
    }
}

impl<S: DurableStore> DurableStore for ChaoticStore<S> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send {
        let injected = self.inject();
        async move {
            injected?;
            self.inner.get(key).await
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> impl Future<Output = Result<(), StoreError>> + Send {
        let injected = self.inject();
        async move {
            injected?;
            self.inner.set(key, value).await
        }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send {
        let injected = self.inject();
        async move {
            injected?;
            self.inner.remove(key).await
        }
    }
}
