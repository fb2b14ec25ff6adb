//! Environment abstraction for deterministic testing.
//!
//! Decouples tag generation, credential initialization and timeouts from
//! system resources (time, randomness). Production code runs on
//! [`SystemEnv`]; tests run on [`SimEnv`] with a seeded RNG and a virtual
//! clock.

use std::{
    future::Future,
    ops::Sub,
    sync::{Arc, Mutex},
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Abstract environment providing time, randomness, and async sleeping.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Milliseconds since the Unix epoch.
    ///
    /// Used for correlation tags, so only millisecond resolution is promised.
    fn wall_clock_millis(&self) -> u64;

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Returns `len` random bytes.
    fn random_vec(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        self.random_bytes(&mut bytes);
        bytes
    }
}

/// Production environment using system time and the OS CSPRNG.
///
/// # Panics
///
/// Panics if the OS RNG fails or the system clock reads earlier than the
/// Unix epoch. Neither is recoverable for a client that must mint keys and
/// tags.
#[derive(Clone, Debug, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        sealink_crypto::fill_random(buffer);
    }

    #[allow(clippy::expect_used)]
    fn wall_clock_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_millis() as u64
    }
}

/// Virtual instant measured from the creation of a [`SimEnv`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(Duration);

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Deterministic environment for tests.
///
/// Randomness comes from a ChaCha20 RNG seeded at construction, so two
/// `SimEnv`s built from the same seed produce the same byte stream. The clock
/// only moves through [`SimEnv::advance`] or [`Environment::sleep`].
///
/// Sleeping waits on Tokio's timer and then moves the virtual clock to the
/// sleep's deadline. Run tests on a paused runtime
/// (`#[tokio::test(start_paused = true)]`): Tokio only auto-advances paused
/// time once every task is idle, so work that is still making progress
/// always finishes before a competing sleep fires.
///
/// Clones share the same RNG and clock.
#[derive(Clone)]
pub struct SimEnv {
    inner: Arc<Mutex<SimState>>,
}

struct SimState {
    rng: ChaCha20Rng,
    elapsed: Duration,
    wall_clock_base_millis: u64,
}

impl SimEnv {
    /// Wall clock reading at creation unless overridden (2021-01-01T00:00:00Z).
    pub const DEFAULT_WALL_CLOCK_MILLIS: u64 = 1_609_459_200_000;

    /// Create an environment with the given RNG seed.
    pub fn new(seed: u64) -> Self {
        Self::with_wall_clock(seed, Self::DEFAULT_WALL_CLOCK_MILLIS)
    }

    /// Create an environment whose wall clock starts at `millis`.
    pub fn with_wall_clock(seed: u64, millis: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState {
                rng: ChaCha20Rng::seed_from_u64(seed),
                elapsed: Duration::ZERO,
                wall_clock_base_millis: millis,
            })),
        }
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, duration: Duration) {
        self.state().elapsed += duration;
    }

    /// Move the virtual clock forward to `deadline` unless it is already
    /// past it.
    fn advance_to(&self, deadline: Duration) {
        let mut state = self.state();
        state.elapsed = state.elapsed.max(deadline);
    }

    /// Total virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.state().elapsed
    }

    #[allow(clippy::expect_used)]
    fn state(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.inner.lock().expect("SimEnv mutex poisoned")
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("elapsed", &self.elapsed()).finish_non_exhaustive()
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> Self::Instant {
        SimInstant(self.elapsed())
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        let env = self.clone();
        let deadline = self.elapsed() + duration;
        async move {
            tokio::time::sleep(duration).await;
            env.advance_to(deadline);
        }
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.state().rng.fill_bytes(buffer);
    }

    fn wall_clock_millis(&self) -> u64 {
        let state = self.state();
        state.wall_clock_base_millis + state.elapsed.as_millis() as u64
    }
}
