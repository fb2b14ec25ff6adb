//! Sealink Core
//!
//! Runtime plumbing shared by the session layer: an [`Environment`]
//! abstraction over time and randomness, the [`TagGenerator`] that produces
//! request correlation tags and client identifiers, and timeout wrappers for
//! round trips that await a correlated response.
//!
//! # Determinism
//!
//! Nothing in this crate reads the clock or the RNG directly. Production code
//! uses [`SystemEnv`]; tests use [`SimEnv`], whose seeded RNG and virtual
//! clock make every tag and identifier reproducible.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod tag;
pub mod timeout;

pub use env::{Environment, SimEnv, SimInstant, SystemEnv};
pub use error::TimeoutError;
pub use tag::TagGenerator;
pub use timeout::{spawn_with_timeout, with_timeout};
