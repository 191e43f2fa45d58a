//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and behind the `test-support` feature.

pub mod clock;
pub mod in_memory;

pub use clock::MutableClock;
pub use in_memory::InMemoryBallotStore;
