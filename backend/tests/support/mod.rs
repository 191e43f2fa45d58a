//! Shared helpers for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! each test file pulls this module in with `mod support;`.

pub mod harness;
