//! Daily ballot badge engine.
//!
//! Awards badges to voters from the vote log: vote-time rules run after each
//! vote is persisted, poll-close rules run once a poll stops accepting votes.
//! The domain is storage agnostic; `outbound::persistence` provides the
//! PostgreSQL adapters and `test_support` provides in-memory ones.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{BadgeEngineSettings, SettingsError};
