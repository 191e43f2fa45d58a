//! Port abstraction for the denormalised per-user vote counters.

use async_trait::async_trait;

use crate::domain::UserVoteStats;

use super::define_port_error;

define_port_error! {
    /// Errors raised by user stats adapters.
    pub enum UserStatsRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user stats connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user stats query failed: {message}",
        /// The user record does not exist.
        MissingUser { message: String } => "user stats target missing: {message}",
    }
}

/// Port for writing cached vote counters onto the user record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStatsRepository: Send + Sync {
    /// Overwrite the cached vote count, streak and last voted day.
    async fn record_vote_stats(&self, stats: &UserVoteStats) -> Result<(), UserStatsRepositoryError>;
}

/// Fixture implementation that discards writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserStatsRepository;

#[async_trait]
impl UserStatsRepository for FixtureUserStatsRepository {
    async fn record_vote_stats(&self, _stats: &UserVoteStats) -> Result<(), UserStatsRepositoryError> {
        Ok(())
    }
}
