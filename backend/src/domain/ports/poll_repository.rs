//! Port abstraction for reading polls and their options.
//!
//! Poll creation and scheduling live outside the badge engine; this port only
//! reads voting windows and option membership.

use async_trait::async_trait;

use crate::domain::{OptionId, Poll, PollId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by poll repository adapters.
    pub enum PollRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "poll repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "poll repository query failed: {message}",
    }
}

/// Port for poll lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PollRepository: Send + Sync {
    /// Fetch a poll with all of its option ids.
    async fn find_poll(&self, id: &PollId) -> Result<Option<Poll>, PollRepositoryError>;

    /// Fetch the poll that owns an option.
    async fn find_poll_for_option(
        &self,
        option_id: &OptionId,
    ) -> Result<Option<Poll>, PollRepositoryError>;
}

/// Fixture implementation that knows no polls.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePollRepository;

#[async_trait]
impl PollRepository for FixturePollRepository {
    async fn find_poll(&self, _id: &PollId) -> Result<Option<Poll>, PollRepositoryError> {
        Ok(None)
    }

    async fn find_poll_for_option(
        &self,
        _option_id: &OptionId,
    ) -> Result<Option<Poll>, PollRepositoryError> {
        Ok(None)
    }
}
