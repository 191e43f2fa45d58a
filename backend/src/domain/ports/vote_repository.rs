//! Port abstraction for vote persistence and vote-history reads.
//!
//! Votes are append-only. The store enforces one vote per (user, poll) with a
//! uniqueness constraint and reports violations as
//! [`VoteRepositoryError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewVote, OptionId, PollId, PollVote, UserId, Vote, VoteId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by vote repository adapters.
    pub enum VoteRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "vote repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "vote repository query failed: {message}",
        /// The user already has a vote in this poll.
        Conflict { message: String } => "vote already recorded: {message}",
    }
}

/// Port for reading and appending votes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Persist a vote for the poll owning `vote.option_id`.
    async fn create_vote(&self, vote: &NewVote) -> Result<Vote, VoteRepositoryError>;

    /// Fetch a vote by id.
    async fn find_vote(&self, id: &VoteId) -> Result<Option<Vote>, VoteRepositoryError>;

    /// Most recent vote timestamps for a user, newest first, at most `limit`.
    async fn list_vote_timestamps_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<DateTime<Utc>>, VoteRepositoryError>;

    /// Lifetime vote count for a user.
    async fn count_votes_for_user(&self, user_id: &UserId) -> Result<u64, VoteRepositoryError>;

    /// Every vote in a poll, ordered by timestamp ascending.
    async fn list_votes_for_poll(
        &self,
        poll_id: &PollId,
    ) -> Result<Vec<PollVote>, VoteRepositoryError>;

    /// Number of votes an option received.
    async fn count_votes_for_option(
        &self,
        option_id: &OptionId,
    ) -> Result<u64, VoteRepositoryError>;

    /// Whether the user already voted in the poll.
    async fn has_voted_in_poll(
        &self,
        user_id: &UserId,
        poll_id: &PollId,
    ) -> Result<bool, VoteRepositoryError>;
}

/// Fixture implementation for tests that do not exercise vote storage.
///
/// Reads return empty results; writes are rejected because a fixture cannot
/// report which poll the option belongs to.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVoteRepository;

#[async_trait]
impl VoteRepository for FixtureVoteRepository {
    async fn create_vote(&self, _vote: &NewVote) -> Result<Vote, VoteRepositoryError> {
        Err(VoteRepositoryError::query("fixture repository does not store votes"))
    }

    async fn find_vote(&self, _id: &VoteId) -> Result<Option<Vote>, VoteRepositoryError> {
        Ok(None)
    }

    async fn list_vote_timestamps_for_user(
        &self,
        _user_id: &UserId,
        _limit: usize,
    ) -> Result<Vec<DateTime<Utc>>, VoteRepositoryError> {
        Ok(Vec::new())
    }

    async fn count_votes_for_user(&self, _user_id: &UserId) -> Result<u64, VoteRepositoryError> {
        Ok(0)
    }

    async fn list_votes_for_poll(
        &self,
        _poll_id: &PollId,
    ) -> Result<Vec<PollVote>, VoteRepositoryError> {
        Ok(Vec::new())
    }

    async fn count_votes_for_option(
        &self,
        _option_id: &OptionId,
    ) -> Result<u64, VoteRepositoryError> {
        Ok(0)
    }

    async fn has_voted_in_poll(
        &self,
        _user_id: &UserId,
        _poll_id: &PollId,
    ) -> Result<bool, VoteRepositoryError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_reads_are_empty() {
        let repo = FixtureVoteRepository;
        let user_id = UserId::random();

        assert!(repo.find_vote(&VoteId::random()).await.expect("find").is_none());
        assert_eq!(repo.count_votes_for_user(&user_id).await.expect("count"), 0);
        assert!(
            repo.list_vote_timestamps_for_user(&user_id, 80)
                .await
                .expect("timestamps")
                .is_empty()
        );
        assert!(
            !repo
                .has_voted_in_poll(&user_id, &PollId::random())
                .await
                .expect("has voted")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_rejects_writes() {
        let repo = FixtureVoteRepository;
        let result = repo
            .create_vote(&NewVote {
                user_id: UserId::random(),
                option_id: OptionId::random(),
                cast_at: Utc::now(),
            })
            .await;
        assert!(matches!(result, Err(VoteRepositoryError::Query { .. })));
    }

    #[rstest]
    fn conflict_error_mentions_existing_vote() {
        let err = VoteRepositoryError::conflict("user already voted in poll");
        assert_eq!(
            err.to_string(),
            "vote already recorded: user already voted in poll"
        );
    }
}
