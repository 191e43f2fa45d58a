//! Driving port for vote submission.
//!
//! Casting a vote persists it and synchronously evaluates vote-time badges so
//! the response can celebrate anything newly earned.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Badge, Error, OptionId, PollId, UserId, VoteId};

/// Request to cast a vote for an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub user_id: UserId,
    pub option_id: OptionId,
}

/// Response after a vote is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteResponse {
    pub vote_id: VoteId,
    pub poll_id: PollId,
    /// Badges earned by this vote, expanded for display.
    pub new_badges: Vec<Badge>,
}

/// Vote submission interface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CastVoteCommand: Send + Sync {
    /// Record a vote and return any newly earned badges.
    ///
    /// A failure while evaluating badges never fails the vote; the response
    /// simply carries no new badges.
    async fn cast_vote(&self, request: CastVoteRequest) -> Result<CastVoteResponse, Error>;
}
