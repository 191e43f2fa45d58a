//! Driving port for badge evaluation triggers.
//!
//! The vote-submission flow calls [`BadgeEvaluation::on_vote_cast`] after a
//! vote is persisted; the external poll-closing scheduler calls
//! [`BadgeEvaluation::on_poll_close`] once a poll stops accepting votes. Both
//! are safe to re-run: grants are idempotent, so at-least-once invocation
//! never produces a second grant.

use async_trait::async_trait;

use crate::domain::{BadgeId, Error, PollId, VoteId};

/// Badge ids newly granted by one evaluation, deduplicated and sorted.
pub type AwardedBadges = Vec<BadgeId>;

/// Trigger interface exposed by the badge engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeEvaluation: Send + Sync {
    /// Evaluate vote-time rules for a persisted vote.
    ///
    /// An unknown vote id yields an empty result.
    async fn on_vote_cast(&self, vote_id: VoteId) -> Result<AwardedBadges, Error>;

    /// Evaluate poll-close rules over the poll's final vote set.
    ///
    /// The caller guarantees the poll no longer accepts votes. An unknown
    /// poll id yields an empty result.
    async fn on_poll_close(&self, poll_id: PollId) -> Result<AwardedBadges, Error>;
}

/// Fixture implementation that never awards anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBadgeEvaluation;

#[async_trait]
impl BadgeEvaluation for FixtureBadgeEvaluation {
    async fn on_vote_cast(&self, _vote_id: VoteId) -> Result<AwardedBadges, Error> {
        Ok(Vec::new())
    }

    async fn on_poll_close(&self, _poll_id: PollId) -> Result<AwardedBadges, Error> {
        Ok(Vec::new())
    }
}
