//! Badge rules evaluated as soon as a vote is persisted.
//!
//! Each [`VoteRule`] reads what it needs, decides whether the voter
//! qualifies, and grants through the [`BadgeRegistry`]. Rules run
//! concurrently and independently: one failing rule is logged and the rest
//! still award.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Timelike, Utc};
use futures_util::future::join_all;
use mockable::Clock;
use tracing::warn;

use crate::domain::ports::{
    AwardedBadges, BadgeCatalogueRepository, BadgeGrantRepository, VoteRepository,
    VoteRepositoryError,
};
use crate::domain::{
    BadgeId, BadgeKind, BadgeRegistry, Error, StreakCalculator, UserId, VoteContext,
};

/// Lifetime vote count that earns Ballot Beast.
pub const BALLOT_BEAST_THRESHOLD: u64 = 100;

/// Local hour during which a vote earns Midnight Maverick.
pub const MIDNIGHT_HOUR: u32 = 0;

pub(crate) fn map_vote_repository_error(error: VoteRepositoryError) -> Error {
    match error {
        VoteRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("vote repository unavailable: {message}"))
        }
        VoteRepositoryError::Query { message } => {
            Error::internal(format!("vote repository error: {message}"))
        }
        VoteRepositoryError::Conflict { message } => Error::conflict(message),
    }
}

/// Tunables shared by the rule engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSettings {
    /// Streak computation, including the app-day rollover.
    pub streaks: StreakCalculator,
    /// Offset used to read a vote's local wall-clock hour.
    pub local_offset: FixedOffset,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            streaks: StreakCalculator::default(),
            local_offset: Utc.fix(),
        }
    }
}

/// Streak milestones, longest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTier {
    Month,
    FullWeek,
    Starter,
}

impl StreakTier {
    /// Tiers in evaluation order.
    pub const DESCENDING: [StreakTier; 3] =
        [StreakTier::Month, StreakTier::FullWeek, StreakTier::Starter];

    /// Days of consecutive voting the tier requires.
    pub const fn min_days(self) -> u32 {
        match self {
            Self::Month => 30,
            Self::FullWeek => 7,
            Self::Starter => 3,
        }
    }

    /// Badge awarded for reaching the tier.
    pub const fn badge(self) -> BadgeKind {
        match self {
            Self::Month => BadgeKind::MonthOfMayhem,
            Self::FullWeek => BadgeKind::FullWeekWarrior,
            Self::Starter => BadgeKind::StreakStarter,
        }
    }

    /// Highest tier reached by `streak`.
    ///
    /// Lower tiers are not back-filled: a 30-day streak yields only
    /// [`StreakTier::Month`].
    pub fn highest_for(streak: u32) -> Option<Self> {
        Self::DESCENDING
            .into_iter()
            .find(|tier| streak >= tier.min_days())
    }
}

/// Rules evaluated on every vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRule {
    FirstVote,
    MidnightMaverick,
    StreakTiers,
    BallotBeast,
}

impl VoteRule {
    /// Every vote-time rule.
    pub const ALL: [VoteRule; 4] = [
        VoteRule::FirstVote,
        VoteRule::MidnightMaverick,
        VoteRule::StreakTiers,
        VoteRule::BallotBeast,
    ];

    /// Stable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::FirstVote => "first_vote",
            Self::MidnightMaverick => "midnight_maverick",
            Self::StreakTiers => "streak_tiers",
            Self::BallotBeast => "ballot_beast",
        }
    }
}

/// Whether the vote was cast during the local midnight hour.
pub fn is_midnight_vote(ctx: &VoteContext, offset: FixedOffset) -> bool {
    ctx.cast_at.with_timezone(&offset).hour() == MIDNIGHT_HOUR
}

/// Runs [`VoteRule::ALL`] for a single vote.
pub struct VoteRuleEngine<V, C, G> {
    votes: Arc<V>,
    registry: BadgeRegistry<C, G>,
    settings: RuleSettings,
    clock: Arc<dyn Clock>,
}

impl<V, C, G> VoteRuleEngine<V, C, G> {
    /// Create an engine reading history from `votes`.
    pub fn new(
        votes: Arc<V>,
        registry: BadgeRegistry<C, G>,
        settings: RuleSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            votes,
            registry,
            settings,
            clock,
        }
    }
}

impl<V, C, G> VoteRuleEngine<V, C, G>
where
    V: VoteRepository,
    C: BadgeCatalogueRepository,
    G: BadgeGrantRepository,
{
    /// Evaluate every rule and return the badges newly granted.
    pub async fn evaluate(&self, ctx: &VoteContext) -> AwardedBadges {
        let outcomes = join_all(VoteRule::ALL.map(|rule| self.apply(rule, ctx))).await;

        let mut awarded = BTreeSet::new();
        for (rule, outcome) in VoteRule::ALL.into_iter().zip(outcomes) {
            match outcome {
                Ok(Some(badge_id)) => {
                    awarded.insert(badge_id);
                }
                Ok(None) => {}
                Err(error) => warn!(
                    rule = rule.name(),
                    vote_id = %ctx.vote_id,
                    user_id = %ctx.user_id,
                    error = %error,
                    "vote rule failed; continuing with remaining rules"
                ),
            }
        }
        awarded.into_iter().collect()
    }

    async fn apply(&self, rule: VoteRule, ctx: &VoteContext) -> Result<Option<BadgeId>, Error> {
        let Some(kind) = self.qualifying_badge(rule, ctx).await? else {
            return Ok(None);
        };
        let outcome = self.registry.grant_by_name(&ctx.user_id, kind).await?;
        Ok(outcome.newly_granted())
    }

    async fn qualifying_badge(
        &self,
        rule: VoteRule,
        ctx: &VoteContext,
    ) -> Result<Option<BadgeKind>, Error> {
        match rule {
            VoteRule::FirstVote => {
                let count = self.vote_count(&ctx.user_id).await?;
                Ok((count == 1).then_some(BadgeKind::FirstVote))
            }
            VoteRule::MidnightMaverick => Ok(is_midnight_vote(ctx, self.settings.local_offset)
                .then_some(BadgeKind::MidnightMaverick)),
            VoteRule::StreakTiers => {
                let streak = self.current_streak(&ctx.user_id).await?;
                Ok(StreakTier::highest_for(streak).map(StreakTier::badge))
            }
            VoteRule::BallotBeast => {
                let count = self.vote_count(&ctx.user_id).await?;
                Ok((count >= BALLOT_BEAST_THRESHOLD).then_some(BadgeKind::BallotBeast))
            }
        }
    }

    async fn vote_count(&self, user_id: &UserId) -> Result<u64, Error> {
        self.votes
            .count_votes_for_user(user_id)
            .await
            .map_err(map_vote_repository_error)
    }

    async fn current_streak(&self, user_id: &UserId) -> Result<u32, Error> {
        let times = self
            .votes
            .list_vote_timestamps_for_user(user_id, self.settings.streaks.lookback())
            .await
            .map_err(map_vote_repository_error)?;
        Ok(self.settings.streaks.current_streak(times, self.clock.utc()))
    }
}

#[cfg(test)]
#[path = "vote_rules_tests.rs"]
mod tests;
