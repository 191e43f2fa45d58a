//! Badge evaluation domain service.
//!
//! Implements the [`BadgeEvaluation`] driving port by composing the vote-time
//! and poll-close rule engines. After vote-time rules run, the voter's cached
//! counters are refreshed so profile reads need not rescan vote history.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::poll_close_rules::PollCloseRuleEngine;
use crate::domain::ports::{
    AwardedBadges, BadgeCatalogueRepository, BadgeEvaluation, BadgeGrantRepository,
    PollRepository, UserStatsRepository, UserStatsRepositoryError, VoteRepository,
};
use crate::domain::vote_rules::{RuleSettings, VoteRuleEngine, map_vote_repository_error};
use crate::domain::{BadgeRegistry, Error, PollId, UserId, UserVoteStats, VoteId};

fn map_user_stats_error(error: UserStatsRepositoryError) -> Error {
    match error {
        UserStatsRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user stats store unavailable: {message}"))
        }
        UserStatsRepositoryError::Query { message } => {
            Error::internal(format!("user stats store error: {message}"))
        }
        UserStatsRepositoryError::MissingUser { message } => {
            Error::not_found(format!("user stats target missing: {message}"))
        }
    }
}

/// Storage adapters the badge engine reads and writes.
pub struct BadgeEngineRepositories<V, P, C, G, S> {
    pub votes: Arc<V>,
    pub polls: Arc<P>,
    pub catalogue: Arc<C>,
    pub grants: Arc<G>,
    pub user_stats: Arc<S>,
}

/// Badge engine entry points for vote and poll-close triggers.
pub struct BadgeEvaluationService<V, P, C, G, S> {
    votes: Arc<V>,
    user_stats: Arc<S>,
    vote_rules: VoteRuleEngine<V, C, G>,
    poll_close_rules: PollCloseRuleEngine<V, P, C, G>,
    settings: RuleSettings,
    clock: Arc<dyn Clock>,
}

impl<V, P, C, G, S> BadgeEvaluationService<V, P, C, G, S> {
    /// Wire the rule engines over a shared set of repositories.
    pub fn new(
        repositories: BadgeEngineRepositories<V, P, C, G, S>,
        settings: RuleSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let BadgeEngineRepositories {
            votes,
            polls,
            catalogue,
            grants,
            user_stats,
        } = repositories;
        let registry = BadgeRegistry::new(catalogue, grants, Arc::clone(&clock));

        Self {
            vote_rules: VoteRuleEngine::new(
                Arc::clone(&votes),
                registry.clone(),
                settings,
                Arc::clone(&clock),
            ),
            poll_close_rules: PollCloseRuleEngine::new(
                Arc::clone(&votes),
                polls,
                registry,
                Arc::clone(&clock),
            ),
            votes,
            user_stats,
            settings,
            clock,
        }
    }
}

impl<V, P, C, G, S> BadgeEvaluationService<V, P, C, G, S>
where
    V: VoteRepository,
    S: UserStatsRepository,
{
    /// Recompute and store the voter's cached vote count and streak.
    pub async fn refresh_vote_stats(&self, user_id: &UserId) -> Result<UserVoteStats, Error> {
        let vote_count = self
            .votes
            .count_votes_for_user(user_id)
            .await
            .map_err(map_vote_repository_error)?;
        let recent = self
            .votes
            .list_vote_timestamps_for_user(user_id, self.settings.streaks.lookback())
            .await
            .map_err(map_vote_repository_error)?;

        let app_days = self.settings.streaks.app_day_clock();
        let last_voted_day = recent
            .iter()
            .max()
            .map(|latest| app_days.app_day_start(*latest));
        let stats = UserVoteStats {
            user_id: user_id.clone(),
            vote_count,
            current_streak: self.settings.streaks.current_streak(recent, self.clock.utc()),
            last_voted_day,
        };

        self.user_stats
            .record_vote_stats(&stats)
            .await
            .map_err(map_user_stats_error)?;
        Ok(stats)
    }
}

#[async_trait]
impl<V, P, C, G, S> BadgeEvaluation for BadgeEvaluationService<V, P, C, G, S>
where
    V: VoteRepository,
    P: PollRepository,
    C: BadgeCatalogueRepository,
    G: BadgeGrantRepository,
    S: UserStatsRepository,
{
    async fn on_vote_cast(&self, vote_id: VoteId) -> Result<AwardedBadges, Error> {
        let Some(vote) = self
            .votes
            .find_vote(&vote_id)
            .await
            .map_err(map_vote_repository_error)?
        else {
            debug!(vote_id = %vote_id, "vote not found; no vote-time badges to award");
            return Ok(Vec::new());
        };

        let ctx = vote.context();
        let awarded = self.vote_rules.evaluate(&ctx).await;

        if let Err(error) = self.refresh_vote_stats(&ctx.user_id).await {
            warn!(
                user_id = %ctx.user_id,
                error = %error,
                "failed to refresh cached vote stats"
            );
        }

        info!(
            vote_id = %vote_id,
            user_id = %ctx.user_id,
            awarded = awarded.len(),
            "vote-time badges evaluated"
        );
        Ok(awarded)
    }

    async fn on_poll_close(&self, poll_id: PollId) -> Result<AwardedBadges, Error> {
        let awarded = self.poll_close_rules.evaluate(poll_id).await?;
        info!(
            poll_id = %poll_id,
            awarded = awarded.len(),
            "poll-close badges evaluated"
        );
        Ok(awarded)
    }
}

#[cfg(test)]
#[path = "badge_evaluation_service_tests.rs"]
mod tests;
