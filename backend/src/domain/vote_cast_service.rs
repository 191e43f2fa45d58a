//! Vote submission domain service.
//!
//! Validates the vote against the poll window, persists it, then triggers
//! vote-time badge evaluation. Badge problems never fail a recorded vote.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::warn;

use crate::domain::poll_close_rules::map_poll_repository_error;
use crate::domain::ports::{
    BadgeCatalogueRepository, BadgeEvaluation, CastVoteCommand, CastVoteRequest,
    CastVoteResponse, PollRepository, VoteRepository,
};
use crate::domain::vote_rules::map_vote_repository_error;
use crate::domain::{Badge, BadgeId, Error, NewVote};

/// Vote service implementing [`CastVoteCommand`].
pub struct VoteCastService<V, P, C, E> {
    votes: Arc<V>,
    polls: Arc<P>,
    catalogue: Arc<C>,
    evaluation: Arc<E>,
    clock: Arc<dyn Clock>,
}

impl<V, P, C, E> VoteCastService<V, P, C, E> {
    /// Create a vote service that reports badges through `evaluation`.
    pub fn new(
        votes: Arc<V>,
        polls: Arc<P>,
        catalogue: Arc<C>,
        evaluation: Arc<E>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            votes,
            polls,
            catalogue,
            evaluation,
            clock,
        }
    }
}

impl<V, P, C, E> VoteCastService<V, P, C, E>
where
    C: BadgeCatalogueRepository,
{
    async fn expand_badges(&self, ids: &[BadgeId]) -> Vec<Badge> {
        if ids.is_empty() {
            return Vec::new();
        }
        match self.catalogue.find_by_ids(ids).await {
            Ok(badges) => badges,
            Err(error) => {
                warn!(error = %error, "failed to load newly earned badges");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<V, P, C, E> CastVoteCommand for VoteCastService<V, P, C, E>
where
    V: VoteRepository,
    P: PollRepository,
    C: BadgeCatalogueRepository,
    E: BadgeEvaluation,
{
    async fn cast_vote(&self, request: CastVoteRequest) -> Result<CastVoteResponse, Error> {
        let poll = self
            .polls
            .find_poll_for_option(&request.option_id)
            .await
            .map_err(map_poll_repository_error)?
            .filter(|poll| poll.has_option(request.option_id))
            .ok_or_else(|| {
                Error::invalid_request(format!("unknown option {}", request.option_id))
            })?;

        let now = self.clock.utc();
        if !poll.is_open_at(now) {
            return Err(Error::forbidden("poll is closed"));
        }

        let already_voted = self
            .votes
            .has_voted_in_poll(&request.user_id, &poll.id)
            .await
            .map_err(map_vote_repository_error)?;
        if already_voted {
            return Err(Error::conflict("you already voted in this poll"));
        }

        let vote = self
            .votes
            .create_vote(&NewVote {
                user_id: request.user_id,
                option_id: request.option_id,
                cast_at: now,
            })
            .await
            .map_err(map_vote_repository_error)?;

        let badge_ids = match self.evaluation.on_vote_cast(vote.id).await {
            Ok(ids) => ids,
            Err(error) => {
                warn!(
                    vote_id = %vote.id,
                    user_id = %vote.user_id,
                    error = %error,
                    "badge evaluation failed; vote recorded without badges"
                );
                Vec::new()
            }
        };

        Ok(CastVoteResponse {
            vote_id: vote.id,
            poll_id: vote.poll_id,
            new_badges: self.expand_badges(&badge_ids).await,
        })
    }
}

#[cfg(test)]
#[path = "vote_cast_service_tests.rs"]
mod tests;
