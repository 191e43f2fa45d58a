//! Badge rules evaluated once a poll has stopped accepting votes.
//!
//! Award selection is a pure function of the poll's options and its final
//! vote set ([`plan_poll_close_awards`]); [`PollCloseRuleEngine`] loads those
//! inputs and grants the planned awards.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use futures_util::future::join_all;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{
    AwardedBadges, BadgeCatalogueRepository, BadgeGrantRepository, PollRepository,
    PollRepositoryError, VoteRepository,
};
use crate::domain::vote_rules::map_vote_repository_error;
use crate::domain::{BadgeKind, BadgeRegistry, Error, OptionId, Poll, PollId, PollVote, UserId};

pub(crate) fn map_poll_repository_error(error: PollRepositoryError) -> Error {
    match error {
        PollRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("poll repository unavailable: {message}"))
        }
        PollRepositoryError::Query { message } => {
            Error::internal(format!("poll repository error: {message}"))
        }
    }
}

/// A badge a poll's outcome earns one voter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PollCloseAward {
    pub user_id: UserId,
    pub badge: BadgeKind,
}

impl PollCloseAward {
    fn new(user_id: &UserId, badge: BadgeKind) -> Self {
        Self {
            user_id: user_id.clone(),
            badge,
        }
    }
}

/// Decide which voters earn which badges for a closed poll.
///
/// - the earliest vote earns First to Vote and the latest earns Last to Vote
///   (a single vote earns both);
/// - when two or more options share the highest count, every voter earns
///   Clutch Voter; options with no votes take part, so a poll where every
///   option is empty is a tie;
/// - the sole voter for any option with exactly one vote earns Chaos Agent.
///
/// A poll without options yields no awards. The result holds no duplicates.
pub fn plan_poll_close_awards(option_ids: &[OptionId], votes: &[PollVote]) -> Vec<PollCloseAward> {
    if option_ids.is_empty() {
        return Vec::new();
    }

    let mut ordered: Vec<&PollVote> = votes.iter().collect();
    ordered.sort_by_key(|vote| vote.cast_at);

    let mut awards = Vec::new();
    if let (Some(first), Some(last)) = (ordered.first(), ordered.last()) {
        awards.push(PollCloseAward::new(&first.user_id, BadgeKind::FirstToVote));
        awards.push(PollCloseAward::new(&last.user_id, BadgeKind::LastToVote));
    }

    let tally = tally_options(option_ids, &ordered);

    let top = tally.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let leaders = tally.iter().filter(|(_, count)| *count == top).count();
    if leaders > 1 {
        let mut seen = HashSet::new();
        for vote in &ordered {
            if seen.insert(&vote.user_id) {
                awards.push(PollCloseAward::new(&vote.user_id, BadgeKind::ClutchVoter));
            }
        }
    }

    for (option_id, count) in &tally {
        if *count != 1 {
            continue;
        }
        if let Some(vote) = ordered.iter().find(|vote| vote.option_id == *option_id) {
            awards.push(PollCloseAward::new(&vote.user_id, BadgeKind::ChaosAgent));
        }
    }

    let mut unique = HashSet::new();
    awards.retain(|award| unique.insert(award.clone()));
    awards
}

/// Vote counts per option in declaration order, including options with no
/// votes. Votes naming an option the poll does not list are counted after.
fn tally_options(option_ids: &[OptionId], votes: &[&PollVote]) -> Vec<(OptionId, u64)> {
    let mut counts: HashMap<OptionId, u64> = HashMap::new();
    for vote in votes {
        *counts.entry(vote.option_id).or_default() += 1;
    }

    let mut tally: Vec<(OptionId, u64)> = option_ids
        .iter()
        .map(|id| (*id, counts.remove(id).unwrap_or(0)))
        .collect();
    let mut strays: Vec<(OptionId, u64)> = counts.into_iter().collect();
    strays.sort_by_key(|(id, _)| *id);
    tally.extend(strays);
    tally
}

/// Loads a closed poll and grants its outcome badges.
pub struct PollCloseRuleEngine<V, P, C, G> {
    votes: Arc<V>,
    polls: Arc<P>,
    registry: BadgeRegistry<C, G>,
    clock: Arc<dyn Clock>,
}

impl<V, P, C, G> PollCloseRuleEngine<V, P, C, G> {
    /// Create an engine over the vote and poll stores.
    pub fn new(
        votes: Arc<V>,
        polls: Arc<P>,
        registry: BadgeRegistry<C, G>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            votes,
            polls,
            registry,
            clock,
        }
    }
}

impl<V, P, C, G> PollCloseRuleEngine<V, P, C, G>
where
    V: VoteRepository,
    P: PollRepository,
    C: BadgeCatalogueRepository,
    G: BadgeGrantRepository,
{
    /// Evaluate the poll-close rules for `poll_id`.
    ///
    /// An unknown poll yields no awards. A poll whose window has not yet
    /// ended is rejected with a forbidden error, since its vote set may still
    /// change. Individual grant failures are logged and skipped.
    pub async fn evaluate(&self, poll_id: PollId) -> Result<AwardedBadges, Error> {
        let Some(poll) = self
            .polls
            .find_poll(&poll_id)
            .await
            .map_err(map_poll_repository_error)?
        else {
            debug!(poll_id = %poll_id, "poll not found; no poll-close badges to award");
            return Ok(Vec::new());
        };

        let now = self.clock.utc();
        if !poll.is_closed_at(now) {
            return Err(Error::forbidden(format!(
                "poll {poll_id} is still open until {}",
                poll.closes_at
            )));
        }

        let votes = self
            .votes
            .list_votes_for_poll(&poll.id)
            .await
            .map_err(map_vote_repository_error)?;

        Ok(self.grant_awards(&poll, plan_poll_close_awards(&poll.option_ids, &votes)).await)
    }

    async fn grant_awards(&self, poll: &Poll, awards: Vec<PollCloseAward>) -> AwardedBadges {
        let outcomes = join_all(
            awards
                .iter()
                .map(|award| self.registry.grant_by_name(&award.user_id, award.badge)),
        )
        .await;

        let mut awarded = BTreeSet::new();
        for (award, outcome) in awards.iter().zip(outcomes) {
            match outcome {
                Ok(outcome) => awarded.extend(outcome.newly_granted()),
                Err(error) => warn!(
                    poll_id = %poll.id,
                    user_id = %award.user_id,
                    badge = %award.badge,
                    error = %error,
                    "poll-close grant failed; continuing with remaining awards"
                ),
            }
        }
        awarded.into_iter().collect()
    }
}

#[cfg(test)]
#[path = "poll_close_rules_tests.rs"]
mod tests;
