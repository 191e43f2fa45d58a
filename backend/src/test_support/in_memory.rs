//! In-memory implementations of every driven port.
//!
//! [`InMemoryBallotStore`] mirrors the PostgreSQL adapters' observable
//! behaviour: one vote per `(user, poll)`, one grant per `(user, badge)`,
//! catalogue seeding keyed by name, and the same orderings. Setup helpers
//! are synchronous so fixtures can build state without a runtime.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    BadgeCatalogueRepository, BadgeCatalogueRepositoryError, BadgeGrantRepository,
    BadgeGrantRepositoryError, GrantInsertion, PollRepository, PollRepositoryError,
    UserStatsRepository, UserStatsRepositoryError, VoteRepository, VoteRepositoryError,
};
use crate::domain::{
    BADGE_CATALOGUE, Badge, BadgeDefinition, BadgeGrant, BadgeId, BadgeKind, EarnedBadge, NewVote,
    OptionId, Poll, PollId, PollVote, UserId, UserVoteStats, Vote, VoteId,
};

#[derive(Debug, Default)]
struct State {
    polls: HashMap<PollId, Poll>,
    option_polls: HashMap<OptionId, PollId>,
    votes: Vec<Vote>,
    badges: Vec<Badge>,
    grants: Vec<BadgeGrant>,
    user_stats: HashMap<UserId, UserVoteStats>,
    fail_vote_counts: bool,
    fail_grants: bool,
}

impl State {
    fn insert_vote(&mut self, vote: &NewVote) -> Result<Vote, VoteRepositoryError> {
        let poll_id = *self
            .option_polls
            .get(&vote.option_id)
            .ok_or_else(|| VoteRepositoryError::query(format!("unknown option {}", vote.option_id)))?;
        let duplicate = self
            .votes
            .iter()
            .any(|existing| existing.user_id == vote.user_id && existing.poll_id == poll_id);
        if duplicate {
            return Err(VoteRepositoryError::conflict(format!(
                "user {} already voted in poll {poll_id}",
                vote.user_id
            )));
        }

        let stored = Vote {
            id: VoteId::random(),
            user_id: vote.user_id.clone(),
            option_id: vote.option_id,
            poll_id,
            cast_at: vote.cast_at,
        };
        self.votes.push(stored.clone());
        Ok(stored)
    }

    fn seed(&mut self, definitions: &[BadgeDefinition]) -> u64 {
        let mut inserted = 0;
        for definition in definitions {
            let name = definition.kind.as_str();
            if self.badges.iter().any(|badge| badge.name == name) {
                continue;
            }
            let next_id = i32::try_from(self.badges.len()).map_or(i32::MAX, |len| len + 1);
            self.badges.push(Badge {
                id: BadgeId::new(next_id),
                name: name.to_owned(),
                icon: definition.icon.to_owned(),
                description: definition.description.to_owned(),
                unlock_hint: definition.unlock_hint.to_owned(),
            });
            inserted += 1;
        }
        inserted
    }
}

/// Shared in-memory store implementing the vote, poll, catalogue, grant and
/// user stats ports.
#[derive(Debug, Default)]
pub struct InMemoryBallotStore {
    state: Mutex<State>,
}

impl InMemoryBallotStore {
    /// An empty store with no catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose catalogue holds every badge.
    pub fn with_catalogue() -> Self {
        let store = Self::new();
        store.lock().seed(&BADGE_CATALOGUE);
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a poll with `option_count` fresh options.
    pub fn add_poll(
        &self,
        opens_at: DateTime<Utc>,
        closes_at: DateTime<Utc>,
        option_count: usize,
    ) -> Poll {
        let poll = Poll {
            id: PollId::random(),
            opens_at,
            closes_at,
            option_ids: (0..option_count).map(|_| OptionId::random()).collect(),
        };
        let mut state = self.lock();
        for option_id in &poll.option_ids {
            state.option_polls.insert(*option_id, poll.id);
        }
        state.polls.insert(poll.id, poll.clone());
        poll
    }

    /// Append a vote directly, bypassing poll window checks.
    ///
    /// # Errors
    ///
    /// Fails for an unknown option or a second vote in the same poll.
    pub fn record_vote(
        &self,
        user_id: &UserId,
        option_id: OptionId,
        cast_at: DateTime<Utc>,
    ) -> Result<Vote, VoteRepositoryError> {
        self.lock().insert_vote(&NewVote {
            user_id: user_id.clone(),
            option_id,
            cast_at,
        })
    }

    /// Catalogue id of a badge, when seeded.
    pub fn badge_id(&self, kind: BadgeKind) -> Option<BadgeId> {
        self.lock()
            .badges
            .iter()
            .find(|badge| badge.name == kind.as_str())
            .map(|badge| badge.id)
    }

    /// Badge kinds the user holds, in grant order.
    pub fn badges_held_by(&self, user_id: &UserId) -> Vec<BadgeKind> {
        let state = self.lock();
        state
            .grants
            .iter()
            .filter(|grant| grant.user_id == *user_id)
            .filter_map(|grant| {
                state
                    .badges
                    .iter()
                    .find(|badge| badge.id == grant.badge_id)
                    .and_then(|badge| badge.name.parse().ok())
            })
            .collect()
    }

    /// Total grants across all users.
    pub fn grant_count(&self) -> usize {
        self.lock().grants.len()
    }

    /// Number of catalogued badges.
    pub fn catalogue_size(&self) -> usize {
        self.lock().badges.len()
    }

    /// Cached stats last written for the user.
    pub fn cached_stats(&self, user_id: &UserId) -> Option<UserVoteStats> {
        self.lock().user_stats.get(user_id).cloned()
    }

    /// Make vote counting fail with a connection error.
    pub fn fail_vote_counts(&self, fail: bool) {
        self.lock().fail_vote_counts = fail;
    }

    /// Make every grant attempt fail with a connection error.
    pub fn fail_grants(&self, fail: bool) {
        self.lock().fail_grants = fail;
    }
}

#[async_trait]
impl VoteRepository for InMemoryBallotStore {
    async fn create_vote(&self, vote: &NewVote) -> Result<Vote, VoteRepositoryError> {
        self.lock().insert_vote(vote)
    }

    async fn find_vote(&self, id: &VoteId) -> Result<Option<Vote>, VoteRepositoryError> {
        Ok(self.lock().votes.iter().find(|vote| vote.id == *id).cloned())
    }

    async fn list_vote_timestamps_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<DateTime<Utc>>, VoteRepositoryError> {
        let mut times: Vec<DateTime<Utc>> = self
            .lock()
            .votes
            .iter()
            .filter(|vote| vote.user_id == *user_id)
            .map(|vote| vote.cast_at)
            .collect();
        times.sort_unstable_by(|a, b| b.cmp(a));
        times.truncate(limit);
        Ok(times)
    }

    async fn count_votes_for_user(&self, user_id: &UserId) -> Result<u64, VoteRepositoryError> {
        let state = self.lock();
        if state.fail_vote_counts {
            return Err(VoteRepositoryError::connection("vote counts unavailable"));
        }
        let count = state
            .votes
            .iter()
            .filter(|vote| vote.user_id == *user_id)
            .count();
        Ok(count as u64)
    }

    async fn list_votes_for_poll(
        &self,
        poll_id: &PollId,
    ) -> Result<Vec<PollVote>, VoteRepositoryError> {
        let mut votes: Vec<PollVote> = self
            .lock()
            .votes
            .iter()
            .filter(|vote| vote.poll_id == *poll_id)
            .map(|vote| PollVote {
                user_id: vote.user_id.clone(),
                option_id: vote.option_id,
                cast_at: vote.cast_at,
            })
            .collect();
        votes.sort_by_key(|vote| vote.cast_at);
        Ok(votes)
    }

    async fn count_votes_for_option(
        &self,
        option_id: &OptionId,
    ) -> Result<u64, VoteRepositoryError> {
        let count = self
            .lock()
            .votes
            .iter()
            .filter(|vote| vote.option_id == *option_id)
            .count();
        Ok(count as u64)
    }

    async fn has_voted_in_poll(
        &self,
        user_id: &UserId,
        poll_id: &PollId,
    ) -> Result<bool, VoteRepositoryError> {
        Ok(self
            .lock()
            .votes
            .iter()
            .any(|vote| vote.user_id == *user_id && vote.poll_id == *poll_id))
    }
}

#[async_trait]
impl PollRepository for InMemoryBallotStore {
    async fn find_poll(&self, id: &PollId) -> Result<Option<Poll>, PollRepositoryError> {
        Ok(self.lock().polls.get(id).cloned())
    }

    async fn find_poll_for_option(
        &self,
        option_id: &OptionId,
    ) -> Result<Option<Poll>, PollRepositoryError> {
        let state = self.lock();
        Ok(state
            .option_polls
            .get(option_id)
            .and_then(|poll_id| state.polls.get(poll_id))
            .cloned())
    }
}

#[async_trait]
impl BadgeCatalogueRepository for InMemoryBallotStore {
    async fn find_by_name(
        &self,
        kind: BadgeKind,
    ) -> Result<Option<Badge>, BadgeCatalogueRepositoryError> {
        Ok(self
            .lock()
            .badges
            .iter()
            .find(|badge| badge.name == kind.as_str())
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[BadgeId]) -> Result<Vec<Badge>, BadgeCatalogueRepositoryError> {
        let mut found: Vec<Badge> = self
            .lock()
            .badges
            .iter()
            .filter(|badge| ids.contains(&badge.id))
            .cloned()
            .collect();
        found.sort_by_key(|badge| badge.id);
        Ok(found)
    }

    async fn seed(
        &self,
        definitions: &[BadgeDefinition],
    ) -> Result<u64, BadgeCatalogueRepositoryError> {
        Ok(self.lock().seed(definitions))
    }
}

#[async_trait]
impl BadgeGrantRepository for InMemoryBallotStore {
    async fn create_grant_if_absent(
        &self,
        user_id: &UserId,
        badge_id: BadgeId,
        granted_at: DateTime<Utc>,
    ) -> Result<GrantInsertion, BadgeGrantRepositoryError> {
        let mut state = self.lock();
        if state.fail_grants {
            return Err(BadgeGrantRepositoryError::connection("grant store unavailable"));
        }
        let held = state
            .grants
            .iter()
            .any(|grant| grant.user_id == *user_id && grant.badge_id == badge_id);
        if held {
            return Ok(GrantInsertion::AlreadyExists);
        }
        state.grants.push(BadgeGrant {
            user_id: user_id.clone(),
            badge_id,
            granted_at,
        });
        Ok(GrantInsertion::Created)
    }

    async fn list_earned_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<EarnedBadge>, BadgeGrantRepositoryError> {
        let state = self.lock();
        let mut earned: Vec<EarnedBadge> = state
            .grants
            .iter()
            .filter(|grant| grant.user_id == *user_id)
            .filter_map(|grant| {
                state
                    .badges
                    .iter()
                    .find(|badge| badge.id == grant.badge_id)
                    .map(|badge| EarnedBadge {
                        badge: badge.clone(),
                        earned_at: grant.granted_at,
                    })
            })
            .collect();
        earned.sort_by(|a, b| {
            b.earned_at
                .cmp(&a.earned_at)
                .then_with(|| a.badge.id.cmp(&b.badge.id))
        });
        Ok(earned)
    }
}

#[async_trait]
impl UserStatsRepository for InMemoryBallotStore {
    async fn record_vote_stats(&self, stats: &UserVoteStats) -> Result<(), UserStatsRepositoryError> {
        self.lock()
            .user_stats
            .insert(stats.user_id.clone(), stats.clone());
        Ok(())
    }
}
