//! In-memory badge engine wiring shared by the behaviour tests.
//!
//! Every port is backed by one [`InMemoryBallotStore`] and "now" comes from a
//! [`MutableClock`], so tests drive the real services through fixed instants.

use std::sync::Arc;

use ballot_backend::domain::ports::{BadgeEvaluation, CastVoteCommand, CastVoteRequest};
use ballot_backend::domain::{
    BadgeEngineRepositories, BadgeEvaluationService, BadgeId, BadgeKind, Error,
    EarnedBadgesService, Poll, RuleSettings, UserId, VoteCastService, VoteId,
};
use ballot_backend::test_support::{InMemoryBallotStore, MutableClock};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use mockable::Clock;

pub type Store = InMemoryBallotStore;
pub type Engine = BadgeEvaluationService<Store, Store, Store, Store, Store>;
pub type Voting = VoteCastService<Store, Store, Store, Engine>;

/// Build a UTC instant from calendar parts.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

/// Badge engine, vote service and store wired together.
pub struct BallotHarness {
    pub store: Arc<Store>,
    pub clock: Arc<MutableClock>,
    pub engine: Arc<Engine>,
    pub voting: Voting,
    pub earned: EarnedBadgesService<Store>,
}

impl Default for BallotHarness {
    fn default() -> Self {
        Self::new(RuleSettings::default())
    }
}

impl BallotHarness {
    /// Wire the services over a store seeded with the full catalogue.
    pub fn new(settings: RuleSettings) -> Self {
        let store = Arc::new(InMemoryBallotStore::with_catalogue());
        let clock = Arc::new(MutableClock::new(utc(2024, 9, 1, 12, 0)));
        let shared_clock: Arc<dyn Clock> = clock.clone();

        let engine = Arc::new(BadgeEvaluationService::new(
            BadgeEngineRepositories {
                votes: Arc::clone(&store),
                polls: Arc::clone(&store),
                catalogue: Arc::clone(&store),
                grants: Arc::clone(&store),
                user_stats: Arc::clone(&store),
            },
            settings,
            Arc::clone(&shared_clock),
        ));
        let voting = VoteCastService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&engine),
            shared_clock,
        );
        let earned = EarnedBadgesService::new(Arc::clone(&store));

        Self {
            store,
            clock,
            engine,
            voting,
            earned,
        }
    }

    /// A one-hour poll centred on `at`.
    pub fn poll_around(&self, at: DateTime<Utc>, option_count: usize) -> Poll {
        self.store.add_poll(
            at - TimeDelta::minutes(30),
            at + TimeDelta::minutes(30),
            option_count,
        )
    }

    /// Cast a vote for `option` of `poll` with the clock set to `at`.
    pub async fn cast_in(
        &self,
        poll: &Poll,
        option: usize,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Vec<BadgeKind>, Error> {
        self.clock.set(at);
        let option_id = poll.option_ids.get(option).copied().expect("poll option");
        let response = self
            .voting
            .cast_vote(CastVoteRequest {
                user_id: user_id.clone(),
                option_id,
            })
            .await?;
        let mut kinds: Vec<BadgeKind> = response
            .new_badges
            .iter()
            .map(|badge| badge.name.parse().expect("catalogued badge name"))
            .collect();
        kinds.sort_unstable();
        Ok(kinds)
    }

    /// Cast a vote at `at` in a fresh poll; returns the badges it earned.
    pub async fn vote_at(&self, user_id: &UserId, at: DateTime<Utc>) -> Vec<BadgeKind> {
        let poll = self.poll_around(at, 2);
        self.cast_in(&poll, 0, user_id, at)
            .await
            .expect("vote should be accepted")
    }

    /// Store a vote without running any badge rules.
    pub fn record_past_vote(&self, user_id: &UserId, at: DateTime<Utc>) -> VoteId {
        let poll = self.poll_around(at, 1);
        let option_id = poll.option_ids.first().copied().expect("poll option");
        self.store
            .record_vote(user_id, option_id, at)
            .expect("record vote")
            .id
    }

    /// Run poll-close rules with the clock just past the poll's close.
    pub async fn close(&self, poll: &Poll) -> Result<Vec<BadgeKind>, Error> {
        self.clock.set(poll.closes_at + TimeDelta::minutes(1));
        let ids = self.engine.on_poll_close(poll.id).await?;
        Ok(self.kinds_of(&ids))
    }

    /// Re-run vote-time rules for an already stored vote.
    pub async fn reevaluate(&self, vote_id: VoteId) -> Result<Vec<BadgeKind>, Error> {
        let ids = self.engine.on_vote_cast(vote_id).await?;
        Ok(self.kinds_of(&ids))
    }

    /// Catalogue kinds for badge ids, in catalogue order.
    pub fn kinds_of(&self, ids: &[BadgeId]) -> Vec<BadgeKind> {
        BadgeKind::ALL
            .into_iter()
            .filter(|kind| {
                self.store
                    .badge_id(*kind)
                    .is_some_and(|id| ids.contains(&id))
            })
            .collect()
    }

    /// Kinds the user holds, sorted.
    pub fn held_by(&self, user_id: &UserId) -> Vec<BadgeKind> {
        let mut held = self.store.badges_held_by(user_id);
        held.sort_unstable();
        held
    }
}
