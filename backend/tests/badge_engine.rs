//! Behavioural tests for vote-time and poll-close badge awarding.
//!
//! The services run against the in-memory store from `test_support`, so the
//! scenarios exercise real rule evaluation, grant idempotency and cached
//! stats without a database.

use ballot_backend::domain::ports::{
    BadgeCatalogueRepository, BadgeEvaluation, EarnedBadgesQuery,
};
use ballot_backend::domain::{
    BADGE_CATALOGUE, BadgeKind, ErrorCode, RuleSettings, StreakCalculator, UserId, VoteId,
};
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use rstest::{fixture, rstest};

mod support;

use support::harness::{BallotHarness, utc};

#[fixture]
fn harness() -> BallotHarness {
    BallotHarness::default()
}

#[fixture]
fn voter() -> UserId {
    UserId::random()
}

// -----------------------------------------------------------------------------
// Vote-time rules
// -----------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn first_vote_is_awarded_once(harness: BallotHarness, voter: UserId) {
    let first = harness.vote_at(&voter, utc(2024, 9, 1, 12, 0)).await;
    let second = harness.vote_at(&voter, utc(2024, 9, 3, 12, 0)).await;

    assert_eq!(first, vec![BadgeKind::FirstVote]);
    assert!(second.is_empty(), "unexpected badges: {second:?}");
    assert_eq!(harness.held_by(&voter), vec![BadgeKind::FirstVote]);
}

#[rstest]
#[tokio::test]
async fn streak_tiers_unlock_progressively(harness: BallotHarness, voter: UserId) {
    let start = utc(2024, 9, 1, 12, 0);
    let mut earned_by_day = Vec::new();
    for day in 0..7 {
        let kinds = harness.vote_at(&voter, start + TimeDelta::days(day)).await;
        earned_by_day.push(kinds);
    }

    assert_eq!(earned_by_day[0], vec![BadgeKind::FirstVote]);
    assert!(earned_by_day[1].is_empty());
    assert_eq!(earned_by_day[2], vec![BadgeKind::StreakStarter]);
    assert!(earned_by_day[3..6].iter().all(Vec::is_empty));
    assert_eq!(earned_by_day[6], vec![BadgeKind::FullWeekWarrior]);
    assert_eq!(
        harness.held_by(&voter),
        vec![
            BadgeKind::FirstVote,
            BadgeKind::StreakStarter,
            BadgeKind::FullWeekWarrior,
        ]
    );
}

#[rstest]
#[tokio::test]
async fn month_streak_skips_lower_tiers_that_were_never_observed(
    harness: BallotHarness,
    voter: UserId,
) {
    let today = utc(2024, 10, 1, 12, 0);
    for day in 1..30 {
        harness.record_past_vote(&voter, today - TimeDelta::days(day));
    }

    let kinds = harness.vote_at(&voter, today).await;

    assert_eq!(kinds, vec![BadgeKind::MonthOfMayhem]);
    assert!(!harness.held_by(&voter).contains(&BadgeKind::StreakStarter));
}

#[rstest]
#[case::before_rollover(utc(2024, 9, 2, 3, 59), false)]
#[case::at_rollover(utc(2024, 9, 2, 4, 0), true)]
#[tokio::test]
async fn rollover_hour_separates_app_days(
    harness: BallotHarness,
    voter: UserId,
    #[case] first_vote: DateTime<Utc>,
    #[case] expect_streak: bool,
) {
    // 03:59 belongs to the app day of 1 September, leaving a gap before 3 September.
    harness.vote_at(&voter, first_vote).await;
    harness.vote_at(&voter, utc(2024, 9, 3, 4, 0)).await;
    let third = harness.vote_at(&voter, utc(2024, 9, 4, 4, 0)).await;

    assert_eq!(third.contains(&BadgeKind::StreakStarter), expect_streak);
}

#[rstest]
#[case::ninety_ninth(98, false)]
#[case::hundredth(99, true)]
#[tokio::test]
async fn ballot_beast_unlocks_on_hundredth_vote(
    harness: BallotHarness,
    voter: UserId,
    #[case] earlier_votes: i64,
    #[case] expect_beast: bool,
) {
    let today = utc(2025, 6, 1, 12, 0);
    // Every other day keeps the streak at one.
    for n in 1..=earlier_votes {
        harness.record_past_vote(&voter, today - TimeDelta::days(2 * n));
    }

    let kinds = harness.vote_at(&voter, today).await;

    assert_eq!(kinds.contains(&BadgeKind::BallotBeast), expect_beast);
    assert!(!kinds.contains(&BadgeKind::FirstVote));
}

#[rstest]
#[case::utc_midnight(0, utc(2024, 9, 1, 0, 15), true)]
#[case::utc_one_am(0, utc(2024, 9, 1, 1, 0), false)]
#[case::east_of_utc(120, utc(2024, 9, 1, 22, 30), true)]
#[case::west_of_utc(-300, utc(2024, 9, 1, 0, 30), false)]
#[tokio::test]
async fn midnight_maverick_uses_configured_local_time(
    voter: UserId,
    #[case] offset_minutes: i32,
    #[case] cast_at: DateTime<Utc>,
    #[case] expect_badge: bool,
) {
    let settings = RuleSettings {
        streaks: StreakCalculator::default(),
        local_offset: FixedOffset::east_opt(offset_minutes * 60).expect("valid offset"),
    };
    let harness = BallotHarness::new(settings);

    let kinds = harness.vote_at(&voter, cast_at).await;

    assert_eq!(kinds.contains(&BadgeKind::MidnightMaverick), expect_badge);
}

#[rstest]
#[tokio::test]
async fn cached_stats_follow_every_vote(harness: BallotHarness, voter: UserId) {
    let start = utc(2024, 9, 1, 12, 0);
    for day in 0..3 {
        harness.vote_at(&voter, start + TimeDelta::days(day)).await;
    }
    let after_run = harness.store.cached_stats(&voter).expect("stats cached");

    harness.vote_at(&voter, start + TimeDelta::days(5)).await;
    let after_gap = harness.store.cached_stats(&voter).expect("stats cached");

    assert_eq!(after_run.vote_count, 3);
    assert_eq!(after_run.current_streak, 3);
    assert_eq!(after_gap.vote_count, 4);
    assert_eq!(after_gap.current_streak, 1);
    assert_eq!(after_gap.last_voted_day, Some(utc(2024, 9, 6, 4, 0)));
}

#[rstest]
#[tokio::test]
async fn concurrent_evaluations_grant_once(harness: BallotHarness, voter: UserId) {
    let vote_id = harness.record_past_vote(&voter, utc(2024, 9, 1, 12, 0));
    harness.clock.set(utc(2024, 9, 1, 12, 0));

    let (left, right) = tokio::join!(harness.reevaluate(vote_id), harness.reevaluate(vote_id));
    let mut awarded = left.expect("evaluation");
    awarded.extend(right.expect("evaluation"));

    assert_eq!(awarded, vec![BadgeKind::FirstVote]);
    assert_eq!(harness.store.grant_count(), 1);
}

// -----------------------------------------------------------------------------
// Failure handling
// -----------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn failing_grants_still_record_the_vote(
    harness: BallotHarness,
    voter: UserId,
) {
    let at = utc(2024, 9, 1, 12, 0);
    let poll = harness.poll_around(at, 2);
    harness.store.fail_grants(true);

    let kinds = harness
        .cast_in(&poll, 0, &voter, at)
        .await
        .expect("vote recorded despite grant failures");
    assert!(kinds.is_empty());
    assert_eq!(harness.store.grant_count(), 0);

    assert!(harness.store.cached_stats(&voter).is_some());

    let error = harness
        .cast_in(&poll, 1, &voter, at + TimeDelta::minutes(1))
        .await
        .expect_err("first vote was stored");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn rerunning_evaluation_awards_what_a_failed_run_missed(
    harness: BallotHarness,
    voter: UserId,
) {
    let at = utc(2024, 9, 1, 12, 0);
    let vote_id = harness.record_past_vote(&voter, at);
    harness.clock.set(at);

    harness.store.fail_grants(true);
    let failed = harness.reevaluate(vote_id).await.expect("rule failures isolated");
    harness.store.fail_grants(false);
    let retried = harness.reevaluate(vote_id).await.expect("evaluation");
    let repeated = harness.reevaluate(vote_id).await.expect("evaluation");

    assert!(failed.is_empty());
    assert_eq!(retried, vec![BadgeKind::FirstVote]);
    assert!(repeated.is_empty());
}

#[rstest]
#[tokio::test]
async fn count_outage_skips_count_rules_only(harness: BallotHarness, voter: UserId) {
    let at = utc(2024, 9, 1, 0, 20);
    let vote_id = harness.record_past_vote(&voter, at);
    harness.clock.set(at);
    harness.store.fail_vote_counts(true);

    let kinds = harness.reevaluate(vote_id).await.expect("rule failures isolated");

    assert_eq!(kinds, vec![BadgeKind::MidnightMaverick]);
    assert!(harness.store.cached_stats(&voter).is_none());
}

#[rstest]
#[tokio::test]
async fn unknown_vote_awards_nothing(harness: BallotHarness) {
    let kinds = harness
        .reevaluate(VoteId::random())
        .await
        .expect("unknown vote is not an error");

    assert!(kinds.is_empty());
}

// -----------------------------------------------------------------------------
// Vote casting
// -----------------------------------------------------------------------------

#[rstest]
#[case::before_open(TimeDelta::minutes(-31))]
#[case::after_close(TimeDelta::minutes(31))]
#[tokio::test]
async fn votes_outside_the_window_are_forbidden(
    harness: BallotHarness,
    voter: UserId,
    #[case] shift: TimeDelta,
) {
    let centre = utc(2024, 9, 1, 12, 0);
    let poll = harness.poll_around(centre, 2);

    let error = harness
        .cast_in(&poll, 0, &voter, centre + shift)
        .await
        .expect_err("poll not open");

    assert_eq!(error.code(), ErrorCode::Forbidden);
    assert_eq!(harness.store.grant_count(), 0);
}

#[rstest]
#[tokio::test]
async fn second_vote_in_a_poll_conflicts(harness: BallotHarness, voter: UserId) {
    let at = utc(2024, 9, 1, 12, 0);
    let poll = harness.poll_around(at, 2);
    harness.cast_in(&poll, 0, &voter, at).await.expect("first vote");

    let error = harness
        .cast_in(&poll, 1, &voter, at + TimeDelta::minutes(1))
        .await
        .expect_err("duplicate vote");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

// -----------------------------------------------------------------------------
// Poll-close rules
// -----------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn tied_poll_rewards_every_voter(harness: BallotHarness) {
    let opens = utc(2024, 9, 1, 4, 0);
    let poll = harness
        .store
        .add_poll(opens, opens + TimeDelta::hours(20), 2);
    let voters: Vec<UserId> = (0..10).map(|_| UserId::random()).collect();
    for (n, voter) in voters.iter().enumerate() {
        let option = poll.option_ids[n % 2];
        let minutes = i64::try_from(n).expect("small index") * 10;
        harness
            .store
            .record_vote(voter, option, opens + TimeDelta::minutes(minutes))
            .expect("vote");
    }

    harness.close(&poll).await.expect("poll-close evaluation");

    let first = voters.first().expect("voter");
    let last = voters.last().expect("voter");
    assert_eq!(
        harness.held_by(first),
        vec![BadgeKind::FirstToVote, BadgeKind::ClutchVoter]
    );
    assert_eq!(
        harness.held_by(last),
        vec![BadgeKind::LastToVote, BadgeKind::ClutchVoter]
    );
    for voter in &voters[1..9] {
        assert_eq!(harness.held_by(voter), vec![BadgeKind::ClutchVoter]);
    }
}

#[rstest]
#[tokio::test]
async fn lone_option_voter_is_a_chaos_agent_in_a_tie(harness: BallotHarness) {
    let opens = utc(2024, 9, 1, 4, 0);
    let poll = harness
        .store
        .add_poll(opens, opens + TimeDelta::hours(20), 3);
    let voters: Vec<UserId> = (0..5).map(|_| UserId::random()).collect();
    let choices = [0, 1, 0, 1, 2];
    for (n, (voter, choice)) in voters.iter().zip(choices).enumerate() {
        let minutes = i64::try_from(n).expect("small index") * 10;
        harness
            .store
            .record_vote(voter, poll.option_ids[choice], opens + TimeDelta::minutes(minutes))
            .expect("vote");
    }

    harness.close(&poll).await.expect("poll-close evaluation");

    let lone = voters.last().expect("voter");
    assert_eq!(
        harness.held_by(lone),
        vec![
            BadgeKind::LastToVote,
            BadgeKind::ClutchVoter,
            BadgeKind::ChaosAgent,
        ]
    );
}

#[rstest]
#[tokio::test]
async fn single_vote_poll_awards_first_last_and_chaos(harness: BallotHarness, voter: UserId) {
    let opens = utc(2024, 9, 1, 4, 0);
    let poll = harness
        .store
        .add_poll(opens, opens + TimeDelta::hours(20), 2);
    harness
        .store
        .record_vote(&voter, poll.option_ids[0], opens + TimeDelta::hours(1))
        .expect("vote");

    let kinds = harness.close(&poll).await.expect("poll-close evaluation");

    assert_eq!(
        kinds,
        vec![
            BadgeKind::FirstToVote,
            BadgeKind::LastToVote,
            BadgeKind::ChaosAgent,
        ]
    );
}

#[rstest]
#[tokio::test]
async fn closing_twice_awards_nothing_new(harness: BallotHarness, voter: UserId) {
    let opens = utc(2024, 9, 1, 4, 0);
    let poll = harness
        .store
        .add_poll(opens, opens + TimeDelta::hours(20), 2);
    harness
        .store
        .record_vote(&voter, poll.option_ids[0], opens)
        .expect("vote");

    let first = harness.close(&poll).await.expect("first close");
    let grants = harness.store.grant_count();
    let second = harness.close(&poll).await.expect("second close");

    assert!(!first.is_empty());
    assert!(second.is_empty());
    assert_eq!(harness.store.grant_count(), grants);
}

#[rstest]
#[tokio::test]
async fn empty_poll_awards_nothing(harness: BallotHarness) {
    let opens = utc(2024, 9, 1, 4, 0);
    let poll = harness
        .store
        .add_poll(opens, opens + TimeDelta::hours(20), 2);

    let kinds = harness.close(&poll).await.expect("poll-close evaluation");

    assert!(kinds.is_empty());
}

#[rstest]
#[tokio::test]
async fn closing_an_open_poll_is_forbidden(harness: BallotHarness, voter: UserId) {
    let opens = utc(2024, 9, 1, 4, 0);
    let poll = harness
        .store
        .add_poll(opens, opens + TimeDelta::hours(20), 2);
    harness
        .store
        .record_vote(&voter, poll.option_ids[0], opens)
        .expect("vote");
    harness.clock.set(opens + TimeDelta::hours(1));

    let error = harness
        .engine
        .on_poll_close(poll.id)
        .await
        .expect_err("poll still open");

    assert_eq!(error.code(), ErrorCode::Forbidden);
    assert_eq!(harness.store.grant_count(), 0);
}

// -----------------------------------------------------------------------------
// Catalogue and earned badges
// -----------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn reseeding_the_catalogue_inserts_nothing(harness: BallotHarness) {
    let first_vote = harness.store.badge_id(BadgeKind::FirstVote);

    let inserted = harness
        .store
        .seed(&BADGE_CATALOGUE)
        .await
        .expect("seed");

    assert_eq!(inserted, 0);
    assert_eq!(harness.store.catalogue_size(), BADGE_CATALOGUE.len());
    assert_eq!(harness.store.badge_id(BadgeKind::FirstVote), first_vote);
}

#[rstest]
#[tokio::test]
async fn earned_badges_are_listed_newest_first(harness: BallotHarness, voter: UserId) {
    let start = utc(2024, 9, 1, 12, 0);
    for day in 0..3 {
        harness.vote_at(&voter, start + TimeDelta::days(day)).await;
    }

    let earned = harness.earned.list_earned(&voter).await.expect("earned");

    let names: Vec<&str> = earned.iter().map(|item| item.badge.name.as_str()).collect();
    assert_eq!(names, vec!["Streak Starter", "First Vote"]);
    assert_eq!(earned[0].earned_at, start + TimeDelta::days(2));
    assert_eq!(earned[1].earned_at, start);
}
