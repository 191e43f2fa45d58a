//! Tests for vote-time badge rules.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    GrantInsertion, MockBadgeCatalogueRepository, MockBadgeGrantRepository, MockVoteRepository,
};
use crate::domain::{AppDayClock, Badge, VoteId};
use crate::test_support::MutableClock;

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn badge_id(kind: BadgeKind) -> BadgeId {
    let position = BadgeKind::ALL
        .iter()
        .position(|candidate| *candidate == kind)
        .expect("kind is catalogued");
    BadgeId::new(i32::try_from(position).expect("small index") + 1)
}

fn full_catalogue() -> MockBadgeCatalogueRepository {
    let mut catalogue = MockBadgeCatalogueRepository::new();
    catalogue.expect_find_by_name().returning(|kind| {
        Ok(Some(Badge {
            id: badge_id(kind),
            name: kind.as_str().to_owned(),
            icon: String::new(),
            description: String::new(),
            unlock_hint: String::new(),
        }))
    });
    catalogue
}

fn granting_store() -> MockBadgeGrantRepository {
    let mut grants = MockBadgeGrantRepository::new();
    grants
        .expect_create_grant_if_absent()
        .returning(|_, _, _| Ok(GrantInsertion::Created));
    grants
}

/// Vote history where the user has `count` votes and voted on each of the
/// last `streak_days` app days, ending on the day of `now`.
fn history(count: u64, streak_days: i64, now: DateTime<Utc>) -> MockVoteRepository {
    let mut votes = MockVoteRepository::new();
    votes
        .expect_count_votes_for_user()
        .returning(move |_| Ok(count));
    votes
        .expect_list_vote_timestamps_for_user()
        .returning(move |_, limit| {
            Ok((0..streak_days)
                .map(|offset| now - Duration::days(offset))
                .take(limit)
                .collect())
        });
    votes
}

fn engine(
    votes: MockVoteRepository,
    grants: MockBadgeGrantRepository,
    settings: RuleSettings,
    now: DateTime<Utc>,
) -> VoteRuleEngine<MockVoteRepository, MockBadgeCatalogueRepository, MockBadgeGrantRepository> {
    let clock: Arc<dyn Clock> = Arc::new(MutableClock::new(now));
    let registry = BadgeRegistry::new(
        Arc::new(full_catalogue()),
        Arc::new(grants),
        Arc::clone(&clock),
    );
    VoteRuleEngine::new(Arc::new(votes), registry, settings, clock)
}

fn context(cast_at: DateTime<Utc>) -> VoteContext {
    VoteContext {
        vote_id: VoteId::random(),
        user_id: UserId::random(),
        cast_at,
    }
}

#[rstest]
#[case(0, None)]
#[case(2, None)]
#[case(3, Some(StreakTier::Starter))]
#[case(6, Some(StreakTier::Starter))]
#[case(7, Some(StreakTier::FullWeek))]
#[case(29, Some(StreakTier::FullWeek))]
#[case(30, Some(StreakTier::Month))]
#[case(45, Some(StreakTier::Month))]
fn highest_tier_only(#[case] streak: u32, #[case] expected: Option<StreakTier>) {
    assert_eq!(StreakTier::highest_for(streak), expected);
}

#[rstest]
#[case(at(0, 0), 0, true)]
#[case(at(0, 59), 0, true)]
#[case(at(1, 0), 0, false)]
#[case(at(23, 59), 0, false)]
#[case(at(22, 30), 120, true)]
#[case(at(0, 30), 120, false)]
fn midnight_hour_uses_local_offset(
    #[case] cast_at: DateTime<Utc>,
    #[case] offset_minutes: i32,
    #[case] expected: bool,
) {
    let offset = FixedOffset::east_opt(offset_minutes * 60).expect("valid offset");
    assert_eq!(is_midnight_vote(&context(cast_at), offset), expected);
}

#[tokio::test]
async fn first_vote_awards_first_vote_only() {
    let now = at(12, 0);
    let engine = engine(history(1, 1, now), granting_store(), RuleSettings::default(), now);

    let awarded = engine.evaluate(&context(now)).await;

    assert_eq!(awarded, vec![badge_id(BadgeKind::FirstVote)]);
}

#[tokio::test]
async fn midnight_first_vote_awards_both() {
    let now = at(0, 15);
    let engine = engine(history(1, 1, now), granting_store(), RuleSettings::default(), now);

    let awarded = engine.evaluate(&context(now)).await;

    let mut expected = vec![
        badge_id(BadgeKind::FirstVote),
        badge_id(BadgeKind::MidnightMaverick),
    ];
    expected.sort();
    assert_eq!(awarded, expected);
}

#[rstest]
#[case(3, BadgeKind::StreakStarter)]
#[case(7, BadgeKind::FullWeekWarrior)]
#[case(30, BadgeKind::MonthOfMayhem)]
#[tokio::test]
async fn streak_awards_highest_tier(#[case] days: i64, #[case] expected: BadgeKind) {
    let now = at(12, 0);
    let count = u64::try_from(days).expect("positive");
    let engine = engine(history(count, days, now), granting_store(), RuleSettings::default(), now);

    let awarded = engine.evaluate(&context(now)).await;

    assert_eq!(awarded, vec![badge_id(expected)]);
}

#[tokio::test]
async fn streak_is_zero_when_today_has_no_vote() {
    let now = at(12, 0);
    let mut votes = MockVoteRepository::new();
    votes.expect_count_votes_for_user().returning(|_| Ok(5));
    votes
        .expect_list_vote_timestamps_for_user()
        .returning(move |_, _| {
            Ok((1..=5).map(|offset| now - Duration::days(offset)).collect())
        });
    let engine = engine(votes, granting_store(), RuleSettings::default(), now);

    let awarded = engine.evaluate(&context(now - Duration::days(1))).await;

    assert!(awarded.is_empty());
}

#[tokio::test]
async fn streak_lookback_is_passed_to_repository() {
    let now = at(12, 0);
    let streaks =
        StreakCalculator::new(AppDayClock::default(), 45).expect("lookback is long enough");
    let settings = RuleSettings {
        streaks,
        ..RuleSettings::default()
    };
    let mut votes = MockVoteRepository::new();
    votes.expect_count_votes_for_user().returning(|_| Ok(2));
    votes
        .expect_list_vote_timestamps_for_user()
        .withf(|_, limit| *limit == 45)
        .times(1)
        .returning(|_, _| Ok(Vec::new()));
    let engine = engine(votes, granting_store(), settings, now);

    let awarded = engine.evaluate(&context(now)).await;

    assert!(awarded.is_empty());
}

#[rstest]
#[case(99, false)]
#[case(100, true)]
#[case(250, true)]
#[tokio::test]
async fn ballot_beast_threshold(#[case] count: u64, #[case] expected: bool) {
    let now = at(12, 0);
    let engine = engine(history(count, 0, now), granting_store(), RuleSettings::default(), now);

    let awarded = engine.evaluate(&context(now)).await;

    assert_eq!(
        awarded.contains(&badge_id(BadgeKind::BallotBeast)),
        expected
    );
}

#[tokio::test]
async fn already_held_badges_are_not_reported() {
    let now = at(0, 10);
    let mut grants = MockBadgeGrantRepository::new();
    grants
        .expect_create_grant_if_absent()
        .returning(|_, _, _| Ok(GrantInsertion::AlreadyExists));
    let engine = engine(history(1, 1, now), grants, RuleSettings::default(), now);

    let awarded = engine.evaluate(&context(now)).await;

    assert!(awarded.is_empty());
}

#[tokio::test]
async fn failing_rule_does_not_block_others() {
    let now = at(0, 10);
    let mut votes = MockVoteRepository::new();
    votes
        .expect_count_votes_for_user()
        .returning(|_| Err(VoteRepositoryError::connection("pool exhausted")));
    votes
        .expect_list_vote_timestamps_for_user()
        .returning(|_, _| Err(VoteRepositoryError::query("timeout")));
    let engine = engine(votes, granting_store(), RuleSettings::default(), now);

    let awarded = engine.evaluate(&context(now)).await;

    assert_eq!(awarded, vec![badge_id(BadgeKind::MidnightMaverick)]);
}
