//! Domain primitives, badge rules and services.
//!
//! Purpose: Define strongly typed voting and badge entities, the rules that
//! award badges, and the services that drive them through ports. Keep types
//! immutable and document invariants and serialisation contracts (serde) in
//! each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - AppDayClock / StreakCalculator: app-day bucketing and streak counting.
//! - BadgeKind / BADGE_CATALOGUE: the fixed badge catalogue.
//! - BadgeEvaluationService: vote-time and poll-close badge triggers.
//! - VoteCastService / EarnedBadgesService: vote submission and badge reads.

pub mod app_day;
pub mod badge;
pub mod badge_evaluation_service;
pub mod badge_registry;
pub mod earned_badges_service;
pub mod error;
pub mod poll_close_rules;
pub mod ports;
pub mod streak;
pub mod user;
pub mod vote;
pub mod vote_cast_service;
pub mod vote_rules;

pub use self::app_day::{AppDayClock, AppDayClockError, DEFAULT_ROLLOVER_HOUR};
pub use self::badge::{
    BADGE_CATALOGUE, Badge, BadgeDefinition, BadgeGrant, BadgeId, BadgeKind, EarnedBadge,
    GrantByNameOutcome, GrantOutcome, ParseBadgeKindError,
};
pub use self::badge_evaluation_service::{BadgeEngineRepositories, BadgeEvaluationService};
pub use self::badge_registry::BadgeRegistry;
pub use self::earned_badges_service::EarnedBadgesService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::poll_close_rules::{PollCloseAward, PollCloseRuleEngine, plan_poll_close_awards};
pub use self::streak::{
    DEFAULT_STREAK_LOOKBACK, HIGHEST_STREAK_THRESHOLD, StreakCalculator, StreakCalculatorError,
};
pub use self::user::{UserId, UserValidationError, UserVoteStats};
pub use self::vote::{NewVote, OptionId, Poll, PollId, PollVote, Vote, VoteContext, VoteId};
pub use self::vote_cast_service::VoteCastService;
pub use self::vote_rules::{
    BALLOT_BEAST_THRESHOLD, RuleSettings, StreakTier, VoteRule, VoteRuleEngine,
};

/// Convenient service result alias.
///
/// # Examples
/// ```
/// use ballot_backend::domain::{DomainResult, Error};
///
/// fn handler() -> DomainResult<()> {
///     Err(Error::forbidden("poll is closed"))
/// }
/// ```
pub type DomainResult<T> = Result<T, Error>;
