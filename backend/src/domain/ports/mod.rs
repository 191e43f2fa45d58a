//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe how the badge engine reaches vote, poll, catalogue
//! and grant storage. Driving ports expose the engine's triggers and the
//! vote submission flow. Each driven port carries a typed error enum so
//! adapters map their failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod badge_catalogue_repository;
mod badge_evaluation;
mod badge_grant_repository;
mod cast_vote_command;
mod earned_badges_query;
mod poll_repository;
mod user_stats_repository;
mod vote_repository;

#[cfg(test)]
pub use badge_catalogue_repository::MockBadgeCatalogueRepository;
pub use badge_catalogue_repository::{
    BadgeCatalogueRepository, BadgeCatalogueRepositoryError, FixtureBadgeCatalogueRepository,
};
#[cfg(test)]
pub use badge_evaluation::MockBadgeEvaluation;
pub use badge_evaluation::{AwardedBadges, BadgeEvaluation, FixtureBadgeEvaluation};
#[cfg(test)]
pub use badge_grant_repository::MockBadgeGrantRepository;
pub use badge_grant_repository::{
    BadgeGrantRepository, BadgeGrantRepositoryError, FixtureBadgeGrantRepository, GrantInsertion,
};
#[cfg(test)]
pub use cast_vote_command::MockCastVoteCommand;
pub use cast_vote_command::{CastVoteCommand, CastVoteRequest, CastVoteResponse};
#[cfg(test)]
pub use earned_badges_query::MockEarnedBadgesQuery;
pub use earned_badges_query::EarnedBadgesQuery;
#[cfg(test)]
pub use poll_repository::MockPollRepository;
pub use poll_repository::{FixturePollRepository, PollRepository, PollRepositoryError};
#[cfg(test)]
pub use user_stats_repository::MockUserStatsRepository;
pub use user_stats_repository::{
    FixtureUserStatsRepository, UserStatsRepository, UserStatsRepositoryError,
};
#[cfg(test)]
pub use vote_repository::MockVoteRepository;
pub use vote_repository::{FixtureVoteRepository, VoteRepository, VoteRepositoryError};
