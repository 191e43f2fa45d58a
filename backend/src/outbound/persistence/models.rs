//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types live here so
//! adapters stay thin.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Badge, BadgeDefinition, BadgeId, OptionId, PollId, PollVote, UserId, Vote, VoteId,
};

use super::schema::{badges, polls, user_badges, users, votes};

/// Row struct for reading from the votes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub option_id: Uuid,
    pub poll_id: Uuid,
    pub cast_at: DateTime<Utc>,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Self {
            id: VoteId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            option_id: OptionId::from_uuid(row.option_id),
            poll_id: PollId::from_uuid(row.poll_id),
            cast_at: row.cast_at,
        }
    }
}

/// Insertable struct for appending a vote.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = votes)]
pub(crate) struct NewVoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub option_id: Uuid,
    pub poll_id: Uuid,
    pub cast_at: DateTime<Utc>,
}

/// Projection of a vote used by poll-close evaluation.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PollVoteRow {
    pub user_id: Uuid,
    pub option_id: Uuid,
    pub cast_at: DateTime<Utc>,
}

impl From<PollVoteRow> for PollVote {
    fn from(row: PollVoteRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            option_id: OptionId::from_uuid(row.option_id),
            cast_at: row.cast_at,
        }
    }
}

/// Row struct for reading a poll's window.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = polls)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PollRow {
    pub id: Uuid,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

/// Row struct for reading from the badges table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = badges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BadgeRow {
    pub id: i32,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub unlock_hint: String,
}

impl From<BadgeRow> for Badge {
    fn from(row: BadgeRow) -> Self {
        Self {
            id: BadgeId::new(row.id),
            name: row.name,
            icon: row.icon,
            description: row.description,
            unlock_hint: row.unlock_hint,
        }
    }
}

/// Insertable struct for seeding catalogue entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = badges)]
pub(crate) struct NewBadgeRow<'a> {
    pub name: &'a str,
    pub icon: &'a str,
    pub description: &'a str,
    pub unlock_hint: &'a str,
}

impl<'a> From<&'a BadgeDefinition> for NewBadgeRow<'a> {
    fn from(definition: &'a BadgeDefinition) -> Self {
        Self {
            name: definition.kind.as_str(),
            icon: definition.icon,
            description: definition.description,
            unlock_hint: definition.unlock_hint,
        }
    }
}

/// Insertable struct for recording a grant.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_badges)]
pub(crate) struct NewUserBadgeRow {
    pub user_id: Uuid,
    pub badge_id: i32,
    pub earned_at: DateTime<Utc>,
}

/// Changeset for the cached vote counters on a user.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserVoteStatsUpdate {
    pub vote_count: i64,
    pub current_streak: i32,
    pub last_voted_day: Option<DateTime<Utc>>,
}
