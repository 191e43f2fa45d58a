//! Port abstraction for the badge grant ledger.
//!
//! The ledger enforces at most one grant per (user, badge) with a storage
//! uniqueness constraint. [`BadgeGrantRepository::create_grant_if_absent`] is
//! the idempotency primitive the whole engine relies on: it must be atomic and
//! must report an existing grant as [`GrantInsertion::AlreadyExists`] rather
//! than as an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BadgeId, EarnedBadge, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by badge grant adapters.
    pub enum BadgeGrantRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "badge grant repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "badge grant repository query failed: {message}",
    }
}

/// Result of an insert-if-absent on the grant ledger.
///
/// Mirrors the applied/already-applied split used for other exactly-once
/// records: callers skip follow-up work without treating the second case as a
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantInsertion {
    /// The grant row was created by this call.
    Created,
    /// A grant for this (user, badge) already existed.
    AlreadyExists,
}

/// Port for the one-time badge grant ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeGrantRepository: Send + Sync {
    /// Atomically record a grant unless one already exists.
    async fn create_grant_if_absent(
        &self,
        user_id: &UserId,
        badge_id: BadgeId,
        granted_at: DateTime<Utc>,
    ) -> Result<GrantInsertion, BadgeGrantRepositoryError>;

    /// Badges the user holds, most recently earned first.
    async fn list_earned_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<EarnedBadge>, BadgeGrantRepositoryError>;
}

/// Fixture implementation that accepts every grant and remembers none.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBadgeGrantRepository;

#[async_trait]
impl BadgeGrantRepository for FixtureBadgeGrantRepository {
    async fn create_grant_if_absent(
        &self,
        _user_id: &UserId,
        _badge_id: BadgeId,
        _granted_at: DateTime<Utc>,
    ) -> Result<GrantInsertion, BadgeGrantRepositoryError> {
        Ok(GrantInsertion::Created)
    }

    async fn list_earned_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<EarnedBadge>, BadgeGrantRepositoryError> {
        Ok(Vec::new())
    }
}
