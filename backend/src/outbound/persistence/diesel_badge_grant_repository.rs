//! PostgreSQL-backed badge grant ledger.
//!
//! `create_grant_if_absent` is a single `INSERT ... ON CONFLICT (user_id,
//! badge_id) DO NOTHING`; the affected row count tells the caller whether
//! this call created the grant. Concurrent callers therefore see exactly one
//! `Created`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BadgeGrantRepository, BadgeGrantRepositoryError, GrantInsertion};
use crate::domain::{BadgeId, EarnedBadge, UserId};

use super::diesel_error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{BadgeRow, NewUserBadgeRow};
use super::pool::{DbPool, PoolError};
use super::schema::{badges, user_badges};

/// Diesel-backed implementation of [`BadgeGrantRepository`].
#[derive(Clone)]
pub struct DieselBadgeGrantRepository {
    pool: DbPool,
}

impl DieselBadgeGrantRepository {
    /// Create a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> BadgeGrantRepositoryError {
    map_pool_error(error, BadgeGrantRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> BadgeGrantRepositoryError {
    map_diesel_error(
        error,
        BadgeGrantRepositoryError::query,
        BadgeGrantRepositoryError::connection,
    )
}

fn insertion_from_rows(rows_affected: usize) -> GrantInsertion {
    if rows_affected == 0 {
        GrantInsertion::AlreadyExists
    } else {
        GrantInsertion::Created
    }
}

#[async_trait]
impl BadgeGrantRepository for DieselBadgeGrantRepository {
    async fn create_grant_if_absent(
        &self,
        user_id: &UserId,
        badge_id: BadgeId,
        granted_at: DateTime<Utc>,
    ) -> Result<GrantInsertion, BadgeGrantRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let result = diesel::insert_into(user_badges::table)
            .values(&NewUserBadgeRow {
                user_id: *user_id.as_uuid(),
                badge_id: badge_id.as_i32(),
                earned_at: granted_at,
            })
            .on_conflict((user_badges::user_id, user_badges::badge_id))
            .do_nothing()
            .execute(&mut conn)
            .await;

        match result {
            Ok(rows_affected) => Ok(insertion_from_rows(rows_affected)),
            Err(error) if is_unique_violation(&error) => Ok(GrantInsertion::AlreadyExists),
            Err(error) => Err(diesel_error(error)),
        }
    }

    async fn list_earned_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<EarnedBadge>, BadgeGrantRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<(BadgeRow, DateTime<Utc>)> = user_badges::table
            .inner_join(badges::table)
            .filter(user_badges::user_id.eq(user_id.as_uuid()))
            .order((user_badges::earned_at.desc(), badges::id.asc()))
            .select((BadgeRow::as_select(), user_badges::earned_at))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|(badge, earned_at)| EarnedBadge {
                badge: badge.into(),
                earned_at,
            })
            .collect())
    }
}
