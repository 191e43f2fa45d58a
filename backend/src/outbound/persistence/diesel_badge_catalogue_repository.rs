//! PostgreSQL-backed badge catalogue.
//!
//! Seeding inserts every definition with `ON CONFLICT (name) DO NOTHING`, so
//! re-running it leaves existing badges, and their ids, untouched.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BadgeCatalogueRepository, BadgeCatalogueRepositoryError};
use crate::domain::{Badge, BadgeDefinition, BadgeId, BadgeKind};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{BadgeRow, NewBadgeRow};
use super::pool::{DbPool, PoolError};
use super::schema::badges;

/// Diesel-backed implementation of [`BadgeCatalogueRepository`].
#[derive(Clone)]
pub struct DieselBadgeCatalogueRepository {
    pool: DbPool,
}

impl DieselBadgeCatalogueRepository {
    /// Create a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> BadgeCatalogueRepositoryError {
    map_pool_error(error, BadgeCatalogueRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> BadgeCatalogueRepositoryError {
    map_diesel_error(
        error,
        BadgeCatalogueRepositoryError::query,
        BadgeCatalogueRepositoryError::connection,
    )
}

#[async_trait]
impl BadgeCatalogueRepository for DieselBadgeCatalogueRepository {
    async fn find_by_name(
        &self,
        kind: BadgeKind,
    ) -> Result<Option<Badge>, BadgeCatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = badges::table
            .filter(badges::name.eq(kind.as_str()))
            .select(BadgeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[BadgeId]) -> Result<Vec<Badge>, BadgeCatalogueRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<BadgeRow> = badges::table
            .filter(badges::id.eq_any(raw_ids))
            .order(badges::id.asc())
            .select(BadgeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn seed(
        &self,
        definitions: &[BadgeDefinition],
    ) -> Result<u64, BadgeCatalogueRepositoryError> {
        if definitions.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NewBadgeRow<'_>> = definitions.iter().map(NewBadgeRow::from).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let inserted = diesel::insert_into(badges::table)
            .values(&rows)
            .on_conflict(badges::name)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(inserted as u64)
    }
}
