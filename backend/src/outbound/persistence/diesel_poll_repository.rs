//! PostgreSQL-backed poll reads.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{PollRepository, PollRepositoryError};
use crate::domain::{OptionId, Poll, PollId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::PollRow;
use super::pool::{DbPool, PoolError};
use super::schema::{poll_options, polls};

/// Diesel-backed implementation of [`PollRepository`].
#[derive(Clone)]
pub struct DieselPollRepository {
    pool: DbPool,
}

impl DieselPollRepository {
    /// Create a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> PollRepositoryError {
    map_pool_error(error, PollRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> PollRepositoryError {
    map_diesel_error(
        error,
        PollRepositoryError::query,
        PollRepositoryError::connection,
    )
}

async fn load_poll(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<Poll>, diesel::result::Error> {
    let Some(row) = polls::table
        .find(id)
        .select(PollRow::as_select())
        .first(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };

    let option_ids: Vec<Uuid> = poll_options::table
        .filter(poll_options::poll_id.eq(row.id))
        .order(poll_options::position.asc())
        .select(poll_options::id)
        .load(conn)
        .await?;

    Ok(Some(Poll {
        id: PollId::from_uuid(row.id),
        opens_at: row.opens_at,
        closes_at: row.closes_at,
        option_ids: option_ids.into_iter().map(OptionId::from_uuid).collect(),
    }))
}

#[async_trait]
impl PollRepository for DieselPollRepository {
    async fn find_poll(&self, id: &PollId) -> Result<Option<Poll>, PollRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        load_poll(&mut conn, *id.as_uuid())
            .await
            .map_err(diesel_error)
    }

    async fn find_poll_for_option(
        &self,
        option_id: &OptionId,
    ) -> Result<Option<Poll>, PollRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let poll_id: Option<Uuid> = poll_options::table
            .find(*option_id.as_uuid())
            .select(poll_options::poll_id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        match poll_id {
            Some(poll_id) => load_poll(&mut conn, poll_id).await.map_err(diesel_error),
            None => Ok(None),
        }
    }
}
