//! PostgreSQL-backed vote log.
//!
//! Votes are appended with the owning poll resolved from the option inside
//! one transaction; the `votes_one_per_poll` constraint turns a racing
//! second vote into [`VoteRepositoryError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{VoteRepository, VoteRepositoryError};
use crate::domain::{NewVote, OptionId, PollId, PollVote, UserId, Vote, VoteId};

use super::diesel_error_mapping::{
    count_to_u64, is_unique_violation, map_diesel_error, map_pool_error,
};
use super::models::{NewVoteRow, PollVoteRow, VoteRow};
use super::pool::{DbPool, PoolError};
use super::schema::{poll_options, votes};

/// Diesel-backed implementation of [`VoteRepository`].
#[derive(Clone)]
pub struct DieselVoteRepository {
    pool: DbPool,
}

impl DieselVoteRepository {
    /// Create a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> VoteRepositoryError {
    map_pool_error(error, VoteRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> VoteRepositoryError {
    if is_unique_violation(&error) {
        return VoteRepositoryError::conflict("user already voted in this poll");
    }
    map_diesel_error(
        error,
        VoteRepositoryError::query,
        VoteRepositoryError::connection,
    )
}

#[async_trait]
impl VoteRepository for DieselVoteRepository {
    async fn create_vote(&self, vote: &NewVote) -> Result<Vote, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let option_id = *vote.option_id.as_uuid();
        let user_id = *vote.user_id.as_uuid();
        let cast_at = vote.cast_at;

        let row = conn
            .transaction(|conn| {
                async move {
                    let poll_id: Uuid = poll_options::table
                        .find(option_id)
                        .select(poll_options::poll_id)
                        .first(conn)
                        .await?;

                    diesel::insert_into(votes::table)
                        .values(&NewVoteRow {
                            id: Uuid::new_v4(),
                            user_id,
                            option_id,
                            poll_id,
                            cast_at,
                        })
                        .returning(VoteRow::as_returning())
                        .get_result(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error)?;

        Ok(row.into())
    }

    async fn find_vote(&self, id: &VoteId) -> Result<Option<Vote>, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = votes::table
            .find(*id.as_uuid())
            .select(VoteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_vote_timestamps_for_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<DateTime<Utc>>, VoteRepositoryError> {
        let limit = i64::try_from(limit)
            .map_err(|_| VoteRepositoryError::query(format!("lookback {limit} too large")))?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        votes::table
            .filter(votes::user_id.eq(user_id.as_uuid()))
            .order(votes::cast_at.desc())
            .limit(limit)
            .select(votes::cast_at)
            .load(&mut conn)
            .await
            .map_err(diesel_error)
    }

    async fn count_votes_for_user(&self, user_id: &UserId) -> Result<u64, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = votes::table
            .filter(votes::user_id.eq(user_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        count_to_u64(count, VoteRepositoryError::query)
    }

    async fn list_votes_for_poll(
        &self,
        poll_id: &PollId,
    ) -> Result<Vec<PollVote>, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<PollVoteRow> = votes::table
            .filter(votes::poll_id.eq(poll_id.as_uuid()))
            .order((votes::cast_at.asc(), votes::id.asc()))
            .select(PollVoteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_votes_for_option(
        &self,
        option_id: &OptionId,
    ) -> Result<u64, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = votes::table
            .filter(votes::option_id.eq(option_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        count_to_u64(count, VoteRepositoryError::query)
    }

    async fn has_voted_in_poll(
        &self,
        user_id: &UserId,
        poll_id: &PollId,
    ) -> Result<bool, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::select(exists(
            votes::table
                .filter(votes::user_id.eq(user_id.as_uuid()))
                .filter(votes::poll_id.eq(poll_id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(diesel_error)
    }
}
