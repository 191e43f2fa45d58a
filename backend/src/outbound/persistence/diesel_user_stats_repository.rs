//! PostgreSQL-backed writes to the cached per-user vote counters.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::UserVoteStats;
use crate::domain::ports::{UserStatsRepository, UserStatsRepositoryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::UserVoteStatsUpdate;
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of [`UserStatsRepository`].
#[derive(Clone)]
pub struct DieselUserStatsRepository {
    pool: DbPool,
}

impl DieselUserStatsRepository {
    /// Create a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserStatsRepositoryError {
    map_pool_error(error, UserStatsRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UserStatsRepositoryError {
    map_diesel_error(
        error,
        UserStatsRepositoryError::query,
        UserStatsRepositoryError::connection,
    )
}

fn to_update(stats: &UserVoteStats) -> Result<UserVoteStatsUpdate, UserStatsRepositoryError> {
    let vote_count = i64::try_from(stats.vote_count)
        .map_err(|_| UserStatsRepositoryError::query("vote count overflows BIGINT"))?;
    let current_streak = i32::try_from(stats.current_streak)
        .map_err(|_| UserStatsRepositoryError::query("streak overflows INTEGER"))?;
    Ok(UserVoteStatsUpdate {
        vote_count,
        current_streak,
        last_voted_day: stats.last_voted_day,
    })
}

#[async_trait]
impl UserStatsRepository for DieselUserStatsRepository {
    async fn record_vote_stats(&self, stats: &UserVoteStats) -> Result<(), UserStatsRepositoryError> {
        let update = to_update(stats)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(users::table.find(*stats.user_id.as_uuid()))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        if updated == 0 {
            return Err(UserStatsRepositoryError::missing_user(
                stats.user_id.to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for stats conversion.
    use super::*;
    use crate::domain::UserId;
    use rstest::rstest;

    fn stats(vote_count: u64, current_streak: u32) -> UserVoteStats {
        UserVoteStats {
            user_id: UserId::random(),
            vote_count,
            current_streak,
            last_voted_day: None,
        }
    }

    #[rstest]
    fn in_range_stats_convert() {
        let update = to_update(&stats(12, 3)).expect("fits columns");

        assert_eq!(update.vote_count, 12);
        assert_eq!(update.current_streak, 3);
        assert!(update.last_voted_day.is_none());
    }

    #[rstest]
    #[case(stats(u64::MAX, 1))]
    #[case(stats(1, u32::MAX))]
    fn oversized_stats_are_rejected(#[case] input: UserVoteStats) {
        assert!(matches!(
            to_update(&input),
            Err(UserStatsRepositoryError::Query { .. })
        ));
    }
}
