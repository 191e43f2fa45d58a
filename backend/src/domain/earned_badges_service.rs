//! Read side for a user's earned badges.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{BadgeGrantRepository, BadgeGrantRepositoryError, EarnedBadgesQuery};
use crate::domain::{EarnedBadge, Error, UserId};

fn map_repository_error(error: BadgeGrantRepositoryError) -> Error {
    match error {
        BadgeGrantRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("badge grant store unavailable: {message}"))
        }
        BadgeGrantRepositoryError::Query { message } => {
            Error::internal(format!("badge grant store error: {message}"))
        }
    }
}

/// Query service implementing [`EarnedBadgesQuery`].
#[derive(Clone)]
pub struct EarnedBadgesService<G> {
    grants: Arc<G>,
}

impl<G> EarnedBadgesService<G> {
    /// Create a query service over the grant store.
    pub fn new(grants: Arc<G>) -> Self {
        Self { grants }
    }
}

#[async_trait]
impl<G> EarnedBadgesQuery for EarnedBadgesService<G>
where
    G: BadgeGrantRepository,
{
    async fn list_earned(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, Error> {
        self.grants
            .list_earned_for_user(user_id)
            .await
            .map_err(map_repository_error)
    }
}
