//! Driving port for reading the badges a user has earned.

use async_trait::async_trait;

use crate::domain::{EarnedBadge, Error, UserId};

/// Read interface over a user's grants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EarnedBadgesQuery: Send + Sync {
    /// Badges the user holds, most recently earned first.
    async fn list_earned(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, Error>;
}
