//! Badge lookup and idempotent granting.
//!
//! Every rule funnels its award through [`BadgeRegistry`], so the
//! at-most-once guarantee lives in one place: the grant store's uniqueness
//! on `(user, badge)` decides whether a call created anything.

use std::sync::Arc;

use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{
    BadgeCatalogueRepository, BadgeCatalogueRepositoryError, BadgeGrantRepository,
    BadgeGrantRepositoryError, GrantInsertion,
};
use crate::domain::{BadgeId, BadgeKind, Error, GrantByNameOutcome, GrantOutcome, UserId};

fn map_catalogue_error(error: BadgeCatalogueRepositoryError) -> Error {
    match error {
        BadgeCatalogueRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("badge catalogue unavailable: {message}"))
        }
        BadgeCatalogueRepositoryError::Query { message } => {
            Error::internal(format!("badge catalogue error: {message}"))
        }
    }
}

fn map_grant_error(error: BadgeGrantRepositoryError) -> Error {
    match error {
        BadgeGrantRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("badge grant store unavailable: {message}"))
        }
        BadgeGrantRepositoryError::Query { message } => {
            Error::internal(format!("badge grant store error: {message}"))
        }
    }
}

/// Resolves badge names and records grants.
pub struct BadgeRegistry<C, G> {
    catalogue: Arc<C>,
    grants: Arc<G>,
    clock: Arc<dyn Clock>,
}

impl<C, G> Clone for BadgeRegistry<C, G> {
    fn clone(&self) -> Self {
        Self {
            catalogue: Arc::clone(&self.catalogue),
            grants: Arc::clone(&self.grants),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C, G> BadgeRegistry<C, G> {
    /// Create a registry over the catalogue and grant stores.
    pub fn new(catalogue: Arc<C>, grants: Arc<G>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalogue,
            grants,
            clock,
        }
    }
}

impl<C, G> BadgeRegistry<C, G>
where
    C: BadgeCatalogueRepository,
    G: BadgeGrantRepository,
{
    /// Look up the catalogue id for a badge, if it has been seeded.
    pub async fn find_badge_id(&self, kind: BadgeKind) -> Result<Option<BadgeId>, Error> {
        let badge = self
            .catalogue
            .find_by_name(kind)
            .await
            .map_err(map_catalogue_error)?;
        Ok(badge.map(|badge| badge.id))
    }

    /// Record that `user_id` holds `badge_id` unless it already does.
    ///
    /// Concurrent callers racing on the same pair see exactly one
    /// [`GrantOutcome::Granted`].
    pub async fn grant(&self, user_id: &UserId, badge_id: BadgeId) -> Result<GrantOutcome, Error> {
        let insertion = self
            .grants
            .create_grant_if_absent(user_id, badge_id, self.clock.utc())
            .await
            .map_err(map_grant_error)?;

        match insertion {
            GrantInsertion::Created => {
                debug!(user_id = %user_id, badge_id = %badge_id, "badge granted");
                Ok(GrantOutcome::Granted(badge_id))
            }
            GrantInsertion::AlreadyExists => Ok(GrantOutcome::AlreadyHeld),
        }
    }

    /// Grant a badge by catalogue name.
    ///
    /// A badge missing from the catalogue is reported as
    /// [`GrantByNameOutcome::UnknownBadge`] rather than an error.
    pub async fn grant_by_name(
        &self,
        user_id: &UserId,
        kind: BadgeKind,
    ) -> Result<GrantByNameOutcome, Error> {
        let Some(badge_id) = self.find_badge_id(kind).await? else {
            debug!(badge = %kind, "badge not present in catalogue; skipping grant");
            return Ok(GrantByNameOutcome::UnknownBadge);
        };

        Ok(match self.grant(user_id, badge_id).await? {
            GrantOutcome::Granted(id) => GrantByNameOutcome::Granted(id),
            GrantOutcome::AlreadyHeld => GrantByNameOutcome::AlreadyHeld,
        })
    }
}
