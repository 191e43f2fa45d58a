//! Port abstraction for the static badge catalogue.
//!
//! The catalogue is seeded once and read-only afterwards. Seeding is
//! idempotent: rows are keyed by badge name and existing rows are left
//! untouched.

use async_trait::async_trait;

use crate::domain::{Badge, BadgeDefinition, BadgeId, BadgeKind};

use super::define_port_error;

define_port_error! {
    /// Errors raised by badge catalogue adapters.
    pub enum BadgeCatalogueRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "badge catalogue connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "badge catalogue query failed: {message}",
    }
}

/// Port for badge catalogue reads and seeding.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeCatalogueRepository: Send + Sync {
    /// Look up a badge by its catalogue name.
    async fn find_by_name(
        &self,
        kind: BadgeKind,
    ) -> Result<Option<Badge>, BadgeCatalogueRepositoryError>;

    /// Fetch the badges with the given ids. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[BadgeId]) -> Result<Vec<Badge>, BadgeCatalogueRepositoryError>;

    /// Insert any definitions not yet catalogued.
    ///
    /// Returns the number of badges inserted by this call.
    async fn seed(
        &self,
        definitions: &[BadgeDefinition],
    ) -> Result<u64, BadgeCatalogueRepositoryError>;
}

/// Fixture implementation with an empty catalogue.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBadgeCatalogueRepository;

#[async_trait]
impl BadgeCatalogueRepository for FixtureBadgeCatalogueRepository {
    async fn find_by_name(
        &self,
        _kind: BadgeKind,
    ) -> Result<Option<Badge>, BadgeCatalogueRepositoryError> {
        Ok(None)
    }

    async fn find_by_ids(
        &self,
        _ids: &[BadgeId],
    ) -> Result<Vec<Badge>, BadgeCatalogueRepositoryError> {
        Ok(Vec::new())
    }

    async fn seed(
        &self,
        _definitions: &[BadgeDefinition],
    ) -> Result<u64, BadgeCatalogueRepositoryError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BADGE_CATALOGUE;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_catalogue_is_empty() {
        let repo = FixtureBadgeCatalogueRepository;
        assert!(
            repo.find_by_name(BadgeKind::FirstVote)
                .await
                .expect("lookup")
                .is_none()
        );
        assert_eq!(repo.seed(&BADGE_CATALOGUE).await.expect("seed"), 0);
    }
}
