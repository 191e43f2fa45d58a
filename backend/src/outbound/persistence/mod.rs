//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the badge engine's driven ports, backed by
//! PostgreSQL through `diesel-async` and a shared `bb8` pool.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories translate between Diesel rows and
//!   domain types; rule logic stays in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Constraint-backed invariants**: one vote per `(user, poll)` and one
//!   grant per `(user, badge)` are enforced by unique constraints, which the
//!   adapters translate into port outcomes.
//!
//! # Example
//!
//! ```no_run
//! use ballot_backend::outbound::persistence::{
//!     DbPool, DieselBadgeGrantRepository, PoolConfig,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/ballot")).await?;
//! let grants = DieselBadgeGrantRepository::new(pool);
//! # let _ = grants;
//! # Ok(())
//! # }
//! ```

mod diesel_badge_catalogue_repository;
mod diesel_badge_grant_repository;
mod diesel_error_mapping;
mod diesel_poll_repository;
mod diesel_user_stats_repository;
mod diesel_vote_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_badge_catalogue_repository::DieselBadgeCatalogueRepository;
pub use diesel_badge_grant_repository::DieselBadgeGrantRepository;
pub use diesel_poll_repository::DieselPollRepository;
pub use diesel_user_stats_repository::DieselUserStatsRepository;
pub use diesel_vote_repository::DieselVoteRepository;
pub use migrations::{
    MIGRATIONS, MigrationError, run_pending_migrations, run_pending_migrations_blocking,
};
pub use pool::{DbPool, PoolConfig, PoolError};
