//! Apply pending migrations and seed the badge catalogue.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;

use ballot_backend::BadgeEngineSettings;
use ballot_backend::domain::BADGE_CATALOGUE;
use ballot_backend::domain::ports::BadgeCatalogueRepository;
use ballot_backend::outbound::persistence::{
    DbPool, DieselBadgeCatalogueRepository, run_pending_migrations,
};
use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// `seed-badges` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "seed-badges",
    about = "Apply schema migrations and insert any missing badge definitions",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `BALLOT_DATABASE_URL`, then
    /// `DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Seed without applying pending migrations first.
    #[arg(long = "skip-migrations")]
    skip_migrations: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        eprintln!("tracing init failed: {error}");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let args = CliArgs::try_parse()?;
    let mut settings = BadgeEngineSettings::load_from_iter([OsString::from("ballot")])
        .map_err(|error| eyre!("load settings: {error}"))?;
    if args.database_url.is_some() {
        settings.database_url = args.database_url;
    }
    let pool_config = settings.pool_config()?;

    if !args.skip_migrations {
        let applied = run_pending_migrations(pool_config.database_url().to_owned())
            .await
            .wrap_err("apply migrations")?;
        info!(applied, "migrations applied");
        println!("migrations_applied={applied}");
    }

    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("create database pool")?;
    let catalogue = DieselBadgeCatalogueRepository::new(pool);
    let inserted = catalogue
        .seed(&BADGE_CATALOGUE)
        .await
        .wrap_err("seed badge catalogue")?;
    info!(inserted, total = BADGE_CATALOGUE.len(), "badge catalogue seeded");

    println!("inserted={inserted}");
    println!("catalogue_size={}", BADGE_CATALOGUE.len());
    Ok(())
}
