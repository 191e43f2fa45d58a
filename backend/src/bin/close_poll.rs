//! Run poll-close badge rules for a poll that has stopped accepting votes.
//!
//! Intended for the external closing scheduler. Re-running the command for
//! the same poll is safe: grants already held are skipped.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use ballot_backend::BadgeEngineSettings;
use ballot_backend::domain::ports::{BadgeCatalogueRepository, BadgeEvaluation};
use ballot_backend::domain::{BadgeEngineRepositories, BadgeEvaluationService, PollId};
use ballot_backend::outbound::persistence::{
    DbPool, DieselBadgeCatalogueRepository, DieselBadgeGrantRepository, DieselPollRepository,
    DieselUserStatsRepository, DieselVoteRepository,
};
use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

/// `close-poll` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "close-poll",
    about = "Award first, last, clutch, and chaos badges for a closed poll",
    version
)]
struct CliArgs {
    /// Identifier of the closed poll.
    #[arg(long = "poll-id", value_name = "uuid")]
    poll_id: Uuid,
    /// Database connection URL. Falls back to `BALLOT_DATABASE_URL`, then
    /// `DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
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
    let rule_settings = settings.rule_settings()?;
    let pool = DbPool::new(settings.pool_config()?)
        .await
        .wrap_err("create database pool")?;

    let catalogue = Arc::new(DieselBadgeCatalogueRepository::new(pool.clone()));
    let repositories = BadgeEngineRepositories {
        votes: Arc::new(DieselVoteRepository::new(pool.clone())),
        polls: Arc::new(DieselPollRepository::new(pool.clone())),
        catalogue: Arc::clone(&catalogue),
        grants: Arc::new(DieselBadgeGrantRepository::new(pool.clone())),
        user_stats: Arc::new(DieselUserStatsRepository::new(pool)),
    };
    let service =
        BadgeEvaluationService::new(repositories, rule_settings, Arc::new(DefaultClock));

    let poll_id = PollId::from_uuid(args.poll_id);
    let awarded = service
        .on_poll_close(poll_id)
        .await
        .wrap_err_with(|| format!("evaluate poll-close rules for {poll_id}"))?;
    let badges = catalogue
        .find_by_ids(&awarded)
        .await
        .wrap_err("load awarded badges")?;

    println!("poll_id={poll_id}");
    println!("badges_awarded={}", awarded.len());
    for badge in badges {
        println!("badge_id={} badge={}", badge.id, badge.name);
    }
    Ok(())
}
