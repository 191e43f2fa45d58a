//! Badge engine configuration loaded via OrthoConfig.
//!
//! The rollover hour always carries a default; the remaining fields are
//! optional and their accessors fall back to the engine defaults.
//! [`BadgeEngineSettings::rule_settings`] validates the values into the
//! domain types the rule engines consume.

use std::env;
use std::time::Duration;

use chrono::FixedOffset;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    AppDayClock, AppDayClockError, DEFAULT_ROLLOVER_HOUR, DEFAULT_STREAK_LOOKBACK, RuleSettings,
    StreakCalculator, StreakCalculatorError,
};
use crate::outbound::persistence::PoolConfig;

const DATABASE_URL_ENV: &str = "DATABASE_URL";
const SECONDS_PER_MINUTE: i32 = 60;

/// Errors raised while turning raw settings into engine configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The rollover hour is not a valid hour of day.
    #[error(transparent)]
    RolloverHour(#[from] AppDayClockError),
    /// The streak lookback is too short for the highest streak badge.
    #[error(transparent)]
    StreakLookback(#[from] StreakCalculatorError),
    /// The local offset does not fit within a day.
    #[error("local offset of {minutes} minutes is out of range")]
    LocalOffsetOutOfRange { minutes: i32 },
    /// Neither the settings nor the environment name a database.
    #[error("database URL is not configured; set BALLOT_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,
}

/// Configuration values for the badge engine and its operator tools.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BALLOT")]
pub struct BadgeEngineSettings {
    /// UTC hour at which one app day ends and the next begins.
    #[ortho_config(default = 4)]
    pub rollover_hour: u32,
    /// Offset east of UTC, in minutes, used to read a vote's local hour.
    pub local_offset_minutes: Option<i32>,
    /// Number of most recent votes inspected when computing streaks.
    pub streak_lookback: Option<usize>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Pool checkout timeout in seconds.
    pub pool_timeout_secs: Option<u64>,
}

impl Default for BadgeEngineSettings {
    fn default() -> Self {
        Self {
            rollover_hour: DEFAULT_ROLLOVER_HOUR,
            local_offset_minutes: None,
            streak_lookback: None,
            database_url: None,
            pool_max_size: None,
            pool_timeout_secs: None,
        }
    }
}

impl BadgeEngineSettings {
    /// Configured rollover hour, 04:00 UTC unless overridden.
    pub fn rollover_hour(&self) -> u32 {
        self.rollover_hour
    }

    /// Configured streak lookback.
    pub fn streak_lookback(&self) -> usize {
        self.streak_lookback.unwrap_or(DEFAULT_STREAK_LOOKBACK)
    }

    /// Configured local offset in minutes, defaulting to UTC.
    pub fn local_offset_minutes(&self) -> i32 {
        self.local_offset_minutes.unwrap_or(0)
    }

    /// Validate the rule tunables.
    pub fn rule_settings(&self) -> Result<RuleSettings, SettingsError> {
        let clock = AppDayClock::new(self.rollover_hour())?;
        let streaks = StreakCalculator::new(clock, self.streak_lookback())?;
        let minutes = self.local_offset_minutes();
        let local_offset = minutes
            .checked_mul(SECONDS_PER_MINUTE)
            .and_then(FixedOffset::east_opt)
            .ok_or(SettingsError::LocalOffsetOutOfRange { minutes })?;
        Ok(RuleSettings {
            streaks,
            local_offset,
        })
    }

    /// Database URL from settings, falling back to `DATABASE_URL`.
    pub fn resolve_database_url(&self) -> Result<String, SettingsError> {
        self.database_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| env::var(DATABASE_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Pool configuration for the resolved database.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let mut config = PoolConfig::new(self.resolve_database_url()?);
        if let Some(max_size) = self.pool_max_size {
            config = config.with_max_size(max_size);
        }
        if let Some(secs) = self.pool_timeout_secs {
            config = config.with_connection_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}
