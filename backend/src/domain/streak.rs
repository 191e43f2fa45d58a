//! Consecutive app-day streaks.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::AppDayClock;

/// Longest streak any badge requires.
pub const HIGHEST_STREAK_THRESHOLD: u32 = 30;

/// Default number of most-recent votes inspected when computing a streak.
pub const DEFAULT_STREAK_LOOKBACK: usize = 80;

/// Errors raised when constructing a [`StreakCalculator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreakCalculatorError {
    /// The lookback could truncate a streak below the highest badge threshold.
    #[error("streak lookback must cover at least {minimum} votes, got {lookback}")]
    LookbackTooShort { lookback: usize, minimum: usize },
}

/// Counts consecutive app days, ending today, on which a user voted.
///
/// The walk is greedy and backward looking: the cursor starts at today's app
/// day and must match immediately, so a user who has not voted today has a
/// streak of zero regardless of earlier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakCalculator {
    clock: AppDayClock,
    lookback: usize,
}

impl StreakCalculator {
    /// Build a calculator that inspects at most `lookback` recent votes.
    pub fn new(clock: AppDayClock, lookback: usize) -> Result<Self, StreakCalculatorError> {
        let minimum = HIGHEST_STREAK_THRESHOLD as usize;
        if lookback < minimum {
            return Err(StreakCalculatorError::LookbackTooShort { lookback, minimum });
        }
        Ok(Self { clock, lookback })
    }

    /// Maximum number of recent votes callers need to fetch.
    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// App-day clock used for bucketing.
    pub fn app_day_clock(&self) -> AppDayClock {
        self.clock
    }

    /// Current streak length for the given vote timestamps.
    ///
    /// Timestamps may arrive in any order and may share an app day.
    pub fn current_streak<I>(&self, vote_times: I, now: DateTime<Utc>) -> u32
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let days: BTreeSet<DateTime<Utc>> = vote_times
            .into_iter()
            .map(|at| self.clock.app_day_start(at))
            .collect();

        let mut cursor = self.clock.app_day_start(now);
        let mut streak = 0_u32;
        for day in days.into_iter().rev() {
            if day != cursor {
                break;
            }
            streak = streak.saturating_add(1);
            cursor = AppDayClock::previous_day(cursor);
        }
        streak
    }
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self {
            clock: AppDayClock::default(),
            lookback: DEFAULT_STREAK_LOOKBACK,
        }
    }
}
