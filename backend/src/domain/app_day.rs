//! App-day bucketing.
//!
//! Daily activity is grouped into "app days" that begin at a fixed UTC hour
//! rather than at midnight. A timestamp before the rollover hour belongs to
//! the previous calendar day's app day.

use chrono::{DateTime, NaiveTime, TimeDelta, Timelike, Utc};

/// Default rollover hour (04:00 UTC).
pub const DEFAULT_ROLLOVER_HOUR: u32 = 4;

/// Errors raised when constructing an [`AppDayClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AppDayClockError {
    /// The rollover hour was not a valid hour of the day.
    #[error("rollover hour must be within 0..=23, got {hour}")]
    RolloverHourOutOfRange { hour: u32 },
}

/// Maps instants to the start of the app day containing them.
///
/// The mapping is pure, total and monotonic: if `a <= b` then
/// `app_day_start(a) <= app_day_start(b)`.
///
/// # Examples
/// ```
/// use ballot_backend::domain::AppDayClock;
/// use chrono::{TimeZone, Utc};
///
/// let clock = AppDayClock::default();
/// let late = Utc.with_ymd_and_hms(2026, 3, 10, 3, 59, 0).unwrap();
/// let start = Utc.with_ymd_and_hms(2026, 3, 9, 4, 0, 0).unwrap();
/// assert_eq!(clock.app_day_start(late), start);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppDayClock {
    rollover: NaiveTime,
}

impl AppDayClock {
    /// Build a clock whose days roll over at `rollover_hour`:00 UTC.
    pub fn new(rollover_hour: u32) -> Result<Self, AppDayClockError> {
        let rollover = NaiveTime::from_hms_opt(rollover_hour, 0, 0).ok_or(
            AppDayClockError::RolloverHourOutOfRange {
                hour: rollover_hour,
            },
        )?;
        Ok(Self { rollover })
    }

    /// Hour of the day (UTC) at which a new app day begins.
    pub fn rollover_hour(&self) -> u32 {
        self.rollover.hour()
    }

    /// Start instant of the app day containing `at`.
    pub fn app_day_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let calendar_day = at.date_naive();
        let day = if at.time() < self.rollover {
            calendar_day.pred_opt().unwrap_or(calendar_day)
        } else {
            calendar_day
        };
        day.and_time(self.rollover).and_utc()
    }

    /// Start of the app day immediately before the one starting at `day_start`.
    pub fn previous_day(day_start: DateTime<Utc>) -> DateTime<Utc> {
        day_start - TimeDelta::days(1)
    }
}

impl Default for AppDayClock {
    fn default() -> Self {
        Self {
            rollover: NaiveTime::MIN + TimeDelta::hours(i64::from(DEFAULT_ROLLOVER_HOUR)),
        }
    }
}
