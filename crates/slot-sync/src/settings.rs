//! Run settings shared by both sync drivers.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slot_engine::schedule::{parse_timezone, QuietHours};
use slot_engine::DEFAULT_ROUNDING_UNIT_MINUTES;

use crate::calendar::CalendarFilter;
use crate::error::{Result, SyncError};

/// Longest a cached snapshot may live.
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 7;

/// Furthest ahead a run may reconcile.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Settings for full and delta sync. Every field has a default, so a partial
/// JSON document (or `{}`) deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncSettings {
    /// IANA zone used for sync days, work hours and quiet hours.
    pub timezone: String,
    pub quiet_hours: QuietHours,
    /// Number of days after today to reconcile. Weekends are skipped.
    pub horizon_days: u32,
    /// Recruiters per full sync invocation.
    pub batch_size: usize,
    pub rounding_unit_minutes: i64,
    pub lock_timeout_secs: u64,
    pub cache_ttl_hours: i64,
    pub calendar_filter: CalendarFilter,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            quiet_hours: QuietHours::default(),
            horizon_days: 14,
            batch_size: 10,
            rounding_unit_minutes: DEFAULT_ROUNDING_UNIT_MINUTES,
            lock_timeout_secs: 10,
            cache_ttl_hours: 23,
            calendar_filter: CalendarFilter::default(),
        }
    }
}

impl SyncSettings {
    /// Check the settings and resolve the timezone.
    ///
    /// # Errors
    /// Returns `SyncError::Settings` for an unknown timezone, an hour outside
    /// 0..=23, a zero batch size, a horizon beyond [`MAX_HORIZON_DAYS`], a
    /// rounding unit outside one day, or a cache TTL outside
    /// 1..=[`MAX_CACHE_TTL_HOURS`].
    pub fn validate(&self) -> Result<Tz> {
        let tz = parse_timezone(&self.timezone).map_err(|e| SyncError::Settings(e.to_string()))?;
        if self.quiet_hours.start_hour > 23 || self.quiet_hours.end_hour > 23 {
            return Err(SyncError::Settings(format!(
                "quiet hours must be within 0..=23, got {}..{}",
                self.quiet_hours.start_hour, self.quiet_hours.end_hour
            )));
        }
        if self.batch_size == 0 {
            return Err(SyncError::Settings("batch size must be positive".to_string()));
        }
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(SyncError::Settings(format!(
                "horizon must be at most {} days, got {}",
                MAX_HORIZON_DAYS, self.horizon_days
            )));
        }
        if !(1..=24 * 60).contains(&self.rounding_unit_minutes) {
            return Err(SyncError::Settings(format!(
                "rounding unit must be within 1..=1440 minutes, got {}",
                self.rounding_unit_minutes
            )));
        }
        if self.cache_ttl_hours <= 0 {
            return Err(SyncError::Settings("cache TTL must be positive".to_string()));
        }
        if self.cache_ttl_hours > MAX_CACHE_TTL_HOURS {
            return Err(SyncError::Settings(format!(
                "cache TTL must be at most {} hours, got {}",
                MAX_CACHE_TTL_HOURS, self.cache_ttl_hours
            )));
        }
        Ok(tz)
    }

    pub fn lock_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.lock_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::hours(self.cache_ttl_hours.clamp(0, MAX_CACHE_TTL_HOURS))
    }

    /// When a snapshot cached at `now` expires.
    ///
    /// # Errors
    /// Returns `SyncError::Settings` if the expiry is not representable.
    pub fn cache_expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        now.checked_add_signed(self.cache_ttl())
            .ok_or_else(|| SyncError::Settings(format!("cache expiry overflows from {}", now)))
    }
}
