//! Day arithmetic in the recruiters' local timezone.
//!
//! All functions take explicit inputs (no system clock access); the caller
//! supplies `now` and the timezone.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::Span;

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(name.to_string()))
}

/// Hour-of-day window reserved for the full pass.
///
/// The window is `[start_hour, end_hour)` and wraps past midnight when
/// `start_hour > end_hour` (e.g. 22 → 6). Equal hours describe an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            start_hour: 22,
            end_hour: 6,
        }
    }
}

impl QuietHours {
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Whether `now`, read in `tz`, falls inside the window.
    pub fn contains(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        self.contains_hour(now.with_timezone(&tz).hour())
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Today plus `horizon_days` following days, weekends skipped.
pub fn sync_days(today: NaiveDate, horizon_days: u32) -> Vec<NaiveDate> {
    today
        .iter_days()
        .take(horizon_days as usize + 1)
        .filter(|date| !is_weekend(*date))
        .collect()
}

/// The local calendar date of `now` in `tz`.
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Resolve a local wall-clock time to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times in a DST
/// gap do not exist and yield `None`.
pub fn local_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The first instant of `date` in `tz`.
///
/// Usually local midnight. Where midnight falls in a DST gap the day begins
/// at the first wall-clock time after the gap. A date skipped entirely by a
/// zone change yields `None`.
pub fn day_start(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let step = Duration::minutes(DAY_START_STEP_MINUTES);
    let mut time = date.and_time(NaiveTime::MIN);
    while time.date() == date {
        if let Some(dt) = tz.from_local_datetime(&time).earliest() {
            return Some(dt.with_timezone(&Utc));
        }
        time += step;
    }
    None
}

/// Zone offsets move in whole quarter hours.
const DAY_START_STEP_MINUTES: i64 = 15;

/// The first instant of `date` to the first instant of the next day.
pub fn day_span(date: NaiveDate, tz: Tz) -> Option<Span> {
    let next = date.succ_opt()?;
    let start = day_start(date, tz)?;
    let end = day_start(next, tz)?;
    Some(Span::new(start, end))
}

/// The work-hours window of one recruiter on one day.
///
/// The returned span may be empty or inverted if the configured hours are;
/// interval calculus treats such a window as holding no free time.
pub fn work_window(date: NaiveDate, work_start: NaiveTime, work_end: NaiveTime, tz: Tz) -> Option<Span> {
    let start = local_instant(date, work_start, tz)?;
    let end = local_instant(date, work_end, tz)?;
    Some(Span::new(start, end))
}

/// Every local date that `[start, end)` touches.
pub fn days_spanned(span: &Span, tz: Tz) -> Vec<NaiveDate> {
    let first = local_date(span.start, tz);
    if span.is_empty() {
        return vec![first];
    }
    // End is exclusive: an event ending exactly at midnight does not touch the next day.
    let last = local_date(span.end - Duration::nanoseconds(1), tz);
    first
        .iter_days()
        .take_while(|date| *date <= last)
        .collect()
}
