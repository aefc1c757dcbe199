//! Recruiter configuration: raw rows in, validated records out.

use std::collections::BTreeSet;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::freebusy::BlockPolicy;

/// One (recruiter, stage) row as supplied by the configuration source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRow {
    pub email: String,
    pub external_user_id: String,
    pub work_start: String,
    pub work_end: String,
    pub slot_length_minutes: i64,
    #[serde(default)]
    pub stage_ids: Vec<String>,
    #[serde(default)]
    pub slot_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecruiterConfig {
    pub email: String,
    pub external_user_id: String,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub slot_length_minutes: i64,
    pub stage_ids: BTreeSet<String>,
    pub slot_title: String,
}

/// Parse `H:MM` or `HH:MM` (optionally `HH:MM:SS`).
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| EngineError::InvalidTime(raw.to_string()))
}

impl RecruiterConfig {
    /// Validate a raw row.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidRow` for a blank email or user id, a
    /// malformed time of day, a non-positive slot length, or no stages.
    pub fn from_row(row: &ConfigRow) -> Result<Self> {
        let invalid = |reason: String| EngineError::InvalidRow {
            email: row.email.clone(),
            reason,
        };

        let email = row.email.trim();
        if email.is_empty() {
            return Err(invalid("missing email".to_string()));
        }
        let external_user_id = row.external_user_id.trim();
        if external_user_id.is_empty() {
            return Err(invalid("missing external user id".to_string()));
        }
        let work_start = parse_time_of_day(&row.work_start).map_err(|e| invalid(e.to_string()))?;
        let work_end = parse_time_of_day(&row.work_end).map_err(|e| invalid(e.to_string()))?;
        if row.slot_length_minutes <= 0 {
            return Err(invalid(format!(
                "slot length must be positive, got {}",
                row.slot_length_minutes
            )));
        }
        let stage_ids: BTreeSet<String> = row
            .stage_ids
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if stage_ids.is_empty() {
            return Err(invalid("no stage ids".to_string()));
        }

        Ok(Self {
            email: email.to_string(),
            external_user_id: external_user_id.to_string(),
            work_start,
            work_end,
            slot_length_minutes: row.slot_length_minutes,
            stage_ids,
            slot_title: row.slot_title.trim().to_string(),
        })
    }

    /// `work_start < work_end`. An invalid window yields no free time.
    pub fn has_valid_hours(&self) -> bool {
        self.work_start < self.work_end
    }

    /// Block shaping for this recruiter, with the grid on `tz`'s wall clock.
    pub fn block_policy(&self, rounding_unit_minutes: i64, tz: Tz) -> BlockPolicy {
        BlockPolicy::new(self.slot_length_minutes)
            .with_rounding_unit(rounding_unit_minutes)
            .in_timezone(tz)
    }

    /// Whether `other` describes the same schedule (hours, length, title).
    pub fn same_schedule(&self, other: &RecruiterConfig) -> bool {
        self.work_start == other.work_start
            && self.work_end == other.work_end
            && self.slot_length_minutes == other.slot_length_minutes
            && self.slot_title == other.slot_title
    }
}

/// Outcome of merging validated rows into one record per recruiter.
#[derive(Debug, Default)]
pub struct RecruiterSet {
    /// Recruiters in order of first appearance.
    pub recruiters: Vec<RecruiterConfig>,
    /// Rows that failed validation and were skipped.
    pub rejected: Vec<EngineError>,
    /// Emails whose later rows disagreed with the first row's schedule.
    pub mismatched: Vec<String>,
}

/// Validate rows and merge rows sharing an email into one recruiter.
///
/// Stage sets are unioned; hours, slot length and title come from the first
/// valid row for that email.
pub fn group_recruiters(rows: &[ConfigRow]) -> RecruiterSet {
    let mut set = RecruiterSet::default();

    for row in rows {
        let config = match RecruiterConfig::from_row(row) {
            Ok(config) => config,
            Err(e) => {
                set.rejected.push(e);
                continue;
            }
        };

        let existing = set
            .recruiters
            .iter_mut()
            .find(|r| r.email.eq_ignore_ascii_case(&config.email));
        match existing {
            Some(recruiter) => {
                if !recruiter.same_schedule(&config) && !set.mismatched.contains(&recruiter.email) {
                    set.mismatched.push(recruiter.email.clone());
                }
                recruiter.stage_ids.extend(config.stage_ids);
            }
            None => set.recruiters.push(config),
        }
    }

    set
}
