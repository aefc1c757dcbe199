//! Calendar snapshots: the last-seen busy state of one recruiter.
//!
//! The serialized form is explicit and flat so that caching is a pure mapping:
//!
//! ```json
//! {"recruiterKey":"ada@example.com","events":{"e1":{"title":"Standup","startMillis":1772442000000,"endMillis":1772443800000}}}
//! ```
//!
//! Events are keyed by id in a `BTreeMap`, which keeps the JSON stable.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::BusyInterval;

/// One cached event, times in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEvent {
    pub title: String,
    pub start_millis: i64,
    pub end_millis: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSnapshot {
    pub recruiter_key: String,
    #[serde(default)]
    pub events: BTreeMap<String, SnapshotEvent>,
}

impl CalendarSnapshot {
    pub fn new(recruiter_key: impl Into<String>) -> Self {
        Self {
            recruiter_key: recruiter_key.into(),
            events: BTreeMap::new(),
        }
    }

    /// Build a snapshot from busy intervals. A later interval with the same id
    /// replaces an earlier one.
    pub fn from_intervals<'a>(
        recruiter_key: impl Into<String>,
        intervals: impl IntoIterator<Item = &'a BusyInterval>,
    ) -> Self {
        let mut snapshot = Self::new(recruiter_key);
        for interval in intervals {
            snapshot.insert(interval);
        }
        snapshot
    }

    pub fn insert(&mut self, interval: &BusyInterval) {
        self.events.insert(
            interval.id.clone(),
            SnapshotEvent {
                title: interval.title.clone(),
                start_millis: interval.start.timestamp_millis(),
                end_millis: interval.end.timestamp_millis(),
            },
        );
    }

    pub fn remove(&mut self, id: &str) -> Option<SnapshotEvent> {
        self.events.remove(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Rehydrate all events as busy intervals, ordered by id.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidTimestamp` for millis outside chrono's range.
    pub fn intervals(&self) -> Result<Vec<BusyInterval>> {
        self.events
            .iter()
            .map(|(id, event)| event.to_interval(id))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl SnapshotEvent {
    pub fn to_interval(&self, id: &str) -> Result<BusyInterval> {
        let start = DateTime::from_timestamp_millis(self.start_millis)
            .ok_or(EngineError::InvalidTimestamp(self.start_millis))?;
        let end = DateTime::from_timestamp_millis(self.end_millis)
            .ok_or(EngineError::InvalidTimestamp(self.end_millis))?;
        Ok(BusyInterval {
            id: id.to_string(),
            title: self.title.clone(),
            start,
            end,
        })
    }

    /// Events are compared on time only; titles are informational.
    pub fn same_time(&self, other: &SnapshotEvent) -> bool {
        self.start_millis == other.start_millis && self.end_millis == other.end_millis
    }
}
