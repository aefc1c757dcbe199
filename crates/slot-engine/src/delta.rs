//! Snapshot diffing for the frequent delta pass.
//!
//! Events are matched by id. An id that is new, or whose start/end moved, is
//! reported as new-or-updated. An id that disappeared is reported as deleted,
//! meaning its time is now free. Title-only changes are invisible here.

use serde::Serialize;

use crate::error::Result;
use crate::snapshot::CalendarSnapshot;
use crate::types::BusyInterval;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDelta {
    pub new_or_updated: Vec<BusyInterval>,
    pub deleted: Vec<BusyInterval>,
}

impl CalendarDelta {
    pub fn is_empty(&self) -> bool {
        self.new_or_updated.is_empty() && self.deleted.is_empty()
    }
}

/// Diff a cached snapshot against the current one. Output is ordered by id.
///
/// # Errors
/// Returns `EngineError::InvalidTimestamp` if either snapshot holds millis
/// that cannot be represented as a `DateTime<Utc>`.
pub fn diff_snapshots(cached: &CalendarSnapshot, current: &CalendarSnapshot) -> Result<CalendarDelta> {
    let mut delta = CalendarDelta::default();

    for (id, event) in &current.events {
        let changed = match cached.events.get(id) {
            Some(previous) => !previous.same_time(event),
            None => true,
        };
        if changed {
            delta.new_or_updated.push(event.to_interval(id)?);
        }
    }

    for (id, event) in &cached.events {
        if !current.events.contains_key(id) {
            delta.deleted.push(event.to_interval(id)?);
        }
    }

    Ok(delta)
}

/// Apply a delta on top of a snapshot.
///
/// `apply_delta(p, &diff_snapshots(p, c)?)` agrees with `c` on ids and times.
pub fn apply_delta(base: &CalendarSnapshot, delta: &CalendarDelta) -> CalendarSnapshot {
    let mut next = base.clone();
    for interval in &delta.deleted {
        next.remove(&interval.id);
    }
    for interval in &delta.new_or_updated {
        next.insert(interval);
    }
    next
}
