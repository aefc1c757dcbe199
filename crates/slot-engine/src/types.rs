//! Typed records shared by every engine.
//!
//! All ranges are half-open: `[start, end)`. Two ranges conflict iff
//! `a.start < b.end && a.end > b.start`, so touching ranges never conflict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open overlap test used throughout the engines.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// A bare `[start, end)` range of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Span {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whole minutes between start and end (negative when inverted).
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    /// Intersection of two spans, `None` when they do not overlap.
    pub fn clamp_to(&self, window: &Span) -> Option<Span> {
        let clamped = Span::new(self.start.max(window.start), self.end.min(window.end));
        if clamped.is_empty() {
            None
        } else {
            Some(clamped)
        }
    }
}

/// A time range during which a recruiter is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyInterval {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// A bookable (or booked) unit held by the remote scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub booked_count: u32,
    pub owner_id: String,
}

impl Slot {
    /// Booked slots are never deleted by reconciliation.
    pub fn is_booked(&self) -> bool {
        self.booked_count > 0
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Free time inside work hours that can hold at least one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBlock {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl FreeBlock {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

impl From<Span> for FreeBlock {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
            duration_minutes: span.duration_minutes(),
        }
    }
}
