//! Port traits for the collaborators a sync run talks to.
//!
//! The drivers only see these traits, so the remote scheduler, the calendar
//! API, the cache and the lock can be swapped (see [`crate::memory`] for the
//! in-process versions). Calls are blocking; a run is single-threaded.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use slot_engine::{CalendarSnapshot, ConfigRow, Slot, Span};

use crate::calendar::CalendarEvent;
use crate::error::{ProviderError, Result};

/// One page of a slot listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotPage {
    pub slots: Vec<Slot>,
    pub next_page_token: Option<String>,
}

/// One page of a calendar listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPage {
    pub events: Vec<CalendarEvent>,
    pub next_page_token: Option<String>,
}

/// Ask the scheduler to open slots of `slot_length_minutes` inside `window`
/// for every stage in `stage_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub owner_email: String,
    pub owner_id: String,
    pub window: Span,
    pub stage_ids: Vec<String>,
    pub slot_length_minutes: i64,
    pub title: String,
}

/// Source of recruiter rows.
pub trait ConfigProvider {
    /// # Errors
    /// Returns `SyncError::Config` when the source as a whole is unusable.
    /// Individual bad rows are not errors here; they are validated later.
    fn load_rows(&self) -> Result<Vec<ConfigRow>>;
}

/// The remote interview scheduler.
pub trait SlotStore {
    /// List booked and unbooked slots of a stage on a local date.
    fn list_slots_page(
        &self,
        stage_id: &str,
        date: NaiveDate,
        page_token: Option<&str>,
    ) -> std::result::Result<SlotPage, ProviderError>;

    fn create_slots(&self, request: &SlotRequest) -> std::result::Result<(), ProviderError>;

    fn delete_slot(&self, slot_id: &str) -> std::result::Result<(), ProviderError>;
}

/// The recruiters' calendar API.
pub trait CalendarProvider {
    fn list_events_page(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> std::result::Result<EventPage, ProviderError>;
}

/// Last-seen calendar state per recruiter, with expiry.
pub trait SnapshotCache {
    /// The cached snapshot, or `None` when absent or expired at `now`.
    fn get(&self, recruiter_key: &str, now: DateTime<Utc>) -> Option<CalendarSnapshot>;

    fn put(&self, recruiter_key: &str, snapshot: &CalendarSnapshot, expires_at: DateTime<Utc>);
}

/// Named mutual-exclusion token guarding the full sync.
pub trait SyncLock {
    /// Wait at most `timeout` for the lock.
    fn try_acquire(&self, timeout: Duration) -> bool;

    fn release(&self);
}

/// Persistent home of the batch cursor position.
pub trait CursorStore {
    fn load(&self) -> Option<usize>;

    fn save(&self, current_batch: usize) -> std::result::Result<(), ProviderError>;
}
