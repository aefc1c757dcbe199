//! In-process collaborators.
//!
//! These back the `slotsync` offline runner and the test suite. They keep
//! their state in `RefCell`s (a run is single-threaded), paginate like the
//! remote APIs do, and can be told to fail specific calls.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slot_engine::schedule::local_date;
use slot_engine::{CalendarSnapshot, ConfigRow, Slot, Span};

use crate::calendar::CalendarEvent;
use crate::error::{ProviderError, Result, SyncError};
use crate::ports::{
    CalendarProvider, ConfigProvider, CursorStore, EventPage, SlotPage, SlotRequest, SlotStore,
    SnapshotCache, SyncLock,
};
use crate::reconcile::SyncServices;

const DEFAULT_PAGE_SIZE: usize = 50;

/// Decode an offset page token. `None` means the first page.
fn page_offset(token: Option<&str>) -> std::result::Result<usize, ProviderError> {
    match token {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| ProviderError::Payload(format!("bad page token: {}", raw))),
    }
}

fn page<T: Clone>(items: &[T], offset: usize, size: usize) -> (Vec<T>, Option<String>) {
    let end = offset.saturating_add(size).min(items.len());
    let chunk = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
    let next = (end < items.len()).then(|| end.to_string());
    (chunk, next)
}

// ── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryConfig {
    rows: RefCell<Vec<ConfigRow>>,
    broken: RefCell<Option<String>>,
}

impl MemoryConfig {
    pub fn new(rows: Vec<ConfigRow>) -> Self {
        Self {
            rows: RefCell::new(rows),
            broken: RefCell::new(None),
        }
    }

    pub fn rows(&self) -> Vec<ConfigRow> {
        self.rows.borrow().clone()
    }

    /// Make every load fail as if the source were unreadable.
    pub fn break_source(&self, reason: &str) {
        *self.broken.borrow_mut() = Some(reason.to_string());
    }
}

impl ConfigProvider for MemoryConfig {
    fn load_rows(&self) -> Result<Vec<ConfigRow>> {
        if let Some(reason) = self.broken.borrow().as_ref() {
            return Err(SyncError::Config(reason.clone()));
        }
        Ok(self.rows())
    }
}

// ── Slot store ──────────────────────────────────────────────────────────────

/// A slot as the remote scheduler stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSlot {
    pub id: String,
    pub stage_id: String,
    pub owner_id: String,
    #[serde(default)]
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub booked_count: u32,
}

impl StoredSlot {
    pub fn to_slot(&self) -> Slot {
        Slot {
            id: self.id.clone(),
            start: self.start,
            end: self.end,
            booked_count: self.booked_count,
            owner_id: self.owner_id.clone(),
        }
    }
}

#[derive(Debug)]
pub struct MemorySlotStore {
    tz: Tz,
    page_size: usize,
    slots: RefCell<Vec<StoredSlot>>,
    next_id: Cell<u64>,
    failing_stages: RefCell<HashSet<String>>,
    fail_creates: Cell<bool>,
    fail_deletes: Cell<bool>,
    calls: RefCell<Vec<String>>,
}

impl MemorySlotStore {
    pub fn new(tz: Tz, slots: Vec<StoredSlot>) -> Self {
        Self {
            tz,
            page_size: DEFAULT_PAGE_SIZE,
            next_id: Cell::new(slots.len() as u64 + 1),
            slots: RefCell::new(slots),
            failing_stages: RefCell::new(HashSet::new()),
            fail_creates: Cell::new(false),
            fail_deletes: Cell::new(false),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn slots(&self) -> Vec<StoredSlot> {
        self.slots.borrow().clone()
    }

    /// Log of calls made, e.g. `list st-1 2026-03-02`, `create ...`, `delete slot-3`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn fail_listing(&self, stage_id: &str) {
        self.failing_stages.borrow_mut().insert(stage_id.to_string());
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.set(fail);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.set(fail);
    }

    fn fresh_id(&self) -> String {
        let slots = self.slots.borrow();
        loop {
            let n = self.next_id.get();
            self.next_id.set(n + 1);
            let id = format!("slot-{}", n);
            if !slots.iter().any(|s| s.id == id) {
                return id;
            }
        }
    }
}

impl SlotStore for MemorySlotStore {
    fn list_slots_page(
        &self,
        stage_id: &str,
        date: NaiveDate,
        page_token: Option<&str>,
    ) -> std::result::Result<SlotPage, ProviderError> {
        self.calls
            .borrow_mut()
            .push(format!("list {} {}", stage_id, date));
        if self.failing_stages.borrow().contains(stage_id) {
            return Err(ProviderError::Status {
                code: 503,
                message: format!("stage {} unavailable", stage_id),
            });
        }

        let offset = page_offset(page_token)?;
        let mut matching: Vec<Slot> = self
            .slots
            .borrow()
            .iter()
            .filter(|s| s.stage_id == stage_id && local_date(s.start, self.tz) == date)
            .map(StoredSlot::to_slot)
            .collect();
        matching.sort_by(|a, b| (a.start, &a.id).cmp(&(b.start, &b.id)));

        let (slots, next_page_token) = page(&matching, offset, self.page_size);
        Ok(SlotPage {
            slots,
            next_page_token,
        })
    }

    fn create_slots(&self, request: &SlotRequest) -> std::result::Result<(), ProviderError> {
        self.calls.borrow_mut().push(format!(
            "create {} {}..{}",
            request.owner_email,
            request.window.start.to_rfc3339(),
            request.window.end.to_rfc3339()
        ));
        if self.fail_creates.get() {
            return Err(ProviderError::Status {
                code: 500,
                message: "create rejected".to_string(),
            });
        }
        if request.slot_length_minutes <= 0 {
            return Err(ProviderError::Status {
                code: 400,
                message: "slot length must be positive".to_string(),
            });
        }

        let length = chrono::Duration::minutes(request.slot_length_minutes);
        let mut created = Vec::new();
        for stage_id in &request.stage_ids {
            let mut start = request.window.start;
            while start + length <= request.window.end {
                created.push(StoredSlot {
                    id: self.fresh_id(),
                    stage_id: stage_id.clone(),
                    owner_id: request.owner_id.clone(),
                    title: request.title.clone(),
                    start,
                    end: start + length,
                    booked_count: 0,
                });
                start += length;
            }
        }
        self.slots.borrow_mut().extend(created);
        Ok(())
    }

    fn delete_slot(&self, slot_id: &str) -> std::result::Result<(), ProviderError> {
        self.calls.borrow_mut().push(format!("delete {}", slot_id));
        if self.fail_deletes.get() {
            return Err(ProviderError::Status {
                code: 500,
                message: "delete rejected".to_string(),
            });
        }
        let mut slots = self.slots.borrow_mut();
        let before = slots.len();
        slots.retain(|s| s.id != slot_id);
        if slots.len() == before {
            return Err(ProviderError::Status {
                code: 404,
                message: format!("slot {} not found", slot_id),
            });
        }
        Ok(())
    }
}

// ── Calendar ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MemoryCalendar {
    tz: Tz,
    page_size: usize,
    events: RefCell<BTreeMap<String, Vec<CalendarEvent>>>,
    failing: RefCell<HashSet<String>>,
}

impl MemoryCalendar {
    pub fn new(tz: Tz, events: BTreeMap<String, Vec<CalendarEvent>>) -> Self {
        Self {
            tz,
            page_size: DEFAULT_PAGE_SIZE,
            events: RefCell::new(events),
            failing: RefCell::new(HashSet::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn events(&self) -> BTreeMap<String, Vec<CalendarEvent>> {
        self.events.borrow().clone()
    }

    pub fn set_events(&self, calendar_id: &str, events: Vec<CalendarEvent>) {
        self.events
            .borrow_mut()
            .insert(calendar_id.to_string(), events);
    }

    pub fn fail_calendar(&self, calendar_id: &str, fail: bool) {
        let mut failing = self.failing.borrow_mut();
        if fail {
            failing.insert(calendar_id.to_string());
        } else {
            failing.remove(calendar_id);
        }
    }
}

impl CalendarProvider for MemoryCalendar {
    fn list_events_page(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> std::result::Result<EventPage, ProviderError> {
        if self.failing.borrow().contains(calendar_id) {
            return Err(ProviderError::Unavailable(format!(
                "calendar {} unreachable",
                calendar_id
            )));
        }
        let offset = page_offset(page_token)?;
        let window = Span::new(start, end);
        let matching: Vec<CalendarEvent> = self
            .events
            .borrow()
            .get(calendar_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| match e.start.resolve(self.tz) {
                        // Malformed end times are left for the filter to reject.
                        Some(from) => match e.end.resolve(self.tz) {
                            Some(to) if to > from => Span::new(from, to).overlaps(&window),
                            _ => from >= start && from < end,
                        },
                        None => false,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let (events, next_page_token) = page(&matching, offset, self.page_size);
        Ok(EventPage {
            events,
            next_page_token,
        })
    }
}

// ── Snapshot cache ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSnapshot {
    pub snapshot: CalendarSnapshot,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<BTreeMap<String, CachedSnapshot>>,
}

impl MemoryCache {
    pub fn new(entries: BTreeMap<String, CachedSnapshot>) -> Self {
        Self {
            entries: RefCell::new(entries),
        }
    }

    pub fn entries(&self) -> BTreeMap<String, CachedSnapshot> {
        self.entries.borrow().clone()
    }
}

impl SnapshotCache for MemoryCache {
    fn get(&self, recruiter_key: &str, now: DateTime<Utc>) -> Option<CalendarSnapshot> {
        self.entries
            .borrow()
            .get(recruiter_key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.snapshot.clone())
    }

    fn put(&self, recruiter_key: &str, snapshot: &CalendarSnapshot, expires_at: DateTime<Utc>) {
        self.entries.borrow_mut().insert(
            recruiter_key.to_string(),
            CachedSnapshot {
                snapshot: snapshot.clone(),
                expires_at,
            },
        );
    }
}

// ── Lock ────────────────────────────────────────────────────────────────────

/// A process-local lock. It never blocks: a held lock fails immediately,
/// which is what a bounded wait degrades to on a single thread.
#[derive(Debug, Default)]
pub struct MemoryLock {
    held: Cell<bool>,
    acquisitions: Cell<usize>,
}

impl MemoryLock {
    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.get()
    }
}

impl SyncLock for MemoryLock {
    fn try_acquire(&self, _timeout: Duration) -> bool {
        if self.held.get() {
            return false;
        }
        self.held.set(true);
        self.acquisitions.set(self.acquisitions.get() + 1);
        true
    }

    fn release(&self) {
        self.held.set(false);
    }
}

// ── Cursor store ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    batch: Cell<Option<usize>>,
    fail_saves: Cell<bool>,
}

impl MemoryCursorStore {
    pub fn new(batch: Option<usize>) -> Self {
        Self {
            batch: Cell::new(batch),
            fail_saves: Cell::new(false),
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self) -> Option<usize> {
        self.batch.get()
    }

    fn save(&self, current_batch: usize) -> std::result::Result<(), ProviderError> {
        if self.fail_saves.get() {
            return Err(ProviderError::Unavailable("property store offline".to_string()));
        }
        self.batch.set(Some(current_batch));
        Ok(())
    }
}

// ── Whole-state bundle ──────────────────────────────────────────────────────

/// Everything the collaborators hold, in one serializable document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncState {
    pub recruiters: Vec<ConfigRow>,
    /// Calendar events keyed by calendar id (the recruiter's email).
    pub calendars: BTreeMap<String, Vec<CalendarEvent>>,
    pub slots: Vec<StoredSlot>,
    pub snapshots: BTreeMap<String, CachedSnapshot>,
    pub cursor: Option<usize>,
}

/// One of each in-memory collaborator.
#[derive(Debug)]
pub struct MemoryBackend {
    pub config: MemoryConfig,
    pub slots: MemorySlotStore,
    pub calendar: MemoryCalendar,
    pub cache: MemoryCache,
    pub lock: MemoryLock,
    pub cursor: MemoryCursorStore,
}

impl MemoryBackend {
    pub fn from_state(state: SyncState, tz: Tz) -> Self {
        Self {
            config: MemoryConfig::new(state.recruiters),
            slots: MemorySlotStore::new(tz, state.slots),
            calendar: MemoryCalendar::new(tz, state.calendars),
            cache: MemoryCache::new(state.snapshots),
            lock: MemoryLock::default(),
            cursor: MemoryCursorStore::new(state.cursor),
        }
    }

    pub fn to_state(&self) -> SyncState {
        SyncState {
            recruiters: self.config.rows(),
            calendars: self.calendar.events(),
            slots: self.slots.slots(),
            snapshots: self.cache.entries(),
            cursor: self.cursor.load(),
        }
    }

    pub fn services(&self) -> SyncServices<'_> {
        SyncServices {
            config: &self.config,
            slots: &self.slots,
            calendar: &self.calendar,
            cache: &self.cache,
            lock: &self.lock,
            cursor: &self.cursor,
        }
    }
}
