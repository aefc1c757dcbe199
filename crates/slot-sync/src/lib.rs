//! # slot-sync
//!
//! Keeps interview slots in step with recruiter calendars.
//!
//! Two drivers share one set of collaborator ports:
//!
//! - [`FullSync`] runs during quiet hours under a lock, reconciles one batch
//!   of recruiters across the sync days, and primes the snapshot cache.
//! - [`DeltaSync`] runs the rest of the day, diffs each recruiter's calendar
//!   against the cached snapshot, and acts only on what changed.
//!
//! Decisions (what to delete, what to open) come from `slot-engine`; this
//! crate fetches, filters, logs and applies them.
//!
//! ## Modules
//!
//! - [`ports`] — Collaborator traits (config, slot store, calendar, cache, lock, cursor)
//! - [`calendar`] — Calendar event model and the busy-time filter
//! - [`fetch`] — Paginated listings and the per-day stage slot cache
//! - [`full_sync`] / [`delta_sync`] — The two drivers
//! - [`reconcile`] — Steps both drivers share
//! - [`report`] — Run options and run reports
//! - [`settings`] — Run settings with defaults
//! - [`memory`] — In-process collaborators
//! - [`lock`] — Lock guard
//! - [`error`] — Error types

pub mod calendar;
pub mod delta_sync;
pub mod error;
pub mod fetch;
pub mod full_sync;
pub mod lock;
pub mod memory;
pub mod ports;
pub mod reconcile;
pub mod report;
pub mod settings;

pub use calendar::{CalendarEvent, CalendarFilter, EventTime, ResponseStatus};
pub use delta_sync::DeltaSync;
pub use error::{ProviderError, SyncError};
pub use full_sync::FullSync;
pub use memory::{MemoryBackend, StoredSlot, SyncState};
pub use ports::{
    CalendarProvider, ConfigProvider, CursorStore, EventPage, SlotPage, SlotRequest, SlotStore,
    SnapshotCache, SyncLock,
};
pub use reconcile::SyncServices;
pub use report::{RunOptions, RunStatus, SyncKind, SyncReport};
pub use settings::SyncSettings;
