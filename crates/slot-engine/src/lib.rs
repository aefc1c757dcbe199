//! # slot-engine
//!
//! Deterministic availability reconciliation for interview scheduling.
//!
//! The engine decides which open interview slots must go because a recruiter
//! is busy, and which free time should be opened as new slots. Every function
//! here is pure: no I/O, no logging, no clock. The orchestrator in `slot-sync`
//! feeds it fetched data and acts on its decisions.
//!
//! ## Modules
//!
//! - [`freebusy`] — Work-hours window + busy ranges → free blocks (with quantization)
//! - [`conflict`] — Existing slots + busy intervals → slots to delete / safe slots
//! - [`delta`] — Cached snapshot + current snapshot → new-or-updated / deleted events
//! - [`snapshot`] — Calendar snapshot model and its JSON form
//! - [`cursor`] — Batch cursor over the recruiter fleet
//! - [`schedule`] — Local-day arithmetic, sync days, quiet hours
//! - [`recruiter`] — Recruiter row validation and merging
//! - [`types`] — Shared records (`Span`, `BusyInterval`, `Slot`, `FreeBlock`)
//! - [`error`] — Error types

pub mod conflict;
pub mod cursor;
pub mod delta;
pub mod error;
pub mod freebusy;
pub mod recruiter;
pub mod schedule;
pub mod snapshot;
pub mod types;

pub use conflict::{detect_slot_conflicts, ConflictReport, SlotConflict};
pub use cursor::BatchCursor;
pub use delta::{apply_delta, diff_snapshots, CalendarDelta};
pub use error::EngineError;
pub use freebusy::{find_free_blocks, BlockPolicy, DEFAULT_ROUNDING_UNIT_MINUTES};
pub use recruiter::{group_recruiters, ConfigRow, RecruiterConfig, RecruiterSet};
pub use schedule::QuietHours;
pub use snapshot::{CalendarSnapshot, SnapshotEvent};
pub use types::{overlaps, BusyInterval, FreeBlock, Slot, Span};
