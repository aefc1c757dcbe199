//! Steps shared by the full and delta drivers: loading recruiters and acting
//! on engine decisions against the slot store.

use chrono::NaiveDate;
use slot_engine::{
    group_recruiters, BusyInterval, ConflictReport, FreeBlock, RecruiterConfig, Slot, Span,
};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ports::{
    CalendarProvider, ConfigProvider, CursorStore, SlotRequest, SlotStore, SnapshotCache, SyncLock,
};
use crate::report::SyncReport;

/// The collaborators one run talks to.
#[derive(Clone, Copy)]
pub struct SyncServices<'a> {
    pub config: &'a dyn ConfigProvider,
    pub slots: &'a dyn SlotStore,
    pub calendar: &'a dyn CalendarProvider,
    pub cache: &'a dyn SnapshotCache,
    pub lock: &'a dyn SyncLock,
    pub cursor: &'a dyn CursorStore,
}

/// Load, validate and merge recruiter rows. Bad rows are skipped with a warning.
///
/// # Errors
/// Propagates `SyncError::Config` from the provider; nothing else fails here.
pub fn load_recruiters(config: &dyn ConfigProvider) -> Result<Vec<RecruiterConfig>> {
    let rows = config.load_rows()?;
    let set = group_recruiters(&rows);

    for rejected in &set.rejected {
        warn!(error = %rejected, "skipping recruiter row");
    }
    for email in &set.mismatched {
        warn!(recruiter = %email, "rows disagree on schedule; using the first row");
    }
    for recruiter in set.recruiters.iter().filter(|r| !r.has_valid_hours()) {
        warn!(
            recruiter = %recruiter.email,
            work_start = %recruiter.work_start,
            work_end = %recruiter.work_end,
            "work hours do not form a window; no slots will be opened"
        );
    }

    info!(
        rows = rows.len(),
        recruiters = set.recruiters.len(),
        rejected = set.rejected.len(),
        "recruiter configuration loaded"
    );
    Ok(set.recruiters)
}

/// Delete every slot the detector flagged. Failures are counted, not retried.
pub fn delete_conflicts(
    store: &dyn SlotStore,
    conflicts: &ConflictReport,
    day: NaiveDate,
    report: &mut SyncReport,
) {
    for conflict in &conflicts.slots_to_delete {
        debug!(
            recruiter = %conflicts.organizer,
            day = %day,
            slot_id = %conflict.slot.id,
            interval_id = %conflict.interval_id,
            interval_title = %conflict.interval_title,
            "deleting slot that overlaps busy time"
        );
        match store.delete_slot(&conflict.slot.id) {
            Ok(()) => report.slots_deleted += 1,
            Err(e) => {
                warn!(slot_id = %conflict.slot.id, error = %e, "slot deletion failed");
                report.delete_failures += 1;
            }
        }
    }
}

/// Ask the store to open slots in each free block, across all of the
/// recruiter's stages.
pub fn create_blocks(
    store: &dyn SlotStore,
    recruiter: &RecruiterConfig,
    blocks: &[FreeBlock],
    report: &mut SyncReport,
) {
    for block in blocks {
        let request = SlotRequest {
            owner_email: recruiter.email.clone(),
            owner_id: recruiter.external_user_id.clone(),
            window: block.span(),
            stage_ids: recruiter.stage_ids.iter().cloned().collect(),
            slot_length_minutes: recruiter.slot_length_minutes,
            title: recruiter.slot_title.clone(),
        };
        debug!(
            recruiter = %recruiter.email,
            start = %block.start,
            end = %block.end,
            "opening slots in free block"
        );
        match store.create_slots(&request) {
            Ok(()) => report.blocks_created += 1,
            Err(e) => {
                warn!(recruiter = %recruiter.email, start = %block.start, error = %e, "slot creation failed");
                report.create_failures += 1;
            }
        }
    }
}

/// Everything that blocks new slots: existing slots plus busy time.
pub fn occupied_spans(slots: &[Slot], busy: &[BusyInterval]) -> Vec<Span> {
    slots
        .iter()
        .map(Slot::span)
        .chain(busy.iter().map(BusyInterval::span))
        .collect()
}
