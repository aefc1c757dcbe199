//! Full sync: the nightly, authoritative reconciliation of one recruiter batch.
//!
//! ```text
//! LockAcquire → QuietHoursGate → LoadConfig → SelectBatch
//!   → for each sync day: build stage slot cache, reconcile each recruiter
//!   → PrimeCache → AdvanceBatch → LockRelease
//! ```
//!
//! The lock is held by a guard and released on every exit. The cursor only
//! advances when the batch finished without a top-level failure.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use slot_engine::schedule::{day_span, local_date, sync_days, work_window};
use slot_engine::{
    detect_slot_conflicts, find_free_blocks, BatchCursor, CalendarSnapshot, RecruiterConfig, Span,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;
use crate::fetch::{list_busy_intervals, StageSlotCache};
use crate::lock::LockGuard;
use crate::reconcile::{create_blocks, delete_conflicts, load_recruiters, occupied_spans, SyncServices};
use crate::report::{RunOptions, RunStatus, SyncKind, SyncReport};
use crate::settings::SyncSettings;

/// One sync day, shared by every recruiter in the batch.
struct SyncDay<'c> {
    date: NaiveDate,
    span: Span,
    tz: Tz,
    stages: &'c StageSlotCache,
}

/// Snapshot being accumulated for one recruiter over the sync days.
struct PendingSnapshot {
    snapshot: CalendarSnapshot,
    /// False once any day's calendar fetch failed; an incomplete snapshot is
    /// never cached.
    complete: bool,
}

pub struct FullSync<'a> {
    services: SyncServices<'a>,
    settings: &'a SyncSettings,
}

impl<'a> FullSync<'a> {
    pub fn new(services: SyncServices<'a>, settings: &'a SyncSettings) -> Self {
        Self { services, settings }
    }

    /// Run one full sync invocation. Never fails outward; see the report.
    #[instrument(skip(self), fields(now = %options.now, force = options.force))]
    pub fn run(&self, options: RunOptions) -> SyncReport {
        let mut report = SyncReport::new(SyncKind::Full);

        let Some(_guard) = LockGuard::acquire(self.services.lock, self.settings.lock_timeout()) else {
            warn!("another full sync holds the lock; skipping this run");
            report.status = RunStatus::SkippedLocked;
            return report;
        };

        if let Err(e) = self.run_locked(options, &mut report) {
            error!(error = %e, ?report, "full sync aborted");
            report.status = RunStatus::Failed(e.to_string());
        }
        report
    }

    fn run_locked(&self, options: RunOptions, report: &mut SyncReport) -> Result<()> {
        let tz = self.settings.validate()?;
        let expires_at = self.settings.cache_expiry(options.now)?;
        if !options.force && !self.settings.quiet_hours.contains(options.now, tz) {
            info!(
                quiet_start = self.settings.quiet_hours.start_hour,
                quiet_end = self.settings.quiet_hours.end_hour,
                "outside quiet hours; full sync not due"
            );
            report.status = RunStatus::NotDue;
            return Ok(());
        }

        let recruiters = load_recruiters(self.services.config)?;
        let cursor = BatchCursor::resume(
            self.services.cursor.load(),
            recruiters.len(),
            self.settings.batch_size,
        )?;
        report.cursor = Some(cursor);
        let batch = cursor.select(&recruiters);
        info!(
            batch = cursor.current_batch,
            total_batches = cursor.total_batches,
            recruiters = batch.len(),
            "full sync batch selected"
        );

        let days = sync_days(local_date(options.now, tz), self.settings.horizon_days);
        let mut pending: Vec<PendingSnapshot> = batch
            .iter()
            .map(|r| PendingSnapshot {
                snapshot: CalendarSnapshot::new(r.email.clone()),
                complete: true,
            })
            .collect();

        for day in &days {
            let Some(span) = day_span(*day, tz) else {
                debug!(day = %day, "day does not exist locally; skipping");
                continue;
            };
            let stage_cache =
                StageSlotCache::build(self.services.slots, batch.iter().flat_map(|r| &r.stage_ids), *day);
            debug!(day = %day, stages = stage_cache.stage_count(), "stage slot cache built");

            let sync_day = SyncDay {
                date: *day,
                span,
                tz,
                stages: &stage_cache,
            };
            for (recruiter, snapshot) in batch.iter().zip(pending.iter_mut()) {
                self.reconcile_day(recruiter, &sync_day, snapshot, report);
            }
        }
        report.recruiters_processed = batch.len();

        self.prime_cache(&pending, expires_at, report);

        let next = cursor.advanced();
        self.services.cursor.save(next.current_batch)?;
        info!(
            next_batch = next.current_batch,
            deleted = report.slots_deleted,
            created = report.blocks_created,
            "full sync batch complete"
        );
        Ok(())
    }

    /// Reconcile one recruiter on one day: delete conflicting slots, then open
    /// slots in whatever free time remains.
    fn reconcile_day(
        &self,
        recruiter: &RecruiterConfig,
        sync_day: &SyncDay<'_>,
        pending: &mut PendingSnapshot,
        report: &mut SyncReport,
    ) {
        let SyncDay {
            date: day,
            span,
            tz,
            stages,
        } = *sync_day;
        let busy = match list_busy_intervals(
            self.services.calendar,
            &recruiter.email,
            span,
            &self.settings.calendar_filter,
            tz,
        ) {
            Ok(busy) => busy,
            Err(e) => {
                warn!(recruiter = %recruiter.email, day = %day, error = %e, "calendar fetch failed; skipping day");
                pending.complete = false;
                report.days_skipped += 1;
                return;
            }
        };
        for interval in &busy {
            pending.snapshot.insert(interval);
        }

        let Some(slots) = stages.slots_for(recruiter) else {
            warn!(recruiter = %recruiter.email, day = %day, "slot listing incomplete; skipping day");
            report.days_skipped += 1;
            return;
        };

        let conflicts = detect_slot_conflicts(&recruiter.email, &slots, &busy);
        delete_conflicts(self.services.slots, &conflicts, day, report);

        if !recruiter.has_valid_hours() {
            return;
        }
        let Some(window) = work_window(day, recruiter.work_start, recruiter.work_end, tz) else {
            warn!(recruiter = %recruiter.email, day = %day, "work hours fall in a DST gap; skipping day");
            return;
        };
        let occupied = occupied_spans(&conflicts.safe_slots, &busy);
        let policy = recruiter.block_policy(self.settings.rounding_unit_minutes, tz);
        let blocks = find_free_blocks(window, &occupied, &policy);
        debug!(
            recruiter = %recruiter.email,
            day = %day,
            slots = slots.len(),
            busy = busy.len(),
            conflicts = conflicts.slots_to_delete.len(),
            free_blocks = blocks.len(),
            "recruiter day reconciled"
        );
        create_blocks(self.services.slots, recruiter, &blocks, report);
    }

    fn prime_cache(&self, pending: &[PendingSnapshot], expires_at: DateTime<Utc>, report: &mut SyncReport) {
        for entry in pending {
            if !entry.complete {
                warn!(recruiter = %entry.snapshot.recruiter_key, "calendar snapshot incomplete; not cached");
                continue;
            }
            self.services
                .cache
                .put(&entry.snapshot.recruiter_key, &entry.snapshot, expires_at);
            report.snapshots_written += 1;
        }
    }
}
