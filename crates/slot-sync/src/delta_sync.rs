//! Delta sync: the frequent, cache-assisted pass that acts only on calendar
//! changes since the last snapshot.
//!
//! Runs outside quiet hours. Recruiters without a cached snapshot are left for
//! the next full sync. For everyone else the cached and current snapshots are
//! diffed; new or moved events delete conflicting slots, removed events open
//! slots in the freed work time, and the current snapshot replaces the cache.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use slot_engine::schedule::{day_span, days_spanned, local_date, sync_days, work_window};
use slot_engine::{
    detect_slot_conflicts, diff_snapshots, find_free_blocks, BusyInterval, CalendarSnapshot,
    RecruiterConfig,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ProviderError, Result};
use crate::fetch::{list_busy_intervals, list_recruiter_slots};
use crate::reconcile::{create_blocks, delete_conflicts, load_recruiters, occupied_spans, SyncServices};
use crate::report::{RunOptions, RunStatus, SyncKind, SyncReport};
use crate::settings::SyncSettings;

/// A recruiter's busy time over the sync days, as fetched right now.
struct CurrentCalendar {
    by_day: BTreeMap<NaiveDate, Vec<BusyInterval>>,
    snapshot: CalendarSnapshot,
}

pub struct DeltaSync<'a> {
    services: SyncServices<'a>,
    settings: &'a SyncSettings,
}

impl<'a> DeltaSync<'a> {
    pub fn new(services: SyncServices<'a>, settings: &'a SyncSettings) -> Self {
        Self { services, settings }
    }

    /// Run one delta sync invocation. Never fails outward; see the report.
    #[instrument(skip(self), fields(now = %options.now, force = options.force))]
    pub fn run(&self, options: RunOptions) -> SyncReport {
        let mut report = SyncReport::new(SyncKind::Delta);
        if let Err(e) = self.run_inner(options, &mut report) {
            error!(error = %e, ?report, "delta sync aborted");
            report.status = RunStatus::Failed(e.to_string());
        }
        report
    }

    fn run_inner(&self, options: RunOptions, report: &mut SyncReport) -> Result<()> {
        let tz = self.settings.validate()?;
        let expires_at = self.settings.cache_expiry(options.now)?;
        if !options.force && self.settings.quiet_hours.contains(options.now, tz) {
            info!("inside quiet hours; delta sync yields to full sync");
            report.status = RunStatus::NotDue;
            return Ok(());
        }

        let recruiters = load_recruiters(self.services.config)?;
        let days = sync_days(local_date(options.now, tz), self.settings.horizon_days);

        for recruiter in &recruiters {
            self.sync_recruiter(recruiter, &days, tz, options.now, expires_at, report);
        }

        info!(
            processed = report.recruiters_processed,
            skipped = report.recruiters_skipped,
            deleted = report.slots_deleted,
            created = report.blocks_created,
            "delta sync complete"
        );
        Ok(())
    }

    fn sync_recruiter(
        &self,
        recruiter: &RecruiterConfig,
        days: &[NaiveDate],
        tz: Tz,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        report: &mut SyncReport,
    ) {
        let current = match self.fetch_current(recruiter, days, tz) {
            Ok(current) => current,
            Err(e) => {
                warn!(recruiter = %recruiter.email, error = %e, "calendar fetch failed; skipping recruiter");
                report.recruiters_skipped += 1;
                return;
            }
        };

        let Some(cached) = self.services.cache.get(&recruiter.email, now) else {
            info!(recruiter = %recruiter.email, "no cached snapshot; leaving recruiter to full sync");
            report.recruiters_skipped += 1;
            return;
        };

        let delta = match diff_snapshots(&cached, &current.snapshot) {
            Ok(delta) => delta,
            Err(e) => {
                warn!(recruiter = %recruiter.email, error = %e, "cached snapshot unreadable; leaving recruiter to full sync");
                report.recruiters_skipped += 1;
                return;
            }
        };

        if delta.is_empty() {
            debug!(recruiter = %recruiter.email, "calendar unchanged");
        } else {
            info!(
                recruiter = %recruiter.email,
                new_or_updated = delta.new_or_updated.len(),
                deleted = delta.deleted.len(),
                "calendar changed"
            );
            self.handle_new_or_updated(recruiter, &delta.new_or_updated, tz, report);
            self.handle_deleted(recruiter, &delta.deleted, &current, tz, report);
        }

        self.services
            .cache
            .put(&recruiter.email, &current.snapshot, expires_at);
        report.snapshots_written += 1;
        report.recruiters_processed += 1;
    }

    /// Fetch busy intervals for every sync day. Any failed day fails the whole
    /// fetch: a partial snapshot would read as deletions.
    fn fetch_current(
        &self,
        recruiter: &RecruiterConfig,
        days: &[NaiveDate],
        tz: Tz,
    ) -> std::result::Result<CurrentCalendar, ProviderError> {
        let mut current = CurrentCalendar {
            by_day: BTreeMap::new(),
            snapshot: CalendarSnapshot::new(recruiter.email.clone()),
        };
        for day in days {
            // A date the zone skips entirely holds no events.
            let Some(span) = day_span(*day, tz) else {
                debug!(day = %day, "day does not exist locally; nothing to fetch");
                continue;
            };
            let busy = list_busy_intervals(
                self.services.calendar,
                &recruiter.email,
                span,
                &self.settings.calendar_filter,
                tz,
            )?;
            for interval in &busy {
                current.snapshot.insert(interval);
            }
            current.by_day.insert(*day, busy);
        }
        Ok(current)
    }

    /// Delete slots that now overlap new or moved events, day by day.
    fn handle_new_or_updated(
        &self,
        recruiter: &RecruiterConfig,
        intervals: &[BusyInterval],
        tz: Tz,
        report: &mut SyncReport,
    ) {
        let mut by_day: BTreeMap<NaiveDate, Vec<BusyInterval>> = BTreeMap::new();
        for interval in intervals {
            for day in days_spanned(&interval.span(), tz) {
                by_day.entry(day).or_default().push(interval.clone());
            }
        }

        for (day, day_intervals) in by_day {
            let slots = match list_recruiter_slots(self.services.slots, recruiter, day) {
                Ok(slots) => slots,
                Err(e) => {
                    warn!(recruiter = %recruiter.email, day = %day, error = %e, "slot listing failed; skipping day");
                    report.days_skipped += 1;
                    continue;
                }
            };
            let conflicts = detect_slot_conflicts(&recruiter.email, &slots, &day_intervals);
            delete_conflicts(self.services.slots, &conflicts, day, report);
        }
    }

    /// Open slots in time freed by removed events.
    ///
    /// The freed range is clamped to work hours and dropped if it cannot hold
    /// one slot. What remains is checked against the recruiter's current busy
    /// time and existing slots, so freed time still covered by something else
    /// is not double-booked.
    fn handle_deleted(
        &self,
        recruiter: &RecruiterConfig,
        intervals: &[BusyInterval],
        current: &CurrentCalendar,
        tz: Tz,
        report: &mut SyncReport,
    ) {
        if !recruiter.has_valid_hours() {
            return;
        }
        let policy = recruiter.block_policy(self.settings.rounding_unit_minutes, tz);

        for interval in intervals {
            for day in days_spanned(&interval.span(), tz) {
                let Some(busy_today) = current.by_day.get(&day) else {
                    debug!(recruiter = %recruiter.email, day = %day, "freed time outside sync days");
                    continue;
                };
                let Some(window) = work_window(day, recruiter.work_start, recruiter.work_end, tz) else {
                    continue;
                };
                let Some(freed) = interval.span().clamp_to(&window) else {
                    debug!(recruiter = %recruiter.email, event = %interval.id, "freed time outside work hours");
                    continue;
                };
                if freed.duration_minutes() < recruiter.slot_length_minutes {
                    debug!(recruiter = %recruiter.email, event = %interval.id, "freed time too short for a slot");
                    continue;
                }

                let existing = match list_recruiter_slots(self.services.slots, recruiter, day) {
                    Ok(slots) => slots,
                    Err(e) => {
                        warn!(recruiter = %recruiter.email, day = %day, error = %e, "slot listing failed; skipping day");
                        report.days_skipped += 1;
                        continue;
                    }
                };
                let occupied = occupied_spans(&existing, busy_today);
                let blocks = find_free_blocks(freed, &occupied, &policy);
                create_blocks(self.services.slots, recruiter, &blocks, report);
            }
        }
    }
}
