//! Interval calculus: turn a work-hours window and a set of busy ranges into
//! bookable free blocks.
//!
//! Busy ranges are sorted by start time and subtracted, one at a time, from a
//! working set of free candidates that starts out as the whole window. Each
//! subtraction splits an overlapped candidate into at most two pieces (before
//! and after the busy range). Surviving candidates are optionally snapped to a
//! rounding grid and finally filtered by the minimum slot length.
//!
//! The grid is laid out in the policy's local time, so half-hour slots start
//! at :00 and :30 on the wall clock even in zones offset by :45 or :30.

use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::types::{FreeBlock, Span};

/// Rounding unit used by the reference scheduling policy.
pub const DEFAULT_ROUNDING_UNIT_MINUTES: i64 = 30;

/// How free candidates are shaped into bookable blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPolicy {
    /// Minimum block duration; also the recruiter's slot length.
    pub slot_length_minutes: i64,
    /// Grid unit for quantization. Quantization only happens when the slot
    /// length equals this unit exactly.
    pub rounding_unit_minutes: i64,
    /// Zone whose wall clock the grid follows.
    pub timezone: Tz,
}

impl BlockPolicy {
    pub fn new(slot_length_minutes: i64) -> Self {
        Self {
            slot_length_minutes,
            rounding_unit_minutes: DEFAULT_ROUNDING_UNIT_MINUTES,
            timezone: Tz::UTC,
        }
    }

    pub fn with_rounding_unit(mut self, rounding_unit_minutes: i64) -> Self {
        self.rounding_unit_minutes = rounding_unit_minutes;
        self
    }

    pub fn in_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Whether blocks are snapped to the rounding grid under this policy.
    pub fn quantizes(&self) -> bool {
        self.rounding_unit_minutes > 0 && self.slot_length_minutes == self.rounding_unit_minutes
    }
}

/// Subtract `busy` from `candidate`, yielding the surviving pieces in order.
///
/// A candidate untouched by the busy range passes through unchanged.
fn subtract(candidate: Span, busy: &Span) -> Vec<Span> {
    if !candidate.overlaps(busy) {
        return vec![candidate];
    }

    let mut pieces = Vec::with_capacity(2);
    if candidate.start < busy.start {
        pieces.push(Span::new(candidate.start, busy.start));
    }
    if busy.end < candidate.end {
        pieces.push(Span::new(busy.end, candidate.end));
    }
    pieces
}

/// Seconds `tz` is ahead of UTC at `instant`.
fn utc_offset_secs(instant: DateTime<Utc>, tz: Tz) -> i64 {
    i64::from(tz.offset_from_utc_datetime(&instant.naive_utc()).fix().local_minus_utc())
}

/// Round an instant up to the next local wall-clock multiple of `unit_minutes`.
fn round_up(instant: DateTime<Utc>, unit_minutes: i64, tz: Tz) -> Option<DateTime<Utc>> {
    let unit_secs = unit_minutes * 60;
    let offset = utc_offset_secs(instant, tz);
    let local = instant.timestamp() + offset;
    let rem = local.rem_euclid(unit_secs);
    let aligned = if rem == 0 && instant.timestamp_subsec_nanos() == 0 {
        local
    } else {
        local - rem + unit_secs
    };
    DateTime::from_timestamp(aligned - offset, 0)
}

/// Round an instant down to the previous local wall-clock multiple of `unit_minutes`.
fn round_down(instant: DateTime<Utc>, unit_minutes: i64, tz: Tz) -> Option<DateTime<Utc>> {
    let unit_secs = unit_minutes * 60;
    let offset = utc_offset_secs(instant, tz);
    let local = instant.timestamp() + offset;
    DateTime::from_timestamp(local - local.rem_euclid(unit_secs) - offset, 0)
}

fn quantize(span: Span, policy: &BlockPolicy) -> Option<Span> {
    let start = round_up(span.start, policy.rounding_unit_minutes, policy.timezone)?;
    let end = round_down(span.end, policy.rounding_unit_minutes, policy.timezone)?;
    Some(Span::new(start, end))
}

/// Compute the free blocks of a work window given the occupied ranges inside it.
///
/// `busy` may be unordered and may overlap; it typically contains both calendar
/// busy intervals and the recruiter's existing (protected) slots. The result
/// is sorted by start time, pairwise non-overlapping, contained in `window`,
/// and every block lasts at least `policy.slot_length_minutes`.
///
/// An empty or inverted window yields no blocks.
pub fn find_free_blocks(window: Span, busy: &[Span], policy: &BlockPolicy) -> Vec<FreeBlock> {
    if window.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Span> = busy.iter().collect();
    sorted.sort_by_key(|span| (span.start, span.end));

    let mut candidates = vec![window];
    for busy_span in sorted {
        if candidates.is_empty() {
            break;
        }
        candidates = candidates
            .into_iter()
            .flat_map(|candidate| subtract(candidate, busy_span))
            .collect();
    }

    candidates
        .into_iter()
        .filter_map(|candidate| {
            if policy.quantizes() {
                quantize(candidate, policy)
            } else {
                Some(candidate)
            }
        })
        .filter(|span| !span.is_empty() && span.duration_minutes() >= policy.slot_length_minutes)
        .map(FreeBlock::from)
        .collect()
}
