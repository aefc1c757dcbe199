//! Paginated reads from the slot store and the calendar provider.
//!
//! A failed page aborts its loop and the partial result is dropped: callers
//! skip the affected recruiter/day rather than act on half a listing.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use chrono_tz::Tz;
use slot_engine::{BusyInterval, RecruiterConfig, Slot, Span};
use tracing::{debug, warn};

use crate::calendar::CalendarFilter;
use crate::error::ProviderError;
use crate::ports::{CalendarProvider, SlotStore};

/// Upper bound on pages per listing, in case a provider keeps handing out tokens.
const MAX_PAGES: usize = 1000;

fn runaway() -> ProviderError {
    ProviderError::Payload(format!("pagination exceeded {} pages", MAX_PAGES))
}

/// Every slot of `stage_id` on `date`, across all pages.
pub fn list_all_slots(
    store: &dyn SlotStore,
    stage_id: &str,
    date: NaiveDate,
) -> Result<Vec<Slot>, ProviderError> {
    let mut slots = Vec::new();
    let mut token: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let page = store.list_slots_page(stage_id, date, token.as_deref())?;
        slots.extend(page.slots);
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => return Ok(slots),
        }
    }
    Err(runaway())
}

/// Busy intervals of `calendar_id` inside `span`, after the filtering policy.
pub fn list_busy_intervals(
    provider: &dyn CalendarProvider,
    calendar_id: &str,
    span: Span,
    filter: &CalendarFilter,
    tz: Tz,
) -> Result<Vec<BusyInterval>, ProviderError> {
    let mut events = Vec::new();
    let mut token: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let page = provider.list_events_page(calendar_id, span.start, span.end, token.as_deref())?;
        events.extend(page.events);
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => {
                let busy = filter.busy_intervals(&events, tz);
                debug!(
                    calendar_id,
                    fetched = events.len(),
                    busy = busy.len(),
                    "calendar events filtered"
                );
                return Ok(busy);
            }
        }
    }
    Err(runaway())
}

/// Keep only `owner_id`'s slots, dropping duplicate ids.
fn owned_by(slots: impl IntoIterator<Item = Slot>, owner_id: &str) -> Vec<Slot> {
    let mut seen = HashSet::new();
    slots
        .into_iter()
        .filter(|slot| slot.owner_id == owner_id)
        .filter(|slot| seen.insert(slot.id.clone()))
        .collect()
}

/// All of one recruiter's slots on `date`, across their stages.
pub fn list_recruiter_slots(
    store: &dyn SlotStore,
    recruiter: &RecruiterConfig,
    date: NaiveDate,
) -> Result<Vec<Slot>, ProviderError> {
    let mut all = Vec::new();
    for stage_id in &recruiter.stage_ids {
        all.extend(list_all_slots(store, stage_id, date)?);
    }
    Ok(owned_by(all, &recruiter.external_user_id))
}

/// One day's slot listings keyed by stage, fetched once and shared by every
/// recruiter that uses the stage.
#[derive(Debug, Default)]
pub struct StageSlotCache {
    date: Option<NaiveDate>,
    slots: HashMap<String, Vec<Slot>>,
    failed: HashSet<String>,
}

impl StageSlotCache {
    pub fn build<'a>(
        store: &dyn SlotStore,
        stage_ids: impl IntoIterator<Item = &'a String>,
        date: NaiveDate,
    ) -> Self {
        let mut cache = Self {
            date: Some(date),
            ..Self::default()
        };
        let unique: BTreeSet<&String> = stage_ids.into_iter().collect();
        for stage_id in unique {
            match list_all_slots(store, stage_id, date) {
                Ok(slots) => {
                    cache.slots.insert(stage_id.clone(), slots);
                }
                Err(e) => {
                    warn!(stage = %stage_id, day = %date, error = %e, "slot listing failed");
                    cache.failed.insert(stage_id.clone());
                }
            }
        }
        cache
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn stage_count(&self) -> usize {
        self.slots.len() + self.failed.len()
    }

    /// The recruiter's slots across their stages, or `None` when any of
    /// those stages could not be listed.
    pub fn slots_for(&self, recruiter: &RecruiterConfig) -> Option<Vec<Slot>> {
        if recruiter.stage_ids.iter().any(|s| self.failed.contains(s)) {
            return None;
        }
        let all = recruiter
            .stage_ids
            .iter()
            .filter_map(|s| self.slots.get(s))
            .flatten()
            .cloned();
        Some(owned_by(all, &recruiter.external_user_id))
    }
}
