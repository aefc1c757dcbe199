//! Slot conflict detection ("busy is busy").
//!
//! Partitions a recruiter's existing slots into those that must be deleted and
//! those that are safe. Booked slots are always safe. An unbooked slot is
//! deleted as soon as it overlaps any busy interval; touching is not
//! overlapping.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::{overlaps, BusyInterval, Slot};

/// An unbooked slot that overlaps busy time, with the first interval it hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConflict {
    pub slot: Slot,
    pub interval_id: String,
    pub interval_title: String,
}

/// Result of running the detector over one recruiter-day.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    /// Calendar owner the busy intervals were read from. Diagnostic only.
    pub organizer: String,
    /// Slots to delete, de-duplicated by slot id.
    pub slots_to_delete: Vec<SlotConflict>,
    pub safe_slots: Vec<Slot>,
}

impl ConflictReport {
    pub fn delete_ids(&self) -> impl Iterator<Item = &str> {
        self.slots_to_delete.iter().map(|c| c.slot.id.as_str())
    }
}

/// Split `slots` into conflicting and safe slots against `busy`.
///
/// `organizer` is carried into the report for logging; it does not influence
/// the decision.
pub fn detect_slot_conflicts(organizer: &str, slots: &[Slot], busy: &[BusyInterval]) -> ConflictReport {
    let mut report = ConflictReport {
        organizer: organizer.to_string(),
        ..ConflictReport::default()
    };
    let mut flagged: HashSet<&str> = HashSet::new();

    for slot in slots {
        if slot.is_booked() {
            report.safe_slots.push(slot.clone());
            continue;
        }

        let hit = busy
            .iter()
            .find(|interval| overlaps(slot.start, slot.end, interval.start, interval.end));

        match hit {
            Some(interval) => {
                if flagged.insert(slot.id.as_str()) {
                    report.slots_to_delete.push(SlotConflict {
                        slot: slot.clone(),
                        interval_id: interval.id.clone(),
                        interval_title: interval.title.clone(),
                    });
                }
            }
            None => report.safe_slots.push(slot.clone()),
        }
    }

    report
}
