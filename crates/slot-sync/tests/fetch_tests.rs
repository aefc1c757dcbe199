//! Tests for paginated listings and the stage slot cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use slot_engine::{ConfigRow, RecruiterConfig, Span};
use slot_sync::fetch::{list_all_slots, list_busy_intervals, list_recruiter_slots, StageSlotCache};
use slot_sync::memory::{MemoryCalendar, MemorySlotStore, StoredSlot};
use slot_sync::{CalendarEvent, CalendarFilter, EventTime, ResponseStatus};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
}

fn slot(id: &str, stage_id: &str, owner_id: &str, start: DateTime<Utc>) -> StoredSlot {
    StoredSlot {
        id: id.to_string(),
        stage_id: stage_id.to_string(),
        owner_id: owner_id.to_string(),
        title: "Interview".to_string(),
        start,
        end: start + Duration::minutes(30),
        booked_count: 0,
    }
}

fn recruiter(stages: &[&str]) -> RecruiterConfig {
    RecruiterConfig::from_row(&ConfigRow {
        email: "ada@example.com".to_string(),
        external_user_id: "user-ada".to_string(),
        work_start: "09:00".to_string(),
        work_end: "17:00".to_string(),
        slot_length_minutes: 30,
        stage_ids: stages.iter().map(|s| s.to_string()).collect(),
        slot_title: "Interview".to_string(),
    })
    .unwrap()
}

#[test]
fn slot_listing_follows_page_tokens() {
    let slots = (0..7)
        .map(|i| slot(&format!("s{}", i), "st-1", "user-ada", at(9, 0) + Duration::minutes(30 * i)))
        .collect();
    let store = MemorySlotStore::new(Tz::UTC, slots).with_page_size(2);

    let listed = list_all_slots(&store, "st-1", day()).unwrap();

    assert_eq!(listed.len(), 7);
    assert_eq!(store.calls().len(), 4);
}

#[test]
fn slot_listing_is_per_stage_and_day() {
    let store = MemorySlotStore::new(
        Tz::UTC,
        vec![
            slot("a", "st-1", "user-ada", at(9, 0)),
            slot("b", "st-2", "user-ada", at(9, 0)),
            slot("c", "st-1", "user-ada", at(9, 0) + Duration::days(1)),
        ],
    );

    let listed = list_all_slots(&store, "st-1", day()).unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "a");
}

#[test]
fn recruiter_slots_are_filtered_by_owner_across_stages() {
    let store = MemorySlotStore::new(
        Tz::UTC,
        vec![
            slot("a", "st-1", "user-ada", at(9, 0)),
            slot("b", "st-2", "user-ada", at(10, 0)),
            slot("c", "st-1", "user-bob", at(11, 0)),
        ],
    );

    let listed = list_recruiter_slots(&store, &recruiter(&["st-1", "st-2"]), day()).unwrap();

    let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn stage_cache_lists_each_stage_once() {
    let store = MemorySlotStore::new(Tz::UTC, vec![slot("a", "st-1", "user-ada", at(9, 0))]);
    let stages = ["st-1".to_string(), "st-1".to_string(), "st-2".to_string()];

    let cache = StageSlotCache::build(&store, stages.iter(), day());

    assert_eq!(cache.stage_count(), 2);
    assert_eq!(cache.date(), Some(day()));
    assert_eq!(store.calls().len(), 2);
    assert_eq!(cache.slots_for(&recruiter(&["st-1"])).unwrap().len(), 1);
}

#[test]
fn stage_cache_withholds_partial_listings() {
    let store = MemorySlotStore::new(Tz::UTC, vec![slot("a", "st-1", "user-ada", at(9, 0))]);
    store.fail_listing("st-2");
    let stages = ["st-1".to_string(), "st-2".to_string()];

    let cache = StageSlotCache::build(&store, stages.iter(), day());

    assert!(cache.slots_for(&recruiter(&["st-1", "st-2"])).is_none());
    assert!(cache.slots_for(&recruiter(&["st-1"])).is_some());
}

#[test]
fn busy_listing_pages_and_filters() {
    let events: Vec<CalendarEvent> = (0..5)
        .map(|i| CalendarEvent {
            id: format!("e{}", i),
            title: "Sync".to_string(),
            start: EventTime::timed(at(9 + i, 0)),
            end: EventTime::timed(at(9 + i, 30)),
            organizer_self: false,
            response_status: Some(if i % 2 == 0 {
                ResponseStatus::Accepted
            } else {
                ResponseStatus::Declined
            }),
        })
        .collect();
    let calendar = MemoryCalendar::new(
        Tz::UTC,
        BTreeMap::from([("ada@example.com".to_string(), events)]),
    )
    .with_page_size(2);

    let busy = list_busy_intervals(
        &calendar,
        "ada@example.com",
        Span::new(at(0, 0), at(0, 0) + Duration::days(1)),
        &CalendarFilter::default(),
        Tz::UTC,
    )
    .unwrap();

    let ids: Vec<&str> = busy.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["e0", "e2", "e4"]);
}

#[test]
fn busy_listing_surfaces_provider_errors() {
    let calendar = MemoryCalendar::new(Tz::UTC, BTreeMap::new());
    calendar.fail_calendar("ada@example.com", true);

    let result = list_busy_intervals(
        &calendar,
        "ada@example.com",
        Span::new(at(0, 0), at(23, 0)),
        &CalendarFilter::default(),
        Tz::UTC,
    );

    assert!(result.is_err());
}
