//! Tests for free-block computation.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use slot_engine::freebusy::{find_free_blocks, BlockPolicy};
use slot_engine::types::Span;

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
}

fn span(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> Span {
    Span::new(at(start_hour, start_min), at(end_hour, end_min))
}

fn bounds(blocks: &[slot_engine::FreeBlock]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    blocks.iter().map(|b| (b.start, b.end)).collect()
}

#[test]
fn two_busy_intervals_leave_three_blocks() {
    // Work 09:00-17:00, busy 10:00-10:30 and 14:00-15:00, slot length 30.
    let window = span(9, 0, 17, 0);
    let busy = vec![span(10, 0, 10, 30), span(14, 0, 15, 0)];

    let blocks = find_free_blocks(window, &busy, &BlockPolicy::new(30));

    assert_eq!(
        bounds(&blocks),
        vec![
            (at(9, 0), at(10, 0)),
            (at(10, 30), at(14, 0)),
            (at(15, 0), at(17, 0)),
        ]
    );
    assert_eq!(blocks[0].duration_minutes, 60);
    assert_eq!(blocks[1].duration_minutes, 210);
    assert_eq!(blocks[2].duration_minutes, 120);
}

#[test]
fn no_busy_time_whole_window_is_free() {
    let window = span(9, 0, 17, 0);

    let blocks = find_free_blocks(window, &[], &BlockPolicy::new(60));

    assert_eq!(bounds(&blocks), vec![(at(9, 0), at(17, 0))]);
    assert_eq!(blocks[0].duration_minutes, 480);
}

#[test]
fn unsorted_and_overlapping_busy_ranges() {
    let window = span(9, 0, 17, 0);
    let busy = vec![
        span(13, 0, 14, 0),
        span(10, 0, 11, 30),
        span(11, 0, 12, 0),
        span(13, 30, 13, 45),
    ];

    let blocks = find_free_blocks(window, &busy, &BlockPolicy::new(30));

    assert_eq!(
        bounds(&blocks),
        vec![
            (at(9, 0), at(10, 0)),
            (at(12, 0), at(13, 0)),
            (at(14, 0), at(17, 0)),
        ]
    );
}

#[test]
fn busy_outside_window_is_ignored() {
    let window = span(9, 0, 12, 0);
    let busy = vec![span(7, 0, 8, 0), span(12, 0, 13, 0)];

    let blocks = find_free_blocks(window, &busy, &BlockPolicy::new(30));

    assert_eq!(bounds(&blocks), vec![(at(9, 0), at(12, 0))]);
}

#[test]
fn busy_straddling_window_edges_is_clipped() {
    let window = span(9, 0, 17, 0);
    let busy = vec![span(8, 0, 9, 30), span(16, 30, 18, 0)];

    let blocks = find_free_blocks(window, &busy, &BlockPolicy::new(30));

    assert_eq!(bounds(&blocks), vec![(at(9, 30), at(16, 30))]);
}

#[test]
fn busy_covering_window_leaves_nothing() {
    let window = span(9, 0, 17, 0);
    let busy = vec![span(8, 0, 18, 0)];

    assert!(find_free_blocks(window, &busy, &BlockPolicy::new(30)).is_empty());
}

#[test]
fn gaps_shorter_than_slot_length_are_dropped() {
    // 45-minute slots: the 10:00-10:30 gap cannot hold one.
    let window = span(9, 0, 12, 0);
    let busy = vec![span(9, 0, 10, 0), span(10, 30, 11, 0)];

    let blocks = find_free_blocks(window, &busy, &BlockPolicy::new(45));

    assert!(blocks.is_empty(), "got {:?}", blocks);
}

#[test]
fn quantization_snaps_to_half_hours() {
    // Busy 10:10-10:40 leaves 09:00-10:10 and 10:40-12:00.
    // Quantized: 09:00-10:00 and 11:00-12:00.
    let window = span(9, 0, 12, 0);
    let busy = vec![span(10, 10, 10, 40)];

    let blocks = find_free_blocks(window, &busy, &BlockPolicy::new(30));

    assert_eq!(
        bounds(&blocks),
        vec![(at(9, 0), at(10, 0)), (at(11, 0), at(12, 0))]
    );
}

#[test]
fn quantization_drops_blocks_that_round_away() {
    // Gap 10:10-10:50 rounds to 10:30-10:30 and disappears.
    let window = span(10, 10, 10, 50);

    assert!(find_free_blocks(window, &[], &BlockPolicy::new(30)).is_empty());
}

#[test]
fn no_quantization_when_slot_length_differs_from_unit() {
    let window = span(9, 0, 12, 0);
    let busy = vec![span(10, 10, 10, 40)];

    let blocks = find_free_blocks(window, &busy, &BlockPolicy::new(45));

    assert_eq!(
        bounds(&blocks),
        vec![(at(9, 0), at(10, 10)), (at(10, 40), at(12, 0))]
    );
}

#[test]
fn custom_rounding_unit_applies_when_equal_to_slot_length() {
    let window = span(9, 5, 11, 0);
    let policy = BlockPolicy::new(60).with_rounding_unit(60);

    let blocks = find_free_blocks(window, &[], &policy);

    assert_eq!(bounds(&blocks), vec![(at(10, 0), at(11, 0))]);
}

#[test]
fn quantization_follows_the_local_wall_clock() {
    // Kathmandu is UTC+5:45: local 09:00-17:00 is 03:15-11:15 UTC.
    let window = span(3, 15, 11, 15);
    let policy = BlockPolicy::new(30).in_timezone(Tz::Asia__Kathmandu);

    let blocks = find_free_blocks(window, &[], &policy);
    assert_eq!(bounds(&blocks), vec![(at(3, 15), at(11, 15))]);

    // Busy 10:10-10:40 local snaps the neighbours to 10:00 and 11:00 local.
    let busy = vec![span(4, 25, 4, 55)];
    let blocks = find_free_blocks(window, &busy, &policy);
    assert_eq!(
        bounds(&blocks),
        vec![(at(3, 15), at(4, 15)), (at(5, 15), at(11, 15))]
    );
}

#[test]
fn inverted_window_yields_nothing() {
    let window = span(17, 0, 9, 0);
    assert!(find_free_blocks(window, &[], &BlockPolicy::new(30)).is_empty());

    let empty = span(9, 0, 9, 0);
    assert!(find_free_blocks(empty, &[], &BlockPolicy::new(30)).is_empty());
}

#[test]
fn touching_busy_ranges_leave_no_sliver() {
    let window = span(9, 0, 11, 0);
    let busy = vec![span(9, 0, 10, 0), span(10, 0, 11, 0)];

    assert!(find_free_blocks(window, &busy, &BlockPolicy::new(30)).is_empty());
}
