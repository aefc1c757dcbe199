//! Tests for the batch cursor.

use slot_engine::cursor::BatchCursor;

#[test]
fn twenty_five_recruiters_in_batches_of_ten() {
    let recruiters: Vec<u32> = (0..25).collect();
    let mut cursor = BatchCursor::resume(None, recruiters.len(), 10).unwrap();

    assert_eq!(cursor.total_batches, 3);

    let mut sizes = Vec::new();
    let mut sequence = Vec::new();
    for _ in 0..6 {
        sequence.push(cursor.current_batch);
        sizes.push(cursor.select(&recruiters).len());
        cursor = cursor.advanced();
    }

    assert_eq!(sequence, vec![1, 2, 3, 1, 2, 3]);
    assert_eq!(sizes, vec![10, 10, 5, 10, 10, 5]);
}

#[test]
fn batches_cover_every_recruiter_once() {
    let recruiters: Vec<u32> = (0..25).collect();
    let mut cursor = BatchCursor::resume(None, recruiters.len(), 10).unwrap();

    let mut seen = Vec::new();
    for _ in 0..cursor.total_batches {
        seen.extend_from_slice(cursor.select(&recruiters));
        cursor = cursor.advanced();
    }

    assert_eq!(seen, recruiters);
    assert_eq!(cursor.current_batch, 1);
}

#[test]
fn resume_from_stored_batch() {
    let cursor = BatchCursor::resume(Some(2), 25, 10).unwrap();
    assert_eq!(cursor.current_batch, 2);
    assert_eq!(cursor.range(25), 10..20);
}

#[test]
fn stored_batch_beyond_shrunk_fleet_restarts() {
    let cursor = BatchCursor::resume(Some(3), 12, 10).unwrap();
    assert_eq!(cursor.total_batches, 2);
    assert_eq!(cursor.current_batch, 1);
}

#[test]
fn zero_stored_batch_restarts() {
    let cursor = BatchCursor::resume(Some(0), 5, 10).unwrap();
    assert_eq!(cursor.current_batch, 1);
}

#[test]
fn empty_fleet_selects_nothing() {
    let cursor = BatchCursor::resume(None, 0, 10).unwrap();
    let recruiters: Vec<u32> = Vec::new();

    assert_eq!(cursor.total_batches, 0);
    assert!(cursor.select(&recruiters).is_empty());
    assert_eq!(cursor.advanced().current_batch, 1);
}

#[test]
fn zero_batch_size_rejected() {
    assert!(BatchCursor::resume(None, 10, 0).is_err());
}
