//! Integration tests for the `slotsync` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to run the full, delta and
//! diff subcommands through the actual binary against fixture files copied
//! into a temporary directory.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const NIGHT: &str = "2026-03-01T23:00:00Z";
const NOON: &str = "2026-03-02T12:00:00Z";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Helper: copy the state fixture into a fresh temp dir.
fn scratch_state() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::copy(fixture("state.json"), &path).unwrap();
    (dir, path)
}

fn slotsync() -> Command {
    Command::cargo_bin("slotsync").unwrap()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn run_report(args: &[&str]) -> serde_json::Value {
    let output = slotsync().args(args).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// full
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn full_prints_report_and_updates_state() {
    let (_dir, state) = scratch_state();
    let settings = fixture("settings.json");

    let report = run_report(&[
        "full",
        "--state",
        state.to_str().unwrap(),
        "--settings",
        settings.to_str().unwrap(),
        "--now",
        NIGHT,
    ]);

    assert_eq!(report["kind"], "full");
    assert_eq!(report["status"]["state"], "completed");
    assert_eq!(report["slotsDeleted"], 1);
    assert_eq!(report["blocksCreated"], 3);
    assert_eq!(report["cursor"]["currentBatch"], 1);

    let updated = read_json(&state);
    let slots = updated["slots"].as_array().unwrap();
    assert!(slots.iter().all(|s| s["id"] != "stale"));
    assert_eq!(slots.len(), 13);
    assert_eq!(updated["cursor"], 1);
    assert!(updated["snapshots"]["ada@example.com"]["snapshot"]["events"]["e1"].is_object());
    // The working-location event is not busy time.
    assert!(updated["snapshots"]["ada@example.com"]["snapshot"]["events"]["e3"].is_null());
}

#[test]
fn full_outside_quiet_hours_is_not_due() {
    let (_dir, state) = scratch_state();

    slotsync()
        .args(["full", "--state", state.to_str().unwrap(), "--now", NOON])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"notDue\""));

    let updated = read_json(&state);
    assert_eq!(updated["slots"].as_array().unwrap().len(), 1);
}

#[test]
fn force_runs_full_sync_at_noon() {
    let (_dir, state) = scratch_state();

    let report = run_report(&[
        "full",
        "--state",
        state.to_str().unwrap(),
        "--now",
        NOON,
        "--force",
    ]);

    assert_eq!(report["status"]["state"], "completed");
}

#[test]
fn output_flag_leaves_input_untouched() {
    let (dir, state) = scratch_state();
    let output = dir.path().join("next.json");
    let before = std::fs::read_to_string(&state).unwrap();

    slotsync()
        .args([
            "full",
            "--state",
            state.to_str().unwrap(),
            "--now",
            NIGHT,
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&state).unwrap(), before);
    assert!(read_json(&output)["slots"].as_array().unwrap().len() > 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// delta
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn delta_after_full_opens_cancelled_time() {
    let (_dir, state) = scratch_state();
    let state_arg = state.to_str().unwrap();
    let settings = fixture("settings.json");
    let settings_arg = settings.to_str().unwrap();

    run_report(&["full", "--state", state_arg, "--settings", settings_arg, "--now", NIGHT]);

    // Cancel the 10:00 meeting.
    let mut updated = read_json(&state);
    updated["calendars"]["ada@example.com"]
        .as_array_mut()
        .unwrap()
        .retain(|e| e["id"] != "e1");
    std::fs::write(&state, serde_json::to_string(&updated).unwrap()).unwrap();

    let report = run_report(&["delta", "--state", state_arg, "--settings", settings_arg, "--now", NOON]);

    assert_eq!(report["kind"], "delta");
    assert_eq!(report["status"]["state"], "completed");
    assert_eq!(report["blocksCreated"], 1);
    assert_eq!(report["snapshotsWritten"], 1);
    assert_eq!(read_json(&state)["slots"].as_array().unwrap().len(), 14);
}

#[test]
fn delta_without_snapshots_skips_everyone() {
    let (_dir, state) = scratch_state();

    let report = run_report(&["delta", "--state", state.to_str().unwrap(), "--now", NOON]);

    assert_eq!(report["recruitersSkipped"], 1);
    assert_eq!(report["recruitersProcessed"], 0);
}

#[test]
fn delta_during_quiet_hours_is_not_due() {
    let (_dir, state) = scratch_state();

    slotsync()
        .args(["delta", "--state", state.to_str().unwrap(), "--now", NIGHT])
        .assert()
        .success()
        .stdout(predicate::str::contains("notDue"));
}

// ─────────────────────────────────────────────────────────────────────────────
// diff
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn diff_reports_new_moved_and_deleted_events() {
    let cached = fixture("cached.json");
    let current = fixture("current.json");

    let delta = run_report(&[
        "diff",
        "--cached",
        cached.to_str().unwrap(),
        "--current",
        current.to_str().unwrap(),
    ]);

    let ids = |key: &str| -> Vec<String> {
        delta[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(ids("newOrUpdated"), vec!["e2", "e4"]);
    assert_eq!(ids("deleted"), vec!["e1"]);
    assert_eq!(delta["newOrUpdated"][0]["start"], "2026-03-02T15:00:00Z");
}

#[test]
fn diff_of_identical_snapshots_is_empty() {
    let cached = fixture("cached.json");

    let delta = run_report(&[
        "diff",
        "--cached",
        cached.to_str().unwrap(),
        "--current",
        cached.to_str().unwrap(),
    ]);

    assert!(delta["newOrUpdated"].as_array().unwrap().is_empty());
    assert!(delta["deleted"].as_array().unwrap().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Error handling
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn missing_state_file_fails() {
    slotsync()
        .args(["full", "--state", "/nonexistent/state.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn malformed_now_fails() {
    let (_dir, state) = scratch_state();

    slotsync()
        .args(["full", "--state", state.to_str().unwrap(), "--now", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --now"));
}

#[test]
fn unknown_timezone_fails() {
    let (dir, state) = scratch_state();
    let settings = dir.path().join("settings.json");
    std::fs::write(&settings, r#"{"timezone": "Nowhere/Special"}"#).unwrap();

    slotsync()
        .args([
            "full",
            "--state",
            state.to_str().unwrap(),
            "--settings",
            settings.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid settings"));
}

#[test]
fn zero_batch_size_fails() {
    let (dir, state) = scratch_state();
    let settings = dir.path().join("settings.json");
    std::fs::write(&settings, r#"{"batchSize": 0}"#).unwrap();

    slotsync()
        .args([
            "full",
            "--state",
            state.to_str().unwrap(),
            "--settings",
            settings.to_str().unwrap(),
            "--now",
            NIGHT,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch size"));
}

#[test]
fn no_subcommand_shows_usage() {
    slotsync()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
