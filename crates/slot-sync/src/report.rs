//! Run options in, run report out.
//!
//! Each driver invocation takes its clock reading and override flag
//! explicitly and returns everything it did; nothing is kept in globals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slot_engine::BatchCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub now: DateTime<Utc>,
    /// Ignore the quiet-hours gate.
    pub force: bool,
}

impl RunOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now, force: false }
    }

    pub fn forced(now: DateTime<Utc>) -> Self {
        Self { now, force: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncKind {
    Full,
    Delta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "reason")]
pub enum RunStatus {
    Completed,
    /// Another full sync holds the lock.
    SkippedLocked,
    /// The quiet-hours gate says this driver is not due.
    NotDue,
    Failed(String),
}

/// What one driver invocation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub kind: SyncKind,
    pub status: RunStatus,
    /// Full sync only: the batch processed (before advancing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<BatchCursor>,
    pub recruiters_processed: usize,
    pub recruiters_skipped: usize,
    /// Recruiter-days left alone because a listing failed.
    pub days_skipped: usize,
    pub slots_deleted: usize,
    pub delete_failures: usize,
    pub blocks_created: usize,
    pub create_failures: usize,
    pub snapshots_written: usize,
}

impl SyncReport {
    pub fn new(kind: SyncKind) -> Self {
        Self {
            kind,
            status: RunStatus::Completed,
            cursor: None,
            recruiters_processed: 0,
            recruiters_skipped: 0,
            days_skipped: 0,
            slots_deleted: 0,
            delete_failures: 0,
            blocks_created: 0,
            create_failures: 0,
            snapshots_written: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
