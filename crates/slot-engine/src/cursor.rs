//! Batch cursor: which fixed-size chunk of recruiters the next full pass owns.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Position of the full pass within the recruiter fleet. Batches are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCursor {
    pub current_batch: usize,
    pub total_batches: usize,
    pub batch_size: usize,
}

impl BatchCursor {
    /// Rebuild the cursor for a fleet of `recruiter_count`, resuming from a
    /// persisted batch number.
    ///
    /// A missing, zero, or out-of-range stored batch (the fleet may have
    /// shrunk since it was saved) restarts at batch 1.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidBatchSize` when `batch_size` is zero.
    pub fn resume(stored: Option<usize>, recruiter_count: usize, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(EngineError::InvalidBatchSize(batch_size));
        }
        let total_batches = recruiter_count.div_ceil(batch_size);
        let current_batch = match stored {
            Some(batch) if batch >= 1 && batch <= total_batches => batch,
            _ => 1,
        };
        Ok(Self {
            current_batch,
            total_batches,
            batch_size,
        })
    }

    /// Index range of the current batch within a list of `len` recruiters.
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = (self.current_batch - 1).saturating_mul(self.batch_size).min(len);
        let end = start.saturating_add(self.batch_size).min(len);
        start..end
    }

    pub fn select<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    /// The cursor after the current batch completes, wrapping to 1.
    pub fn advanced(&self) -> Self {
        let next = self.current_batch + 1;
        Self {
            current_batch: if next > self.total_batches { 1 } else { next },
            ..*self
        }
    }
}
