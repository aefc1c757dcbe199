//! RAII guard around [`SyncLock`].

use std::time::Duration;

use tracing::debug;

use crate::ports::SyncLock;

/// Holds the sync lock until dropped, so every exit path releases it.
pub struct LockGuard<'a> {
    lock: &'a dyn SyncLock,
}

impl<'a> LockGuard<'a> {
    /// Try to take the lock, waiting at most `timeout`. `None` means another
    /// run holds it.
    pub fn acquire(lock: &'a dyn SyncLock, timeout: Duration) -> Option<Self> {
        if lock.try_acquire(timeout) {
            debug!(?timeout, "sync lock acquired");
            Some(Self { lock })
        } else {
            None
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
        debug!("sync lock released");
    }
}
