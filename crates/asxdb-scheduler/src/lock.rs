use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(1);

/// Single-slot, in-process mutual exclusion for scrape cycles.
///
/// Clones share the slot. Two locks built with [`CycleLock::new`] are
/// independent.
#[derive(Debug, Clone)]
pub struct CycleLock {
    slot: Arc<Semaphore>,
    wait: Duration,
}

/// Held for the duration of a cycle; the slot is released on drop.
#[derive(Debug)]
pub struct CycleGuard {
    _permit: OwnedSemaphorePermit,
}

impl CycleLock {
    #[must_use]
    pub fn new(wait: Duration) -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
            wait,
        }
    }

    #[must_use]
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Wait up to the configured duration for the slot.
    ///
    /// Returns `None` when the wait elapses first.
    pub async fn acquire(&self) -> Option<CycleGuard> {
        let permit = tokio::time::timeout(self.wait, Arc::clone(&self.slot).acquire_owned())
            .await
            .ok()?
            .ok()?;
        Some(CycleGuard { _permit: permit })
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}

impl Default for CycleLock {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}
