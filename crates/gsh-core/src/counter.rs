//! Shared failure counter

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts failed hosts within one batch
///
/// Clones share the same count. Each batch creates its own counter.
#[derive(Debug, Clone, Default)]
pub struct ErrorCounter(Arc<AtomicU64>);

impl ErrorCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Current count
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
