//! Error tracking collaborator.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::error;

/// Receives faults that escaped a command body or the dispatch pipeline.
pub trait ErrorTracker: Send + Sync {
    fn register_exception(&self, error: &anyhow::Error);
}

/// Logs every registered fault with its cause chain.
#[derive(Debug, Default)]
pub struct LoggingErrorTracker {
    registered: AtomicU64,
}

impl LoggingErrorTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of faults registered so far.
    #[must_use]
    pub fn registered(&self) -> u64 {
        self.registered.load(Ordering::Relaxed)
    }
}

impl ErrorTracker for LoggingErrorTracker {
    fn register_exception(&self, error: &anyhow::Error) {
        let count = self.registered.fetch_add(1, Ordering::Relaxed) + 1;
        error!("Tracked fault #{}: {:#}", count, error);
    }
}
