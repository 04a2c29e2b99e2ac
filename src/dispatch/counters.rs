//! Named atomic counters.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Incremented after a standard command succeeds.
pub const COMMAND_SUCCESS: &str = "command-success";

/// Incremented after a standard command fails for any reason but "unknown command".
pub const COMMAND_FAILED: &str = "command-failed";

/// Incremented after a custom command runs.
pub const CUSTOM_COMMAND_EXECUTED: &str = "custom-command-executed";

/// A single monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters shared by concurrent dispatches, created on first use.
#[derive(Debug, Default)]
pub struct CounterSet {
    counters: RwLock<HashMap<String, Arc<Counter>>>,
}

impl CounterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counter called `name`, creating it at zero.
    pub fn get(&self, name: &str) -> Arc<Counter> {
        if let Some(counter) = self
            .counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(counter);
        }

        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(counters.entry(name.to_owned()).or_default())
    }

    /// Current value of `name`; zero if it was never incremented.
    #[must_use]
    pub fn value(&self, name: &str) -> u64 {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |c| c.value())
    }

    /// Sum of all counters.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.snapshot().values().sum()
    }

    /// Values of all counters, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, c)| (name.clone(), c.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_counter_is_zero() {
        let counters = CounterSet::new();
        assert_eq!(counters.value(COMMAND_SUCCESS), 0);
        assert_eq!(counters.total(), 0);
    }

    #[test]
    fn test_get_returns_shared_counter() {
        let counters = CounterSet::new();
        counters.get(COMMAND_SUCCESS).increment();
        counters.get(COMMAND_SUCCESS).increment();
        assert_eq!(counters.value(COMMAND_SUCCESS), 2);
        assert_eq!(counters.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments() {
        let counters = Arc::new(CounterSet::new());
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let counters = Arc::clone(&counters);
                tokio::spawn(async move {
                    for _ in 0..100 {
                        counters.get(COMMAND_FAILED).increment();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(counters.value(COMMAND_FAILED), 1600);
    }
}
