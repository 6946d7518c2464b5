//! Request counter shared between a worker and the progress reporter

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Completed fetch attempts (successes and recoverable failures).
///
/// Cloning shares the underlying atomic: the worker increments through its
/// handle, the progress reporter reads through another.
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    count: Arc<AtomicU64>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one attempt; returns the new total
    pub fn record(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_count() {
        let counter = RequestCounter::new();
        let reader = counter.clone();
        assert_eq!(counter.record(), 1);
        assert_eq!(counter.record(), 2);
        assert_eq!(reader.get(), 2);
    }

    #[test]
    fn test_concurrent_increments_not_lost() {
        let counter = RequestCounter::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.record();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.get(), 8000);
    }
}
