//! Poller-specific types

use chrono::{DateTime, Utc};
use std::fmt;

/// One price observation travelling from a worker to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEvent {
    pub worker_id: usize,
    pub symbol: String,
    pub price: String,
    /// A prior price for this symbol existed in the worker's cache and differed
    pub changed: bool,
    pub observed_at: DateTime<Utc>,
}

impl PriceEvent {
    pub fn new(worker_id: usize, symbol: &str, price: &str, changed: bool) -> Self {
        Self {
            worker_id,
            symbol: symbol.to_string(),
            price: price.to_string(),
            changed,
            observed_at: Utc::now(),
        }
    }
}

impl fmt::Display for PriceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} price:{}", self.symbol, self.price)?;
        if self.changed {
            write!(f, " changed")?;
        }
        Ok(())
    }
}

/// What a worker did over its lifetime, returned when it exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub symbols: usize,
    /// Completed fetch attempts, successes plus failures
    pub requests: u64,
    pub failures: u64,
    pub emitted: u64,
}

/// What the aggregator consumed before the bus closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorReport {
    pub delivered: u64,
    pub changed: u64,
}

/// Final accounting after the poller has drained
#[derive(Debug, Clone, Default)]
pub struct PollerSummary {
    pub workers: Vec<WorkerReport>,
    pub aggregator: AggregatorReport,
    pub progress_ticks: u64,
}

impl PollerSummary {
    pub fn total_requests(&self) -> u64 {
        self.workers.iter().map(|w| w.requests).sum()
    }

    pub fn events_emitted(&self) -> u64 {
        self.workers.iter().map(|w| w.emitted).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_line_format() {
        let plain = PriceEvent::new(0, "BTCUSDT", "50000", false);
        assert_eq!(plain.to_string(), "BTCUSDT price:50000");

        let changed = PriceEvent::new(0, "BTCUSDT", "50100", true);
        assert_eq!(changed.to_string(), "BTCUSDT price:50100 changed");
    }

    #[test]
    fn test_summary_totals() {
        let summary = PollerSummary {
            workers: vec![
                WorkerReport {
                    worker_id: 0,
                    symbols: 2,
                    requests: 10,
                    failures: 1,
                    emitted: 9,
                },
                WorkerReport {
                    worker_id: 1,
                    symbols: 1,
                    requests: 5,
                    failures: 0,
                    emitted: 5,
                },
            ],
            ..Default::default()
        };
        assert_eq!(summary.total_requests(), 15);
        assert_eq!(summary.events_emitted(), 14);
    }
}
