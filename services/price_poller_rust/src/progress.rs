//! Periodic throughput reporting
//!
//! Sums every worker's request counter on a fixed interval. The sum is a
//! best-effort snapshot: counters are read one after another while workers
//! keep incrementing them.

use crate::price::RequestCounter;
use std::io::Write;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct ProgressReporter<W: Write> {
    counters: Vec<RequestCounter>,
    interval: Duration,
    out: W,
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(counters: Vec<RequestCounter>, interval: Duration, out: W) -> Self {
        Self {
            counters,
            interval,
            out,
        }
    }

    /// Current sum of all worker counters
    pub fn total(&self) -> u64 {
        self.counters.iter().map(RequestCounter::get).sum()
    }

    /// Report until `cancel` fires. The first report comes one full interval
    /// after start. Returns the number of reports written.
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let total = self.total();
                    ticks += 1;
                    // One short blocking line, same as the aggregator's event output
                    if let Err(e) = writeln!(self.out, "workers requests total: {}", total)
                        .and_then(|_| self.out.flush())
                    {
                        warn!("Failed to write progress report: {}", e);
                    }
                }
            }
        }

        debug!("Progress reporter stopped after {} reports", ticks);
        ticks
    }
}
