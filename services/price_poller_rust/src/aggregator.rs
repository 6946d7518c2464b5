//! Result aggregator: the single consumer of the event bus
//!
//! Writes one line per event until the bus is closed and drained. It does not
//! watch the cancellation token; the orchestrator closes the bus after the
//! workers stop, and that is what ends this loop.

use crate::bus::EventStream;
use crate::types::AggregatorReport;
use std::io::Write;
use tracing::{debug, warn};

pub struct ResultAggregator<W: Write> {
    out: W,
}

impl<W: Write> ResultAggregator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub async fn run(mut self, mut stream: EventStream) -> AggregatorReport {
        let mut report = AggregatorReport::default();

        while let Some(event) = stream.recv().await {
            report.delivered += 1;
            if event.changed {
                report.changed += 1;
            }

            debug!(
                "worker {} observed {} at {}",
                event.worker_id,
                event.symbol,
                event.observed_at.to_rfc3339()
            );

            // Blocking write of one short line; a stalled stdout reader stalls this task's thread
            if let Err(e) = writeln!(self.out, "{}", event).and_then(|_| self.out.flush()) {
                warn!("Failed to write event for {}: {}", event.symbol, e);
            }
        }

        debug!("Event bus closed after {} events", report.delivered);
        report
    }
}
