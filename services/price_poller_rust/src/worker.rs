//! Polling worker: one partition, one cache, one request counter
//!
//! A worker walks its partition in order, forever: fetch, update cache,
//! count, emit. Cancellation is checked before every fetch and raced against
//! both the in-flight fetch and the emit, so after the token fires a worker
//! performs no new fetch and publishes nothing.

use crate::bus::{EventPublisher, Publish};
use crate::errors::PollerError;
use crate::price::{PriceCache, RequestCounter};
use crate::types::{PriceEvent, WorkerReport};
use price_poller_core::{FetchError, PriceQuote, PriceSource};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Worker {
    id: usize,
    partition: Vec<String>,
    cache: Arc<PriceCache>,
    requests: RequestCounter,
    fetch_timeout: Duration,
}

impl Worker {
    pub fn new(id: usize, partition: Vec<String>, fetch_timeout: Duration) -> Self {
        Self {
            id,
            partition,
            cache: Arc::new(PriceCache::new()),
            requests: RequestCounter::new(),
            fetch_timeout,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn partition(&self) -> &[String] {
        &self.partition
    }

    /// Read handle on this worker's cache
    pub fn cache(&self) -> Arc<PriceCache> {
        self.cache.clone()
    }

    /// Read handle on this worker's request counter
    pub fn requests(&self) -> RequestCounter {
        self.requests.clone()
    }

    /// Poll until `cancel` fires.
    ///
    /// Fetch failures are logged and counted, never returned. The only error
    /// is a publish onto a bus that was closed underneath the worker.
    pub async fn run(
        self,
        source: Arc<dyn PriceSource>,
        events: EventPublisher,
        cancel: CancellationToken,
    ) -> Result<WorkerReport, PollerError> {
        let mut report = WorkerReport {
            worker_id: self.id,
            symbols: self.partition.len(),
            ..Default::default()
        };

        if self.partition.is_empty() {
            debug!("Worker {} has no symbols, idling until shutdown", self.id);
            cancel.cancelled().await;
            return Ok(report);
        }

        info!(
            "Worker {} polling {} symbols from {}",
            self.id,
            self.partition.len(),
            source.source_name()
        );

        'polling: loop {
            for symbol in &self.partition {
                if cancel.is_cancelled() {
                    break 'polling;
                }

                // An abandoned fetch is not a completed attempt and is not counted
                let Some(result) = self.fetch(source.as_ref(), symbol, &cancel).await else {
                    break 'polling;
                };

                match result {
                    Ok(quote) => {
                        let update = self.cache.get_and_set(symbol, &quote.price);
                        report.requests = self.requests.record();

                        let event = PriceEvent::new(self.id, symbol, &quote.price, update.changed);
                        match events.publish(event, &cancel).await? {
                            Publish::Delivered => report.emitted += 1,
                            Publish::Cancelled => break 'polling,
                        }
                    }
                    Err(e) => {
                        report.requests = self.requests.record();
                        report.failures += 1;
                        warn!("Worker {}: error fetching {}: {}", self.id, symbol, e);
                    }
                }
            }

            // A partition whose fetches all fail instantly must not hog the executor
            tokio::task::yield_now().await;
        }

        info!(
            "Worker {} stopped: requests={}, failures={}, emitted={}",
            self.id, report.requests, report.failures, report.emitted
        );
        Ok(report)
    }

    /// One bounded fetch; `None` when cancellation interrupted it
    async fn fetch(
        &self,
        source: &dyn PriceSource,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Option<Result<PriceQuote, FetchError>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = tokio::time::timeout(self.fetch_timeout, source.fetch(symbol)) => {
                Some(result.unwrap_or(Err(FetchError::Timeout(self.fetch_timeout))))
            }
        }
    }
}
