//! PricePoller: owns the worker pool and its shutdown
//!
//! Lifecycle: `Starting -> Running -> Stopping -> Drained`.
//!
//! Shutdown order:
//! 1. fire the cancellation token (idempotent)
//! 2. join every worker
//! 3. drop the orchestrator's publisher, closing the bus
//! 4. join the aggregator (drains what is left) and the progress reporter

use crate::aggregator::ResultAggregator;
use crate::bus::{event_bus, EventPublisher};
use crate::config::PollerConfig;
use crate::errors::PollerError;
use crate::partition::{hard_cap, partition_symbols};
use crate::price::{PriceCache, RequestCounter};
use crate::progress::ProgressReporter;
use crate::stop::StopReason;
use crate::types::{AggregatorReport, PollerSummary, WorkerReport};
use crate::worker::Worker;
use futures_util::future::join_all;
use price_poller_core::PriceSource;
use std::fmt;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Where event lines and progress lines go
pub type OutputSink = Box<dyn Write + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Starting,
    Running,
    Stopping,
    Drained,
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PollerState::Starting => "starting",
            PollerState::Running => "running",
            PollerState::Stopping => "stopping",
            PollerState::Drained => "drained",
        };
        f.write_str(name)
    }
}

/// A configured, not yet started poller
pub struct PricePoller {
    config: PollerConfig,
    source: Arc<dyn PriceSource>,
    hard_cap: usize,
    event_out: OutputSink,
    progress_out: OutputSink,
}

impl PricePoller {
    /// Poller writing to stdout, capped at the machine's parallelism
    pub fn new(config: PollerConfig, source: Arc<dyn PriceSource>) -> Self {
        Self {
            config,
            source,
            hard_cap: hard_cap(),
            event_out: Box::new(std::io::stdout()),
            progress_out: Box::new(std::io::stdout()),
        }
    }

    pub fn with_hard_cap(mut self, hard_cap: usize) -> Self {
        self.hard_cap = hard_cap;
        self
    }

    pub fn with_output(mut self, events: OutputSink, progress: OutputSink) -> Self {
        self.event_out = events;
        self.progress_out = progress;
        self
    }

    /// Partition symbols and launch workers, aggregator and progress reporter.
    ///
    /// Fails before spawning anything if the worker count is unusable. Must
    /// be called inside a tokio runtime.
    pub fn start(self) -> Result<RunningPoller, PollerError> {
        let (state_tx, _) = watch::channel(PollerState::Starting);

        let partitions =
            partition_symbols(&self.config.symbols, self.config.max_workers, self.hard_cap)?;

        info!(
            "Starting price poller: {} symbols across {} workers (requested {}, cap {}), source {}",
            self.config.symbols.len(),
            partitions.len(),
            self.config.max_workers,
            self.hard_cap,
            self.source.source_name()
        );

        let workers: Vec<Worker> = partitions
            .into_iter()
            .enumerate()
            .map(|(id, partition)| Worker::new(id, partition, self.config.fetch_timeout()))
            .collect();

        for worker in &workers {
            debug!("Worker {} assigned {:?}", worker.id(), worker.partition());
        }

        let counters: Vec<RequestCounter> = workers.iter().map(Worker::requests).collect();
        let caches: Vec<Arc<PriceCache>> = workers.iter().map(Worker::cache).collect();

        let cancel = CancellationToken::new();
        let (publisher, stream) = event_bus();

        let worker_handles = workers
            .into_iter()
            .map(|worker| {
                tokio::spawn(worker.run(self.source.clone(), publisher.clone(), cancel.clone()))
            })
            .collect();

        let aggregator = tokio::spawn(ResultAggregator::new(self.event_out).run(stream));

        let reporter = tokio::spawn(
            ProgressReporter::new(
                counters.clone(),
                self.config.progress_interval(),
                self.progress_out,
            )
            .run(cancel.clone()),
        );

        state_tx.send_replace(PollerState::Running);
        info!("Price poller running");

        Ok(RunningPoller {
            state: state_tx,
            cancel,
            workers: worker_handles,
            counters,
            caches,
            publisher: Some(publisher),
            aggregator,
            reporter,
        })
    }
}

/// Handle on a started poller
pub struct RunningPoller {
    state: watch::Sender<PollerState>,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<Result<WorkerReport, PollerError>>>,
    counters: Vec<RequestCounter>,
    caches: Vec<Arc<PriceCache>>,
    /// Keeps the bus open until every worker has been joined
    publisher: Option<EventPublisher>,
    aggregator: JoinHandle<AggregatorReport>,
    reporter: JoinHandle<u64>,
}

impl RunningPoller {
    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    /// Observe state transitions, including the final `Drained`
    pub fn subscribe_state(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Best-effort sum of all worker request counters
    pub fn total_requests(&self) -> u64 {
        self.counters.iter().map(RequestCounter::get).sum()
    }

    /// Number of symbols each worker has cached so far
    pub fn cached_symbols(&self) -> Vec<usize> {
        self.caches.iter().map(|c| c.len()).collect()
    }

    /// Fire the shared cancellation signal. Safe to call any number of times.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("Stop requested, cancelling workers");
        }
        self.cancel.cancel();
    }

    /// Run until `stop` resolves, then drain
    pub async fn run_until<F>(self, stop: F) -> Result<PollerSummary, PollerError>
    where
        F: Future<Output = StopReason>,
    {
        let reason = stop.await;
        info!("Stopping price poller: {}", reason);
        self.shutdown().await
    }

    /// Cancel, wait for every task, close the bus and report.
    ///
    /// All tasks are drained even when one of them failed; the first failure
    /// is returned afterwards.
    pub async fn shutdown(mut self) -> Result<PollerSummary, PollerError> {
        self.state.send_replace(PollerState::Stopping);
        self.stop();

        let mut first_error: Option<PollerError> = None;
        let mut reports = Vec::with_capacity(self.workers.len());

        let results = join_all(std::mem::take(&mut self.workers)).await;
        for (id, result) in results.into_iter().enumerate() {
            match result {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => {
                    error!("Worker {} failed: {}", id, e);
                    reports.push(self.fallback_report(id));
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    error!("Worker {} task failed: {}", id, e);
                    reports.push(self.fallback_report(id));
                    first_error.get_or_insert(PollerError::Shutdown(format!(
                        "worker {} task failed: {}",
                        id, e
                    )));
                }
            }
        }

        // Every producer has exited; closing the bus lets the aggregator finish
        drop(self.publisher.take());

        let aggregator = match (&mut self.aggregator).await {
            Ok(report) => report,
            Err(e) => {
                error!("Aggregator task failed: {}", e);
                first_error.get_or_insert(PollerError::Shutdown(format!(
                    "aggregator task failed: {}",
                    e
                )));
                AggregatorReport::default()
            }
        };

        let progress_ticks = match (&mut self.reporter).await {
            Ok(ticks) => ticks,
            Err(e) => {
                error!("Progress reporter task failed: {}", e);
                first_error.get_or_insert(PollerError::Shutdown(format!(
                    "progress reporter task failed: {}",
                    e
                )));
                0
            }
        };

        self.state.send_replace(PollerState::Drained);

        let summary = PollerSummary {
            workers: reports,
            aggregator,
            progress_ticks,
        };
        info!(
            "Price poller drained: requests={}, emitted={}, delivered={}, changed={}",
            summary.total_requests(),
            summary.events_emitted(),
            summary.aggregator.delivered,
            summary.aggregator.changed
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    fn fallback_report(&self, id: usize) -> WorkerReport {
        WorkerReport {
            worker_id: id,
            requests: self.counters.get(id).map(RequestCounter::get).unwrap_or(0),
            ..Default::default()
        }
    }
}
