use anyhow::{Context, Result};
use dotenv::dotenv;
use price_poller_core::BinanceClient;
use price_poller_rust::stop::{spawn_stdin_reader, wait_for_stop};
use price_poller_rust::{PollerConfig, PricePoller};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // stdout carries price lines; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting price_poller_rust...");

    let config = PollerConfig::load().context("Failed to load configuration")?;
    let source = BinanceClient::with_base_url(&config.base_url, config.fetch_timeout())?;

    let poller = PricePoller::new(config, Arc::new(source)).start()?;
    let commands = spawn_stdin_reader().context("Failed to read stop commands from stdin")?;
    info!("Type {} (or close stdin) to shut down", price_poller_rust::stop::STOP_COMMAND);

    let summary = poller.run_until(wait_for_stop(commands)).await?;

    for worker in &summary.workers {
        info!(
            "Worker {}: symbols={}, requests={}, failures={}, emitted={}",
            worker.worker_id, worker.symbols, worker.requests, worker.failures, worker.emitted
        );
    }
    info!(
        "Shutdown complete: {} requests, {} events delivered ({} changed), {} progress reports",
        summary.total_requests(),
        summary.aggregator.delivered,
        summary.aggregator.changed,
        summary.progress_ticks
    );

    Ok(())
}
