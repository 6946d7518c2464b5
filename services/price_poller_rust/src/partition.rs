//! Symbol partitioning across the worker pool
//!
//! Symbols are dealt round-robin: the i-th symbol goes to worker
//! `i % worker_count`. Assignment is computed once and never rebalanced.
//! With fewer symbols than workers the surplus workers get empty partitions
//! and simply idle until shutdown, which costs one parked task each.

use crate::errors::ConfigError;
use std::num::NonZeroUsize;
use tracing::warn;

/// Upper bound on concurrent workers: the machine's available parallelism
pub fn hard_cap() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// `min(requested, hard_cap)`, refusing to produce zero workers
pub fn effective_worker_count(requested: i64, hard_cap: usize) -> Result<usize, ConfigError> {
    if requested <= 0 {
        return Err(ConfigError::Invalid(format!(
            "worker count must be > 0, got {}",
            requested
        )));
    }
    if hard_cap == 0 {
        return Err(ConfigError::Invalid("worker hard cap must be > 0".to_string()));
    }

    let requested = usize::try_from(requested).unwrap_or(usize::MAX);
    if requested > hard_cap {
        warn!(
            "Requested {} workers, clamping to available parallelism {}",
            requested, hard_cap
        );
    }
    Ok(requested.min(hard_cap))
}

/// Split `symbols` into exactly `effective_worker_count(requested, hard_cap)`
/// partitions, preserving input order inside each partition.
pub fn partition_symbols(
    symbols: &[String],
    requested: i64,
    hard_cap: usize,
) -> Result<Vec<Vec<String>>, ConfigError> {
    let worker_count = effective_worker_count(requested, hard_cap)?;

    let mut partitions: Vec<Vec<String>> = (0..worker_count)
        .map(|_| Vec::with_capacity(symbols.len() / worker_count + 1))
        .collect();

    for (i, symbol) in symbols.iter().enumerate() {
        partitions[i % worker_count].push(symbol.clone());
    }

    Ok(partitions)
}
