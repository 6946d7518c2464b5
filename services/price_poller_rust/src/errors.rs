//! Error types for the polling engine
//!
//! Per-symbol fetch failures never reach this level: workers log and count
//! them locally (see `price_poller_core::FetchError`). What remains here is
//! either fatal before startup or a drain-ordering violation.

use thiserror::Error;

/// Configuration errors. Fatal: the process exits before any worker starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml_bw::Error),

    /// An environment override was present but unusable.
    #[error("{var} must be a valid {expected}")]
    Env { var: String, expected: &'static str },

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    Invalid(String),
}

/// Errors surfaced by the orchestrator
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A worker tried to emit after the event bus closed, or a task died
    /// while the orchestrator was draining.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}
