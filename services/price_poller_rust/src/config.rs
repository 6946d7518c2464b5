//! Configuration for price_poller_rust
//!
//! The symbol list and worker count come from a YAML file (`config.yaml` by
//! default). Tuning knobs can be overridden from the environment.

use crate::errors::ConfigError;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const CONFIG_PATH_VAR: &str = "PRICE_POLLER_CONFIG";
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com/api/v3";
pub const DEFAULT_PROGRESS_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Instrument symbols to poll, e.g. BTCUSDT
    #[serde(default)]
    pub symbols: Vec<String>,

    /// Requested worker count; clamped to available parallelism at startup
    #[serde(default)]
    pub max_workers: i64,

    // Monitoring
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,

    // Price source
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_progress_interval_secs() -> u64 {
    DEFAULT_PROGRESS_INTERVAL_SECS
}

fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl PollerConfig {
    /// Load from the file named by `PRICE_POLLER_CONFIG` (or `config.yaml`),
    /// then apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let contents = read_file(&path)?;
        Self::parse(&contents)?
            .with_overrides(|var| env::var(var).ok())?
            .validated()
    }

    /// Load from a file without consulting the environment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = read_file(path)?;
        Self::parse(&contents)?.validated()
    }

    /// Load from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml)?.validated()
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml_bw::from_str(yaml)?)
    }

    /// Apply overrides from `lookup` (the process environment in production)
    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secs) = parse_u64(&lookup, "PRICE_POLLER_PROGRESS_INTERVAL_SECS")? {
            self.progress_interval_secs = secs;
        }
        if let Some(ms) = parse_u64(&lookup, "PRICE_POLLER_FETCH_TIMEOUT_MS")? {
            self.fetch_timeout_ms = ms;
        }
        if let Some(url) = lookup("PRICE_POLLER_BASE_URL") {
            self.base_url = url;
        }
        Ok(self)
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        if self.max_workers <= 0 {
            return Err(ConfigError::Invalid(format!(
                "max_workers must be > 0, got {}",
                self.max_workers
            )));
        }
        if self.progress_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "progress_interval_secs must be > 0".to_string(),
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid("fetch_timeout_ms must be > 0".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }

        for (i, symbol) in self.symbols.iter_mut().enumerate() {
            let trimmed = symbol.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid(format!("symbols[{}] is blank", i)));
            }
            *symbol = trimmed.to_string();
        }

        Ok(self)
    }
}

fn read_file<P: AsRef<Path>>(path: P) -> Result<String, ConfigError> {
    std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
        path: path.as_ref().display().to_string(),
        source,
    })
}

/// Parse an override as u64; absent means no override
fn parse_u64<F>(lookup: &F, var_name: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var_name) {
        Some(val) => val.trim().parse().map(Some).map_err(|_| ConfigError::Env {
            var: var_name.to_string(),
            expected: "u64",
        }),
        None => Ok(None),
    }
}
