//! price_poller_rust - concurrent price polling with per-partition change detection
//!
//! Symbols are dealt round-robin to a bounded pool of workers. Each worker
//! polls its own partition forever, keeps its own price cache, and emits
//! one event per successful fetch onto a shared bus. A single aggregator
//! prints events; a progress reporter periodically prints the total number
//! of fetch attempts. A `STOP` line on stdin (or EOF, Ctrl+C, SIGTERM)
//! cancels everything and drains the bus before exit.

pub mod aggregator;
pub mod bus;
pub mod config;
pub mod errors;
pub mod partition;
pub mod poller;
pub mod price;
pub mod progress;
pub mod stop;
pub mod types;
pub mod worker;

pub use config::PollerConfig;
pub use errors::{ConfigError, PollerError};
pub use poller::{PollerState, PricePoller, RunningPoller};
pub use types::{PollerSummary, PriceEvent, WorkerReport};
