//! Price Poller Core - shared price source plumbing.
//!
//! This module provides:
//! - The `PriceSource` seam used by polling workers
//! - A bounded-timeout Binance spot ticker client
//! - The fetch error taxonomy shared by all sources

pub mod clients;

pub use clients::binance::BinanceClient;
pub use clients::price_source::{FetchError, PriceQuote, PriceSource};
