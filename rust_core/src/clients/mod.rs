//! External API clients

pub mod binance;
pub mod price_source;

pub use binance::BinanceClient;
pub use price_source::{FetchError, PriceQuote, PriceSource};
