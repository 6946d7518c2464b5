//! Price Source Trait
//!
//! Defines the single-lookup interface polling workers call.
//! Implementations include the Binance spot ticker client; tests plug in
//! scripted sources.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One price observation as returned by a source.
///
/// `price` is kept as the exact text the source sent. It is compared by
/// value and never parsed as a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: String,
}

impl PriceQuote {
    pub fn new(symbol: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: price.into(),
        }
    }
}

/// Errors from a single price lookup. All of them are recoverable: the
/// caller logs, counts the attempt and moves on to the next symbol.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or other transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-2xx status
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be decoded into a quote
    #[error("malformed response: {0}")]
    Decode(String),

    /// Lookup did not finish within the allowed time
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// True for failures caused by the response body rather than the transport
    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode(_))
    }
}

/// Common trait for price lookups
///
/// Implementations must be Send + Sync so one source can be shared by
/// every worker in the pool.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Get the source's display name (e.g., "Binance")
    fn source_name(&self) -> &str;

    /// Fetch the current price for one symbol
    ///
    /// # Returns
    /// * `Ok(PriceQuote)` - the price as reported by the source
    /// * `Err(FetchError)` - transport, status, decode or timeout failure
    async fn fetch(&self, symbol: &str) -> Result<PriceQuote, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_compares_text_exactly() {
        let a = PriceQuote::new("BTCUSDT", "50000.00");
        let b = PriceQuote::new("BTCUSDT", "50000.0");
        assert_ne!(a, b);
        assert_eq!(a, PriceQuote::new("BTCUSDT", "50000.00"));
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            status: 400,
            body: "{\"code\":-1121}".to_string(),
        };
        assert_eq!(err.to_string(), "unexpected status 400: {\"code\":-1121}");
        assert!(FetchError::Decode("eof".into()).is_decode());
        assert!(!FetchError::Timeout(Duration::from_millis(5)).is_decode());
    }
}
