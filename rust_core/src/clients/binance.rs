//! Binance API Client
//!
//! Provides spot prices from the Binance public ticker endpoint.
//! No API key required for public endpoints.
//!
//! Every request carries a hard timeout so a stalled connection can never
//! park a polling worker indefinitely.

use super::price_source::{FetchError, PriceQuote, PriceSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const BASE_URL: &str = "https://api.binance.com/api/v3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Binance API client implementing PriceSource
#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BinanceClient {
    /// Create a new client against the production API
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(BASE_URL, timeout)
    }

    /// Create a client against an alternative base URL (mirrors, test servers)
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("PricePoller/1.0")
            .build()
            .context("Failed to create HTTP client for Binance")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl PriceSource for BinanceClient {
    fn source_name(&self) -> &str {
        "Binance"
    }

    async fn fetch(&self, symbol: &str) -> Result<PriceQuote, FetchError> {
        let url = format!("{}/ticker/price", self.base_url);

        debug!("Fetching {} from Binance", symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        let ticker: BinanceTickerPrice =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        // Cache keys are the requested symbols, so the answer must be for that symbol
        if !ticker.symbol.eq_ignore_ascii_case(symbol) {
            return Err(FetchError::Decode(format!(
                "asked for {} but response is for {}",
                symbol, ticker.symbol
            )));
        }

        Ok(PriceQuote {
            symbol: symbol.to_string(),
            price: ticker.price,
        })
    }
}

/// Binance ticker price response
#[derive(Debug, Deserialize)]
struct BinanceTickerPrice {
    symbol: String,
    price: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> BinanceClient {
        BinanceClient::with_base_url(server.uri(), timeout).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            BinanceClient::with_base_url("http://localhost:9999/api/v3/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999/api/v3");
        assert_eq!(client.source_name(), "Binance");
    }

    #[tokio::test]
    async fn test_fetch_returns_price_text_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ticker/price"))
            .and(query_param("symbol", "BTCUSDT"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"symbol": "BTCUSDT", "price": "50000.01000000"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(2));
        let quote = client.fetch("BTCUSDT").await.unwrap();
        assert_eq!(quote, PriceQuote::new("BTCUSDT", "50000.01000000"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ticker/price"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string("{\"code\":-1121,\"msg\":\"Invalid symbol.\"}"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(2));
        match client.fetch("NOPE").await {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("Invalid symbol"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ticker/price"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(2));
        let err = client.fetch("BTCUSDT").await.unwrap_err();
        assert!(err.is_decode(), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_mismatched_symbol_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ticker/price"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"symbol": "ETHUSDT", "price": "3000.00"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(2));
        let err = client.fetch("BTCUSDT").await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ticker/price"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"symbol": "BTCUSDT", "price": "1"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_millis(100));
        match client.fetch("BTCUSDT").await {
            Err(FetchError::Timeout(limit)) => assert_eq!(limit, Duration::from_millis(100)),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_ticker_price() {
        let client = BinanceClient::new(DEFAULT_TIMEOUT).unwrap();
        let quote = client.fetch("BTCUSDT").await.unwrap();
        assert_eq!(quote.symbol, "BTCUSDT");
        assert!(!quote.price.is_empty());
    }
}
