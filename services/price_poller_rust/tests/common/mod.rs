//! Shared helpers for poller integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use price_poller_core::{FetchError, PriceQuote, PriceSource};
use std::collections::{HashMap, VecDeque};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cloneable in-memory writer standing in for stdout
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Plays back a price script per symbol, then keeps repeating the last
/// price. Symbols without a script always fail.
pub struct StickySource {
    scripts: Mutex<HashMap<String, VecDeque<String>>>,
    delay: Duration,
    calls: AtomicU64,
}

impl StickySource {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            delay: Duration::from_millis(2),
            calls: AtomicU64::new(0),
        }
    }

    pub fn script(self, symbol: &str, prices: &[&str]) -> Self {
        self.scripts.lock().insert(
            symbol.to_string(),
            prices.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Fetches started, including ones abandoned at shutdown
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for StickySource {
    fn source_name(&self) -> &str {
        "sticky"
    }

    async fn fetch(&self, symbol: &str) -> Result<PriceQuote, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let mut scripts = self.scripts.lock();
        let queue = scripts
            .get_mut(symbol)
            .ok_or_else(|| FetchError::Status {
                status: 400,
                body: format!("unknown symbol {}", symbol),
            })?;
        let price = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        price
            .map(|p| PriceQuote::new(symbol, p))
            .ok_or_else(|| FetchError::Decode("empty script".to_string()))
    }
}
