//! Per-partition price cache with change detection
//!
//! Each worker owns one cache. Nothing else writes to it, so the lock is
//! uncontended; it exists so the cache can be inspected from other tasks
//! while the owning worker keeps running.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Outcome of a `get_and_set`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheUpdate {
    /// Price held before this write, `None` on first sighting
    pub previous: Option<String>,
    /// A prior price existed and differs from the new one
    pub changed: bool,
}

/// symbol -> last seen price
#[derive(Debug, Default)]
pub struct PriceCache {
    prices: Mutex<FxHashMap<String, String>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `price` for `symbol` and report what it replaced.
    ///
    /// Read and write happen under one lock acquisition. Prices compare as
    /// exact text.
    pub fn get_and_set(&self, symbol: &str, price: &str) -> CacheUpdate {
        let previous = self
            .prices
            .lock()
            .insert(symbol.to_string(), price.to_string());
        let changed = previous.as_deref().is_some_and(|prior| prior != price);
        CacheUpdate { previous, changed }
    }

    pub fn get(&self, symbol: &str) -> Option<String> {
        self.prices.lock().get(symbol).cloned()
    }

    pub fn len(&self) -> usize {
        self.prices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.lock().is_empty()
    }
}
