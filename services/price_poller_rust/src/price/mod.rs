//! Per-worker price state

pub mod cache;
pub mod counter;

pub use cache::{CacheUpdate, PriceCache};
pub use counter::RequestCounter;
