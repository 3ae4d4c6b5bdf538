//! Tile cache.
//!
//! Fetched tiles are kept in memory, keyed by provider and tile coordinates,
//! and expire after a fixed duration (one hour by default). Nothing is
//! persisted; the cache is discarded with the process.

mod clock;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::{CacheEntry, CacheStats, TileCache, TileKey, DEFAULT_CACHE_DURATION};
