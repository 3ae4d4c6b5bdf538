//! In-memory tile cache with time-based expiry, backed by moka.
//!
//! Entries are keyed by provider and tile coordinates. Expiry is evaluated
//! lazily against an injected [`Clock`] when an entry is read: an expired
//! entry is removed on that read and reported as a miss. There is no
//! background sweeper and no capacity eviction, so an expired read is the only
//! way an entry leaves the cache.
//!
//! Concurrent loads of the same key are coalesced by moka's `try_get_with`:
//! the first caller runs the load, later callers wait for its result. Loads
//! of unrelated keys never wait on each other.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;

use crate::cache::clock::{Clock, SystemClock};
use crate::coord::TileCoord;
use crate::tile::TileImage;

/// Default time a fetched tile stays valid.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(3600);

/// Cache key: provider name plus tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub provider: Arc<str>,
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub fn new(provider: impl Into<Arc<str>>, tile: TileCoord) -> Self {
        Self {
            provider: provider.into(),
            zoom: tile.zoom,
            x: tile.x,
            y: tile.y,
        }
    }

    pub fn tile(&self) -> TileCoord {
        TileCoord {
            x: self.x,
            y: self.y,
            zoom: self.zoom,
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile:{}:{}:{}:{}", self.provider, self.zoom, self.x, self.y)
    }
}

/// A cached tile and the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fetched_at: Instant,
    pub tile: TileImage,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) >= ttl
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    /// Loads that went to the network.
    pub fetches: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache: {} hits, {} misses ({} expired), {} fetches",
            self.hits, self.misses, self.expired, self.fetches
        )
    }
}

/// In-memory cache for fetched map tiles.
///
/// This is the only state shared across renders. It is `Send + Sync` and is
/// normally held in an `Arc`.
pub struct TileCache {
    entries: Cache<TileKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    fetches: AtomicU64,
}

impl TileCache {
    /// Creates a cache using the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Cache::builder().build(),
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    /// The configured cache duration.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Looks up a tile.
    ///
    /// Returns `None` on a miss. An entry whose age has reached the cache
    /// duration is removed here and also reported as `None`.
    pub async fn get(&self, key: &TileKey) -> Option<TileImage> {
        match self.entries.get(key).await {
            Some(entry) if !entry.is_expired(self.clock.now(), self.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.tile)
            }
            Some(_) => {
                self.entries.invalidate(key).await;
                self.expired.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Tile cache entry expired");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a tile, stamping it with the current clock reading.
    ///
    /// Replaces any existing entry for the key.
    pub async fn put(&self, key: TileKey, tile: TileImage) {
        let entry = CacheEntry {
            fetched_at: self.clock.now(),
            tile,
        };
        self.entries.insert(key, entry).await;
    }

    /// Returns the cached tile or runs `init` to load it.
    ///
    /// If several callers miss on the same key at once, `init` runs for only
    /// one of them; the others wait and receive the same result. A failed
    /// load is not cached and the error is shared with every waiter.
    pub async fn get_or_try_insert_with<F, E>(
        &self,
        key: TileKey,
        init: F,
    ) -> Result<TileImage, Arc<E>>
    where
        F: Future<Output = Result<TileImage, E>>,
        E: Send + Sync + 'static,
    {
        if let Some(tile) = self.get(&key).await {
            return Ok(tile);
        }

        let clock = Arc::clone(&self.clock);
        let fetches = &self.fetches;
        let entry = self
            .entries
            .try_get_with(key, async move {
                fetches.fetch_add(1, Ordering::Relaxed);
                let tile = init.await?;
                Ok(CacheEntry {
                    fetched_at: clock.now(),
                    tile,
                })
            })
            .await?;

        Ok(entry.tile)
    }

    /// Number of entries currently held, including expired ones that have
    /// not been read since they expired.
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl fmt::Debug for TileCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileCache")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}
