//! Ordered provider fallback.
//!
//! A render asks providers one after another, in configured order, until one
//! of them delivers the tile grid around the ship. There is no retry within a
//! provider: a failed or timed-out attempt moves straight on to the next one.

use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::fetcher::TileFetcher;
use super::http::{AsyncHttpClient, DEFAULT_TIMEOUT};
use super::types::{FetchError, MapProvider, ProviderError, ProviderList};
use crate::coord::{to_tile_coords, to_world_pixel, GeoPosition, TileCoord, TILE_SIZE};
use crate::map::{MapError, TileMosaic};
use crate::tile::TileImage;

/// Zoom level used when none is configured.
pub const DEFAULT_ZOOM: u8 = 9;

/// Tiles fetched on each side of the ship's tile (1 → 3×3 grid).
pub const DEFAULT_GRID_RADIUS: u32 = 1;

/// Largest supported grid radius (7×7 tiles).
pub const MAX_GRID_RADIUS: u32 = 3;

/// Runs `attempt` over `items` in order and returns the first success.
///
/// Each attempt starts only after the previous one has failed. If every
/// attempt fails, all errors are returned in attempt order.
pub async fn first_success<I, T, E, F, Fut>(items: I, mut attempt: F) -> Result<T, Vec<E>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = Vec::new();
    for item in items {
        match attempt(item).await {
            Ok(value) => return Ok(value),
            Err(e) => failures.push(e),
        }
    }
    Err(failures)
}

/// Outcome of one provider attempt, kept for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub elapsed: Duration,
    pub error: Option<ProviderError>,
}

impl ProviderAttempt {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// The fallback chain over an ordered provider list.
pub struct ProviderChain<C> {
    providers: ProviderList,
    fetcher: TileFetcher<C>,
    zoom: u8,
    grid_radius: u32,
    attempt_timeout: Duration,
}

impl<C: AsyncHttpClient> ProviderChain<C> {
    pub fn new(providers: ProviderList, fetcher: TileFetcher<C>) -> Self {
        Self {
            providers,
            fetcher,
            zoom: DEFAULT_ZOOM,
            grid_radius: DEFAULT_GRID_RADIUS,
            attempt_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Sets the grid radius, capped at [`MAX_GRID_RADIUS`].
    pub fn with_grid_radius(mut self, radius: u32) -> Self {
        self.grid_radius = radius.min(MAX_GRID_RADIUS);
        self
    }

    /// Sets the hard limit for one provider attempt, including every tile
    /// of its grid.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn providers(&self) -> &ProviderList {
        &self.providers
    }

    pub fn fetcher(&self) -> &TileFetcher<C> {
        &self.fetcher
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn grid_radius(&self) -> u32 {
        self.grid_radius
    }

    /// Fetches the tile grid around `position` from the first provider
    /// that can deliver it.
    pub async fn fetch_with_fallback(&self, position: GeoPosition) -> Result<TileMosaic, MapError> {
        self.fetch_with_report(position).await.0
    }

    /// Like [`fetch_with_fallback`](Self::fetch_with_fallback), also
    /// returning one [`ProviderAttempt`] per provider tried.
    pub async fn fetch_with_report(
        &self,
        position: GeoPosition,
    ) -> (Result<TileMosaic, MapError>, Vec<ProviderAttempt>) {
        let (lat, lon) = (position.latitude(), position.longitude());
        let projected = to_tile_coords(lat, lon, self.zoom)
            .and_then(|tile| to_world_pixel(lat, lon, self.zoom).map(|px| (tile, px)));
        let (center, world) = match projected {
            Ok(p) => p,
            Err(e) => {
                warn!(position = %position, error = %e, "Position cannot be projected");
                return (Err(MapError::from(e)), Vec::new());
            }
        };

        let attempts = Mutex::new(Vec::new());
        let result = first_success(self.providers.iter(), |provider| {
            let started = Instant::now();
            let attempts = &attempts;
            async move {
                let result = self.attempt(provider, center, world).await;
                attempts.lock().push(ProviderAttempt {
                    provider: provider.name().to_string(),
                    elapsed: started.elapsed(),
                    error: result.as_ref().err().map(|e| e.source.clone()),
                });
                result
            }
        })
        .await;

        let result = result.map_err(|failures| {
            warn!(
                position = %position,
                providers = failures.len(),
                "All map providers failed"
            );
            MapError::AllProvidersExhausted { failures }
        });
        (result, attempts.into_inner())
    }

    /// One provider attempt.
    ///
    /// The centre tile must arrive within the attempt timeout. Each
    /// neighbour then gets its own deadline of the same length; a neighbour
    /// that misses it is left blank and does not fail the provider.
    async fn attempt(
        &self,
        provider: &MapProvider,
        center: TileCoord,
        world: (f64, f64),
    ) -> Result<TileMosaic, FetchError> {
        let fetched =
            tokio::time::timeout(self.attempt_timeout, self.fetcher.fetch(provider, center)).await;
        let center_result = match fetched {
            Ok(result) => result,
            Err(_) => Err(FetchError {
                provider: provider.name().to_string(),
                tile: center,
                source: ProviderError::Timeout(self.attempt_timeout),
            }),
        };

        let result = match center_result {
            Ok(tile) => Ok(self.fetch_grid(provider, center, tile, world).await),
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => info!(provider = %provider.name(), tile = %center, "Map tiles fetched"),
            Err(e) => warn!(
                provider = %provider.name(),
                tile = %e.tile,
                error = %e.source,
                "Map provider failed, trying next"
            ),
        }
        result
    }

    /// Fetches the neighbours of an already fetched centre tile concurrently.
    ///
    /// Neighbours that fail, time out, or lie beyond the poles are left blank.
    async fn fetch_grid(
        &self,
        provider: &MapProvider,
        center: TileCoord,
        center_tile: TileImage,
        world: (f64, f64),
    ) -> TileMosaic {
        let deadline = tokio::time::Instant::now() + self.attempt_timeout;
        let r = self.grid_radius as i64;
        let side = (2 * r + 1) as u32;
        let offsets: Vec<(i64, i64)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .collect();

        let fetches = offsets.iter().map(|&(dx, dy)| {
            let center_tile = &center_tile;
            async move {
                if (dx, dy) == (0, 0) {
                    return center_tile.clone();
                }
                let Some(tile) = center.offset(dx, dy) else {
                    return TileImage::blank();
                };
                match tokio::time::timeout_at(deadline, self.fetcher.fetch(provider, tile)).await {
                    Ok(Ok(image)) => image,
                    Ok(Err(e)) => {
                        debug!(tile = %tile, error = %e.source, "Neighbour tile unavailable, leaving blank");
                        TileImage::blank()
                    }
                    Err(_) => {
                        debug!(tile = %tile, "Neighbour tile timed out, leaving blank");
                        TileImage::blank()
                    }
                }
            }
        });
        let tiles = join_all(fetches).await;

        // Grid origin in unwrapped pixels so the marker stays correct when
        // columns wrap across the antimeridian.
        let origin_x = (center.x as i64 - r) * TILE_SIZE as i64;
        let origin_y = (center.y as i64 - r) * TILE_SIZE as i64;
        let marker = (world.0 - origin_x as f64, world.1 - origin_y as f64);

        TileMosaic::new(provider.name(), side, side, tiles, marker)
    }
}
