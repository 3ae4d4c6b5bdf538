//! Single-tile fetcher: cache lookup, download and decode.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::http::AsyncHttpClient;
use super::types::{FetchError, MapProvider, ProviderError};
use crate::cache::{TileCache, TileKey};
use crate::coord::TileCoord;
use crate::tile::TileImage;

/// Fetches tiles from one provider at a time, consulting the cache first.
///
/// Concurrent requests for the same provider and tile share one download.
/// Errors never escape as panics; every failure comes back as a
/// [`FetchError`] naming the provider.
pub struct TileFetcher<C> {
    client: Arc<C>,
    cache: Arc<TileCache>,
}

impl<C> Clone for TileFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<C: AsyncHttpClient> TileFetcher<C> {
    pub fn new(client: Arc<C>, cache: Arc<TileCache>) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Fetches one tile from one provider.
    ///
    /// A fresh cache entry is returned without touching the network. On a
    /// miss the tile is downloaded, decoded and cached; nothing is cached on
    /// failure.
    #[instrument(skip(self, provider, tile), fields(provider = %provider.name(), tile = %tile))]
    pub async fn fetch(
        &self,
        provider: &MapProvider,
        tile: TileCoord,
    ) -> Result<TileImage, FetchError> {
        let fail = |source: ProviderError| FetchError {
            provider: provider.name().to_string(),
            tile,
            source,
        };

        if !provider.supports_zoom(tile.zoom) {
            return Err(fail(ProviderError::UnsupportedZoom(tile.zoom)));
        }

        let key = TileKey::new(provider.name_arc(), tile);
        let url = provider.tile_url(&tile);

        self.cache
            .get_or_try_insert_with(key, async {
                debug!(url = %url, "Downloading tile");
                let body = self.client.get(&url).await?;
                let size = body.len();
                let image = TileImage::decode(body)
                    .map_err(|e| ProviderError::InvalidImage(e.to_string()))?;
                debug!(size_bytes = size, "Tile downloaded");
                Ok::<_, ProviderError>(image)
            })
            .await
            .map_err(|e| fail(ProviderError::clone(&e)))
    }
}
