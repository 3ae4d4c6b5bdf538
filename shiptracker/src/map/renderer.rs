//! Render driver: chain, compositor and fallback wired together.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::compositor::compose;
use super::error::MapError;
use super::placeholder::render_fallback;
use super::{RenderedMap, TargetSize};
use crate::coord::GeoPosition;
use crate::provider::{AsyncHttpClient, ProviderChain};

/// Produces a map for a position, always.
///
/// Each render runs `project → fetch chain → compose`; any failure on the
/// way ends in the placeholder instead. Renders may run concurrently and
/// share the chain's tile cache.
pub struct MapRenderer<C> {
    chain: ProviderChain<C>,
}

impl<C: AsyncHttpClient> MapRenderer<C> {
    pub fn new(chain: ProviderChain<C>) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &ProviderChain<C> {
        &self.chain
    }

    /// Renders a map of exactly `target` pixels centred on `position`.
    pub async fn render(&self, position: GeoPosition, target: TargetSize) -> RenderedMap {
        self.render_with_cancel(position, target, &CancellationToken::new())
            .await
    }

    /// Like [`render`](Self::render), abandoning the network work as soon as
    /// `cancel` fires. In-flight tile requests are dropped and the
    /// placeholder is returned.
    pub async fn render_with_cancel(
        &self,
        position: GeoPosition,
        target: TargetSize,
        cancel: &CancellationToken,
    ) -> RenderedMap {
        let (outcome, attempts) = tokio::select! {
            biased;

            _ = cancel.cancelled() => (Err(MapError::Cancelled), Vec::new()),

            report = self.chain.fetch_with_report(position) => report,
        };

        let mut map = match outcome {
            Ok(mosaic) => {
                let composing = tokio::task::spawn_blocking(move || compose(&mosaic, target));
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => fallback(&position, target, &MapError::Cancelled),

                    joined = composing => match joined {
                        Ok(map) => {
                            info!(position = %position, source = %map.source, target = %target, "Map rendered");
                            map
                        }
                        Err(e) => {
                            error!(error = %e, "Map compositor task failed");
                            render_fallback(&position, target, "compositor failed")
                        }
                    },
                }
            }
            Err(e) => fallback(&position, target, &e),
        };
        map.attempts = attempts;
        map
    }
}

fn fallback(position: &GeoPosition, target: TargetSize, cause: &MapError) -> RenderedMap {
    warn!(
        position = %position,
        reason = cause.kind(),
        error = %cause,
        "Rendering placeholder map"
    );
    render_fallback(position, target, &cause.to_string())
}
