//! Map tile providers.
//!
//! This module covers everything between a projected tile coordinate and a
//! decoded tile image:
//!
//! - [`MapProvider`] / [`ProviderList`]: validated, ordered provider config
//! - [`AsyncHttpClient`]: the network seam, with [`ReqwestClient`] for real use
//! - [`TileFetcher`]: cache-aware fetch of a single tile
//! - [`ProviderChain`]: ordered fallback across providers

mod builtin;
mod chain;
mod fetcher;
mod http;
mod types;

pub use builtin::BUILTIN_PROVIDERS;
pub use chain::{
    first_success, ProviderAttempt, ProviderChain, DEFAULT_GRID_RADIUS, DEFAULT_ZOOM,
    MAX_GRID_RADIUS,
};
pub use fetcher::TileFetcher;
pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_TIMEOUT, USER_AGENT};
pub use types::{FetchError, MapProvider, ProviderConfigError, ProviderError, ProviderList};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
