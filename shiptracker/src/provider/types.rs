//! Provider configuration records and errors.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

use crate::coord::{TileCoord, MAX_ZOOM};

/// Errors from a single tile request against a single provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// No complete response within the allowed time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or body transfer failure.
    #[error("request failed: {0}")]
    Connection(String),

    /// The body was not a decodable raster image.
    #[error("undecodable tile image: {0}")]
    InvalidImage(String),

    /// The provider does not serve this zoom level.
    #[error("zoom level {0} not supported")]
    UnsupportedZoom(u8),

    /// The request was abandoned before it completed.
    #[error("request cancelled")]
    Cancelled,
}

/// A failed tile fetch, scoped to the provider that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{provider}: tile {tile}: {source}")]
pub struct FetchError {
    pub provider: String,
    pub tile: TileCoord,
    pub source: ProviderError,
}

/// Invalid provider configuration. Detected at startup and fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderConfigError {
    #[error("provider name must not be empty")]
    EmptyName,

    #[error("provider '{name}': URL template must start with http:// or https://")]
    InvalidScheme { name: String },

    #[error("provider '{name}': URL template is missing the {{{placeholder}}} placeholder")]
    MissingPlaceholder { name: String, placeholder: String },

    #[error("provider '{name}': unknown placeholder {{{placeholder}}} in URL template")]
    UnknownPlaceholder { name: String, placeholder: String },

    #[error("duplicate provider name '{0}'")]
    DuplicateName(String),

    #[error("at least one map provider must be configured")]
    NoProviders,
}

const REQUIRED_PLACEHOLDERS: [&str; 3] = ["z", "x", "y"];

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"))
}

/// A raster tile source.
///
/// The URL template contains `{z}`, `{x}` and `{y}` placeholders, in any
/// order, which are replaced with the tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapProvider {
    name: Arc<str>,
    url_template: String,
    max_zoom: u8,
}

impl MapProvider {
    /// Creates a provider, validating the name and URL template.
    pub fn new(
        name: impl Into<String>,
        url_template: impl Into<String>,
    ) -> Result<Self, ProviderConfigError> {
        let name = name.into().trim().to_string();
        let url_template = url_template.into().trim().to_string();

        if name.is_empty() {
            return Err(ProviderConfigError::EmptyName);
        }
        if !(url_template.starts_with("https://") || url_template.starts_with("http://")) {
            return Err(ProviderConfigError::InvalidScheme { name });
        }

        let found: Vec<&str> = placeholder_pattern()
            .captures_iter(&url_template)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        if let Some(unknown) = found
            .iter()
            .copied()
            .find(|p| !REQUIRED_PLACEHOLDERS.contains(p))
        {
            return Err(ProviderConfigError::UnknownPlaceholder {
                name,
                placeholder: unknown.to_string(),
            });
        }
        for required in REQUIRED_PLACEHOLDERS {
            if !found.contains(&required) {
                return Err(ProviderConfigError::MissingPlaceholder {
                    name,
                    placeholder: required.to_string(),
                });
            }
        }

        Ok(Self {
            name: name.into(),
            url_template,
            max_zoom: MAX_ZOOM,
        })
    }

    /// Limits the zoom levels this provider is asked for.
    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom.min(MAX_ZOOM);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the name, used for cache keys.
    pub fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    pub fn supports_zoom(&self, zoom: u8) -> bool {
        zoom <= self.max_zoom
    }

    /// Builds the request URL for a tile.
    pub fn tile_url(&self, tile: &TileCoord) -> String {
        self.url_template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

impl fmt::Display for MapProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url_template)
    }
}

/// Ordered, non-empty list of providers with unique names.
///
/// Order is fallback priority and never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderList {
    providers: Vec<MapProvider>,
}

impl ProviderList {
    pub fn new(providers: Vec<MapProvider>) -> Result<Self, ProviderConfigError> {
        if providers.is_empty() {
            return Err(ProviderConfigError::NoProviders);
        }
        for (i, provider) in providers.iter().enumerate() {
            if providers[..i].iter().any(|p| p.name() == provider.name()) {
                return Err(ProviderConfigError::DuplicateName(provider.name().to_string()));
            }
        }
        Ok(Self { providers })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MapProvider> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(MapProvider::name).collect()
    }
}

impl<'a> IntoIterator for &'a ProviderList {
    type Item = &'a MapProvider;
    type IntoIter = std::slice::Iter<'a, MapProvider>;

    fn into_iter(self) -> Self::IntoIter {
        self.providers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn osm() -> MapProvider {
        MapProvider::new("osm", "https://tile.openstreetmap.org/{z}/{x}/{y}.png").unwrap()
    }

    #[test]
    fn test_tile_url() {
        let url = osm().tile_url(&TileCoord { x: 339, y: 140, zoom: 9 });
        assert_eq!(url, "https://tile.openstreetmap.org/9/339/140.png");
    }

    #[test]
    fn test_tile_url_with_reordered_placeholders() {
        let provider = MapProvider::new(
            "arcgis",
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}",
        )
        .unwrap();
        let url = provider.tile_url(&TileCoord { x: 200, y: 100, zoom: 15 });
        assert!(url.ends_with("/tile/15/100/200"));
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let err = MapProvider::new("bad", "https://example.com/{z}/{x}.png").unwrap_err();
        assert_eq!(
            err,
            ProviderConfigError::MissingPlaceholder {
                name: "bad".to_string(),
                placeholder: "y".to_string()
            }
        );
        assert!(err.to_string().contains("{y}"));
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = MapProvider::new("bad", "https://{s}.example.com/{z}/{x}/{y}.png").unwrap_err();
        assert!(matches!(err, ProviderConfigError::UnknownPlaceholder { .. }));
    }

    #[test]
    fn test_scheme_required() {
        let err = MapProvider::new("bad", "ftp://example.com/{z}/{x}/{y}").unwrap_err();
        assert!(matches!(err, ProviderConfigError::InvalidScheme { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = MapProvider::new("  ", "https://example.com/{z}/{x}/{y}").unwrap_err();
        assert_eq!(err, ProviderConfigError::EmptyName);
    }

    #[test]
    fn test_supports_zoom() {
        let provider = osm().with_max_zoom(12);
        assert!(provider.supports_zoom(12));
        assert!(!provider.supports_zoom(13));
    }

    #[test]
    fn test_provider_list_rejects_empty() {
        assert_eq!(
            ProviderList::new(Vec::new()).unwrap_err(),
            ProviderConfigError::NoProviders
        );
    }

    #[test]
    fn test_provider_list_rejects_duplicates() {
        let err = ProviderList::new(vec![osm(), osm()]).unwrap_err();
        assert_eq!(err, ProviderConfigError::DuplicateName("osm".to_string()));
    }

    #[test]
    fn test_provider_list_preserves_order() {
        let carto = MapProvider::new(
            "carto",
            "https://a.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
        )
        .unwrap();
        let list = ProviderList::new(vec![carto, osm()]).unwrap();
        assert_eq!(list.names(), vec!["carto", "osm"]);
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError {
            provider: "osm".to_string(),
            tile: TileCoord { x: 1, y: 2, zoom: 9 },
            source: ProviderError::HttpStatus {
                status: 500,
                url: "https://x/9/1/2.png".to_string(),
            },
        };
        assert_eq!(err.to_string(), "osm: tile 9/1/2: HTTP 500 from https://x/9/1/2.png");
    }
}
