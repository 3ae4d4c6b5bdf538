//! Built-in provider order.

use super::types::{MapProvider, ProviderConfigError, ProviderList};

/// Name and URL template of every built-in provider, in fallback order.
pub const BUILTIN_PROVIDERS: [(&str, &str); 4] = [
    (
        "OpenStreetMap",
        "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
    ),
    (
        "CARTO Positron",
        "https://a.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
    ),
    (
        "ArcGIS World Street Map",
        "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}",
    ),
    (
        "OpenTopoMap",
        "https://a.tile.opentopomap.org/{z}/{x}/{y}.png",
    ),
];

/// OpenTopoMap only renders up to zoom 17.
const OPENTOPOMAP_MAX_ZOOM: u8 = 17;

impl ProviderList {
    /// The default provider order used when no `[providers]` section is
    /// configured.
    pub fn builtin() -> Result<Self, ProviderConfigError> {
        let providers = BUILTIN_PROVIDERS
            .iter()
            .map(|(name, template)| {
                let provider = MapProvider::new(*name, *template)?;
                Ok(if *name == "OpenTopoMap" {
                    provider.with_max_zoom(OPENTOPOMAP_MAX_ZOOM)
                } else {
                    provider
                })
            })
            .collect::<Result<Vec<_>, ProviderConfigError>>()?;

        ProviderList::new(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_list_is_valid_and_ordered() {
        let list = ProviderList::builtin().unwrap();
        assert_eq!(
            list.names(),
            vec![
                "OpenStreetMap",
                "CARTO Positron",
                "ArcGIS World Street Map",
                "OpenTopoMap"
            ]
        );
    }

    #[test]
    fn test_builtin_arcgis_uses_row_before_column() {
        let list = ProviderList::builtin().unwrap();
        let arcgis = list.iter().nth(2).unwrap();
        let url = arcgis.tile_url(&crate::coord::TileCoord { x: 1, y: 2, zoom: 3 });
        assert!(url.ends_with("/tile/3/2/1"));
    }

    #[test]
    fn test_builtin_opentopomap_zoom_limit() {
        let list = ProviderList::builtin().unwrap();
        let topo = list.iter().last().unwrap();
        assert!(topo.supports_zoom(17));
        assert!(!topo.supports_zoom(18));
    }
}
