//! Shared startup for commands that touch the network.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shiptracker::cache::TileCache;
use shiptracker::config::{config_file_path, ConfigFile, MapConfig};
use shiptracker::logging::{self, LoggingGuard};
use shiptracker::map::MapRenderer;
use shiptracker::provider::{ProviderChain, ReqwestClient, TileFetcher};
use shiptracker::vessel::{VesselClient, VESSEL_API_TIMEOUT};
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// Loaded configuration plus the logging guard for the life of a command.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Loads the config (with environment overrides) and starts logging.
    ///
    /// `log_level` from the command line wins over the config file.
    pub fn new(config_path: Option<&Path>, log_level: Option<&str>) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let mut config = ConfigFile::load_from(&config_path)?;
        config.apply_env_with(|name| std::env::var(name).ok());

        let level = log_level.or(config.logging.level.as_deref());
        let guard = logging::init(level, config.logging.file.as_deref())?;

        Ok(Self {
            config,
            config_path,
            _logging: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = shiptracker::VERSION,
            command,
            config = %self.config_path.display(),
            mmsi = %self.config.vessel.mmsi,
            "Shiptracker starting"
        );
    }

    /// A multi-threaded runtime; compose work runs on its blocking pool.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }

    pub fn map_config(&self) -> Result<MapConfig, CliError> {
        Ok(self.config.to_map_config()?)
    }

    /// Builds the provider chain and renderer from the map settings.
    pub fn map_renderer(&self, map: &MapConfig) -> Result<MapRenderer<ReqwestClient>, CliError> {
        let http = Arc::new(ReqwestClient::with_timeout(map.attempt_timeout)?);
        let cache = Arc::new(TileCache::new(map.cache_duration));
        let chain = ProviderChain::new(map.providers.clone(), TileFetcher::new(http, cache))
            .with_zoom(map.zoom)
            .with_grid_radius(map.grid_radius)
            .with_attempt_timeout(map.attempt_timeout);

        info!(
            providers = %map.providers.names().join(", "),
            zoom = map.zoom,
            grid_radius = map.grid_radius,
            "Map pipeline ready"
        );
        Ok(MapRenderer::new(chain))
    }

    /// The vessel API client; requires an API key.
    pub fn vessel_client(&self) -> Result<VesselClient<ReqwestClient>, CliError> {
        let vessel = &self.config.vessel;
        let api_key = vessel.api_key.clone().ok_or_else(|| {
            CliError::Config(
                "no VesselFinder API key. Set api_key in [vessel] or VESSELFINDER_API_KEY"
                    .to_string(),
            )
        })?;
        let http = Arc::new(ReqwestClient::with_timeout(VESSEL_API_TIMEOUT)?);
        Ok(VesselClient::new(http, api_key, vessel.mmsi.as_str())
            .with_endpoint(vessel.endpoint.as_str())
            .with_cache_timeout(vessel.cache_timeout))
    }
}
