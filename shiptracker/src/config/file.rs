//! INI file model.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::cache::DEFAULT_CACHE_DURATION;
use crate::coord::MAX_ZOOM;
use crate::display::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MIN_HEIGHT, MIN_WIDTH};
use crate::map::{TargetSize, DEFAULT_TARGET_HEIGHT, DEFAULT_TARGET_WIDTH};
use crate::provider::{
    MapProvider, ProviderConfigError, ProviderList, DEFAULT_GRID_RADIUS, DEFAULT_TIMEOUT,
    DEFAULT_ZOOM, MAX_GRID_RADIUS,
};
use crate::vessel::{DEFAULT_CACHE_TIMEOUT, DEFAULT_ENDPOINT};

/// Environment variable overriding `vessel.api_key`.
pub const ENV_API_KEY: &str = "VESSELFINDER_API_KEY";
/// Environment variable overriding `vessel.mmsi`.
pub const ENV_MMSI: &str = "MMSI";

/// Default MMSI (Sapphire Princess).
const DEFAULT_MMSI: &str = "235103357";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 21_600;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Allowed range for the per-provider attempt timeout, in seconds.
const MIN_PROVIDER_TIMEOUT_SECS: u64 = 5;
const MAX_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Prefix of ordered provider entries in `[providers]`.
const PROVIDER_ENTRY_PREFIX: &str = "provider.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: String,
        value: String,
        reason: String,
    },

    #[error("invalid provider entry {key}: expected 'name|url_template'")]
    MalformedProvider { key: String },

    #[error(transparent)]
    Provider(#[from] ProviderConfigError),
}

/// Directory holding the config file.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shiptracker")
}

/// Path of the config file.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.ini")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VesselSettings {
    pub api_key: Option<String>,
    pub mmsi: String,
    pub endpoint: String,
    /// How long a vessel report is reused.
    pub cache_timeout: Duration,
    /// Suggested refresh period reported to the display.
    pub refresh_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSettings {
    pub zoom: u8,
    pub grid_radius: u32,
    /// Size of standalone map renders.
    pub width: u32,
    pub height: u32,
    /// Tile cache duration.
    pub cache_duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Per-provider attempt timeout.
    pub timeout: Duration,
    /// Configured `(name, url_template)` pairs, in order. Empty means the
    /// built-in list.
    pub entries: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: Option<String>,
    /// Log file; stderr only when unset.
    pub file: Option<PathBuf>,
}

/// Everything the map pipeline needs, resolved from the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapConfig {
    pub providers: ProviderList,
    pub zoom: u8,
    pub grid_radius: u32,
    pub target: TargetSize,
    pub attempt_timeout: Duration,
    pub cache_duration: Duration,
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub vessel: VesselSettings,
    pub display: DisplaySettings,
    pub map: MapSettings,
    pub providers: ProviderSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            vessel: VesselSettings {
                api_key: None,
                mmsi: DEFAULT_MMSI.to_string(),
                endpoint: DEFAULT_ENDPOINT.to_string(),
                cache_timeout: DEFAULT_CACHE_TIMEOUT,
                refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            },
            display: DisplaySettings {
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
            },
            map: MapSettings {
                zoom: DEFAULT_ZOOM,
                grid_radius: DEFAULT_GRID_RADIUS,
                width: DEFAULT_TARGET_WIDTH,
                height: DEFAULT_TARGET_HEIGHT,
                cache_duration: DEFAULT_CACHE_DURATION,
            },
            providers: ProviderSettings {
                timeout: DEFAULT_TIMEOUT,
                entries: Vec::new(),
            },
            server: ServerSettings {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            logging: LoggingSettings::default(),
        }
    }
}

impl ConfigFile {
    /// Loads the default config file, then applies environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&config_file_path())?;
        config.apply_env_with(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Loads a specific file without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parses INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Overrides the API key and MMSI from the environment.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.vessel.api_key = Some(key.trim().to_string());
        }
        if let Some(mmsi) = lookup(ENV_MMSI).filter(|v| !v.trim().is_empty()) {
            self.vessel.mmsi = mmsi.trim().to_string();
        }
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |section: &str, key: &str| {
            ini.section(Some(section))
                .and_then(|props| props.get(key))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("vessel", "api_key") {
            config.vessel.api_key = Some(v.to_string());
        }
        if let Some(v) = get("vessel", "mmsi") {
            config.vessel.mmsi = v.to_string();
        }
        if let Some(v) = get("vessel", "endpoint") {
            config.vessel.endpoint = v.to_string();
        }
        if let Some(v) = get("vessel", "cache_timeout") {
            config.vessel.cache_timeout = secs("vessel", "cache_timeout", v)?;
        }
        if let Some(v) = get("vessel", "refresh_interval") {
            config.vessel.refresh_interval = secs("vessel", "refresh_interval", v)?;
        }

        if let Some(v) = get("display", "width") {
            config.display.width = number("display", "width", v)?;
        }
        if let Some(v) = get("display", "height") {
            config.display.height = number("display", "height", v)?;
        }

        if let Some(v) = get("map", "zoom") {
            config.map.zoom = number("map", "zoom", v)?;
        }
        if let Some(v) = get("map", "grid_radius") {
            config.map.grid_radius = number("map", "grid_radius", v)?;
        }
        if let Some(v) = get("map", "width") {
            config.map.width = number("map", "width", v)?;
        }
        if let Some(v) = get("map", "height") {
            config.map.height = number("map", "height", v)?;
        }
        if let Some(v) = get("cache", "duration") {
            config.map.cache_duration = secs("cache", "duration", v)?;
        }

        if let Some(v) = get("providers", "timeout") {
            config.providers.timeout = secs("providers", "timeout", v)?;
        }
        if let Some(props) = ini.section(Some("providers")) {
            config.providers.entries = provider_entries(props)?;
        }

        if let Some(v) = get("server", "host") {
            config.server.host = v.to_string();
        }
        if let Some(v) = get("server", "port") {
            config.server.port = number("server", "port", v)?;
        }

        config.logging.level = get("logging", "level").map(str::to_string);
        config.logging.file = get("logging", "file").map(PathBuf::from);

        config.validate()?;
        Ok(config)
    }

    /// Range checks that do not depend on other sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |section: &'static str, key: &str, value: String, reason: &str| {
            Err(ConfigError::InvalidValue {
                section,
                key: key.to_string(),
                value,
                reason: reason.to_string(),
            })
        };

        let timeout = self.providers.timeout.as_secs();
        if !(MIN_PROVIDER_TIMEOUT_SECS..=MAX_PROVIDER_TIMEOUT_SECS).contains(&timeout) {
            return invalid(
                "providers",
                "timeout",
                timeout.to_string(),
                "must be between 5 and 10 seconds",
            );
        }
        if self.map.zoom > MAX_ZOOM {
            return invalid("map", "zoom", self.map.zoom.to_string(), "must be at most 19");
        }
        if self.map.grid_radius > MAX_GRID_RADIUS {
            return invalid(
                "map",
                "grid_radius",
                self.map.grid_radius.to_string(),
                "must be at most 3",
            );
        }
        if self.map.cache_duration.is_zero() {
            return invalid("cache", "duration", "0".to_string(), "must be positive");
        }
        if self.display.width < MIN_WIDTH || self.display.height < MIN_HEIGHT {
            return invalid(
                "display",
                "width",
                format!("{}x{}", self.display.width, self.display.height),
                "display must be at least 400x240",
            );
        }
        Ok(())
    }

    /// The ordered provider list: configured entries, else the built-in
    /// list.
    pub fn provider_list(&self) -> Result<ProviderList, ConfigError> {
        if self.providers.entries.is_empty() {
            return Ok(ProviderList::builtin()?);
        }
        let providers = self
            .providers
            .entries
            .iter()
            .map(|(name, template)| MapProvider::new(name.as_str(), template.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProviderList::new(providers)?)
    }

    /// Resolves the map pipeline settings.
    pub fn to_map_config(&self) -> Result<MapConfig, ConfigError> {
        self.validate()?;
        Ok(MapConfig {
            providers: self.provider_list()?,
            zoom: self.map.zoom,
            grid_radius: self.map.grid_radius,
            target: TargetSize::new(self.map.width, self.map.height),
            attempt_timeout: self.providers.timeout,
            cache_duration: self.map.cache_duration,
        })
    }

    /// Renders the config as INI.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        let v = &self.vessel;
        ini.with_section(Some("vessel"))
            .set("api_key", v.api_key.clone().unwrap_or_default())
            .set("mmsi", v.mmsi.as_str())
            .set("endpoint", v.endpoint.as_str())
            .set("cache_timeout", v.cache_timeout.as_secs().to_string())
            .set("refresh_interval", v.refresh_interval.as_secs().to_string());
        ini.with_section(Some("display"))
            .set("width", self.display.width.to_string())
            .set("height", self.display.height.to_string());
        ini.with_section(Some("map"))
            .set("zoom", self.map.zoom.to_string())
            .set("grid_radius", self.map.grid_radius.to_string())
            .set("width", self.map.width.to_string())
            .set("height", self.map.height.to_string());
        ini.with_section(Some("cache"))
            .set("duration", self.map.cache_duration.as_secs().to_string());
        ini.with_section(Some("providers"))
            .set("timeout", self.providers.timeout.as_secs().to_string());
        for (i, (name, template)) in self.providers.entries.iter().enumerate() {
            ini.with_section(Some("providers")).set(
                format!("{PROVIDER_ENTRY_PREFIX}{}", i + 1),
                format!("{name}|{template}"),
            );
        }
        ini.with_section(Some("server"))
            .set("host", self.server.host.as_str())
            .set("port", self.server.port.to_string());
        let l = &self.logging;
        ini.with_section(Some("logging"))
            .set("level", l.level.clone().unwrap_or_default())
            .set(
                "file",
                l.file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            );
        ini
    }

    /// Writes the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    /// Writes the config to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }
}

fn number<T: std::str::FromStr>(section: &'static str, key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        section,
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn secs(section: &'static str, key: &str, value: &str) -> Result<Duration, ConfigError> {
    number::<u64>(section, key, value).map(Duration::from_secs)
}

/// Reads `provider.N = name|url_template` entries ordered by `N`.
fn provider_entries(props: &ini::Properties) -> Result<Vec<(String, String)>, ConfigError> {
    let mut entries = Vec::new();
    for (key, value) in props.iter() {
        let Some(index) = key.strip_prefix(PROVIDER_ENTRY_PREFIX) else {
            continue;
        };
        let index: u32 = number("providers", key, index)?;
        let (name, template) = value
            .split_once('|')
            .ok_or_else(|| ConfigError::MalformedProvider {
                key: key.to_string(),
            })?;
        entries.push((index, name.trim().to_string(), template.trim().to_string()));
    }
    entries.sort_by_key(|(index, _, _)| *index);
    Ok(entries
        .into_iter()
        .map(|(_, name, template)| (name, template))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.vessel.mmsi, "235103357");
        assert_eq!(config.vessel.cache_timeout, Duration::from_secs(600));
        assert_eq!(config.map.zoom, 9);
        assert_eq!(config.map.cache_duration, Duration::from_secs(3600));
        assert_eq!(config.providers.timeout, Duration::from_secs(8));
        assert_eq!((config.display.width, config.display.height), (800, 480));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sections() {
        let config = ConfigFile::parse(
            "[vessel]\napi_key = abc\nmmsi = 311000000\n\
             [map]\nzoom = 8\ngrid_radius = 2\n\
             [cache]\nduration = 1800\n\
             [server]\nport = 9000\n",
        )
        .unwrap();

        assert_eq!(config.vessel.api_key.as_deref(), Some("abc"));
        assert_eq!(config.vessel.mmsi, "311000000");
        assert_eq!(config.map.zoom, 8);
        assert_eq!(config.map.grid_radius, 2);
        assert_eq!(config.map.cache_duration, Duration::from_secs(1800));
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_provider_entries_keep_numeric_order() {
        let config = ConfigFile::parse(
            "[providers]\n\
             provider.10 = Third|https://c.example/{z}/{x}/{y}.png\n\
             provider.2 = Second|https://b.example/{z}/{x}/{y}.png\n\
             provider.1 = First|https://a.example/{z}/{x}/{y}.png\n",
        )
        .unwrap();

        let list = config.provider_list().unwrap();
        assert_eq!(list.names(), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_no_providers_means_builtin() {
        let list = ConfigFile::default().provider_list().unwrap();
        assert_eq!(list.names()[0], "OpenStreetMap");
    }

    #[test]
    fn test_invalid_provider_is_fatal() {
        let config = ConfigFile::parse(
            "[providers]\nprovider.1 = Broken|https://a.example/{z}/{x}.png\n",
        )
        .unwrap();
        assert!(matches!(
            config.provider_list(),
            Err(ConfigError::Provider(ProviderConfigError::MissingPlaceholder { .. }))
        ));

        let duplicate = ConfigFile::parse(
            "[providers]\n\
             provider.1 = A|https://a.example/{z}/{x}/{y}.png\n\
             provider.2 = A|https://b.example/{z}/{x}/{y}.png\n",
        )
        .unwrap();
        assert!(matches!(
            duplicate.to_map_config(),
            Err(ConfigError::Provider(ProviderConfigError::DuplicateName(_)))
        ));
    }

    #[test]
    fn test_malformed_provider_entry() {
        let err = ConfigFile::parse("[providers]\nprovider.1 = just-a-name\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedProvider { .. }));
    }

    #[test]
    fn test_timeout_range() {
        for bad in ["4", "11"] {
            let err = ConfigFile::parse(&format!("[providers]\ntimeout = {bad}\n")).unwrap_err();
            assert!(err.to_string().contains("providers.timeout"), "{err}");
        }
        assert!(ConfigFile::parse("[providers]\ntimeout = 5\n").is_ok());
    }

    #[test]
    fn test_bad_number() {
        let err = ConfigFile::parse("[map]\nzoom = nine\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { section: "map", .. }));
        assert!(ConfigFile::parse("[map]\nzoom = 20\n").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_API_KEY, "from-env"), (ENV_MMSI, " 244000000 ")]);
        let mut config = ConfigFile::default();

        config.apply_env_with(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.vessel.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.vessel.mmsi, "244000000");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");
        let mut config = ConfigFile::default();
        config.vessel.api_key = Some("key".to_string());
        config.providers.entries = vec![(
            "Local".to_string(),
            "http://localhost:8081/{z}/{x}/{y}.png".to_string(),
        )];
        config.logging.file = Some(PathBuf::from("/tmp/shiptracker.log"));

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_map_config() {
        let map = ConfigFile::default().to_map_config().unwrap();
        assert_eq!(map.target, TargetSize::new(400, 420));
        assert_eq!(map.attempt_timeout, Duration::from_secs(8));
        assert_eq!(map.providers.len(), 4);
    }
}
