//! Addressable `section.key` settings for `config get/set/list`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use super::file::ConfigFile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigKeyError {
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// A single scalar setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    VesselApiKey,
    VesselMmsi,
    VesselEndpoint,
    VesselCacheTimeout,
    VesselRefreshInterval,
    DisplayWidth,
    DisplayHeight,
    MapZoom,
    MapGridRadius,
    MapWidth,
    MapHeight,
    CacheDuration,
    ProvidersTimeout,
    ServerHost,
    ServerPort,
    LoggingLevel,
    LoggingFile,
}

const ALL_KEYS: [ConfigKey; 17] = [
    ConfigKey::VesselApiKey,
    ConfigKey::VesselMmsi,
    ConfigKey::VesselEndpoint,
    ConfigKey::VesselCacheTimeout,
    ConfigKey::VesselRefreshInterval,
    ConfigKey::DisplayWidth,
    ConfigKey::DisplayHeight,
    ConfigKey::MapZoom,
    ConfigKey::MapGridRadius,
    ConfigKey::MapWidth,
    ConfigKey::MapHeight,
    ConfigKey::CacheDuration,
    ConfigKey::ProvidersTimeout,
    ConfigKey::ServerHost,
    ConfigKey::ServerPort,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingFile,
];

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::VesselApiKey => "vessel.api_key",
            ConfigKey::VesselMmsi => "vessel.mmsi",
            ConfigKey::VesselEndpoint => "vessel.endpoint",
            ConfigKey::VesselCacheTimeout => "vessel.cache_timeout",
            ConfigKey::VesselRefreshInterval => "vessel.refresh_interval",
            ConfigKey::DisplayWidth => "display.width",
            ConfigKey::DisplayHeight => "display.height",
            ConfigKey::MapZoom => "map.zoom",
            ConfigKey::MapGridRadius => "map.grid_radius",
            ConfigKey::MapWidth => "map.width",
            ConfigKey::MapHeight => "map.height",
            ConfigKey::CacheDuration => "cache.duration",
            ConfigKey::ProvidersTimeout => "providers.timeout",
            ConfigKey::ServerHost => "server.host",
            ConfigKey::ServerPort => "server.port",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    pub fn section(&self) -> &'static str {
        self.name().split_once('.').map_or("", |(section, _)| section)
    }

    pub fn key_name(&self) -> &'static str {
        self.name().split_once('.').map_or("", |(_, key)| key)
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::VesselApiKey => config.vessel.api_key.clone().unwrap_or_default(),
            ConfigKey::VesselMmsi => config.vessel.mmsi.clone(),
            ConfigKey::VesselEndpoint => config.vessel.endpoint.clone(),
            ConfigKey::VesselCacheTimeout => config.vessel.cache_timeout.as_secs().to_string(),
            ConfigKey::VesselRefreshInterval => {
                config.vessel.refresh_interval.as_secs().to_string()
            }
            ConfigKey::DisplayWidth => config.display.width.to_string(),
            ConfigKey::DisplayHeight => config.display.height.to_string(),
            ConfigKey::MapZoom => config.map.zoom.to_string(),
            ConfigKey::MapGridRadius => config.map.grid_radius.to_string(),
            ConfigKey::MapWidth => config.map.width.to_string(),
            ConfigKey::MapHeight => config.map.height.to_string(),
            ConfigKey::CacheDuration => config.map.cache_duration.as_secs().to_string(),
            ConfigKey::ProvidersTimeout => config.providers.timeout.as_secs().to_string(),
            ConfigKey::ServerHost => config.server.host.clone(),
            ConfigKey::ServerPort => config.server.port.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone().unwrap_or_default(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Sets a value. The whole config is re-validated and left unchanged
    /// if the new value breaks a range check.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        let mut updated = config.clone();
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());

        match self {
            ConfigKey::VesselApiKey => updated.vessel.api_key = optional(value),
            ConfigKey::VesselMmsi => updated.vessel.mmsi = value.to_string(),
            ConfigKey::VesselEndpoint => updated.vessel.endpoint = value.to_string(),
            ConfigKey::VesselCacheTimeout => updated.vessel.cache_timeout = self.secs(value)?,
            ConfigKey::VesselRefreshInterval => {
                updated.vessel.refresh_interval = self.secs(value)?
            }
            ConfigKey::DisplayWidth => updated.display.width = self.parse(value)?,
            ConfigKey::DisplayHeight => updated.display.height = self.parse(value)?,
            ConfigKey::MapZoom => updated.map.zoom = self.parse(value)?,
            ConfigKey::MapGridRadius => updated.map.grid_radius = self.parse(value)?,
            ConfigKey::MapWidth => updated.map.width = self.parse(value)?,
            ConfigKey::MapHeight => updated.map.height = self.parse(value)?,
            ConfigKey::CacheDuration => updated.map.cache_duration = self.secs(value)?,
            ConfigKey::ProvidersTimeout => updated.providers.timeout = self.secs(value)?,
            ConfigKey::ServerHost => updated.server.host = value.to_string(),
            ConfigKey::ServerPort => updated.server.port = self.parse(value)?,
            ConfigKey::LoggingLevel => updated.logging.level = optional(value),
            ConfigKey::LoggingFile => updated.logging.file = optional(value).map(PathBuf::from),
        }

        updated.validate().map_err(|e| ConfigKeyError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: e.to_string(),
        })?;
        *config = updated;
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigKeyError>
    where
        T::Err: std::fmt::Display,
    {
        value.parse().map_err(|e: T::Err| ConfigKeyError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    fn secs(&self, value: &str) -> Result<Duration, ConfigKeyError> {
        self.parse::<u64>(value).map(Duration::from_secs)
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("map.zoom".parse::<ConfigKey>().unwrap(), ConfigKey::MapZoom);
        assert_eq!(" Vessel.MMSI ".parse::<ConfigKey>().unwrap(), ConfigKey::VesselMmsi);
        assert!("map.colour".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_every_key_round_trips_by_name() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
            assert_eq!(format!("{}.{}", key.section(), key.key_name()), key.name());
        }
    }

    #[test]
    fn test_get_and_set() {
        let mut config = ConfigFile::default();
        ConfigKey::MapZoom.set(&mut config, "11").unwrap();
        assert_eq!(ConfigKey::MapZoom.get(&config), "11");

        ConfigKey::VesselApiKey.set(&mut config, "abc").unwrap();
        assert_eq!(config.vessel.api_key.as_deref(), Some("abc"));
        ConfigKey::VesselApiKey.set(&mut config, "").unwrap();
        assert!(config.vessel.api_key.is_none());
    }

    #[test]
    fn test_set_rejects_out_of_range_and_keeps_config() {
        let mut config = ConfigFile::default();

        let err = ConfigKey::ProvidersTimeout.set(&mut config, "30").unwrap_err();

        assert!(matches!(err, ConfigKeyError::InvalidValue { key: "providers.timeout", .. }));
        assert_eq!(config.providers.timeout, Duration::from_secs(8));
        assert!(ConfigKey::ServerPort.set(&mut config, "http").is_err());
    }
}
