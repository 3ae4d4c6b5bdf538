//! Configuration file support.
//!
//! Settings live in `~/.shiptracker/config.ini`. A missing file means
//! defaults; a present but invalid file is an error reported at startup,
//! before anything is served.

mod file;
mod keys;

pub use file::{
    config_dir, config_file_path, ConfigError, ConfigFile, DisplaySettings, LoggingSettings,
    MapConfig, MapSettings, ProviderSettings, ServerSettings, VesselSettings, ENV_API_KEY,
    ENV_MMSI,
};
pub use keys::{ConfigKey, ConfigKeyError};
