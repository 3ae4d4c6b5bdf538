//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;

use shiptracker::config::{ConfigError, ConfigKeyError};
use shiptracker::coord::CoordError;
use shiptracker::display::DisplayError;
use shiptracker::logging::LoggingError;
use shiptracker::provider::ProviderError;
use shiptracker::vessel::VesselError;

/// Errors that end a CLI command with a non-zero exit status.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    ConfigKey(#[from] ConfigKeyError),

    #[error("Failed to initialise logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("Failed to create HTTP client: {0}")]
    Http(#[from] ProviderError),

    #[error("Invalid position: {0}")]
    Position(#[from] CoordError),

    #[error("Vessel data unavailable: {0}")]
    Vessel(#[from] VesselError),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error("Unsupported output format for {path}; use .bmp or .png")]
    UnsupportedOutput { path: PathBuf },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create Tokio runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Server error: {0}")]
    Server(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = CliError::Config("missing api key".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing api key"));
    }

    #[test]
    fn test_unsupported_output_names_path() {
        let err = CliError::UnsupportedOutput {
            path: PathBuf::from("frame.gif"),
        };
        assert!(err.to_string().contains("frame.gif"));
    }

    #[test]
    fn test_from_vessel_error() {
        let err: CliError = VesselError::MissingApiKey.into();
        assert!(matches!(err, CliError::Vessel(_)));
    }
}
