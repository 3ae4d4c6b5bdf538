//! Common types and utilities shared across CLI commands.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use shiptracker::coord::GeoPosition;
use shiptracker::display::{DisplayAssembler, DisplayError};
use shiptracker::map::{MapRenderer, MonoBitmap, RenderedMap};
use shiptracker::provider::AsyncHttpClient;
use shiptracker::vessel::{VesselData, VesselError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::CliError;

/// Output image encoding.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// 1-bit Windows bitmap, as e-ink firmware expects
    Bmp,
    /// 1-bit grayscale PNG
    Png,
}

impl OutputFormat {
    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "bmp" => Some(OutputFormat::Bmp),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }

    /// Explicit format first, then the extension.
    pub fn resolve(explicit: Option<Self>, path: &Path) -> Result<Self, CliError> {
        explicit
            .or_else(|| Self::from_path(path))
            .ok_or_else(|| CliError::UnsupportedOutput {
                path: path.to_path_buf(),
            })
    }

    pub fn encode(self, bitmap: &MonoBitmap) -> Result<Vec<u8>, CliError> {
        match self {
            OutputFormat::Bmp => Ok(bitmap.to_bmp()),
            OutputFormat::Png => bitmap
                .to_png()
                .map_err(|e| CliError::Display(DisplayError::from(e))),
        }
    }
}

/// Encodes and writes a bitmap, creating parent directories.
pub fn write_bitmap(
    bitmap: &MonoBitmap,
    path: &Path,
    format: Option<OutputFormat>,
) -> Result<(), CliError> {
    let format = OutputFormat::resolve(format, path)?;
    let bytes = format.encode(bitmap)?;
    let write_err = |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, bytes).map_err(write_err)
}

/// A position from `--lat/--lon`, if both were given.
pub fn explicit_position(
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<Option<GeoPosition>, CliError> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(Some(GeoPosition::new(lat, lon)?)),
        (None, None) => Ok(None),
        _ => Err(CliError::Config(
            "--lat and --lon must be given together".to_string(),
        )),
    }
}

/// Renders the map for a vessel report and lays out the full frame.
///
/// A failed report gives the connection-error layout; a report with an
/// unusable position gives the vessel layout without a map.
pub async fn display_frame<C: AsyncHttpClient>(
    assembler: &DisplayAssembler,
    renderer: &MapRenderer<C>,
    vessel: Result<VesselData, VesselError>,
    last_update: Option<DateTime<Utc>>,
    cancel: &CancellationToken,
) -> (MonoBitmap, Option<RenderedMap>) {
    let vessel = match vessel {
        Ok(vessel) => vessel,
        Err(e) => {
            warn!(error = %e, "No vessel data, drawing error layout");
            let last = last_update.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
            return (
                assembler.assemble_error(Some(&e.to_string()), last.as_deref()),
                None,
            );
        }
    };

    let map = match vessel.position() {
        Ok(position) => Some(
            renderer
                .render_with_cancel(position, assembler.map_target(), cancel)
                .await,
        ),
        Err(e) => {
            warn!(error = %e, "Vessel position unusable, skipping map");
            None
        }
    };
    (assembler.assemble(Some(&vessel), map.as_ref()), map)
}
