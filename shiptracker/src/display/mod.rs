//! Full-screen e-ink layout.
//!
//! Combines the vessel report and the rendered map into one frame for an
//! 800×480 (by default) black-and-white panel.

mod assembler;
mod formatters;
mod validators;

use thiserror::Error;

pub use assembler::{DisplayAssembler, DEFAULT_HEIGHT, DEFAULT_WIDTH, MIN_HEIGHT, MIN_WIDTH};
pub use formatters::{
    format_coordinates, format_course, format_mmsi, format_nav_status, format_speed,
    format_timestamp, parse_timestamp,
};
pub use validators::{
    sanitize_text, validate_coordinates, validate_course, validate_mmsi, validate_speed,
    validate_timestamp, validate_vessel_data, MAX_TEXT_LEN,
};

/// Display layout and encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error(
        "display {width}x{height} is smaller than the minimum {min_w}x{min_h}",
        min_w = MIN_WIDTH,
        min_h = MIN_HEIGHT
    )]
    TooSmall { width: u32, height: u32 },

    #[error("vessel report has an invalid {0}")]
    InvalidField(&'static str),

    #[error("failed to encode display image: {0}")]
    Encode(String),
}

impl From<image::ImageError> for DisplayError {
    fn from(e: image::ImageError) -> Self {
        DisplayError::Encode(e.to_string())
    }
}
