//! Map rendering.
//!
//! Turns a ship position into a 1-bit map image for an e-ink panel. The
//! [`MapRenderer`] drives the whole pipeline:
//!
//! ```text
//! position ─► project ─► provider chain ─► compose ─► RenderedMap
//!                │              │
//!                └──── error ───┴──► render_fallback ─► RenderedMap
//! ```
//!
//! Every path ends in a [`RenderedMap`] of the requested size; failures are
//! visible as an explicit "map unavailable" placeholder, never as an error.

mod bitmap;
mod compositor;
mod error;
mod mosaic;
mod placeholder;
mod renderer;

use std::fmt;

pub use bitmap::MonoBitmap;
pub use compositor::{compose, draw_marker, MARKER_RADIUS};
pub use error::MapError;
pub use mosaic::TileMosaic;
pub use placeholder::{fallback_annotations, render_fallback, UNAVAILABLE_TEXT};
pub use renderer::MapRenderer;

use crate::provider::ProviderAttempt;

/// Default map size when rendering a map on its own.
pub const DEFAULT_TARGET_WIDTH: u32 = 400;
pub const DEFAULT_TARGET_HEIGHT: u32 = 420;

/// Output dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSize {
    width: u32,
    height: u32,
}

impl TargetSize {
    /// Creates a target size; zero dimensions are raised to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_WIDTH, DEFAULT_TARGET_HEIGHT)
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where a rendered map came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapSource {
    /// Real tiles from the named provider.
    Provider(String),
    /// The placeholder, with the reason a real map was not produced.
    Fallback { reason: String },
}

impl MapSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, MapSource::Fallback { .. })
    }
}

impl fmt::Display for MapSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapSource::Provider(name) => write!(f, "{name}"),
            MapSource::Fallback { reason } => write!(f, "fallback ({reason})"),
        }
    }
}

/// The result of one render request.
#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub bitmap: MonoBitmap,
    /// Ship position in bitmap pixels; `None` on the placeholder.
    pub marker: Option<(u32, u32)>,
    pub source: MapSource,
    /// Text lines drawn onto the bitmap, in drawing order.
    pub annotations: Vec<String>,
    /// Provider attempts made for this render, in order.
    pub attempts: Vec<ProviderAttempt>,
}

impl RenderedMap {
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn is_fallback(&self) -> bool {
        self.source.is_fallback()
    }
}
