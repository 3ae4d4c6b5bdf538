//! Coordinate types and errors.

use std::fmt;

use thiserror::Error;

/// Maximum latitude the Web Mercator projection can represent.
///
/// Positions at or beyond this bound (in either hemisphere) project to
/// infinity and are rejected.
pub const MAX_LAT: f64 = 85.05113;

/// Minimum latitude the Web Mercator projection can represent.
pub const MIN_LAT: f64 = -MAX_LAT;

/// Minimum valid longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude.
pub const MAX_LON: f64 = 180.0;

/// Minimum supported zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum supported zoom level.
///
/// Public raster tile servers stop at 19.
pub const MAX_ZOOM: u8 = 19;

/// Edge length of a slippy-map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is NaN or outside the projectable band.
    #[error("latitude {0} is outside the projectable range ±{max}", max = MAX_LAT)]
    LatitudeOutOfRange(f64),

    /// Longitude is NaN or outside [-180, 180].
    #[error("longitude {0} is outside the range [-180, 180]")]
    LongitudeOutOfRange(f64),

    /// Zoom level exceeds [`MAX_ZOOM`].
    #[error("zoom level {0} exceeds maximum {max}", max = MAX_ZOOM)]
    InvalidZoom(u8),
}

/// A geographic position in degrees.
///
/// Construction only checks the geographic bounds. Whether the position can
/// be projected onto Web Mercator is decided by [`super::to_tile_coords`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    latitude: f64,
    longitude: f64,
}

impl GeoPosition {
    /// Creates a position, validating latitude in [-90, 90] and longitude in
    /// [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordError::LatitudeOutOfRange(latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}°, {:.4}°", self.latitude, self.longitude)
    }
}

/// Slippy-map tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Column, west to east (0 to 2^zoom - 1).
    pub x: u32,
    /// Row, north to south (0 to 2^zoom - 1).
    pub y: u32,
    /// Zoom level.
    pub zoom: u8,
}

impl TileCoord {
    /// Number of tiles along one axis at this zoom level.
    #[inline]
    pub fn tiles_per_axis(&self) -> u32 {
        1u32 << self.zoom
    }

    /// Pixel position of this tile's north-west corner in world pixel space.
    #[inline]
    pub fn origin_pixels(&self) -> (f64, f64) {
        (
            self.x as f64 * TILE_SIZE as f64,
            self.y as f64 * TILE_SIZE as f64,
        )
    }

    /// Returns the tile offset by `(dx, dy)`.
    ///
    /// Columns wrap around the antimeridian. Rows do not wrap: `None` is
    /// returned when the row falls off the top or bottom of the world.
    pub fn offset(&self, dx: i64, dy: i64) -> Option<TileCoord> {
        let n = self.tiles_per_axis() as i64;
        let y = self.y as i64 + dy;
        if y < 0 || y >= n {
            return None;
        }
        let x = (self.x as i64 + dx).rem_euclid(n);
        Some(TileCoord {
            x: x as u32,
            y: y as u32,
            zoom: self.zoom,
        })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_position_rejects_out_of_bounds() {
        assert!(GeoPosition::new(90.1, 0.0).is_err());
        assert!(GeoPosition::new(0.0, -180.5).is_err());
        assert!(GeoPosition::new(f64::NAN, 0.0).is_err());
        assert!(GeoPosition::new(-62.8568, 58.7332).is_ok());
    }

    #[test]
    fn test_geo_position_accepts_poles() {
        // Geographically valid; only the projection rejects it.
        assert!(GeoPosition::new(90.0, 0.0).is_ok());
    }

    #[test]
    fn test_geo_position_display() {
        let pos = GeoPosition::new(62.8568, 58.7332).unwrap();
        assert_eq!(pos.to_string(), "62.8568°, 58.7332°");
    }

    #[test]
    fn test_tile_offset_wraps_columns() {
        let tile = TileCoord { x: 0, y: 5, zoom: 4 };
        let west = tile.offset(-1, 0).unwrap();
        assert_eq!(west.x, 15);
        assert_eq!(west.y, 5);

        let east = TileCoord { x: 15, y: 5, zoom: 4 }.offset(1, 0).unwrap();
        assert_eq!(east.x, 0);
    }

    #[test]
    fn test_tile_offset_clips_rows() {
        let top = TileCoord { x: 3, y: 0, zoom: 4 };
        assert!(top.offset(0, -1).is_none());
        let bottom = TileCoord { x: 3, y: 15, zoom: 4 };
        assert!(bottom.offset(0, 1).is_none());
    }

    #[test]
    fn test_origin_pixels() {
        let tile = TileCoord { x: 2, y: 3, zoom: 5 };
        assert_eq!(tile.origin_pixels(), (512.0, 768.0));
    }

    #[test]
    fn test_tile_display() {
        let tile = TileCoord { x: 10, y: 20, zoom: 9 };
        assert_eq!(tile.to_string(), "9/10/20");
    }
}
