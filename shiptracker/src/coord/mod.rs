//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile and pixel coordinates used by slippy-map tile servers.
//!
//! All functions are pure: identical inputs always produce identical outputs.

mod types;

pub use types::{
    CoordError, GeoPosition, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
    TILE_SIZE,
};

use std::f64::consts::PI;

/// Validates inputs and returns the fractional tile position `(x, y)`.
fn fractional_tile(lat: f64, lon: f64, zoom: u8) -> Result<(f64, f64), CoordError> {
    if lat.is_nan() || lat.abs() >= MAX_LAT {
        return Err(CoordError::LatitudeOutOfRange(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::LongitudeOutOfRange(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let x = (lon + 180.0) / 360.0 * n;

    // ln(tan φ + sec φ) == asinh(tan φ)
    let lat_rad = lat.to_radians();
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;

    Ok((x, y))
}

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees, strictly inside ±[`MAX_LAT`]
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to [`MAX_ZOOM`])
///
/// # Returns
///
/// A `Result` containing the tile coordinates or an error if inputs are invalid.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    let (fx, fy) = fractional_tile(lat, lon, zoom)?;
    let max_index = (1u32 << zoom) - 1;

    // lon == 180.0 lands exactly on the right edge of the world
    let x = (fx.floor() as u32).min(max_index);
    let y = (fy.floor() as u32).min(max_index);

    Ok(TileCoord { x, y, zoom })
}

/// Converts geographic coordinates to world pixel coordinates.
///
/// World pixel space spans `256 × 2^zoom` pixels on each axis with the
/// origin at the north-west corner of tile (0, 0).
#[inline]
pub fn to_world_pixel(lat: f64, lon: f64, zoom: u8) -> Result<(f64, f64), CoordError> {
    let (fx, fy) = fractional_tile(lat, lon, zoom)?;
    Ok((fx * TILE_SIZE as f64, fy * TILE_SIZE as f64))
}

/// Pixel offset of a position relative to a pixel origin.
///
/// `origin` is usually the north-west corner of a tile grid as returned by
/// [`TileCoord::origin_pixels`]. The marker position inside a stitched grid
/// is computed with this function so it shares the projection used to pick
/// the tiles.
#[inline]
pub fn pixel_offset(
    lat: f64,
    lon: f64,
    zoom: u8,
    origin: (f64, f64),
) -> Result<(f64, f64), CoordError> {
    let (px, py) = to_world_pixel(lat, lon, zoom)?;
    Ok((px - origin.0, py - origin.1))
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad.to_degrees();

    (lat, lon)
}
