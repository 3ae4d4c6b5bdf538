//! Decoded map tiles.
//!
//! A [`TileImage`] keeps the raw bytes the provider returned next to the
//! decoded RGBA raster. Both halves are reference counted, so cloning a tile
//! out of the cache is cheap.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use image::{ImageError, Rgba, RgbaImage};

use crate::coord::TILE_SIZE;

/// A fetched and decoded map tile.
#[derive(Clone)]
pub struct TileImage {
    data: Bytes,
    pixels: Arc<RgbaImage>,
}

impl TileImage {
    /// Decodes a raster tile (PNG, JPEG, ...) from the response body.
    ///
    /// The format is sniffed from the content, not from the URL.
    pub fn decode(data: impl Into<Bytes>) -> Result<Self, ImageError> {
        let data = data.into();
        let pixels = image::load_from_memory(&data)?.to_rgba8();
        Ok(Self {
            data,
            pixels: Arc::new(pixels),
        })
    }

    /// A solid white tile standing in for a tile that could not be fetched.
    pub fn blank() -> Self {
        let pixels = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba([255, 255, 255, 255]));
        Self {
            data: Bytes::new(),
            pixels: Arc::new(pixels),
        }
    }

    /// The raw response body.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The decoded raster.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Whether two handles point at the same decoded raster.
    pub fn ptr_eq(&self, other: &TileImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl fmt::Debug for TileImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileImage")
            .field("bytes", &self.data.len())
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Luma};
    use std::io::Cursor;

    /// Encodes a 256×256 PNG with a vertical gradient.
    pub(crate) fn sample_png() -> Vec<u8> {
        let img = image::GrayImage::from_fn(TILE_SIZE, TILE_SIZE, |_, y| Luma([y as u8]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let tile = TileImage::decode(sample_png()).unwrap();
        assert_eq!(tile.width(), 256);
        assert_eq!(tile.height(), 256);
        assert_eq!(tile.pixels().get_pixel(0, 255).0, [255, 255, 255, 255]);
        assert!(!tile.data().is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(TileImage::decode(b"<html>rate limited</html>".to_vec()).is_err());
    }

    #[test]
    fn test_blank_tile_is_white() {
        let tile = TileImage::blank();
        assert_eq!(tile.width(), TILE_SIZE);
        assert!(tile.pixels().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_clone_shares_raster() {
        let tile = TileImage::decode(sample_png()).unwrap();
        let copy = tile.clone();
        assert!(tile.ptr_eq(&copy));
    }
}
