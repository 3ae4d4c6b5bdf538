//! Stitched tile grids.

use image::{imageops, imageops::FilterType, RgbaImage};

use crate::coord::TILE_SIZE;
use crate::tile::TileImage;

/// A rectangular grid of tiles from one provider plus the ship's pixel
/// position inside the stitched grid.
///
/// Tiles are stored row-major. The marker position is produced by the same
/// projection that selected the tiles, so it always lies inside the grid.
#[derive(Debug, Clone)]
pub struct TileMosaic {
    provider: String,
    columns: u32,
    rows: u32,
    tiles: Vec<TileImage>,
    marker: (f64, f64),
}

impl TileMosaic {
    /// Builds a mosaic.
    ///
    /// `tiles.len()` must equal `columns * rows`; missing cells are padded
    /// with blank tiles.
    pub fn new(
        provider: impl Into<String>,
        columns: u32,
        rows: u32,
        mut tiles: Vec<TileImage>,
        marker: (f64, f64),
    ) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let cells = (columns * rows) as usize;
        tiles.truncate(cells);
        tiles.resize_with(cells, TileImage::blank);

        Self {
            provider: provider.into(),
            columns,
            rows,
            tiles,
            marker,
        }
    }

    /// Name of the provider every tile came from.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tiles(&self) -> &[TileImage] {
        &self.tiles
    }

    /// Stitched width in pixels.
    pub fn width(&self) -> u32 {
        self.columns * TILE_SIZE
    }

    /// Stitched height in pixels.
    pub fn height(&self) -> u32 {
        self.rows * TILE_SIZE
    }

    /// Ship position in stitched pixel coordinates.
    pub fn marker(&self) -> (f64, f64) {
        self.marker
    }

    /// Copies every tile into one RGBA image.
    ///
    /// Tiles that are not 256×256 (some servers return 512 px "retina"
    /// tiles) are resampled to fit their cell.
    pub fn stitch(&self) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width(), self.height());

        for (index, tile) in self.tiles.iter().enumerate() {
            let col = index as u32 % self.columns;
            let row = index as u32 / self.columns;
            let x = (col * TILE_SIZE) as i64;
            let y = (row * TILE_SIZE) as i64;

            if tile.width() == TILE_SIZE && tile.height() == TILE_SIZE {
                imageops::replace(&mut canvas, tile.pixels(), x, y);
            } else {
                let scaled =
                    imageops::resize(tile.pixels(), TILE_SIZE, TILE_SIZE, FilterType::Triangle);
                imageops::replace(&mut canvas, &scaled, x, y);
            }
        }

        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn solid_tile(value: u8, size: u32) -> TileImage {
        let img = RgbaImage::from_pixel(size, size, Rgba([value, value, value, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        TileImage::decode(buf.into_inner()).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let mosaic = TileMosaic::new("osm", 3, 3, Vec::new(), (384.0, 384.0));
        assert_eq!(mosaic.width(), 768);
        assert_eq!(mosaic.height(), 768);
        assert_eq!(mosaic.tiles().len(), 9);
    }

    #[test]
    fn test_stitch_places_tiles_row_major() {
        let tiles = vec![solid_tile(0, 256), solid_tile(100, 256), solid_tile(200, 256)];
        let mosaic = TileMosaic::new("osm", 3, 1, tiles, (300.0, 100.0));

        let stitched = mosaic.stitch();

        assert_eq!(stitched.dimensions(), (768, 256));
        assert_eq!(stitched.get_pixel(10, 10).0[0], 0);
        assert_eq!(stitched.get_pixel(300, 10).0[0], 100);
        assert_eq!(stitched.get_pixel(700, 200).0[0], 200);
    }

    #[test]
    fn test_stitch_rescales_retina_tiles() {
        let mosaic = TileMosaic::new("osm", 1, 1, vec![solid_tile(50, 512)], (128.0, 128.0));
        let stitched = mosaic.stitch();
        assert_eq!(stitched.dimensions(), (256, 256));
        assert_eq!(stitched.get_pixel(128, 128).0[0], 50);
    }

    #[test]
    fn test_missing_cells_are_blank() {
        let mosaic = TileMosaic::new("osm", 2, 1, vec![solid_tile(0, 256)], (10.0, 10.0));
        let stitched = mosaic.stitch();
        assert_eq!(stitched.get_pixel(400, 100).0, [255, 255, 255, 255]);
    }
}
