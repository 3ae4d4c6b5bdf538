//! Tile grid to 1-bit map.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle};
use image::imageops::{self, BiLevel, FilterType};
use tracing::debug;

use super::bitmap::MonoBitmap;
use super::mosaic::TileMosaic;
use super::{MapSource, RenderedMap, TargetSize};

/// Marker circle radius in pixels.
pub const MARKER_RADIUS: u32 = 9;
/// Crosshair arm length measured from the centre.
const CROSSHAIR_ARM: i32 = 14;
/// Width of the white outline drawn under the marker.
const HALO_WIDTH: u32 = 5;
const STROKE_WIDTH: u32 = 2;

/// Composes a stitched tile grid into a map of exactly `target` pixels.
///
/// A window centred on the ship is cut from the grid. If the grid is
/// smaller than the target, the window is enlarged with Lanczos3. The
/// result is converted to grayscale, Floyd–Steinberg dithered to black and
/// white, and the marker is drawn at the ship position.
pub fn compose(mosaic: &TileMosaic, target: TargetSize) -> RenderedMap {
    let stitched = mosaic.stitch();
    let (mw, mh) = stitched.dimensions();
    let (tw, th) = (target.width(), target.height());

    let scale = (tw as f64 / mw as f64)
        .max(th as f64 / mh as f64)
        .max(1.0);
    let window_w = ((tw as f64 / scale).ceil() as u32).clamp(1, mw);
    let window_h = ((th as f64 / scale).ceil() as u32).clamp(1, mh);

    let (mx, my) = mosaic.marker();
    let left = centered_origin(mx, window_w, mw);
    let top = centered_origin(my, window_h, mh);

    let mut window = imageops::crop_imm(&stitched, left, top, window_w, window_h).to_image();
    if (window_w, window_h) != (tw, th) {
        window = imageops::resize(&window, tw, th, FilterType::Lanczos3);
    }

    let mut gray = imageops::grayscale(&window);
    imageops::dither(&mut gray, &BiLevel);
    let mut bitmap = MonoBitmap::from_luma(&gray);

    let sx = tw as f64 / window_w as f64;
    let sy = th as f64 / window_h as f64;
    let marker = (
        to_pixel((mx - left as f64) * sx, tw),
        to_pixel((my - top as f64) * sy, th),
    );
    draw_marker(&mut bitmap, marker);

    debug!(
        provider = mosaic.provider(),
        window = %format!("{window_w}x{window_h}+{left}+{top}"),
        target = %target,
        marker_x = marker.0,
        marker_y = marker.1,
        "Map composed"
    );

    RenderedMap {
        bitmap,
        marker: Some(marker),
        source: MapSource::Provider(mosaic.provider().to_string()),
        annotations: Vec::new(),
        attempts: Vec::new(),
    }
}

/// Left or top edge of a window of `size` centred on `center`, kept inside
/// `[0, bound)`.
fn centered_origin(center: f64, size: u32, bound: u32) -> u32 {
    let max = bound.saturating_sub(size) as f64;
    (center - size as f64 / 2.0).round().clamp(0.0, max) as u32
}

fn to_pixel(value: f64, bound: u32) -> u32 {
    value.floor().clamp(0.0, (bound - 1) as f64) as u32
}

/// Draws the position marker: a circle with a crosshair through it, over a
/// white outline so it stays visible on dense map areas.
pub fn draw_marker(bitmap: &mut MonoBitmap, (x, y): (u32, u32)) {
    let center = Point::new(x as i32, y as i32);
    let diameter = MARKER_RADIUS * 2 + 1;
    let arms = [
        (Point::new(-CROSSHAIR_ARM, 0), Point::new(CROSSHAIR_ARM, 0)),
        (Point::new(0, -CROSSHAIR_ARM), Point::new(0, CROSSHAIR_ARM)),
    ];

    for (color, width) in [(BinaryColor::Off, HALO_WIDTH), (BinaryColor::On, STROKE_WIDTH)] {
        let style = PrimitiveStyle::with_stroke(color, width);
        let _ = Circle::with_center(center, diameter)
            .into_styled(style)
            .draw(bitmap);
        for (from, to) in arms {
            let _ = Line::new(center + from, center + to)
                .into_styled(style)
                .draw(bitmap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileImage;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn gray_tile(value: u8) -> TileImage {
        let img = RgbaImage::from_pixel(256, 256, Rgba([value, value, value, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        TileImage::decode(buf.into_inner()).unwrap()
    }

    fn mosaic(marker: (f64, f64)) -> TileMosaic {
        let tiles = (0..9).map(|_| gray_tile(255)).collect();
        TileMosaic::new("osm", 3, 3, tiles, marker)
    }

    #[test]
    fn test_output_has_target_dimensions() {
        let map = compose(&mosaic((384.0, 384.0)), TargetSize::new(400, 420));
        assert_eq!((map.width(), map.height()), (400, 420));
        assert_eq!(map.source, MapSource::Provider("osm".to_string()));
    }

    #[test]
    fn test_zero_target_composes_single_pixel() {
        let map = compose(&mosaic((384.0, 384.0)), TargetSize::new(0, 0));
        assert_eq!((map.width(), map.height()), (1, 1));
        assert_eq!(map.marker, Some((0, 0)));
    }

    #[test]
    fn test_centered_marker_lands_in_middle() {
        let map = compose(&mosaic((384.0, 384.0)), TargetSize::new(400, 420));
        assert_eq!(map.marker, Some((200, 210)));
        assert!(map.bitmap.is_black(200 + MARKER_RADIUS, 210));
    }

    #[test]
    fn test_window_clamped_at_grid_edge() {
        // Ship near the top-left corner: the window cannot centre on it
        let map = compose(&mosaic((20.0, 30.0)), TargetSize::new(400, 420));
        assert_eq!(map.marker, Some((20, 30)));
    }

    #[test]
    fn test_target_larger_than_grid_is_upscaled() {
        let small = TileMosaic::new("osm", 1, 1, vec![gray_tile(255)], (128.0, 128.0));

        let map = compose(&small, TargetSize::new(800, 480));

        assert_eq!((map.width(), map.height()), (800, 480));
        let (x, y) = map.marker.unwrap();
        assert!((395..=405).contains(&x), "x = {x}");
        assert!((235..=245).contains(&y), "y = {y}");
    }

    #[test]
    fn test_output_is_strictly_black_and_white() {
        let tiles = (0..9).map(|i| gray_tile(i * 28)).collect();
        let map = compose(
            &TileMosaic::new("osm", 3, 3, tiles, (384.0, 384.0)),
            TargetSize::new(200, 200),
        );
        assert!(map.bitmap.as_gray().pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_mid_gray_is_dithered_not_thresholded() {
        let tiles = (0..9).map(|_| gray_tile(128)).collect();
        let map = compose(
            &TileMosaic::new("osm", 3, 3, tiles, (384.0, 384.0)),
            TargetSize::new(100, 100),
        );
        let black = map.bitmap.count_black() as f64 / 10_000.0;
        assert!((0.3..0.7).contains(&black), "black ratio {black}");
    }

    #[test]
    fn test_marker_moves_with_ship() {
        let a = compose(&mosaic((380.0, 384.0)), TargetSize::new(300, 300));
        let b = compose(&mosaic((390.0, 384.0)), TargetSize::new(300, 300));
        // Window recentres, so the marker stays put
        assert_eq!(a.marker, b.marker);

        let a = compose(&mosaic((640.0, 384.0)), TargetSize::new(300, 300));
        let b = compose(&mosaic((650.0, 384.0)), TargetSize::new(300, 300));
        // Window clamped at the right edge, so the marker moves east
        assert!(b.marker.unwrap().0 > a.marker.unwrap().0);
    }

    #[test]
    fn test_marker_has_white_halo() {
        let mut bitmap = MonoBitmap::new(60, 60);
        bitmap.invert_rect(0, 0, 60, 60);

        draw_marker(&mut bitmap, (30, 30));

        // The halo outside the black stroke is white on a black background
        assert!(bitmap.is_black(0, 0));
        assert!(!bitmap.is_black(38, 38));
        assert!(bitmap.is_black(30 + MARKER_RADIUS, 30 + 1));
    }
}
