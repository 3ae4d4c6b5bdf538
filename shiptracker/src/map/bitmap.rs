//! 1-bit raster used for every e-ink output.

use std::convert::Infallible;
use std::io::Cursor;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};
use image::{GrayImage, ImageError, ImageFormat, Luma};

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// Size of the BMP file header plus the BITMAPINFOHEADER.
const BMP_HEADER_LEN: u32 = 14 + 40;
/// Two BGRA palette entries: black then white.
const BMP_PALETTE: [u8; 8] = [0, 0, 0, 0, 255, 255, 255, 0];
/// Print resolution written into BMP headers (72 DPI).
const BMP_PIXELS_PER_METER: i32 = 2835;

/// A black-and-white image.
///
/// Stored as a [`GrayImage`] whose pixels are only ever 0 (black) or 255
/// (white). Implements [`DrawTarget`] so embedded-graphics primitives and
/// fonts can be drawn on it directly; [`BinaryColor::On`] is black ink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoBitmap {
    pixels: GrayImage,
}

impl MonoBitmap {
    /// Creates an all-white bitmap. Zero dimensions are raised to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::from_pixel(width.max(1), height.max(1), WHITE),
        }
    }

    /// Thresholds a grayscale image at mid-gray.
    ///
    /// Already dithered input passes through unchanged.
    pub fn from_luma(image: &GrayImage) -> Self {
        let mut pixels = image.clone();
        for p in pixels.pixels_mut() {
            *p = if p.0[0] < 128 { BLACK } else { WHITE };
        }
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Returns whether the pixel is black. Out-of-bounds reads are white.
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.pixels
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] == 0)
    }

    /// Sets a pixel; writes outside the bitmap are ignored.
    pub fn set(&mut self, x: u32, y: u32, black: bool) {
        if let Some(p) = self.pixels.get_pixel_mut_checked(x, y) {
            *p = if black { BLACK } else { WHITE };
        }
    }

    pub fn count_black(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[0] == 0).count()
    }

    /// Copies `other` onto this bitmap with its top-left corner at (x, y),
    /// clipping whatever falls outside.
    pub fn blit(&mut self, other: &MonoBitmap, x: i64, y: i64) {
        image::imageops::replace(&mut self.pixels, &other.pixels, x, y);
    }

    /// Inverts every pixel inside the rectangle, clipped to the bitmap.
    pub fn invert_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let x_end = x.saturating_add(width).min(self.width());
        let y_end = y.saturating_add(height).min(self.height());
        for py in y.min(y_end)..y_end {
            for px in x.min(x_end)..x_end {
                let black = self.is_black(px, py);
                self.set(px, py, !black);
            }
        }
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn into_gray(self) -> GrayImage {
        self.pixels
    }

    /// Packs the bitmap at one bit per pixel, most significant bit first,
    /// each row padded to a whole byte. A set bit is white.
    pub fn to_packed(&self) -> Vec<u8> {
        let stride = self.width().div_ceil(8) as usize;
        let mut out = vec![0u8; stride * self.height() as usize];
        for (x, y, p) in self.pixels.enumerate_pixels() {
            if p.0[0] != 0 {
                out[y as usize * stride + (x / 8) as usize] |= 0x80 >> (x % 8);
            }
        }
        out
    }

    /// Encodes the bitmap as an 8-bit grayscale PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut buf = Cursor::new(Vec::new());
        self.pixels.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }

    /// Encodes the bitmap as a 1-bit palettised BMP, the format e-ink
    /// frames load directly.
    pub fn to_bmp(&self) -> Vec<u8> {
        let (width, height) = (self.width(), self.height());
        let row_bytes = width.div_ceil(8);
        let stride = row_bytes.div_ceil(4) * 4;
        let image_size = stride * height;
        let data_offset = BMP_HEADER_LEN + BMP_PALETTE.len() as u32;
        let file_size = data_offset + image_size;

        let mut out = Vec::with_capacity(file_size as usize);
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&file_size.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&data_offset.to_le_bytes());

        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&(width as i32).to_le_bytes());
        out.extend_from_slice(&(height as i32).to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&image_size.to_le_bytes());
        out.extend_from_slice(&BMP_PIXELS_PER_METER.to_le_bytes());
        out.extend_from_slice(&BMP_PIXELS_PER_METER.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&BMP_PALETTE);

        // Rows are stored bottom-up
        let packed = self.to_packed();
        let padding = (stride - row_bytes) as usize;
        for row in packed.chunks(row_bytes as usize).rev() {
            out.extend_from_slice(row);
            out.extend(std::iter::repeat(0).take(padding));
        }
        out
    }
}

impl OriginDimensions for MonoBitmap {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl DrawTarget for MonoBitmap {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}
