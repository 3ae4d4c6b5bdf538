//! Placeholder map used when no real map can be produced.

use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use super::bitmap::MonoBitmap;
use super::{MapSource, RenderedMap, TargetSize};
use crate::coord::GeoPosition;

/// Headline drawn on the placeholder.
pub const UNAVAILABLE_TEXT: &str = "MAP UNAVAILABLE";

const GRID_SPACING: usize = 40;
const BORDER_WIDTH: u32 = 2;
const LABEL_PADDING: u32 = 8;
const LINE_GAP: i32 = 6;

/// Text lines of the placeholder, top to bottom.
pub fn fallback_annotations(position: &GeoPosition) -> Vec<String> {
    vec![
        UNAVAILABLE_TEXT.to_string(),
        format!("{:.4}°, {:.4}°", position.latitude(), position.longitude()),
    ]
}

/// Draws the placeholder: a border, a 40 px grid and a centred label with
/// the ship's coordinates. Never fails.
pub fn render_fallback(position: &GeoPosition, target: TargetSize, reason: &str) -> RenderedMap {
    let (width, height) = (target.width(), target.height());
    let mut bitmap = MonoBitmap::new(width, height);
    let ink = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

    for x in (GRID_SPACING..width as usize).step_by(GRID_SPACING) {
        let x = x as i32;
        let _ = Line::new(Point::new(x, 0), Point::new(x, height as i32 - 1))
            .into_styled(ink)
            .draw(&mut bitmap);
    }
    for y in (GRID_SPACING..height as usize).step_by(GRID_SPACING) {
        let y = y as i32;
        let _ = Line::new(Point::new(0, y), Point::new(width as i32 - 1, y))
            .into_styled(ink)
            .draw(&mut bitmap);
    }

    let _ = Rectangle::new(Point::zero(), Size::new(width, height))
        .into_styled(
            PrimitiveStyleBuilder::new()
                .stroke_color(BinaryColor::On)
                .stroke_width(BORDER_WIDTH)
                .stroke_alignment(StrokeAlignment::Inside)
                .build(),
        )
        .draw(&mut bitmap);

    let annotations = fallback_annotations(position);
    draw_label(&mut bitmap, &annotations);

    RenderedMap {
        bitmap,
        marker: None,
        source: MapSource::Fallback {
            reason: reason.to_string(),
        },
        annotations,
        attempts: Vec::new(),
    }
}

/// Draws the headline and coordinates centred on a white panel.
fn draw_label(bitmap: &mut MonoBitmap, lines: &[String]) {
    let [headline, coords] = lines else {
        return;
    };

    let big = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let centered = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();

    let big_h = FONT_10X20.character_size.height as i32;
    let small_h = FONT_6X10.character_size.height as i32;
    let text_w = (headline.chars().count() as u32 * FONT_10X20.character_size.width)
        .max(coords.chars().count() as u32 * FONT_6X10.character_size.width);
    let text_h = (big_h + LINE_GAP + small_h) as u32;

    let center = bitmap.bounding_box().center();
    let top = center.y - text_h as i32 / 2;

    let panel = Rectangle::with_center(
        center,
        Size::new(text_w + 2 * LABEL_PADDING, text_h + 2 * LABEL_PADDING),
    );
    let _ = panel
        .into_styled(
            PrimitiveStyleBuilder::new()
                .fill_color(BinaryColor::Off)
                .stroke_color(BinaryColor::On)
                .stroke_width(1)
                .build(),
        )
        .draw(bitmap);

    let _ = Text::with_text_style(headline, Point::new(center.x, top), big, centered).draw(bitmap);
    let _ = Text::with_text_style(
        coords,
        Point::new(center.x, top + big_h + LINE_GAP),
        small,
        centered,
    )
    .draw(bitmap);
}
