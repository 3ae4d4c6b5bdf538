//! Screen layout.

use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_9X15, FONT_9X15_BOLD};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use tracing::debug;

use super::formatters::{format_coordinates, format_course, format_mmsi, format_speed, format_timestamp};
use super::validators::{sanitize_text, MAX_TEXT_LEN};
use super::DisplayError;
use crate::map::{MonoBitmap, RenderedMap, TargetSize};
use crate::vessel::VesselData;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const MIN_WIDTH: u32 = 400;
pub const MIN_HEIGHT: u32 = 240;

const MARGIN: i32 = 10;
const PAD: i32 = 20;
const HEADER_HEIGHT: u32 = 44;
const STATUS_HEIGHT: u32 = 30;
const BOX_HEIGHT: u32 = 36;

/// Lays out vessel data and the map on a 1-bit canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayAssembler {
    width: u32,
    height: u32,
}

impl Default for DisplayAssembler {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl DisplayAssembler {
    pub fn new(width: u32, height: u32) -> Result<Self, DisplayError> {
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            return Err(DisplayError::TooSmall { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Map panel rectangle, including its 1 px frame.
    fn map_panel(&self) -> Rectangle {
        let w = (self.width as i32 - 3 * PAD) / 2;
        let top = PAD + HEADER_HEIGHT as i32 + MARGIN;
        let bottom = self.height as i32 - PAD - STATUS_HEIGHT as i32 - MARGIN;
        Rectangle::new(
            Point::new(self.width as i32 - PAD - w, top),
            Size::new(w as u32, (bottom - top) as u32),
        )
    }

    /// Size the map should be rendered at to fill the map panel.
    pub fn map_target(&self) -> TargetSize {
        let panel = self.map_panel().size;
        TargetSize::new(panel.width - 2, panel.height - 2)
    }

    /// Draws the frame.
    ///
    /// Without vessel data the connection-error layout is drawn instead.
    pub fn assemble(&self, vessel: Option<&VesselData>, map: Option<&RenderedMap>) -> MonoBitmap {
        match vessel {
            Some(vessel) => self.draw_vessel(vessel, map),
            None => self.assemble_error(None, None),
        }
    }

    /// The connection-error layout.
    pub fn assemble_error(&self, message: Option<&str>, last_update: Option<&str>) -> MonoBitmap {
        let mut canvas = self.frame();
        self.header(&mut canvas, "Connection Error");

        let message = match message {
            Some(m) => format!("Error: {}", sanitize_text(m, MAX_TEXT_LEN)),
            None => "No connection to vessel tracking service".to_string(),
        };
        let left = PAD + MARGIN;
        let top = PAD + HEADER_HEIGHT as i32;
        self.text(&mut canvas, &message, Point::new(left, top + 36), &FONT_9X15, BinaryColor::On);

        if let Some(ts) = last_update {
            let line = format!("Last successful update: {}", format_timestamp(ts));
            self.text(&mut canvas, &line, Point::new(left, top + 76), &FONT_9X15, BinaryColor::On);
        }
        canvas
    }

    fn draw_vessel(&self, vessel: &VesselData, map: Option<&RenderedMap>) -> MonoBitmap {
        let mut canvas = self.frame();
        self.header(&mut canvas, &sanitize_text(&vessel.name, MAX_TEXT_LEN));

        let panel = self.map_panel();
        let left = PAD + MARGIN;
        let column = panel.top_left.x - PAD - left;
        let half = (column - MARGIN) / 2;
        let mut y = panel.top_left.y;

        let mmsi = format_mmsi(&vessel.mmsi).unwrap_or_else(|| vessel.mmsi.clone());
        self.line(&mut canvas, &format!("MMSI: {mmsi}"), left, y);
        y += 20;
        let destination = sanitize_text(&vessel.destination, MAX_TEXT_LEN);
        self.line(&mut canvas, &format!("Destination: {destination}"), left, y);
        y += 30;

        let (lat, lon) = format_coordinates(vessel.latitude, vessel.longitude);
        y = self.section(&mut canvas, "Current Position", left, y, half, [
            format!("Lat: {lat}"),
            format!("Lon: {lon}"),
        ]);
        y = self.section(&mut canvas, "Navigation Data", left, y, half, [
            format!("Speed: {} kn", format_speed(vessel.speed)),
            format!("Course: {}", format_course(vessel.course)),
        ]);

        let eta = format_timestamp(&vessel.eta);
        self.line(&mut canvas, &format!("ETA: {}", sanitize_text(&eta, MAX_TEXT_LEN)), left, y);
        y += 20;
        if let Some(map) = map {
            self.line(&mut canvas, &format!("Map: {}", map.source), left, y);
        }

        self.map(&mut canvas, panel, map);

        let updated = vessel
            .timestamp
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_else(|| "Unknown".to_string());
        self.status_bar(&mut canvas, &format!("Last Update: {updated}"));

        debug!(vessel = %vessel.name, "Display assembled");
        canvas
    }

    /// White canvas with the outer border.
    fn frame(&self) -> MonoBitmap {
        let mut canvas = MonoBitmap::new(self.width, self.height);
        let _ = Rectangle::new(
            Point::new(MARGIN, MARGIN),
            Size::new(self.width - 2 * MARGIN as u32, self.height - 2 * MARGIN as u32),
        )
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(&mut canvas);
        canvas
    }

    /// Inverted title band.
    fn header(&self, canvas: &mut MonoBitmap, title: &str) {
        let band = Rectangle::new(
            Point::new(PAD, PAD),
            Size::new(self.width - 2 * PAD as u32, HEADER_HEIGHT),
        );
        fill(canvas, band);
        let baseline = PAD + (HEADER_HEIGHT as i32 - FONT_10X20.character_size.height as i32) / 2;
        self.text(canvas, title, Point::new(PAD + MARGIN, baseline), &FONT_10X20, BinaryColor::Off);
    }

    /// Inverted bar along the bottom edge.
    fn status_bar(&self, canvas: &mut MonoBitmap, status: &str) {
        let top = self.height as i32 - PAD - STATUS_HEIGHT as i32 + MARGIN;
        let bar = Rectangle::new(
            Point::new(MARGIN, top),
            Size::new(self.width - 2 * MARGIN as u32, STATUS_HEIGHT - MARGIN as u32 + 2),
        );
        fill(canvas, bar);
        self.text(canvas, status, Point::new(PAD, top + 3), &FONT_9X15, BinaryColor::Off);
    }

    /// Section title with two boxed values side by side; returns the next
    /// free row.
    fn section(
        &self,
        canvas: &mut MonoBitmap,
        title: &str,
        left: i32,
        top: i32,
        half: i32,
        values: [String; 2],
    ) -> i32 {
        self.text(canvas, title, Point::new(left, top), &FONT_9X15_BOLD, BinaryColor::On);
        let boxes_top = top + 20;
        for (i, value) in values.iter().enumerate() {
            let x = left + i as i32 * (half + MARGIN);
            let _ = Rectangle::new(Point::new(x, boxes_top), Size::new(half.max(1) as u32, BOX_HEIGHT))
                .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
                .draw(canvas);
            let clip = (half - MARGIN).max(0) as u32 / FONT_9X15.character_size.width;
            let value: String = value.chars().take(clip as usize).collect();
            self.text(canvas, &value, Point::new(x + 6, boxes_top + 11), &FONT_9X15, BinaryColor::On);
        }
        boxes_top + BOX_HEIGHT as i32 + 16
    }

    fn map(&self, canvas: &mut MonoBitmap, panel: Rectangle, map: Option<&RenderedMap>) {
        let _ = panel
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(canvas);

        let Some(map) = map else {
            let center = panel.center();
            let label = "No map";
            let x = center.x - (label.len() as u32 * FONT_9X15.character_size.width) as i32 / 2;
            self.text(canvas, label, Point::new(x, center.y - 7), &FONT_9X15, BinaryColor::On);
            return;
        };

        // Centre the map in the panel; oversized maps are cropped by the
        // clipped blit below.
        let inner = self.map_target();
        let x = panel.top_left.x + 1 + (inner.width() as i32 - map.width() as i32) / 2;
        let y = panel.top_left.y + 1 + (inner.height() as i32 - map.height() as i32) / 2;
        let mut window = MonoBitmap::new(inner.width(), inner.height());
        window.blit(
            &map.bitmap,
            (x - panel.top_left.x - 1) as i64,
            (y - panel.top_left.y - 1) as i64,
        );
        canvas.blit(&window, (panel.top_left.x + 1) as i64, (panel.top_left.y + 1) as i64);
    }

    /// Left-column text, cut before the map panel.
    fn line(&self, canvas: &mut MonoBitmap, text: &str, left: i32, top: i32) {
        let room = (self.map_panel().top_left.x - PAD - left).max(0) as u32;
        let fits = (room / FONT_9X15.character_size.width) as usize;
        let text: String = text.chars().take(fits).collect();
        self.text(canvas, &text, Point::new(left, top), &FONT_9X15, BinaryColor::On);
    }

    /// Draws one line of text, cut at the right margin.
    fn text(
        &self,
        canvas: &mut MonoBitmap,
        text: &str,
        at: Point,
        font: &MonoFont<'_>,
        color: BinaryColor,
    ) {
        let room = (self.width as i32 - PAD - at.x).max(0) as u32;
        let fits = (room / font.character_size.width) as usize;
        let text: String = text.chars().take(fits).collect();
        let style = MonoTextStyle::new(font, color);
        let _ = Text::with_baseline(&text, at, style, Baseline::Top).draw(canvas);
    }
}

fn fill(canvas: &mut MonoBitmap, area: Rectangle) {
    let _ = area
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(canvas);
}
