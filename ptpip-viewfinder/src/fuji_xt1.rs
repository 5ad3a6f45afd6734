//! The Fuji X-T1 widget set: positions and draw routines mimicking
//! the camera's own viewfinder.
//!
//! Positions are fractions of the image extents so the layout is
//! resolution-independent.

use std::collections::HashMap;

use image::RgbaImage;
use ptpip_core::fmt::{fnumber_as_string, fuji_exposure_index_as_string, ExposureProgramMode};
use ptpip_core::fuji::{FujiBatteryLevel, DPC_FUJI_EXPOSURE_INDEX};
use ptpip_core::DevicePropCode;

use crate::{fix, Face, Viewfinder, Widget, WidgetKind, GREY, WHITE, YELLOW};

/// The 19-rune exposure bias ruler; index 9 is the zero mark.
const BIAS_RULER: &str = "6..5..4..0..1..2..3";
const BIAS_ZERO_INDEX: i32 = 9;
/// Ruler cells per whole stop.
const BIAS_CELLS_PER_STOP: i32 = 3;
/// Replaces the ruler rune under a whole-stop marker.
const BIAS_PLACEHOLDER: char = '"';
/// The marker rune.
const BIAS_MARKER: char = '!';

/// A viewfinder mimicking the X-T1's overlay, with widget origins
/// calibrated against `img`'s extents.
pub fn fuji_xt1_viewfinder(img: &RgbaImage) -> Viewfinder {
    let (max_x, max_y) = (img.width() as i32, img.height() as i32);

    let mut widgets = HashMap::new();
    widgets.insert(
        DevicePropCode::BATTERY_LEVEL,
        Widget::white_glyph(
            WidgetKind::Battery,
            max_x - (max_x as f64 * 0.1) as i32,
            max_y - 8,
        ),
    );
    widgets.insert(
        DevicePropCode::EXPOSURE_BIAS_COMPENSATION,
        Widget::white_glyph(
            WidgetKind::ExposureBias,
            bias_origin_x(max_x),
            max_y - 10,
        ),
    );
    widgets.insert(
        DevicePropCode::EXPOSURE_PROGRAM_MODE,
        Widget::white_glyph(
            WidgetKind::ExposureProgram,
            (max_x as f64 * 0.1) as i32,
            max_y - 10,
        ),
    );
    widgets.insert(
        DPC_FUJI_EXPOSURE_INDEX,
        Widget::white_glyph(
            WidgetKind::ExposureIndex,
            max_x - (max_x as f64 * 0.2) as i32,
            max_y - 10,
        ),
    );
    widgets.insert(
        DevicePropCode::F_NUMBER,
        Widget::white_text(
            WidgetKind::FNumber,
            (max_x as f64 * 0.25) as i32,
            max_y - 10,
        ),
    );
    Viewfinder::new(widgets)
}

/// Center the ruler: origin sits half the ruler's pixel width left of
/// the image midline.
fn bias_origin_x(max_x: i32) -> i32 {
    let offset = Face::Glyph6x13.advance() * BIAS_RULER.chars().count() as i32 / 2;
    (max_x as f64 - max_x as f64 * 0.5) as i32 - offset
}

impl Widget {
    /// Paint this widget's property value.
    pub fn draw(&mut self, img: &mut RgbaImage, value: i64) {
        match self.kind() {
            WidgetKind::Battery => self.draw_battery(img, value),
            WidgetKind::ExposureBias => self.draw_exposure_bias(img, value),
            WidgetKind::ExposureProgram => self.draw_exposure_program(img, value),
            WidgetKind::ExposureIndex => self.draw_exposure_index(img, value),
            WidgetKind::FNumber => self.draw_fnumber(img, value),
        }
    }

    fn draw_battery(&mut self, img: &mut RgbaImage, value: i64) {
        self.reset_to_origin();
        self.reset_colour();

        let glyphs = match FujiBatteryLevel::try_from(value) {
            Ok(FujiBatteryLevel::One) => {
                self.set_colour(255, 0, 0);
                "baU"
            }
            Ok(FujiBatteryLevel::Two) => "bCT",
            Ok(FujiBatteryLevel::Full) => "BAT",
            Err(_) => return,
        };
        self.draw_string(img, glyphs);
    }

    fn draw_exposure_bias(&mut self, img: &mut RgbaImage, value: i64) {
        self.reset_to_origin();
        self.reset_colour();

        let mark = bias_mark(value as i16);
        let mut ruler: Vec<char> = BIAS_RULER.chars().collect();
        let mut marker: Vec<char> = std::iter::repeat(' ').take(ruler.len()).collect();

        // The leading +/- icon, three glyphs left of origin.
        self.dot.0 -= fix(self.face.advance() * 3);
        self.draw_string(img, "+-");
        self.reset_to_origin();

        // On a whole stop the number under the marker gives way to a
        // placeholder.
        if mark.on_whole {
            ruler[mark.pos] = BIAS_PLACEHOLDER;
        }

        if mark.on_zero {
            self.set_colour(GREY.0[0], GREY.0[1], GREY.0[2]);
        }
        let ruler_string: String = ruler.iter().collect();
        self.draw_string(img, &ruler_string);

        if mark.on_zero {
            // Marker and zero glyph overdrawn in white.
            self.set_colour(WHITE.0[0], WHITE.0[1], WHITE.0[2]);
            for r in [BIAS_PLACEHOLDER, BIAS_MARKER] {
                self.reset_to_origin();
                marker[mark.pos] = r;
                let marker_string: String = marker.iter().collect();
                self.draw_string(img, &marker_string);
            }
            return;
        }

        marker[mark.pos] = BIAS_MARKER;
        self.set_colour(YELLOW.0[0], YELLOW.0[1], YELLOW.0[2]);
        self.reset_to_origin();
        let marker_string: String = marker.iter().collect();
        self.draw_string(img, &marker_string);
    }

    fn draw_exposure_program(&mut self, img: &mut RgbaImage, value: i64) {
        self.reset_to_origin();
        self.reset_colour();

        let icon = ExposureProgramMode::try_from(value)
            .map(|m| m.icon())
            .unwrap_or(" ");
        self.draw_string(img, icon);
    }

    fn draw_exposure_index(&mut self, img: &mut RgbaImage, value: i64) {
        self.reset_to_origin();
        self.reset_colour();
        self.reset_face();

        let mut iso = fuji_exposure_index_as_string(value as u32);

        self.draw_string(img, "is"); // iso icon

        if iso.starts_with('S') {
            // Auto badge, raised and shifted left of the icon.
            self.dot.0 -= fix(18);
            self.dot.1 -= fix(8);
            self.draw_string(img, "ISO");
            self.dot.1 += fix(8);
            iso.remove(0);
        }

        self.face = Face::Text7x13;
        self.dot.0 += fix(6);
        self.dot.1 += fix(2);
        self.draw_string(img, &iso);
    }

    fn draw_fnumber(&mut self, img: &mut RgbaImage, value: i64) {
        self.reset_to_origin();
        self.reset_colour();
        self.draw_string(img, &fnumber_as_string(value as u16));
    }
}

// ── Bias marker arithmetic ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BiasMark {
    /// Ruler index the marker lands on.
    pos: usize,
    /// The value is exactly zero.
    on_zero: bool,
    /// The value sits on a whole stop (no third-stop fraction).
    on_whole: bool,
}

/// Marker position for a raw bias value in thousandths of a stop:
/// `zero + thirdStop + wholeStops·3`, where the third-stop is ±1 for
/// |fraction| ≤ 0.4 and ±2 above, sign following the fraction.
fn bias_mark(value: i16) -> BiasMark {
    let stops = value as f64 / 1000.0;
    let whole = stops.trunc();
    let frac = stops.fract();

    let mut third = 0i32;
    if frac != 0.0 {
        third = if frac.abs() > 0.4 { 2 } else { 1 };
        if frac.is_sign_negative() {
            third = -third;
        }
    }

    let pos = BIAS_ZERO_INDEX + third + whole as i32 * BIAS_CELLS_PER_STOP;
    BiasMark {
        pos: pos.clamp(0, BIAS_RULER.len() as i32 - 1) as usize,
        on_zero: value == 0,
        on_whole: frac == 0.0,
    }
}
