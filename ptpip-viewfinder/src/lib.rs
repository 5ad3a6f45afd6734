//! Viewfinder-style status overlay.
//!
//! A [`Viewfinder`] maps device property codes to positioned
//! [`Widget`]s. Each widget owns a pen ("dot", 26.6 fixed point), a
//! current colour and a current face, and paints its property's value
//! into a shared `RgbaImage`. Widgets never own the image — every
//! draw borrows it for the call — so redrawing the same values is
//! idempotent.

mod face;
mod fuji_xt1;

pub use face::Face;
pub use fuji_xt1::fuji_xt1_viewfinder;

use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use ptpip_core::DevicePropCode;

/// 26.6 fixed-point pixels, as glyph pipelines count them.
pub type Fixed = i32;

/// Pixels → 26.6 fixed point.
pub const fn fix(px: i32) -> Fixed {
    px << 6
}

/// 26.6 fixed point → pixels, truncating the fraction.
pub const fn unfix(f: Fixed) -> i32 {
    f >> 6
}

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const GREY: Rgba<u8> = Rgba([100, 100, 100, 255]);
pub const YELLOW: Rgba<u8> = Rgba([255, 185, 10, 255]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

// ── Widget ───────────────────────────────────────────────────────

/// The property kinds this overlay can paint. One case per kind, so
/// the supported set is checked at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Battery,
    ExposureBias,
    ExposureProgram,
    ExposureIndex,
    FNumber,
}

/// A positioned renderer bound to one property kind.
#[derive(Debug, Clone)]
pub struct Widget {
    kind: WidgetKind,
    origin: (i32, i32),
    /// Pen position, 26.6 fixed point.
    pub dot: (Fixed, Fixed),
    colour: Rgba<u8>,
    default_colour: Rgba<u8>,
    pub face: Face,
    default_face: Face,
}

impl Widget {
    /// A widget drawing in white with the narrow glyph face.
    pub fn white_glyph(kind: WidgetKind, x: i32, y: i32) -> Self {
        Widget::new(kind, x, y, WHITE, Face::Glyph6x13)
    }

    /// A widget drawing in white with the wider text face.
    pub fn white_text(kind: WidgetKind, x: i32, y: i32) -> Self {
        Widget::new(kind, x, y, WHITE, Face::Text7x13)
    }

    fn new(kind: WidgetKind, x: i32, y: i32, colour: Rgba<u8>, face: Face) -> Self {
        Widget {
            kind,
            origin: (x, y),
            dot: (fix(x), fix(y)),
            colour,
            default_colour: colour,
            face,
            default_face: face,
        }
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn colour(&self) -> Rgba<u8> {
        self.colour
    }

    /// Restore the pen to the widget's origin.
    pub fn reset_to_origin(&mut self) {
        self.dot = (fix(self.origin.0), fix(self.origin.1));
    }

    /// Restore the default colour.
    pub fn reset_colour(&mut self) {
        self.colour = self.default_colour;
    }

    /// Restore the default face.
    pub fn reset_face(&mut self) {
        self.face = self.default_face;
    }

    pub fn set_colour(&mut self, r: u8, g: u8, b: u8) {
        self.colour = Rgba([r, g, b, 255]);
    }

    /// Draw a string at the pen, advancing it by the sum of glyph
    /// advances.
    pub fn draw_string(&mut self, img: &mut RgbaImage, s: &str) {
        for ch in s.chars() {
            self.face
                .draw_glyph(img, unfix(self.dot.0), unfix(self.dot.1), self.colour, ch);
            self.dot.0 += fix(self.face.advance());
        }
    }
}

// ── Viewfinder ───────────────────────────────────────────────────

/// Maps property codes to their widgets.
pub struct Viewfinder {
    widgets: HashMap<DevicePropCode, Widget>,
}

impl Viewfinder {
    pub fn new(widgets: HashMap<DevicePropCode, Widget>) -> Self {
        Viewfinder { widgets }
    }

    pub fn widget(&self, code: DevicePropCode) -> Option<&Widget> {
        self.widgets.get(&code)
    }

    /// Paint one property's value. Returns `false` when no widget is
    /// bound to the code.
    pub fn update(&mut self, img: &mut RgbaImage, code: DevicePropCode, value: i64) -> bool {
        match self.widgets.get_mut(&code) {
            Some(widget) => {
                widget.draw(img, value);
                true
            }
            None => false,
        }
    }

    /// Paint every property present in `values` that has a widget.
    pub fn draw_all(&mut self, img: &mut RgbaImage, values: &HashMap<DevicePropCode, i64>) {
        for (code, value) in values {
            self.update(img, *code, *value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_conversions() {
        assert_eq!(fix(10), 640);
        assert_eq!(unfix(fix(10)), 10);
        assert_eq!(unfix(fix(3) + fix(4)), 7);
    }

    #[test]
    fn pen_advances_and_resets() {
        let mut img = RgbaImage::new(200, 100);
        let mut w = Widget::white_glyph(WidgetKind::FNumber, 20, 50);

        w.draw_string(&mut img, "F5.6");
        assert_eq!(unfix(w.dot.0), 20 + 4 * 6);
        assert_eq!(unfix(w.dot.1), 50);

        w.reset_to_origin();
        assert_eq!((unfix(w.dot.0), unfix(w.dot.1)), (20, 50));
    }

    #[test]
    fn colour_and_face_reset() {
        let mut w = Widget::white_glyph(WidgetKind::Battery, 0, 0);
        w.set_colour(255, 0, 0);
        assert_eq!(w.colour(), RED);
        w.reset_colour();
        assert_eq!(w.colour(), WHITE);

        w.face = Face::Text7x13;
        w.reset_face();
        assert_eq!(w.face, Face::Glyph6x13);
    }

    #[test]
    fn update_unknown_code_is_a_no_op() {
        let mut img = RgbaImage::new(64, 64);
        let mut vf = Viewfinder::new(HashMap::new());
        assert!(!vf.update(&mut img, DevicePropCode(0x5007), 560));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}
