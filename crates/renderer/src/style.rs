//! Colors and stroke/fill styles for map layers.
//!
//! Colors are written in configuration as CSS-style names (`gold`,
//! `mediumseagreen`), hex strings (`#F2F2F2`, `#F2F2F280`) or `none`.
//! Widths and font sizes are in typographic points and scale with the
//! figure DPI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const NONE: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from unit-range float components.
    pub fn from_f32(r: f32, g: f32, b: f32) -> Self {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(q(r), q(g), q(b))
    }

    /// Fully transparent colors are never drawn.
    pub fn is_none(&self) -> bool {
        self.a == 0
    }

    /// Multiply the alpha channel by `alpha` (0..1).
    pub fn with_alpha(self, alpha: f32) -> Self {
        let a = (self.a as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// Premultiplied RGBA bytes as stored in a pixmap.
    pub fn premultiplied(self) -> [u8; 4] {
        let a = self.a as u16;
        let m = |c: u8| ((c as u16 * a + 127) / 255) as u8;
        [m(self.r), m(self.g), m(self.b), self.a]
    }

    /// Linear interpolation between two colors.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// Named colors used by the map products (CSS4 values).
const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("grey", (128, 128, 128)),
    ("gray", (128, 128, 128)),
    ("dimgray", (105, 105, 105)),
    ("dimgrey", (105, 105, 105)),
    ("darkgray", (169, 169, 169)),
    ("lightgray", (211, 211, 211)),
    ("slategrey", (112, 128, 144)),
    ("slategray", (112, 128, 144)),
    ("lightsteelblue", (176, 196, 222)),
    ("steelblue", (70, 130, 180)),
    ("mediumseagreen", (60, 179, 113)),
    ("gold", (255, 215, 0)),
    ("orangered", (255, 69, 0)),
    ("deepskyblue", (0, 191, 255)),
    ("crimson", (220, 20, 60)),
    ("seashell", (255, 245, 238)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("magenta", (255, 0, 255)),
    ("cyan", (0, 255, 255)),
];

impl FromStr for Color {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower == "none" || lower == "transparent" {
            return Ok(Color::NONE);
        }
        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| RenderError::UnknownColor(s.to_string()));
        }
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, (r, g, b))| Color::rgb(*r, *g, *b))
            .ok_or_else(|| RenderError::UnknownColor(s.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => {
            let nib = |i: usize| {
                let v = u8::from_str_radix(hex.get(i..i + 1)?, 16).ok()?;
                Some(v * 17)
            };
            Some(Color::rgb(nib(0)?, nib(1)?, nib(2)?))
        }
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

impl TryFrom<String> for Color {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

fn default_alpha() -> f32 {
    1.0
}

/// Line end shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapStyle {
    #[default]
    Butt,
    Round,
    Square,
}

impl CapStyle {
    pub fn to_skia(self) -> tiny_skia::LineCap {
        match self {
            CapStyle::Butt => tiny_skia::LineCap::Butt,
            CapStyle::Round => tiny_skia::LineCap::Round,
            CapStyle::Square => tiny_skia::LineCap::Square,
        }
    }
}

/// One stroke pass over a line or outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    /// Line width in points
    pub width: f32,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default)]
    pub cap: CapStyle,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            alpha: 1.0,
            cap: CapStyle::Butt,
        }
    }

    pub fn with_cap(mut self, cap: CapStyle) -> Self {
        self.cap = cap;
        self
    }

    pub fn effective_color(&self) -> Color {
        self.color.with_alpha(self.alpha)
    }

    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && !self.effective_color().is_none()
    }
}

/// Fill and outline of polygon features.
///
/// `strokes` are drawn in order, so a wide dark stroke followed by a thin
/// light one gives a haloed outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonStyle {
    #[serde(default = "PolygonStyle::no_fill")]
    pub fill: Color,
    #[serde(default)]
    pub strokes: Vec<StrokeStyle>,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

impl PolygonStyle {
    fn no_fill() -> Color {
        Color::NONE
    }

    pub fn outline(strokes: Vec<StrokeStyle>) -> Self {
        Self {
            fill: Color::NONE,
            strokes,
            alpha: 1.0,
        }
    }

    pub fn filled(fill: Color) -> Self {
        Self {
            fill,
            strokes: Vec::new(),
            alpha: 1.0,
        }
    }

    pub fn with_stroke(mut self, stroke: StrokeStyle) -> Self {
        self.strokes.push(stroke);
        self
    }
}

/// Convert points to device pixels.
#[inline]
pub fn points_to_px(points: f32, dpi: f32) -> f32 {
    points * dpi / 72.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!("#FF0000".parse::<Color>().unwrap(), Color::rgb(255, 0, 0));
        assert_eq!("#f2f2f2".parse::<Color>().unwrap(), Color::rgb(242, 242, 242));
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!(
            "#00000080".parse::<Color>().unwrap(),
            Color::rgba(0, 0, 0, 128)
        );
        assert!("#GGGGGG".parse::<Color>().is_err());
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(
            "mediumseagreen".parse::<Color>().unwrap(),
            Color::rgb(60, 179, 113)
        );
        assert_eq!("Gold".parse::<Color>().unwrap(), Color::rgb(255, 215, 0));
        assert!("none".parse::<Color>().unwrap().is_none());
        assert!(matches!(
            "not-a-color".parse::<Color>(),
            Err(RenderError::UnknownColor(_))
        ));
    }

    #[test]
    fn test_premultiplied() {
        assert_eq!(Color::rgba(255, 0, 0, 128).premultiplied(), [128, 0, 0, 128]);
        assert_eq!(Color::WHITE.premultiplied(), [255, 255, 255, 255]);
    }

    #[test]
    fn test_alpha_scaling() {
        assert_eq!(Color::BLACK.with_alpha(0.5).a, 128);
        assert!(Color::BLACK.with_alpha(0.0).is_none());
    }

    #[test]
    fn test_display_roundtrip() {
        let c = Color::rgba(1, 2, 3, 4);
        assert_eq!(c.to_string().parse::<Color>().unwrap(), c);
        assert_eq!(Color::NONE.to_string(), "none");
    }

    #[test]
    fn test_polygon_style_yaml() {
        let style: PolygonStyle = serde_yaml::from_str(
            "fill: '#E1E1E1'\nstrokes:\n  - { color: black, width: 2.5 }\n  - { color: white, width: 0.5 }\n",
        )
        .unwrap();
        assert_eq!(style.fill, Color::rgb(225, 225, 225));
        assert_eq!(style.strokes.len(), 2);
        assert_eq!(style.strokes[1].alpha, 1.0);
        assert_eq!(style.strokes[1].cap, CapStyle::Butt);
    }

    #[test]
    fn test_stroke_cap_and_alpha_yaml() {
        let stroke: StrokeStyle = serde_yaml::from_str("{ color: black, width: 0.5, alpha: 0.2, cap: round }").unwrap();
        assert_eq!(stroke.cap, CapStyle::Round);
        assert_eq!(stroke.effective_color().a, 51);
        assert_eq!(stroke.cap.to_skia(), tiny_skia::LineCap::Round);
    }

    #[test]
    fn test_points_to_px() {
        assert_eq!(points_to_px(72.0, 300.0), 300.0);
        assert!((points_to_px(7.0, 300.0) - 29.166_666).abs() < 1e-4);
    }
}
