//! Hatched polygon areas.
//!
//! A pattern such as `//////` is drawn as parallel diagonal lines across the
//! map, masked by the polygons. Each pattern character adds
//! [`LINES_PER_INCH_PER_CHAR`] lines per inch in its direction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, LineCap, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::canvas::RenderContext;
use crate::features::{Feature, FeatureKind};
use crate::style::Color;
use crate::viewport::PixelRect;

pub const LINES_PER_INCH_PER_CHAR: f32 = 6.0;

fn default_pattern() -> String {
    "//////".to_string()
}

fn default_line_width() -> f32 {
    1.0
}

fn default_color() -> Color {
    Color::rgb(255, 245, 238)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HatchSpec {
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_color")]
    pub color: Color,
    /// Hatch line width in points
    #[serde(default = "default_line_width")]
    pub line_width: f32,
}

impl Default for HatchSpec {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            color: default_color(),
            line_width: default_line_width(),
        }
    }
}

impl HatchSpec {
    /// Line densities (per inch) of the rising `/` and falling `\` families.
    pub fn densities(&self) -> (f32, f32) {
        let count = |c: char| self.pattern.chars().filter(|&p| p == c || p == 'x' || p == 'X').count() as f32;
        (
            count('/') * LINES_PER_INCH_PER_CHAR,
            count('\\') * LINES_PER_INCH_PER_CHAR,
        )
    }
}

/// Rising diagonal segments (screen `x + y = c`) clipped to `rect`,
/// `spacing` pixels apart along x.
pub fn rising_lines(rect: &PixelRect, spacing: f32) -> Vec<((f32, f32), (f32, f32))> {
    diagonal_lines(rect, spacing, false)
}

/// Falling diagonal segments (screen `x - y = c`) clipped to `rect`.
pub fn falling_lines(rect: &PixelRect, spacing: f32) -> Vec<((f32, f32), (f32, f32))> {
    diagonal_lines(rect, spacing, true)
}

fn diagonal_lines(rect: &PixelRect, spacing: f32, falling: bool) -> Vec<((f32, f32), (f32, f32))> {
    if !(spacing > 0.0) || rect.width <= 0.0 || rect.height <= 0.0 {
        return Vec::new();
    }
    let (x0, x1, y0, y1) = (rect.x, rect.right(), rect.y, rect.bottom());
    let (c_min, c_max) = if falling {
        (x0 - y1, x1 - y0)
    } else {
        (x0 + y0, x1 + y1)
    };
    // Phase-lock to the figure origin so adjacent areas line up
    let mut c = (c_min / spacing).ceil() * spacing;
    let mut lines = Vec::new();
    while c <= c_max {
        let (lo, hi) = if falling {
            // y = x - c
            ((c + y0).max(x0), (c + y1).min(x1))
        } else {
            // y = c - x
            ((c - y1).max(x0), (c - y0).min(x1))
        };
        if hi > lo {
            let y = |x: f32| if falling { x - c } else { c - x };
            lines.push(((lo, y(lo)), (hi, y(hi))));
        }
        c += spacing;
    }
    lines
}

/// Polygons filled with a hatch pattern and nothing else.
#[derive(Debug, Clone)]
pub struct HatchedArea {
    pub features: Arc<Vec<Feature>>,
    pub spec: HatchSpec,
}

impl HatchedArea {
    pub fn new(features: Arc<Vec<Feature>>, spec: HatchSpec) -> Self {
        Self { features, spec }
    }

    pub fn draw(&self, pixmap: &mut Pixmap, ctx: &RenderContext<'_>) {
        let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) else {
            return;
        };
        let mut covered = false;
        for feature in self.features.iter().filter(|f| f.kind == FeatureKind::Polygon) {
            if let Some(path) = feature.to_path(ctx.viewport) {
                mask.fill_path(&path, FillRule::EvenOdd, true, Transform::identity());
                covered = true;
            }
        }
        if !covered || self.spec.color.is_none() {
            return;
        }

        let rect = ctx.viewport.rect();
        let (rising_density, falling_density) = self.spec.densities();
        let mut pb = PathBuilder::new();
        for (density, falling) in [(rising_density, false), (falling_density, true)] {
            if density <= 0.0 {
                continue;
            }
            for ((ax, ay), (bx, by)) in diagonal_lines(&rect, ctx.text.dpi() / density, falling) {
                pb.move_to(ax, ay);
                pb.line_to(bx, by);
            }
        }
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint {
            anti_alias: true,
            ..Paint::default()
        };
        paint.set_color(self.spec.color.to_skia());
        let stroke = Stroke {
            width: ctx.px(self.spec.line_width),
            line_cap: LineCap::Butt,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), Some(&mask));
    }
}
