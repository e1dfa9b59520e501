//! Wind barbs drawn as vector glyphs.
//!
//! Barbs sit on a regular grid in projected map space with
//! `regrid_shape` points along the shorter map axis. Speeds are rounded to
//! the nearest 5 kt and split into pennants (50 kt), full barbs (10 kt) and
//! a half barb (5 kt); calm winds are drawn as an open circle. Glyph
//! proportions follow the conventional barb layout relative to the staff
//! length.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use wx_common::VectorOverlay;

use crate::canvas::RenderContext;
use crate::raster::{ScalarRaster, ScreenGrid};
use crate::style::{Color, StrokeStyle};
use crate::viewport::Viewport;

/// Staff-relative glyph proportions.
const SPACING: f32 = 0.125;
const HEIGHT: f32 = 0.4;
const WIDTH: f32 = 0.25;
const EMPTY_RADIUS: f32 = 0.15;

/// Wind components are resampled on a raster this many times coarser than
/// the figure.
const SAMPLE_DECIMATION: f32 = 8.0;

/// Where the glyph is anchored on its sample point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pivot {
    Tip,
    #[default]
    Middle,
}

fn default_length() -> f32 {
    4.5
}

fn default_regrid_shape() -> usize {
    15
}

fn default_strokes() -> Vec<StrokeStyle> {
    vec![
        StrokeStyle::new(Color::BLACK, 1.5),
        StrokeStyle::new(Color::WHITE, 0.5),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarbSpec {
    /// Staff length in points
    #[serde(default = "default_length")]
    pub length: f32,
    #[serde(default = "default_regrid_shape")]
    pub regrid_shape: usize,
    #[serde(default)]
    pub pivot: Pivot,
    /// Each pass fills pennants and strokes the glyph in its colour
    #[serde(default = "default_strokes")]
    pub strokes: Vec<StrokeStyle>,
}

impl Default for BarbSpec {
    fn default() -> Self {
        Self {
            length: default_length(),
            regrid_shape: default_regrid_shape(),
            pivot: Pivot::default(),
            strokes: default_strokes(),
        }
    }
}

/// Decomposition of a speed into barb elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarbCounts {
    pub flags: u32,
    pub barbs: u32,
    pub half: bool,
}

impl BarbCounts {
    /// Round `knots` to the nearest 5 and split it up.
    pub fn from_speed(knots: f32) -> Self {
        let rounded = ((knots.max(0.0) / 5.0 + 0.5).floor() * 5.0) as u32;
        let flags = rounded / 50;
        let rest = rounded % 50;
        Self {
            flags,
            barbs: rest / 10,
            half: rest % 10 >= 5,
        }
    }

    pub fn is_calm(&self) -> bool {
        self.flags == 0 && self.barbs == 0 && !self.half
    }
}

/// Glyph geometry in points, staff along +y, elements on the +x side.
#[derive(Debug, Clone, PartialEq)]
pub enum BarbGlyph {
    Polygon(Vec<(f32, f32)>),
    Calm { radius: f32 },
}

/// Build the glyph for `counts` with a staff `length` points long.
pub fn barb_glyph(counts: BarbCounts, length: f32, pivot: Pivot) -> BarbGlyph {
    if counts.is_calm() {
        return BarbGlyph::Calm {
            radius: length * EMPTY_RADIUS,
        };
    }
    let spacing = length * SPACING;
    let height = length * HEIGHT;
    let width = length * WIDTH;
    let end_x = 0.0;
    let end_y = match pivot {
        Pivot::Tip => 0.0,
        Pivot::Middle => -length / 2.0,
    };

    let mut verts = vec![(end_x, end_y)];
    let mut offset = length;

    for _ in 0..counts.flags {
        // Consecutive pennants sit closer than barbs
        if offset != length {
            offset += spacing / 2.0;
        }
        verts.push((end_x, end_y + offset));
        verts.push((end_x + height, end_y - width / 2.0 + offset));
        verts.push((end_x, end_y - width + offset));
        offset -= width + spacing;
    }

    for _ in 0..counts.barbs {
        verts.push((end_x, end_y + offset));
        verts.push((end_x + height, end_y + offset + width / 2.0));
        verts.push((end_x, end_y + offset));
        offset -= spacing;
    }

    if counts.half {
        // A lone half barb is set in from the end of the staff
        if offset == length {
            verts.push((end_x, end_y + offset));
            offset -= 1.5 * spacing;
        }
        verts.push((end_x, end_y + offset));
        verts.push((end_x + height / 2.0, end_y + offset + width / 4.0));
        verts.push((end_x, end_y + offset));
    }

    BarbGlyph::Polygon(verts)
}

/// Regular sample points over the projected map extent, in pixels.
pub fn regrid_points(viewport: &Viewport, regrid_shape: usize) -> Vec<(f32, f32)> {
    let bounds = viewport.bounds();
    let (w, h) = (bounds.width(), bounds.height());
    if regrid_shape < 2 || w <= 0.0 || h <= 0.0 {
        return Vec::new();
    }
    let (nx, ny) = if w >= h {
        (((regrid_shape as f64) * w / h) as usize, regrid_shape)
    } else {
        (regrid_shape, ((regrid_shape as f64) * h / w) as usize)
    };
    let (nx, ny) = (nx.max(2), ny.max(2));

    let mut points = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        let y = bounds.min_y + h * j as f64 / (ny - 1) as f64;
        for i in 0..nx {
            let x = bounds.min_x + w * i as f64 / (nx - 1) as f64;
            points.push(viewport.projected_to_pixel(x, y));
        }
    }
    points
}

/// Glyph vertices placed at (cx, cy) pointing into the wind, with the
/// wind direction given in screen components (y down).
fn place(verts: &[(f32, f32)], cx: f32, cy: f32, sx: f32, sy: f32, scale: f32) -> Vec<(f32, f32)> {
    let phi = (-sy).atan2(sx) + FRAC_PI_2;
    let (s, c) = phi.sin_cos();
    verts
        .iter()
        .map(|&(x, y)| {
            let rx = x * c - y * s;
            let ry = x * s + y * c;
            (cx + rx * scale, cy - ry * scale)
        })
        .collect()
}

/// Wind components (knots) drawn as barbs.
#[derive(Debug, Clone)]
pub struct WindBarbs {
    pub wind: Arc<VectorOverlay>,
    pub spec: BarbSpec,
}

impl WindBarbs {
    pub fn new(wind: Arc<VectorOverlay>, spec: BarbSpec) -> Self {
        Self { wind, spec }
    }

    pub fn draw(&self, pixmap: &mut Pixmap, ctx: &RenderContext<'_>) {
        let vp = ctx.viewport;
        let screen = ScreenGrid::project(self.wind.grid(), vp).scaled(1.0 / SAMPLE_DECIMATION);
        let cw = (pixmap.width() as f32 / SAMPLE_DECIMATION).ceil() as usize + 1;
        let ch = (pixmap.height() as f32 / SAMPLE_DECIMATION).ceil() as usize + 1;
        let u = ScalarRaster::rasterize(&screen, &self.wind.u.values, cw, ch);
        let v = ScalarRaster::rasterize(&screen, &self.wind.v.values, cw, ch);

        let scale = ctx.px(1.0);
        let mut glyphs = PathBuilder::new();
        let mut circles = PathBuilder::new();
        let mut drawn = 0usize;

        for (px, py) in regrid_points(vp, self.spec.regrid_shape) {
            let (su, sv) = (
                u.sample(px / SAMPLE_DECIMATION, py / SAMPLE_DECIMATION),
                v.sample(px / SAMPLE_DECIMATION, py / SAMPLE_DECIMATION),
            );
            if su.is_nan() || sv.is_nan() {
                continue;
            }
            let Some((lon, lat)) = vp.pixel_to_geo(px, py) else {
                continue;
            };
            let speed = (su * su + sv * sv).sqrt();
            let counts = BarbCounts::from_speed(speed);
            match barb_glyph(counts, self.spec.length, self.spec.pivot) {
                BarbGlyph::Calm { radius } => {
                    circles.push_circle(px, py, radius * scale);
                }
                BarbGlyph::Polygon(verts) => {
                    let (sx, sy) = vp.vector_to_screen(lon, lat, su as f64, sv as f64);
                    let placed = place(&verts, px, py, sx as f32, sy as f32, scale);
                    glyphs.move_to(placed[0].0, placed[0].1);
                    for &(x, y) in &placed[1..] {
                        glyphs.line_to(x, y);
                    }
                    glyphs.close();
                }
            }
            drawn += 1;
        }
        tracing::debug!(barbs = drawn, "Placed wind barbs");

        let glyphs = glyphs.finish();
        let circles = circles.finish();
        for style in self.spec.strokes.iter().filter(|s| s.is_visible()) {
            let mut paint = Paint {
                anti_alias: true,
                ..Paint::default()
            };
            paint.set_color(style.effective_color().to_skia());
            let stroke = Stroke {
                width: ctx.px(style.width),
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            if let Some(path) = &glyphs {
                pixmap.fill_path(path, &paint, FillRule::Winding, Transform::identity(), Some(ctx.clip));
                pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), Some(ctx.clip));
            }
            if let Some(path) = &circles {
                pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), Some(ctx.clip));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use projection::{LambertConformal, LambertParams};
    use wx_common::BoundingBox;

    use crate::viewport::PixelRect;

    fn assert_close(actual: &[(f32, f32)], expected: &[(f32, f32)]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a.0 - e.0).abs() < 1e-4 && (a.1 - e.1).abs() < 1e-4, "{a:?} != {e:?}");
        }
    }

    #[test]
    fn test_speed_rounding() {
        assert_eq!(BarbCounts::from_speed(2.4), BarbCounts { flags: 0, barbs: 0, half: false });
        assert!(BarbCounts::from_speed(2.4).is_calm());
        assert_eq!(BarbCounts::from_speed(2.5), BarbCounts { flags: 0, barbs: 0, half: true });
        assert_eq!(BarbCounts::from_speed(17.0), BarbCounts { flags: 0, barbs: 1, half: true });
        assert_eq!(BarbCounts::from_speed(65.0), BarbCounts { flags: 1, barbs: 1, half: true });
        assert_eq!(BarbCounts::from_speed(103.0), BarbCounts { flags: 2, barbs: 0, half: true });
    }

    #[test]
    fn test_calm_glyph_is_circle() {
        let glyph = barb_glyph(BarbCounts::from_speed(1.0), 4.5, Pivot::Middle);
        assert_eq!(glyph, BarbGlyph::Calm { radius: 4.5 * 0.15 });
    }

    #[test]
    fn test_full_barb_geometry() {
        let BarbGlyph::Polygon(v) = barb_glyph(BarbCounts::from_speed(10.0), 8.0, Pivot::Tip) else {
            panic!("expected polygon");
        };
        assert_close(&v, &[(0.0, 0.0), (0.0, 8.0), (3.2, 9.0), (0.0, 8.0)]);
    }

    #[test]
    fn test_lone_half_barb_is_set_in() {
        let BarbGlyph::Polygon(v) = barb_glyph(BarbCounts::from_speed(5.0), 8.0, Pivot::Tip) else {
            panic!("expected polygon");
        };
        // staff top, then the half barb 1.5 spacings down
        assert_close(&v[1..], &[(0.0, 8.0), (0.0, 6.5), (1.6, 7.0), (0.0, 6.5)]);
    }

    #[test]
    fn test_pivot_middle_centres_staff() {
        let BarbGlyph::Polygon(v) = barb_glyph(BarbCounts::from_speed(20.0), 8.0, Pivot::Middle) else {
            panic!("expected polygon");
        };
        assert_eq!(v[0], (0.0, -4.0));
        assert_eq!(v[1], (0.0, 4.0));
    }

    #[test]
    fn test_westerly_staff_points_west() {
        let staff = [(0.0, 0.0), (0.0, 10.0)];
        let placed = place(&staff, 100.0, 100.0, 1.0, 0.0, 1.0);
        assert!((placed[1].0 - 90.0).abs() < 1e-4);
        assert!((placed[1].1 - 100.0).abs() < 1e-4);

        // southerly wind: staff extends south (down the screen)
        let placed = place(&staff, 100.0, 100.0, 0.0, -1.0, 1.0);
        assert!((placed[1].0 - 100.0).abs() < 1e-4);
        assert!((placed[1].1 - 110.0).abs() < 1e-4);
    }

    #[test]
    fn test_regrid_shorter_axis() {
        let proj = LambertConformal::new(LambertParams {
            central_longitude: -101.0,
            central_latitude: 35.0,
            standard_parallels: [30.0, 60.0],
        })
        .unwrap();
        let vp = Viewport::fit(
            Arc::new(proj),
            BoundingBox::new(-125.0, 25.0, -89.0, 50.0),
            PixelRect::new(0.0, 0.0, 1000.0, 1000.0),
        )
        .unwrap();
        let b = vp.bounds();
        let expected_nx = (15.0 * b.width() / b.height()) as usize;
        let points = regrid_points(&vp, 15);
        assert_eq!(points.len(), expected_nx * 15);

        let r = vp.rect();
        let (x0, y0) = points[0];
        assert!((x0 - r.x).abs() < 1e-2);
        assert!((y0 - r.bottom()).abs() < 1e-2);
    }

    #[test]
    fn test_spec_defaults() {
        let spec: BarbSpec = serde_yaml::from_str("{}").unwrap();
        assert_eq!(spec, BarbSpec::default());
        assert_eq!(spec.strokes.len(), 2);
        assert_eq!(spec.pivot, Pivot::Middle);
    }
}
