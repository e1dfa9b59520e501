//! Vector features (polygons and polylines) drawn in lon/lat.

use tiny_skia::{FillRule, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};
use wx_common::BoundingBox;

use crate::canvas::RenderContext;
use crate::style::PolygonStyle;
use crate::viewport::Viewport;

/// Degrees of slack when culling features against the map extent; conic
/// maps bulge past the lon/lat box.
const CULL_MARGIN_DEG: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Polygon,
    Line,
}

/// One shape: rings of a polygon or parts of a polyline, in (lon, lat).
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    pub parts: Vec<Vec<(f64, f64)>>,
    bbox: Option<BoundingBox>,
}

impl Feature {
    pub fn new(kind: FeatureKind, parts: Vec<Vec<(f64, f64)>>) -> Self {
        let bbox = BoundingBox::enclosing(parts.iter().flatten().copied());
        Self { kind, parts, bbox }
    }

    pub fn polygon(rings: Vec<Vec<(f64, f64)>>) -> Self {
        Self::new(FeatureKind::Polygon, rings)
    }

    pub fn line(parts: Vec<Vec<(f64, f64)>>) -> Self {
        Self::new(FeatureKind::Line, parts)
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    pub fn point_count(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    fn visible_in(&self, extent: &BoundingBox) -> bool {
        self.bbox
            .map(|b| b.intersects(&extent.expand(CULL_MARGIN_DEG)))
            .unwrap_or(false)
    }

    /// Path in pixel space. Vertices the projection cannot place split the
    /// part. None if nothing drawable remains.
    pub fn to_path(&self, viewport: &Viewport) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for part in &self.parts {
            let mut open = false;
            let mut placed = 0usize;
            for &(lon, lat) in part {
                match viewport.geo_to_pixel(lon, lat) {
                    Some((x, y)) => {
                        if open {
                            pb.line_to(x, y);
                        } else {
                            pb.move_to(x, y);
                            open = true;
                        }
                        placed += 1;
                    }
                    None if self.kind == FeatureKind::Line => open = false,
                    None => {}
                }
            }
            if open && placed > 2 && self.kind == FeatureKind::Polygon {
                pb.close();
            }
        }
        pb.finish()
    }
}

/// Fill then stroke every feature with `style`.
pub fn draw_features(pixmap: &mut Pixmap, ctx: &RenderContext<'_>, features: &[Feature], style: &PolygonStyle) {
    let extent = ctx.viewport.extent();
    let fill = style.fill.with_alpha(style.alpha);
    let strokes: Vec<(Paint<'static>, Stroke)> = style
        .strokes
        .iter()
        .filter(|s| s.is_visible())
        .map(|s| {
            let mut paint = Paint {
                anti_alias: true,
                ..Paint::default()
            };
            paint.set_color(s.effective_color().with_alpha(style.alpha).to_skia());
            let stroke = Stroke {
                width: ctx.px(s.width),
                line_cap: s.cap.to_skia(),
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            (paint, stroke)
        })
        .collect();

    let mut fill_paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    fill_paint.set_color(fill.to_skia());

    for feature in features.iter().filter(|f| f.visible_in(extent)) {
        let Some(path) = feature.to_path(ctx.viewport) else {
            continue;
        };
        if feature.kind == FeatureKind::Polygon && !fill.is_none() {
            pixmap.fill_path(&path, &fill_paint, FillRule::EvenOdd, Transform::identity(), Some(ctx.clip));
        }
        for (paint, stroke) in &strokes {
            pixmap.stroke_path(&path, paint, stroke, Transform::identity(), Some(ctx.clip));
        }
    }
}
