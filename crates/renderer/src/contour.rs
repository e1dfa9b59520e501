//! Contour line (isoline) rendering using the marching squares algorithm.
//!
//! Lines are traced in grid index space and carried to pixels through the
//! projected grid, so curvilinear model grids contour correctly. Labels are
//! drawn upright at intervals along each line, and the line is broken
//! underneath them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform};
use wx_common::GriddedField;

use crate::canvas::RenderContext;
use crate::levels::Levels;
use crate::raster::ScreenGrid;
use crate::style::StrokeStyle;
use crate::text::{format_integer, Anchor, TextStyle};
use crate::viewport::PixelRect;

/// A point in 2D space (grid index or pixel coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Contour {
    /// Total length of the polyline
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    /// Point at arc length `distance` from the start.
    fn point_at(&self, distance: f32) -> Option<Point> {
        let mut walked = 0.0;
        for w in self.points.windows(2) {
            let seg = w[0].distance(&w[1]);
            if seg > 0.0 && walked + seg >= distance {
                let t = (distance - walked) / seg;
                return Some(Point::new(
                    w[0].x + t * (w[1].x - w[0].x),
                    w[0].y + t * (w[1].y - w[0].y),
                ));
            }
            walked += seg;
        }
        self.points.last().copied()
    }
}

/// Marching squares algorithm to generate contour segments
///
/// # Arguments
/// * `data` - Grid data in row-major order
/// * `width` - Grid width
/// * `height` - Grid height
/// * `level` - Contour level to extract
///
/// # Returns
/// Line segments in grid index coordinates
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            // Skip cells with NaN values
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            // Which corners are at or above the level (0-15)
            let mut cell_index = 0;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            segments.extend(
                get_cell_segments(cell_index, x as f32, y as f32, tl, tr, br, bl, level)
                    .into_iter()
                    .filter(|s| s.start != s.end),
            );
        }
    }

    segments
}

/// Line segments for one marching squares cell, with crossings linearly
/// interpolated along the cell edges.
#[allow(clippy::too_many_arguments)]
fn get_cell_segments(
    cell_index: u8,
    x: f32,
    y: f32,
    tl: f32,
    tr: f32,
    br: f32,
    bl: f32,
    level: f32,
) -> Vec<Segment> {
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![Segment { start: left, end: top }],
        2 | 13 => vec![Segment { start: top, end: right }],
        3 | 12 => vec![Segment { start: left, end: right }],
        4 | 11 => vec![Segment { start: right, end: bottom }],
        // Saddles: two separate segments
        5 => vec![
            Segment { start: left, end: top },
            Segment { start: right, end: bottom },
        ],
        6 | 9 => vec![Segment { start: top, end: bottom }],
        7 | 8 => vec![Segment { start: left, end: bottom }],
        10 => vec![
            Segment { start: top, end: right },
            Segment { start: left, end: bottom },
        ],
        _ => vec![],
    }
}

fn interpolate_edge(x1: f32, y1: f32, x2: f32, y2: f32, val1: f32, val2: f32, level: f32) -> Point {
    if (val2 - val1).abs() < 1e-6 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }
    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

type PointKey = (i64, i64);

fn point_key(p: Point) -> PointKey {
    ((p.x * 1e4).round() as i64, (p.y * 1e4).round() as i64)
}

/// Connect unordered segments into polylines.
///
/// Neighbouring cells compute shared edge crossings identically, so
/// endpoints are matched exactly through a hash index and each chain is
/// grown from both ends.
pub fn connect_segments(segments: &[Segment], level: f32) -> Vec<Contour> {
    let mut index: HashMap<PointKey, Vec<usize>> = HashMap::with_capacity(segments.len() * 2);
    for (i, seg) in segments.iter().enumerate() {
        index.entry(point_key(seg.start)).or_default().push(i);
        index.entry(point_key(seg.end)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;

        let mut forward = vec![segments[first].start, segments[first].end];
        extend_chain(&mut forward, segments, &index, &mut used);
        let mut backward = vec![segments[first].start];
        extend_chain(&mut backward, segments, &index, &mut used);

        let mut points: Vec<Point> = backward.into_iter().skip(1).rev().collect();
        points.extend(forward);

        let closed = points.len() > 2
            && matches!((points.first(), points.last()), (Some(a), Some(b)) if point_key(*a) == point_key(*b));
        contours.push(Contour { level, points, closed });
    }

    contours
}

fn extend_chain(
    chain: &mut Vec<Point>,
    segments: &[Segment],
    index: &HashMap<PointKey, Vec<usize>>,
    used: &mut [bool],
) {
    while let Some(&tip) = chain.last() {
        let key = point_key(tip);
        let next = index
            .get(&key)
            .and_then(|candidates| candidates.iter().copied().find(|&i| !used[i]));
        let Some(i) = next else {
            break;
        };
        used[i] = true;
        let seg = &segments[i];
        chain.push(if point_key(seg.start) == key { seg.end } else { seg.start });
    }
}

/// Trace every level of a row-major grid.
pub fn trace_contours(data: &[f32], width: usize, height: usize, levels: &[f32]) -> Vec<Contour> {
    levels
        .iter()
        .flat_map(|&level| connect_segments(&march_squares(data, width, height, level), level))
        .collect()
}

/// Carry index-space contours to pixels. Stretches that leave the
/// projected grid split the line.
pub fn to_screen(contours: &[Contour], grid: &ScreenGrid) -> Vec<Contour> {
    let mut out = Vec::new();
    for contour in contours {
        let mut current = Vec::with_capacity(contour.points.len());
        for p in &contour.points {
            match grid.at(p.x, p.y) {
                Some((x, y)) => current.push(Point::new(x, y)),
                None => flush(&mut out, &mut current, contour.level),
            }
        }
        let whole = current.len() == contour.points.len();
        if whole && contour.closed {
            out.push(Contour {
                level: contour.level,
                points: current,
                closed: true,
            });
        } else {
            flush(&mut out, &mut current, contour.level);
        }
    }
    out
}

fn flush(out: &mut Vec<Contour>, current: &mut Vec<Point>, level: f32) {
    if current.len() >= 2 {
        out.push(Contour {
            level,
            points: std::mem::take(current),
            closed: false,
        });
    } else {
        current.clear();
    }
}

fn default_label_spacing() -> f32 {
    144.0
}

fn default_inline_spacing() -> f32 {
    2.0
}

/// Inline contour labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    #[serde(flatten)]
    pub style: TextStyle,
    /// Distance between labels along a line, points
    #[serde(default = "default_label_spacing")]
    pub spacing: f32,
    /// Gap left on each side of a label, points
    #[serde(default = "default_inline_spacing")]
    pub inline_spacing: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSpec {
    #[serde(default)]
    pub levels: Levels,
    /// Drawn in order over every line
    pub strokes: Vec<StrokeStyle>,
    #[serde(default)]
    pub labels: Option<LabelSpec>,
}

/// A label placed on a contour line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub text: String,
    pub center: (f32, f32),
    /// Area cut out of the line
    pub gap: PixelRect,
}

/// Place labels along pixel-space contours. A label must fit inside
/// `bounds` and must not overlap an earlier one.
pub fn place_labels(
    contours: &[Contour],
    bounds: PixelRect,
    spacing_px: f32,
    inline_px: f32,
    mut measure: impl FnMut(&str) -> (f32, f32),
) -> Vec<PlacedLabel> {
    let mut placed: Vec<PlacedLabel> = Vec::new();
    for contour in contours {
        let length = contour.length();
        let text = format_integer(contour.level);
        let (w, h) = measure(&text);
        if w <= 0.0 || length < 1.5 * (w + 2.0 * inline_px) {
            continue;
        }
        let count = ((length / spacing_px.max(1.0)).floor() as usize).max(1);
        for k in 0..count {
            let along = (k as f32 + 0.5) * length / count as f32;
            let Some(p) = contour.point_at(along) else {
                continue;
            };
            let gap = PixelRect::new(p.x - w / 2.0 - inline_px, p.y - h / 2.0, w + 2.0 * inline_px, h);
            let inside = gap.x >= bounds.x && gap.y >= bounds.y && gap.right() <= bounds.right() && gap.bottom() <= bounds.bottom();
            if !inside || placed.iter().any(|l| l.gap.intersects(&gap)) {
                continue;
            }
            placed.push(PlacedLabel {
                text: text.clone(),
                center: (p.x, p.y),
                gap,
            });
        }
    }
    placed
}

/// Coverage mask of the map area with label gaps removed.
fn gap_mask(width: u32, height: u32, map: PixelRect, labels: &[PlacedLabel]) -> Option<Mask> {
    let mut pb = PathBuilder::new();
    pb.push_rect(map.to_skia()?);
    for label in labels {
        if let Some(r) = label.gap.to_skia() {
            pb.push_rect(r);
        }
    }
    let path = pb.finish()?;
    let mut mask = Mask::new(width, height)?;
    mask.fill_path(&path, FillRule::EvenOdd, true, Transform::identity());
    Some(mask)
}

/// A field drawn as labelled contour lines.
#[derive(Debug, Clone)]
pub struct LineContours {
    pub field: Arc<GriddedField>,
    pub spec: ContourSpec,
}

impl LineContours {
    pub fn new(field: Arc<GriddedField>, spec: ContourSpec) -> Self {
        Self { field, spec }
    }

    pub fn draw(&self, pixmap: &mut Pixmap, ctx: &RenderContext<'_>) {
        let levels = self.spec.levels.line_levels(self.field.finite_range());
        let traced = trace_contours(&self.field.values, self.field.nx(), self.field.ny(), &levels);
        let screen = ScreenGrid::project(&self.field.grid, ctx.viewport);
        let contours = to_screen(&traced, &screen);
        tracing::debug!(
            field = %self.field.name,
            levels = levels.len(),
            lines = contours.len(),
            "Traced contours"
        );
        if contours.is_empty() {
            return;
        }

        let labels = match &self.spec.labels {
            Some(spec) => place_labels(
                &contours,
                ctx.viewport.rect(),
                ctx.px(spec.spacing),
                ctx.px(spec.inline_spacing),
                |text| ctx.text.measure(text, &spec.style),
            ),
            None => Vec::new(),
        };
        let broken = if labels.is_empty() {
            None
        } else {
            gap_mask(pixmap.width(), pixmap.height(), ctx.viewport.rect(), &labels)
        };
        let mask = broken.as_ref().unwrap_or(ctx.clip);

        let mut pb = PathBuilder::new();
        for contour in &contours {
            pb.move_to(contour.points[0].x, contour.points[0].y);
            for p in &contour.points[1..] {
                pb.line_to(p.x, p.y);
            }
            if contour.closed {
                pb.close();
            }
        }
        let Some(path) = pb.finish() else {
            return;
        };

        for style in self.spec.strokes.iter().filter(|s| s.is_visible()) {
            let mut paint = Paint {
                anti_alias: true,
                ..Paint::default()
            };
            paint.set_color(style.effective_color().to_skia());
            let stroke = Stroke {
                width: ctx.px(style.width),
                line_cap: LineCap::Butt,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), Some(mask));
        }

        if let Some(spec) = &self.spec.labels {
            for label in &labels {
                ctx.text
                    .draw(pixmap, &label.text, label.center, Anchor::CENTER, &spec.style, None);
            }
        }
    }
}
