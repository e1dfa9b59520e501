//! Vertical colorbar for a filled-contour layer.

use tiny_skia::{Paint, Pixmap, Rect, Transform};

use crate::fill::Bands;
use crate::text::{Anchor, TextRenderer, TextStyle};
use crate::viewport::PixelRect;

/// Maximum number of tick labels along the bar.
const MAX_TICKS: usize = 10;

/// Colorbar placement relative to the axes it steals room from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorbarLayout {
    /// Share of the parent width taken by the colorbar box
    pub fraction: f32,
    /// Gap between map and colorbar, as a share of the parent width
    pub pad: f32,
    pub shrink: f32,
    /// Bar height over bar width
    pub aspect: f32,
}

impl Default for ColorbarLayout {
    fn default() -> Self {
        Self {
            fraction: 0.15,
            pad: 0.025,
            shrink: 0.896,
            aspect: 20.0,
        }
    }
}

impl ColorbarLayout {
    /// Split `parent` into the map area and the bar rectangle.
    pub fn split(&self, parent: PixelRect) -> (PixelRect, PixelRect) {
        let map = PixelRect::new(
            parent.x,
            parent.y,
            parent.width * (1.0 - self.fraction - self.pad),
            parent.height,
        );
        let box_height = parent.height * self.shrink;
        let bar = PixelRect::new(
            parent.x + parent.width * (1.0 - self.fraction),
            parent.y + (parent.height - box_height) / 2.0,
            box_height / self.aspect,
            box_height,
        );
        (map, bar)
    }
}

/// Tick subset of at most `max_ticks` levels, every `step`-th level with
/// the offset whose smallest magnitude is closest to zero.
pub fn select_ticks(levels: &[f32], max_ticks: usize) -> Vec<f32> {
    if levels.is_empty() || max_ticks == 0 {
        return Vec::new();
    }
    let step = levels.len().div_ceil(max_ticks).max(1);
    let min_abs = |offset: usize| {
        levels
            .iter()
            .skip(offset)
            .step_by(step)
            .map(|v| v.abs())
            .fold(f32::INFINITY, f32::min)
    };
    let mut best = 0;
    for offset in 1..step {
        if min_abs(offset) < min_abs(best) {
            best = offset;
        }
    }
    levels.iter().skip(best).step_by(step).copied().collect()
}

/// Tick label text: integers without a decimal point.
pub fn format_tick(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let s = format!("{value:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Colorbar {
    pub bands: Bands,
    /// Tick label style; fixed at 7 pt when built with [`Colorbar::new`]
    pub labels: TextStyle,
    /// Gap between bar and labels in points
    pub label_pad: f32,
}

impl Colorbar {
    pub fn new(bands: Bands) -> Self {
        Self {
            bands,
            labels: TextStyle::new(7.0),
            label_pad: 3.5,
        }
    }

    fn value_to_y(&self, bar: &PixelRect, value: f32) -> f32 {
        let (lo, hi) = match (self.bands.levels.first(), self.bands.levels.last()) {
            (Some(&lo), Some(&hi)) if hi > lo => (lo, hi),
            _ => return bar.bottom(),
        };
        bar.bottom() - (value - lo) / (hi - lo) * bar.height
    }

    pub fn ticks(&self) -> Vec<f32> {
        select_ticks(&self.bands.levels, MAX_TICKS)
    }

    /// Draw the bands inside `bar` and tick labels to its right.
    pub fn draw(&self, pixmap: &mut Pixmap, bar: PixelRect, text: &TextRenderer<'_>) {
        if self.bands.is_empty() {
            return;
        }
        for (k, color) in self.bands.colors.iter().enumerate() {
            let top = self.value_to_y(&bar, self.bands.levels[k + 1]);
            let bottom = self.value_to_y(&bar, self.bands.levels[k]);
            let Some(rect) = Rect::from_ltrb(bar.x, top, bar.right(), bottom) else {
                continue;
            };
            let mut paint = Paint::default();
            paint.set_color(color.to_skia());
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }

        let x = bar.right() + crate::style::points_to_px(self.label_pad, text.dpi());
        for tick in self.ticks() {
            let y = self.value_to_y(&bar, tick);
            text.draw(pixmap, &format_tick(tick), (x, y), Anchor::CENTER_LEFT, &self.labels, None);
        }
    }
}
