//! Filled contour bands.
//!
//! `n + 1` levels bound `n` bands. A pixel takes the colour of the band its
//! value falls in; values below the first or above the last level are left
//! unfilled.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tiny_skia::{IntSize, Pixmap, PixmapPaint, Transform};
use wx_common::GriddedField;

use crate::canvas::RenderContext;
use crate::colormap::Colormap;
use crate::levels::Levels;
use crate::raster::{ScalarRaster, ScreenGrid};
use crate::style::Color;

fn default_alpha() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillSpec {
    #[serde(default)]
    pub levels: Levels,
    pub colormap: Colormap,
    /// Colormap normalization; defaults to the first and last level
    #[serde(default)]
    pub vmin: Option<f32>,
    #[serde(default)]
    pub vmax: Option<f32>,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

impl FillSpec {
    pub fn bands(&self, data_range: Option<(f32, f32)>) -> Bands {
        let levels = self.levels.band_levels(data_range);
        if levels.len() < 2 {
            return Bands {
                levels,
                colors: Vec::new(),
            };
        }
        let vmin = self.vmin.unwrap_or(levels[0]);
        let vmax = self.vmax.unwrap_or(levels[levels.len() - 1]);
        let colors = levels
            .windows(2)
            .map(|w| {
                self.colormap
                    .sample_value((w[0] + w[1]) / 2.0, vmin, vmax)
                    .with_alpha(self.alpha)
            })
            .collect();
        Bands { levels, colors }
    }
}

/// Resolved band boundaries and their colours.
#[derive(Debug, Clone, PartialEq)]
pub struct Bands {
    pub levels: Vec<f32>,
    /// One colour per band, `levels.len() - 1` entries
    pub colors: Vec<Color>,
}

impl Bands {
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Band containing `value`. Bands are `(z1, z2]`; the lowest band also
    /// includes its lower level.
    pub fn index(&self, value: f32) -> Option<usize> {
        let (first, last) = (*self.levels.first()?, *self.levels.last()?);
        if self.colors.is_empty() || !(value >= first && value <= last) {
            return None;
        }
        let below = self.levels.partition_point(|&l| l < value);
        Some(below.saturating_sub(1).min(self.colors.len() - 1))
    }

    pub fn color_for(&self, value: f32) -> Option<Color> {
        self.index(value).map(|i| self.colors[i])
    }
}

/// A field drawn as filled bands.
#[derive(Debug, Clone)]
pub struct FilledContours {
    pub field: Arc<GriddedField>,
    pub spec: FillSpec,
}

impl FilledContours {
    pub fn new(field: Arc<GriddedField>, spec: FillSpec) -> Self {
        Self { field, spec }
    }

    pub fn bands(&self) -> Bands {
        self.spec.bands(self.field.finite_range())
    }

    pub fn draw(&self, pixmap: &mut Pixmap, ctx: &RenderContext<'_>) {
        let bands = self.bands();
        if bands.is_empty() {
            tracing::debug!(field = %self.field.name, "No fill bands, skipping");
            return;
        }
        let (w, h) = (pixmap.width() as usize, pixmap.height() as usize);
        let screen = ScreenGrid::project(&self.field.grid, ctx.viewport);
        let raster = ScalarRaster::rasterize(&screen, &self.field.values, w, h);
        let colors: Vec<[u8; 4]> = bands.colors.iter().map(|c| c.premultiplied()).collect();

        let mut data = vec![0u8; w * h * 4];
        data.par_chunks_mut(w * 4)
            .zip(raster.values.par_chunks(w))
            .for_each(|(row, values)| {
                for (px, &v) in row.chunks_exact_mut(4).zip(values) {
                    if let Some(i) = bands.index(v) {
                        px.copy_from_slice(&colors[i]);
                    }
                }
            });

        let Some(layer) = IntSize::from_wh(w as u32, h as u32).and_then(|size| Pixmap::from_vec(data, size)) else {
            return;
        };
        pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            Some(ctx.clip),
        );
    }
}
