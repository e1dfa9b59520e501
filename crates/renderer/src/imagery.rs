//! Satellite imagery resampled onto the map.
//!
//! Every map pixel is taken back to lon/lat and looked up in the source
//! image by nearest scan-angle pixel. Pixels outside the satellite view or
//! holding NaN stay transparent.

use std::sync::Arc;

use projection::Geostationary;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tiny_skia::{IntSize, Pixmap, PixmapPaint, Transform};

use crate::canvas::RenderContext;
use crate::colormap::Colormap;

fn default_colormap() -> Colormap {
    Colormap::GreysR
}

fn default_alpha() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagerySpec {
    #[serde(default = "default_colormap")]
    pub colormap: Colormap,
    /// Normalization bounds; the finite data range when unset
    #[serde(default)]
    pub vmin: Option<f32>,
    #[serde(default)]
    pub vmax: Option<f32>,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

impl Default for ImagerySpec {
    fn default() -> Self {
        Self {
            colormap: default_colormap(),
            vmin: None,
            vmax: None,
            alpha: 1.0,
        }
    }
}

/// One band of a geostationary image, row-major `nx * ny` values.
#[derive(Debug, Clone)]
pub struct SatelliteImage {
    pub projection: Geostationary,
    pub values: Vec<f32>,
}

impl SatelliteImage {
    pub fn new(projection: Geostationary, values: Vec<f32>) -> Self {
        Self { projection, values }
    }

    pub fn value_at(&self, lon: f64, lat: f64) -> Option<f32> {
        let (i, j) = self.projection.nearest_pixel(lon, lat)?;
        let v = *self.values.get(j * self.projection.nx + i)?;
        (!v.is_nan()).then_some(v)
    }

    pub fn finite_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[derive(Debug, Clone)]
pub struct SatelliteImagery {
    pub image: Arc<SatelliteImage>,
    pub spec: ImagerySpec,
}

impl SatelliteImagery {
    pub fn new(image: Arc<SatelliteImage>, spec: ImagerySpec) -> Self {
        Self { image, spec }
    }

    fn normalization(&self) -> Option<(f32, f32)> {
        let range = self.image.finite_range();
        let vmin = self.spec.vmin.or(range.map(|r| r.0))?;
        let vmax = self.spec.vmax.or(range.map(|r| r.1))?;
        Some((vmin, vmax))
    }

    pub fn draw(&self, pixmap: &mut Pixmap, ctx: &RenderContext<'_>) {
        let Some((vmin, vmax)) = self.normalization() else {
            tracing::debug!("Satellite image has no finite values, skipping");
            return;
        };
        let (w, h) = (pixmap.width() as usize, pixmap.height() as usize);
        let rect = ctx.viewport.rect();
        let y0 = rect.y.floor().max(0.0) as usize;
        let y1 = (rect.bottom().ceil() as usize).min(h);
        let x0 = rect.x.floor().max(0.0) as usize;
        let x1 = (rect.right().ceil() as usize).min(w);

        let mut data = vec![0u8; w * h * 4];
        data.par_chunks_mut(w * 4)
            .enumerate()
            .filter(|(y, _)| (y0..y1).contains(y))
            .for_each(|(y, row)| {
                for x in x0..x1 {
                    let Some((lon, lat)) = ctx.viewport.pixel_to_geo(x as f32 + 0.5, y as f32 + 0.5) else {
                        continue;
                    };
                    let Some(v) = self.image.value_at(lon, lat) else {
                        continue;
                    };
                    let color = self
                        .spec
                        .colormap
                        .sample_value(v, vmin, vmax)
                        .with_alpha(self.spec.alpha);
                    row[x * 4..x * 4 + 4].copy_from_slice(&color.premultiplied());
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
