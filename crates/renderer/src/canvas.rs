//! Z-ordered map layers.
//!
//! Layers are kept sorted by z-order; layers sharing a z-order draw in the
//! order they were added.

use std::sync::Arc;

use tiny_skia::{FillRule, Mask, PathBuilder, Pixmap, Transform};

use crate::barbs::WindBarbs;
use crate::contour::LineContours;
use crate::features::{draw_features, Feature};
use crate::fill::FilledContours;
use crate::hatch::HatchedArea;
use crate::imagery::SatelliteImagery;
use crate::style::{points_to_px, PolygonStyle};
use crate::text::{Anchor, TextRenderer, TextStyle};
use crate::viewport::{PixelRect, Viewport};

/// Stacking order of map layers. Higher draws on top.
pub struct ZOrder;

impl ZOrder {
    pub const OCEAN: i32 = 0;
    pub const LAND: i32 = 10;
    pub const LAKES: i32 = 20;
    pub const IMAGERY: i32 = 25;
    pub const FIELD_FILL: i32 = 30;
    pub const FIELD_CONTOUR: i32 = 35;
    pub const BORDERS: i32 = 40;
    pub const COUNTIES: i32 = 50;
    pub const FORECAST_AREA: i32 = 60;
    pub const STATES: i32 = 70;
    pub const HIGHLIGHT_HATCH: i32 = 80;
    pub const CONFIDENCE: i32 = 90;
    pub const CONFIDENCE_LABEL: i32 = 95;
    pub const ISOPLETHS: i32 = 100;
    pub const BARBS: i32 = 103;
    pub const LABELS: i32 = 110;
}

/// Text placed at a geographic position. Not clipped to the map frame.
#[derive(Debug, Clone)]
pub struct MapLabel {
    pub text: String,
    pub lon: f64,
    pub lat: f64,
    pub style: TextStyle,
    pub anchor: Anchor,
}

#[derive(Debug, Clone)]
pub enum LayerContent {
    Features {
        features: Arc<Vec<Feature>>,
        style: PolygonStyle,
    },
    Fill(FilledContours),
    Contours(LineContours),
    Barbs(WindBarbs),
    Imagery(SatelliteImagery),
    Hatch(HatchedArea),
    Text(MapLabel),
}

impl LayerContent {
    fn kind(&self) -> &'static str {
        match self {
            LayerContent::Features { .. } => "features",
            LayerContent::Fill(_) => "fill",
            LayerContent::Contours(_) => "contours",
            LayerContent::Barbs(_) => "barbs",
            LayerContent::Imagery(_) => "imagery",
            LayerContent::Hatch(_) => "hatch",
            LayerContent::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub z: i32,
    seq: usize,
    pub content: LayerContent,
}

/// Everything drawing needs besides the pixmap.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub viewport: &'a Viewport,
    pub text: TextRenderer<'a>,
    /// Coverage of the map frame
    pub clip: &'a Mask,
}

impl<'a> RenderContext<'a> {
    pub fn new(viewport: &'a Viewport, text: TextRenderer<'a>, clip: &'a Mask) -> Self {
        Self { viewport, text, clip }
    }

    pub fn dpi(&self) -> f32 {
        self.text.dpi()
    }

    /// Points to pixels at the figure DPI.
    #[inline]
    pub fn px(&self, points: f32) -> f32 {
        points_to_px(points, self.text.dpi())
    }
}

/// Mask covering `rect` on a `width` x `height` figure.
pub fn clip_mask(width: u32, height: u32, rect: PixelRect) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    let path = PathBuilder::from_rect(rect.to_skia()?);
    mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
    Some(mask)
}

#[derive(Debug, Clone, Default)]
pub struct MapCanvas {
    layers: Vec<Layer>,
    next_seq: usize,
}

impl MapCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, z: i32, content: LayerContent) {
        let layer = Layer {
            name: name.into(),
            z,
            seq: self.next_seq,
            content,
        };
        self.next_seq += 1;
        let at = self.layers.partition_point(|l| (l.z, l.seq) <= (layer.z, layer.seq));
        self.layers.insert(at, layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in draw order.
    pub fn ordered(&self) -> &[Layer] {
        &self.layers
    }

    pub fn z_orders(&self) -> Vec<i32> {
        self.layers.iter().map(|l| l.z).collect()
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn render(&self, pixmap: &mut Pixmap, ctx: &RenderContext<'_>) {
        for layer in &self.layers {
            tracing::debug!(layer = %layer.name, z = layer.z, kind = layer.content.kind(), "Drawing layer");
            match &layer.content {
                LayerContent::Features { features, style } => draw_features(pixmap, ctx, features, style),
                LayerContent::Fill(fill) => fill.draw(pixmap, ctx),
                LayerContent::Contours(contours) => contours.draw(pixmap, ctx),
                LayerContent::Barbs(barbs) => barbs.draw(pixmap, ctx),
                LayerContent::Imagery(imagery) => imagery.draw(pixmap, ctx),
                LayerContent::Hatch(hatch) => hatch.draw(pixmap, ctx),
                LayerContent::Text(label) => {
                    if let Some(pos) = ctx.viewport.geo_to_pixel(label.lon, label.lat) {
                        ctx.text.draw(pixmap, &label.text, pos, label.anchor, &label.style, None);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> LayerContent {
        LayerContent::Text(MapLabel {
            text: text.to_string(),
            lon: -100.0,
            lat: 35.0,
            style: TextStyle::new(7.0),
            anchor: Anchor::BOTTOM_LEFT,
        })
    }

    #[test]
    fn test_layers_sorted_by_z_then_insertion() {
        let mut canvas = MapCanvas::new();
        canvas.add("states", ZOrder::STATES, label("a"));
        canvas.add("ocean", ZOrder::OCEAN, label("b"));
        canvas.add("low", ZOrder::CONFIDENCE, label("c"));
        canvas.add("med", ZOrder::CONFIDENCE, label("d"));
        canvas.add("land", ZOrder::LAND, label("e"));

        assert_eq!(canvas.layer_names(), vec!["ocean", "land", "states", "low", "med"]);
        let z = canvas.z_orders();
        assert!(z.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(canvas.len(), 5);
    }

    #[test]
    fn test_clip_mask_covers_rect() {
        let mask = clip_mask(20, 20, PixelRect::new(5.0, 5.0, 10.0, 10.0)).unwrap();
        let data = mask.data();
        assert_eq!(data[10 * 20 + 10], 255);
        assert_eq!(data[2 * 20 + 2], 0);
        assert_eq!(data[10 * 20 + 16], 0);
    }

    #[test]
    fn test_z_order_constants_ascend() {
        let all = [
            ZOrder::OCEAN,
            ZOrder::LAND,
            ZOrder::LAKES,
            ZOrder::IMAGERY,
            ZOrder::FIELD_FILL,
            ZOrder::FIELD_CONTOUR,
            ZOrder::BORDERS,
            ZOrder::COUNTIES,
            ZOrder::FORECAST_AREA,
            ZOrder::STATES,
            ZOrder::HIGHLIGHT_HATCH,
            ZOrder::CONFIDENCE,
            ZOrder::CONFIDENCE_LABEL,
            ZOrder::ISOPLETHS,
            ZOrder::BARBS,
            ZOrder::LABELS,
        ];
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }
}
