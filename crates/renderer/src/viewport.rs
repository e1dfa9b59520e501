//! Mapping between geographic, projected and pixel coordinates.

use std::sync::Arc;

use projection::MapProjection;
use wx_common::BoundingBox;

use crate::error::{RenderError, RenderResult};

/// Axis-aligned rectangle in device pixels (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Rectangle grown by `margin` on every side.
    pub fn inflate(&self, margin: f32) -> PixelRect {
        PixelRect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    pub fn to_skia(&self) -> Option<tiny_skia::Rect> {
        tiny_skia::Rect::from_xywh(self.x, self.y, self.width, self.height)
    }
}

/// A projected map extent placed onto a pixel rectangle.
///
/// The scale is isotropic: `rect` holds the projected bounds exactly with
/// equal metres per pixel on both axes.
#[derive(Clone)]
pub struct Viewport {
    projection: Arc<dyn MapProjection>,
    extent: BoundingBox,
    bounds: BoundingBox,
    rect: PixelRect,
    scale: f64,
}

impl std::fmt::Debug for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewport")
            .field("extent", &self.extent)
            .field("bounds", &self.bounds)
            .field("rect", &self.rect)
            .finish()
    }
}

impl Viewport {
    /// Projected bounds of the geographic `extent` under `projection`.
    pub fn projected_extent(
        projection: &dyn MapProjection,
        extent: &BoundingBox,
    ) -> RenderResult<BoundingBox> {
        let bounds = projection
            .projected_bounds(extent)
            .ok_or_else(|| RenderError::Projection(format!("{extent:?}")))?;
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(RenderError::Projection(format!(
                "degenerate projected bounds {bounds:?}"
            )));
        }
        Ok(bounds)
    }

    /// Fit the projected extent into `area`, centred, preserving aspect.
    pub fn fit(
        projection: Arc<dyn MapProjection>,
        extent: BoundingBox,
        area: PixelRect,
    ) -> RenderResult<Self> {
        Self::fit_anchored(projection, extent, area, (0.5, 0.5))
    }

    /// Fit preserving aspect, placing leftover room according to `anchor`
    /// ((0, 0) top-left, (1, 0.5) right-centre).
    pub fn fit_anchored(
        projection: Arc<dyn MapProjection>,
        extent: BoundingBox,
        area: PixelRect,
        anchor: (f32, f32),
    ) -> RenderResult<Self> {
        let bounds = Self::projected_extent(projection.as_ref(), &extent)?;
        let scale = (area.width as f64 / bounds.width()).min(area.height as f64 / bounds.height());
        let width = (bounds.width() * scale) as f32;
        let height = (bounds.height() * scale) as f32;
        let rect = PixelRect::new(
            area.x + (area.width - width) * anchor.0,
            area.y + (area.height - height) * anchor.1,
            width,
            height,
        );
        Ok(Self {
            projection,
            extent,
            bounds,
            rect,
            scale,
        })
    }

    pub fn projection(&self) -> &dyn MapProjection {
        self.projection.as_ref()
    }

    /// Geographic extent requested for the map.
    pub fn extent(&self) -> &BoundingBox {
        &self.extent
    }

    /// Projected bounds in metres.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Pixel rectangle the map occupies.
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Pixels per projected metre.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn projected_to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let px = self.rect.x as f64 + (x - self.bounds.min_x) * self.scale;
        let py = self.rect.y as f64 + (self.bounds.max_y - y) * self.scale;
        (px as f32, py as f32)
    }

    pub fn pixel_to_projected(&self, px: f32, py: f32) -> (f64, f64) {
        let x = self.bounds.min_x + (px - self.rect.x) as f64 / self.scale;
        let y = self.bounds.max_y - (py - self.rect.y) as f64 / self.scale;
        (x, y)
    }

    pub fn geo_to_pixel(&self, lon: f64, lat: f64) -> Option<(f32, f32)> {
        self.projection
            .forward(lon, lat)
            .map(|(x, y)| self.projected_to_pixel(x, y))
    }

    pub fn pixel_to_geo(&self, px: f32, py: f32) -> Option<(f64, f64)> {
        let (x, y) = self.pixel_to_projected(px, py);
        self.projection.inverse(x, y)
    }

    /// Rotate an earth-relative vector at (lon, lat) into screen
    /// components (x right, y down).
    pub fn vector_to_screen(&self, lon: f64, lat: f64, u: f64, v: f64) -> (f64, f64) {
        let (mx, my) = self.projection.rotate_to_map(lon, lat, u, v);
        (mx, -my)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::{LambertConformal, LambertParams};

    fn viewport() -> Viewport {
        let proj = LambertConformal::new(LambertParams {
            central_longitude: -101.0,
            central_latitude: 35.0,
            standard_parallels: [30.0, 60.0],
        })
        .unwrap();
        Viewport::fit(
            Arc::new(proj),
            BoundingBox::new(-125.0, 25.0, -89.0, 50.0),
            PixelRect::new(100.0, 100.0, 2000.0, 2000.0),
        )
        .unwrap()
    }

    #[test]
    fn test_fit_preserves_aspect() {
        let vp = viewport();
        let r = vp.rect();
        let aspect_px = r.width / r.height;
        let aspect_m = (vp.bounds().width() / vp.bounds().height()) as f32;
        assert!((aspect_px - aspect_m).abs() < 1e-3);
        assert!(r.width <= 2000.0 + 1e-3 && r.height <= 2000.0 + 1e-3);
        assert!((r.width - 2000.0).abs() < 1e-3 || (r.height - 2000.0).abs() < 1e-3);
    }

    #[test]
    fn test_pixel_roundtrip() {
        let vp = viewport();
        let (px, py) = vp.geo_to_pixel(-100.0, 40.0).unwrap();
        assert!(vp.rect().contains(px, py));
        let (lon, lat) = vp.pixel_to_geo(px, py).unwrap();
        assert!((lon + 100.0).abs() < 1e-3);
        assert!((lat - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_north_is_up_at_central_meridian() {
        let vp = viewport();
        let (_, north) = vp.geo_to_pixel(-101.0, 45.0).unwrap();
        let (_, south) = vp.geo_to_pixel(-101.0, 30.0).unwrap();
        assert!(north < south);
        let (sx, sy) = vp.vector_to_screen(-101.0, 40.0, 0.0, 10.0);
        assert!(sx.abs() < 1e-9);
        assert!((sy + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_anchored_fit_hugs_right_edge() {
        let proj = LambertConformal::new(LambertParams {
            central_longitude: -98.0,
            central_latitude: 35.0,
            standard_parallels: [30.0, 60.0],
        })
        .unwrap();
        let area = PixelRect::new(0.0, 0.0, 3000.0, 1000.0);
        let vp = Viewport::fit_anchored(
            Arc::new(proj),
            BoundingBox::new(-104.1, 32.1, -95.5, 39.1),
            area,
            (1.0, 0.5),
        )
        .unwrap();
        assert!((vp.rect().right() - 3000.0).abs() < 1e-2);
        assert!((vp.rect().height - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn test_rect_helpers() {
        let a = PixelRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PixelRect::new(5.0, 5.0, 10.0, 10.0);
        let c = PixelRect::new(20.0, 20.0, 1.0, 1.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.inflate(1.0), PixelRect::new(-1.0, -1.0, 12.0, 12.0));
    }
}
