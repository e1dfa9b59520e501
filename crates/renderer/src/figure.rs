//! Figure layout, decorations and PNG output.
//!
//! The figure follows the usual plotting layout: the map axes occupy a
//! fixed share of the page, a colorbar (if any) takes room from the right
//! side of that box, titles hang off the map frame and the final image is
//! cropped to its drawn content plus a small margin.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use projection::MapProjection;
use serde::{Deserialize, Serialize};
use tiny_skia::{Color as SkiaColor, Paint, PathBuilder, Pixmap, Stroke, Transform};
use wx_common::BoundingBox;

use crate::canvas::{clip_mask, MapCanvas, RenderContext};
use crate::colorbar::{Colorbar, ColorbarLayout};
use crate::error::{RenderError, RenderResult};
use crate::png::encode_png;
use crate::style::{points_to_px, Color};
use crate::text::{Anchor, FontSet, HAlign, TextRenderer, TextStyle, VAlign};
use crate::viewport::{PixelRect, Viewport};

/// Axes box as fractions of the figure (left, bottom, right, top), y up.
const AXES_BOX: (f32, f32, f32, f32) = (0.125, 0.11, 0.9, 0.88);

/// Gap between a title baseline and the anchor edge, in points.
const TITLE_PAD: f32 = 6.0;

/// Map frame width in points.
const FRAME_WIDTH: f32 = 0.8;

/// Margin kept around drawn content when cropping, in inches.
pub const TIGHT_PAD_INCHES: f32 = 0.1;

fn default_width() -> f32 {
    10.0
}

fn default_height() -> f32 {
    10.0
}

fn default_dpi() -> f32 {
    300.0
}

fn default_background() -> Color {
    Color::WHITE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureSpec {
    /// Page width in inches
    #[serde(default = "default_width")]
    pub width: f32,
    /// Page height in inches
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default = "default_dpi")]
    pub dpi: f32,
    #[serde(default = "default_background")]
    pub background: Color,
}

impl Default for FigureSpec {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            dpi: default_dpi(),
            background: default_background(),
        }
    }
}

impl FigureSpec {
    pub fn size_px(&self) -> (u32, u32) {
        (
            (self.width * self.dpi).round() as u32,
            (self.height * self.dpi).round() as u32,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitlePlacement {
    /// Under the map frame
    #[default]
    Below,
    Above,
}

/// Left and right titles sharing one style.
#[derive(Debug, Clone)]
pub struct Titles {
    pub left: Option<String>,
    pub right: Option<String>,
    pub style: TextStyle,
    pub placement: TitlePlacement,
    /// Drop below the frame as a share of map height (Below only)
    pub offset: f32,
}

impl Default for Titles {
    fn default() -> Self {
        Self {
            left: None,
            right: None,
            style: TextStyle::new(8.0).bold(),
            placement: TitlePlacement::Below,
            offset: 0.09,
        }
    }
}

/// Figure-level text anchored top-right at a figure fraction (y up).
#[derive(Debug, Clone)]
pub struct Suptitle {
    pub text: String,
    pub style: TextStyle,
    pub x: f32,
    pub y: f32,
}

impl Suptitle {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::new(6.0).bold(),
            x: 0.764,
            y: 0.094,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Decorations {
    pub titles: Titles,
    pub suptitle: Option<Suptitle>,
    pub colorbar: Option<Colorbar>,
}

/// Page geometry for one map.
#[derive(Debug, Clone)]
pub struct Figure {
    spec: FigureSpec,
    viewport: Viewport,
    colorbar: Option<PixelRect>,
}

impl Figure {
    pub fn new(
        spec: FigureSpec,
        projection: Arc<dyn MapProjection>,
        extent: BoundingBox,
        with_colorbar: bool,
    ) -> RenderResult<Self> {
        let (w, h) = spec.size_px();
        if w == 0 || h == 0 {
            return Err(RenderError::InvalidSize { width: w, height: h });
        }
        let (left, bottom, right, top) = AXES_BOX;
        let parent = PixelRect::new(
            left * w as f32,
            (1.0 - top) * h as f32,
            (right - left) * w as f32,
            (top - bottom) * h as f32,
        );
        let (viewport, colorbar) = if with_colorbar {
            let (area, bar) = ColorbarLayout::default().split(parent);
            (Viewport::fit_anchored(projection, extent, area, (1.0, 0.5))?, Some(bar))
        } else {
            (Viewport::fit(projection, extent, parent)?, None)
        };
        Ok(Self {
            spec,
            viewport,
            colorbar,
        })
    }

    pub fn spec(&self) -> &FigureSpec {
        &self.spec
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn colorbar_rect(&self) -> Option<PixelRect> {
        self.colorbar
    }

    /// Draw the canvas and decorations, then crop to content.
    pub fn render(&self, canvas: &MapCanvas, decorations: &Decorations, fonts: &FontSet) -> RenderResult<RenderedImage> {
        let started = Instant::now();
        let (w, h) = self.spec.size_px();
        let mut pixmap = Pixmap::new(w, h).ok_or(RenderError::InvalidSize { width: w, height: h })?;
        pixmap.fill(self.spec.background.to_skia());

        let rect = self.viewport.rect();
        let clip = clip_mask(w, h, rect).ok_or(RenderError::InvalidSize { width: w, height: h })?;
        let text = TextRenderer::new(fonts, self.spec.dpi);
        let ctx = RenderContext::new(&self.viewport, text, &clip);

        canvas.render(&mut pixmap, &ctx);
        self.draw_frame(&mut pixmap, &ctx);
        self.draw_titles(&mut pixmap, &text, &decorations.titles);
        if let Some(sup) = &decorations.suptitle {
            let pos = (sup.x * w as f32, (1.0 - sup.y) * h as f32);
            text.draw(&mut pixmap, &sup.text, pos, Anchor::TOP_RIGHT, &sup.style, None);
        }
        if let (Some(colorbar), Some(bar)) = (&decorations.colorbar, self.colorbar) {
            colorbar.draw(&mut pixmap, bar, &text);
        }

        let image = RenderedImage::from_pixmap(&pixmap, self.spec.dpi)
            .crop_to_content(self.spec.background, TIGHT_PAD_INCHES);
        tracing::info!(
            layers = canvas.len(),
            width = image.width,
            height = image.height,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered figure"
        );
        Ok(image)
    }

    fn draw_frame(&self, pixmap: &mut Pixmap, ctx: &RenderContext<'_>) {
        let Some(rect) = self.viewport.rect().to_skia() else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let mut paint = Paint {
            anti_alias: true,
            ..Paint::default()
        };
        paint.set_color(SkiaColor::BLACK);
        let stroke = Stroke {
            width: ctx.px(FRAME_WIDTH),
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn draw_titles(&self, pixmap: &mut Pixmap, text: &TextRenderer<'_>, titles: &Titles) {
        let map = self.viewport.rect();
        let pad = points_to_px(TITLE_PAD, self.spec.dpi);
        let baseline = match titles.placement {
            TitlePlacement::Below => map.bottom() + titles.offset * map.height - pad,
            TitlePlacement::Above => map.y - pad,
        };
        if let Some(left) = &titles.left {
            let anchor = Anchor::new(HAlign::Left, VAlign::Bottom);
            text.draw(pixmap, left, (map.x, baseline), anchor, &titles.style, None);
        }
        if let Some(right) = &titles.right {
            let anchor = Anchor::new(HAlign::Right, VAlign::Bottom);
            text.draw(pixmap, right, (map.right(), baseline), anchor, &titles.style, None);
        }
    }
}

/// Straight-alpha RGBA image ready for encoding.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub width: usize,
    pub height: usize,
    pub dpi: f32,
    pub rgba: Vec<u8>,
}

impl RenderedImage {
    pub fn from_pixmap(pixmap: &Pixmap, dpi: f32) -> Self {
        let rgba = pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        Self {
            width: pixmap.width() as usize,
            height: pixmap.height() as usize,
            dpi,
            rgba,
        }
    }

    /// Bounds (x0, y0, x1, y1), exclusive, of pixels differing from
    /// `background`.
    pub fn content_bounds(&self, background: Color) -> Option<(usize, usize, usize, usize)> {
        let bg = [background.r, background.g, background.b, background.a];
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for y in 0..self.height {
            let row = &self.rgba[y * self.width * 4..(y + 1) * self.width * 4];
            let mut cols = row.chunks_exact(4).enumerate().filter(|(_, px)| *px != bg).map(|(x, _)| x);
            let Some(first) = cols.next() else {
                continue;
            };
            let last = cols.last().unwrap_or(first);
            bounds = Some(match bounds {
                None => (first, y, last + 1, y + 1),
                Some((x0, y0, x1, _)) => (x0.min(first), y0, x1.max(last + 1), y + 1),
            });
        }
        bounds
    }

    /// Crop to drawn content plus `pad_inches`, clamped to the image.
    pub fn crop_to_content(self, background: Color, pad_inches: f32) -> Self {
        let Some((x0, y0, x1, y1)) = self.content_bounds(background) else {
            return self;
        };
        let pad = (pad_inches * self.dpi).round() as usize;
        let (x0, y0) = (x0.saturating_sub(pad), y0.saturating_sub(pad));
        let (x1, y1) = ((x1 + pad).min(self.width), (y1 + pad).min(self.height));
        let width = x1 - x0;
        let mut rgba = Vec::with_capacity(width * (y1 - y0) * 4);
        for y in y0..y1 {
            let start = (y * self.width + x0) * 4;
            rgba.extend_from_slice(&self.rgba[start..start + width * 4]);
        }
        Self {
            width,
            height: y1 - y0,
            dpi: self.dpi,
            rgba,
        }
    }

    pub fn encode(&self) -> RenderResult<Vec<u8>> {
        encode_png(&self.rgba, self.width, self.height, self.dpi)
    }

    /// Write a PNG, creating parent directories and replacing any existing
    /// file.
    pub fn save(&self, path: &Path) -> RenderResult<()> {
        let bytes = self.encode()?;
        let io_err = |source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, &bytes).map_err(io_err)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Wrote PNG");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::{LambertConformal, LambertParams};

    fn figure(with_colorbar: bool) -> Figure {
        let proj = LambertConformal::new(LambertParams {
            central_longitude: -98.0,
            central_latitude: 35.0,
            standard_parallels: [30.0, 60.0],
        })
        .unwrap();
        let spec = FigureSpec {
            dpi: 30.0,
            ..FigureSpec::default()
        };
        Figure::new(spec, Arc::new(proj), BoundingBox::new(-104.1, 32.1, -95.5, 39.1), with_colorbar).unwrap()
    }

    #[test]
    fn test_map_inside_axes_box() {
        let fig = figure(false);
        assert_eq!(fig.spec().size_px(), (300, 300));
        let r = fig.viewport().rect();
        assert!(r.x >= 37.5 - 1e-3 && r.right() <= 270.0 + 1e-3);
        assert!(r.y >= 36.0 - 1e-3 && r.bottom() <= 267.0 + 1e-3);
        assert!(fig.colorbar_rect().is_none());
    }

    #[test]
    fn test_colorbar_right_of_map() {
        let fig = figure(true);
        let bar = fig.colorbar_rect().unwrap();
        let map = fig.viewport().rect();
        assert!(bar.x > map.right());
        assert!(bar.right() <= 270.0);
    }

    #[test]
    fn test_render_crops_to_content() {
        let fig = figure(false);
        let decorations = Decorations {
            titles: Titles {
                left: Some("500MB WINDS".to_string()),
                right: Some("03/05/2024 14:07Z".to_string()),
                ..Titles::default()
            },
            ..Decorations::default()
        };
        let image = fig.render(&MapCanvas::new(), &decorations, &FontSet::builtin()).unwrap();
        let map = fig.viewport().rect();
        assert!(image.width < 300 && image.height < 300);
        // frame plus 0.1 in padding on each side
        assert!(image.width as f32 >= map.width + 2.0 * 3.0 - 2.0);
        assert_eq!(image.rgba.len(), image.width * image.height * 4);
    }

    #[test]
    fn test_blank_image_not_cropped() {
        let image = RenderedImage {
            width: 4,
            height: 3,
            dpi: 10.0,
            rgba: vec![255; 48],
        };
        assert!(image.content_bounds(Color::WHITE).is_none());
        let cropped = image.crop_to_content(Color::WHITE, 0.1);
        assert_eq!((cropped.width, cropped.height), (4, 3));
    }

    #[test]
    fn test_crop_pads_and_clamps() {
        let mut rgba = vec![255u8; 10 * 10 * 4];
        let idx = (5 * 10 + 5) * 4;
        rgba[idx..idx + 4].copy_from_slice(&[0, 0, 0, 255]);
        let image = RenderedImage {
            width: 10,
            height: 10,
            dpi: 20.0,
            rgba,
        };
        assert_eq!(image.content_bounds(Color::WHITE), Some((5, 5, 6, 6)));
        let cropped = image.crop_to_content(Color::WHITE, 0.1);
        // 2 px of padding each side
        assert_eq!((cropped.width, cropped.height), (5, 5));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images/out.png");
        let image = RenderedImage {
            width: 2,
            height: 2,
            dpi: 300.0,
            rgba: vec![0, 0, 0, 255, 255, 255, 255, 255, 0, 0, 0, 255, 255, 255, 255, 255],
        };
        image.save(&path).unwrap();
        image.save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
