//! Text drawing for titles, contour labels and colorbar ticks.
//!
//! TrueType fonts are rasterized with rusttype through imageproc into a
//! transparent RGBA buffer and composited onto the map. Without a usable
//! font file the built-in stroke font in [`crate::glyphs`] is drawn instead.

use std::fmt;
use std::path::Path;

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{point, Font, Scale};
use serde::{Deserialize, Serialize};
use tiny_skia::{
    IntSize, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::glyphs;
use crate::style::{points_to_px, Color};
use crate::viewport::PixelRect;

/// Regular and bold faces. Either may be missing.
#[derive(Default)]
pub struct FontSet {
    regular: Option<Font<'static>>,
    bold: Option<Font<'static>>,
}

impl fmt::Debug for FontSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSet")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

impl FontSet {
    /// Stroke font only.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load TrueType faces. A face that cannot be read or parsed is logged
    /// and left out.
    pub fn load(regular: Option<&Path>, bold: Option<&Path>) -> Self {
        Self {
            regular: regular.and_then(load_font),
            bold: bold.and_then(load_font),
        }
    }

    pub fn has_truetype(&self) -> bool {
        self.regular.is_some() || self.bold.is_some()
    }

    /// Face for the requested weight, and whether bold must be emulated.
    fn face(&self, bold: bool) -> Option<(&Font<'static>, bool)> {
        if bold {
            match (&self.bold, &self.regular) {
                (Some(b), _) => Some((b, false)),
                (None, Some(r)) => Some((r, true)),
                (None, None) => None,
            }
        } else {
            self.regular.as_ref().or(self.bold.as_ref()).map(|f| (f, false))
        }
    }
}

fn load_font(path: &Path) -> Option<Font<'static>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Font file unreadable, using stroke font");
            return None;
        }
    };
    let font = Font::try_from_vec(bytes);
    if font.is_none() {
        tracing::warn!(path = %path.display(), "Font file is not a TrueType font, using stroke font");
    }
    font
}

/// Outline drawn around glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Halo {
    pub color: Color,
    /// Total halo stroke width in points, centred on the glyph edge
    pub width: f32,
}

fn default_text_color() -> Color {
    Color::BLACK
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in points
    pub size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default = "default_text_color")]
    pub color: Color,
    #[serde(default)]
    pub halo: Option<Halo>,
}

impl TextStyle {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            bold: false,
            color: Color::BLACK,
            halo: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_halo(mut self, color: Color, width: f32) -> Self {
        self.halo = Some(Halo { color, width });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// Which point of the text box an (x, y) position refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub h: HAlign,
    pub v: VAlign,
}

impl Anchor {
    pub const CENTER: Anchor = Anchor::new(HAlign::Center, VAlign::Center);
    pub const TOP_CENTER: Anchor = Anchor::new(HAlign::Center, VAlign::Top);
    pub const TOP_RIGHT: Anchor = Anchor::new(HAlign::Right, VAlign::Top);
    pub const CENTER_LEFT: Anchor = Anchor::new(HAlign::Left, VAlign::Center);
    pub const BOTTOM_LEFT: Anchor = Anchor::new(HAlign::Left, VAlign::Bottom);

    pub const fn new(h: HAlign, v: VAlign) -> Self {
        Self { h, v }
    }
}

/// Draws text at a fixed figure DPI.
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer<'a> {
    fonts: &'a FontSet,
    dpi: f32,
}

impl<'a> TextRenderer<'a> {
    pub fn new(fonts: &'a FontSet, dpi: f32) -> Self {
        Self { fonts, dpi }
    }

    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Width and height of the text box in pixels.
    pub fn measure(&self, text: &str, style: &TextStyle) -> (f32, f32) {
        let size_px = points_to_px(style.size, self.dpi);
        match self.fonts.face(style.bold) {
            Some((font, _)) => {
                let scale = Scale::uniform(size_px);
                let vm = font.v_metrics(scale);
                (line_width(font, scale, text), vm.ascent - vm.descent)
            }
            None => (glyphs::text_width(text, size_px), glyphs::CAP_HEIGHT * size_px),
        }
    }

    /// Box the text would occupy when drawn at (x, y) with `anchor`.
    pub fn bounds(&self, text: &str, x: f32, y: f32, anchor: Anchor, style: &TextStyle) -> PixelRect {
        let (w, h) = self.measure(text, style);
        let left = match anchor.h {
            HAlign::Left => x,
            HAlign::Center => x - w / 2.0,
            HAlign::Right => x - w,
        };
        let top = match anchor.v {
            VAlign::Top => y,
            VAlign::Center => y - h / 2.0,
            VAlign::Bottom => y - h,
        };
        PixelRect::new(left, top, w, h)
    }

    /// Draw `text` and return the box it occupies (halo excluded).
    pub fn draw(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        (x, y): (f32, f32),
        anchor: Anchor,
        style: &TextStyle,
        mask: Option<&Mask>,
    ) -> PixelRect {
        let rect = self.bounds(text, x, y, anchor, style);
        if text.trim().is_empty() || style.color.is_none() {
            return rect;
        }
        match self.fonts.face(style.bold) {
            Some((font, faux_bold)) => self.draw_truetype(pixmap, text, rect, style, font, faux_bold, mask),
            None => self.draw_strokes(pixmap, text, rect, style, mask),
        }
        rect
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_truetype(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        rect: PixelRect,
        style: &TextStyle,
        font: &Font<'static>,
        faux_bold: bool,
        mask: Option<&Mask>,
    ) {
        let size_px = points_to_px(style.size, self.dpi);
        let scale = Scale::uniform(size_px);
        let halo_radius = style
            .halo
            .map(|h| points_to_px(h.width, self.dpi) / 2.0)
            .unwrap_or(0.0);
        let pad = halo_radius.ceil() as i32 + 2;
        let img_w = rect.width.ceil() as u32 + 2 * pad as u32 + 2;
        let img_h = rect.height.ceil() as u32 + 2 * pad as u32;
        let mut img = RgbaImage::new(img_w, img_h);

        if let Some(halo) = style.halo.filter(|h| !h.color.is_none() && h.width > 0.0) {
            let color = Rgba(halo.color.premultiplied());
            for radius in [halo_radius * 0.5, halo_radius] {
                for k in 0..16 {
                    let theta = k as f32 * std::f32::consts::PI / 8.0;
                    let dx = (radius * theta.cos()).round() as i32;
                    let dy = (radius * theta.sin()).round() as i32;
                    draw_text_mut(&mut img, color, pad + dx, pad + dy, scale, font, text);
                }
            }
        }

        let color = Rgba(style.color.premultiplied());
        draw_text_mut(&mut img, color, pad, pad, scale, font, text);
        if faux_bold {
            let offset = (size_px / 30.0).round().max(1.0) as i32;
            draw_text_mut(&mut img, color, pad + offset, pad, scale, font, text);
        }

        let Some(size) = IntSize::from_wh(img_w, img_h) else {
            return;
        };
        let Some(glyphs) = Pixmap::from_vec(img.into_raw(), size) else {
            return;
        };
        pixmap.draw_pixmap(
            rect.x.round() as i32 - pad,
            rect.y.round() as i32 - pad,
            glyphs.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            mask,
        );
    }

    fn draw_strokes(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        rect: PixelRect,
        style: &TextStyle,
        mask: Option<&Mask>,
    ) {
        let size_px = points_to_px(style.size, self.dpi);
        let mut pb = PathBuilder::new();
        for line in glyphs::layout(text, rect.x, rect.y, size_px) {
            let mut points = line.into_iter();
            if let Some((x0, y0)) = points.next() {
                pb.move_to(x0, y0);
                for (x, y) in points {
                    pb.line_to(x, y);
                }
            }
        }
        let Some(path) = pb.finish() else {
            return;
        };

        let weight = if style.bold { 0.13 } else { 0.09 };
        let glyph_width = (size_px * weight).max(1.0);
        let mut stroke = Stroke {
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        let mut paint = Paint {
            anti_alias: true,
            ..Paint::default()
        };

        if let Some(halo) = style.halo.filter(|h| !h.color.is_none() && h.width > 0.0) {
            stroke.width = glyph_width + points_to_px(halo.width, self.dpi);
            paint.set_color(halo.color.to_skia());
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), mask);
        }
        stroke.width = glyph_width;
        paint.set_color(style.color.to_skia());
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), mask);
    }
}

fn line_width(font: &Font<'static>, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Format a level the way `%i` would: truncate toward zero.
pub fn format_integer(value: f32) -> String {
    format!("{}", value.trunc() as i64)
}
