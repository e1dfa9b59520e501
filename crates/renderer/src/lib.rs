//! Map rendering for weather products.
//!
//! A [`MapCanvas`] holds z-ordered layers (vector features, filled and line
//! contours, wind barbs, satellite imagery, hatching, labels). A [`Figure`]
//! lays the projected map out on a page, draws the canvas, adds titles and a
//! colorbar, and produces a cropped PNG.

pub mod barbs;
pub mod canvas;
pub mod colorbar;
pub mod colormap;
pub mod contour;
pub mod error;
pub mod features;
pub mod figure;
pub mod fill;
pub mod glyphs;
pub mod hatch;
pub mod imagery;
pub mod levels;
pub mod png;
pub mod raster;
pub mod style;
pub mod text;
pub mod viewport;

pub use barbs::{BarbSpec, Pivot, WindBarbs};
pub use canvas::{Layer, LayerContent, MapCanvas, MapLabel, RenderContext, ZOrder};
pub use colorbar::Colorbar;
pub use colormap::Colormap;
pub use contour::{ContourSpec, LabelSpec, LineContours};
pub use error::{RenderError, RenderResult};
pub use features::{Feature, FeatureKind};
pub use figure::{Decorations, Figure, FigureSpec, RenderedImage, Suptitle, TitlePlacement, Titles};
pub use fill::{Bands, FillSpec, FilledContours};
pub use hatch::{HatchSpec, HatchedArea};
pub use imagery::{ImagerySpec, SatelliteImage, SatelliteImagery};
pub use levels::Levels;
pub use style::{CapStyle, Color, PolygonStyle, StrokeStyle};
pub use text::{Anchor, FontSet, Halo, TextStyle};
pub use viewport::{PixelRect, Viewport};
