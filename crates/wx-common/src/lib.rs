//! Common types and utilities shared across the wxmaps crates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod time;
pub mod units;

pub use bbox::BoundingBox;
pub use error::{WxError, WxResult};
pub use grid::{GeoGrid, GridCoords, GriddedField, VectorOverlay};
pub use time::{format_timestamp, format_valid_label};
pub use units::{Conversion, Unit};
