//! Field post-processing for map products.
//!
//! Raw subsets come off the wire in model units and at native resolution.
//! Before plotting they pass through, in this order:
//!
//! ```text
//! raw field ──► gaussian::smooth_field ──► derive::wind_speed ──► convert::convert_field
//! ```
//!
//! Smoothing happens on the raw components, derived quantities are computed
//! from the smoothed components, and unit conversion comes last. NaN (missing
//! data) passes through every step.

pub mod convert;
pub mod derive;
pub mod gaussian;

pub use convert::{convert_field, convert_in_place};
pub use derive::{sqrt_reflectance, wind_speed};
pub use gaussian::{gaussian_filter, smooth_field, GaussianFilter};
