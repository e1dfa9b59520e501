//! Coordinate reference system transformations.
//!
//! Implements the map projections used by wxmaps from scratch: the Lambert
//! Conformal Conic map plane and the geostationary scan geometry of GOES
//! imagery.

pub mod geostationary;
pub mod lambert;

pub use geostationary::{GeosParams, Geostationary};
pub use lambert::{LambertConformal, LambertParams};

use wx_common::BoundingBox;

/// A projection from geographic degrees onto a planar map in metres.
pub trait MapProjection: Send + Sync {
    /// Project (lon, lat) in degrees to map coordinates (x, y) in metres.
    ///
    /// Returns None where the projection is undefined (e.g. the cone apex
    /// for a conic projection).
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;

    /// Inverse of [`MapProjection::forward`].
    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// Angle in radians, counter-clockwise from the map +y axis, of local
    /// true north at (lon, lat).
    ///
    /// The default estimates it by projecting a small northward step.
    fn north_angle(&self, lon: f64, lat: f64) -> f64 {
        let step = 0.01;
        match (self.forward(lon, lat), self.forward(lon, lat + step)) {
            (Some((x0, y0)), Some((x1, y1))) => (-(x1 - x0)).atan2(y1 - y0),
            _ => 0.0,
        }
    }

    /// Rotate an earth-relative vector (east, north) into map-plane (x, y)
    /// components at (lon, lat).
    fn rotate_to_map(&self, lon: f64, lat: f64, u: f64, v: f64) -> (f64, f64) {
        let theta = self.north_angle(lon, lat);
        let (s, c) = theta.sin_cos();
        (u * c - v * s, u * s + v * c)
    }

    /// Planar bounds covering a geographic box.
    ///
    /// The edges of a lon/lat box are curves on most maps, so the box outline
    /// is densified before projecting.
    fn projected_bounds(&self, geo: &BoundingBox) -> Option<BoundingBox> {
        BoundingBox::enclosing(
            geo.densified_outline(64)
                .into_iter()
                .filter_map(|(lon, lat)| self.forward(lon, lat)),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Invalid projection parameters: {0}")]
    InvalidParameters(String),
}

impl From<ProjectionError> for wx_common::WxError {
    fn from(err: ProjectionError) -> Self {
        wx_common::WxError::ProjectionError(err.to_string())
    }
}
