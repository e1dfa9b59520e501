//! Lambert Conformal Conic projection.
//!
//! Every map in wxmaps is drawn on this projection. It maps a cone secant to
//! the Earth along two standard parallels onto a flat plane; meridians become
//! straight lines converging on the cone apex and parallels become arcs.
//!
//! Spherical formulation, false easting/northing zero:
//! - cone constant `n = ln(cos φ1 / cos φ2) / ln(tan(π/4 + φ2/2) / tan(π/4 + φ1/2))`
//! - `F = cos φ1 · tan^n(π/4 + φ1/2) / n`
//! - `ρ(φ) = R · F / tan^n(π/4 + φ/2)`, with `ρ0 = ρ(φ0)` at the central latitude

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use serde::{Deserialize, Serialize};

use crate::{MapProjection, ProjectionError};

/// Mean Earth radius (meters), as used by NCEP grids.
pub const EARTH_RADIUS: f64 = 6_371_229.0;

/// User-facing projection parameters, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambertParams {
    pub central_longitude: f64,
    pub central_latitude: f64,
    pub standard_parallels: [f64; 2],
}

impl Default for LambertParams {
    fn default() -> Self {
        Self {
            central_longitude: -96.0,
            central_latitude: 39.0,
            standard_parallels: [33.0, 45.0],
        }
    }
}

/// Lambert Conformal Conic projection with precomputed cone constants.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    pub params: LambertParams,
    /// Central meridian in radians
    lon0: f64,
    /// Earth radius (meters)
    pub earth_radius: f64,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the central latitude
    rho0: f64,
}

impl LambertConformal {
    /// Build the projection from degree parameters.
    ///
    /// Fails when the standard parallels straddle the equator symmetrically
    /// (a cylinder, not a cone) or a parallel sits on a pole.
    pub fn new(params: LambertParams) -> Result<Self, ProjectionError> {
        let [p1, p2] = params.standard_parallels;
        let phi1 = p1.to_radians();
        let phi2 = p2.to_radians();
        let phi0 = params.central_latitude.to_radians();

        if p1.abs() >= 90.0 || p2.abs() >= 90.0 || params.central_latitude.abs() >= 90.0 {
            return Err(ProjectionError::InvalidParameters(format!(
                "latitudes must be strictly between the poles: {:?}",
                params
            )));
        }

        let n = if (phi1 - phi2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            phi1.sin()
        } else {
            // Secant cone (two standard parallels)
            let ln_ratio = (phi1.cos() / phi2.cos()).ln();
            let tan_ratio = ((FRAC_PI_4 + phi2 / 2.0).tan() / (FRAC_PI_4 + phi1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };
        if !n.is_finite() || n.abs() < 1e-10 {
            return Err(ProjectionError::InvalidParameters(format!(
                "standard parallels {:?} do not define a cone",
                params.standard_parallels
            )));
        }

        let f = phi1.cos() * (FRAC_PI_4 + phi1 / 2.0).tan().powf(n) / n;
        let earth_radius = EARTH_RADIUS;
        let rho0 = earth_radius * f / (FRAC_PI_4 + phi0 / 2.0).tan().powf(n);

        Ok(Self {
            params,
            lon0: params.central_longitude.to_radians(),
            earth_radius,
            n,
            f,
            rho0,
        })
    }

    /// Cone constant.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }

    fn rho(&self, lat_rad: f64) -> f64 {
        self.earth_radius * self.f / (FRAC_PI_4 + lat_rad / 2.0).tan().powf(self.n)
    }

    /// Longitude difference from the central meridian, normalized to [-π, π].
    fn delta_lon(&self, lon_rad: f64) -> f64 {
        let mut dlon = lon_rad - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }
        dlon
    }
}

impl MapProjection for LambertConformal {
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        // The apex pole maps to a point, the opposite pole to infinity.
        let lat = lat.clamp(-89.999, 89.999);
        let rho = self.rho(lat.to_radians());
        if !rho.is_finite() {
            return None;
        }
        let theta = self.n * self.delta_lon(lon.to_radians());
        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();
        Some((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dy = self.rho0 - y;
        let mut rho = x.hypot(dy);
        if rho == 0.0 {
            let lat = if self.n > 0.0 { 90.0 } else { -90.0 };
            return Some((self.params.central_longitude, lat));
        }
        let theta = if self.n < 0.0 {
            rho = -rho;
            (-x).atan2(-dy)
        } else {
            x.atan2(dy)
        };

        let lat = 2.0 * (self.earth_radius * self.f / rho).powf(1.0 / self.n).atan() - FRAC_PI_2;
        let lon = self.lon0 + theta / self.n;
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        Some((lon.to_degrees(), lat.to_degrees()))
    }

    fn north_angle(&self, lon: f64, _lat: f64) -> f64 {
        // Meridians converge on the apex at (0, rho0): grid north is rotated
        // from true north by theta = n * dlon.
        self.n * self.delta_lon(lon.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;
    use wx_common::BoundingBox;

    fn conus() -> LambertConformal {
        LambertConformal::new(LambertParams::default()).unwrap()
    }

    #[test]
    fn test_origin_maps_to_zero() {
        let proj = conus();
        let (x, y) = proj.forward(-96.0, 39.0).unwrap();
        assert_approx_eq!(x, 0.0, 1e-6);
        assert_approx_eq!(y, 0.0, 1e-6);
    }

    #[test]
    fn test_roundtrip() {
        let proj = conus();
        for &(lon, lat) in &[(-122.3, 47.6), (-80.2, 25.8), (-100.0, 31.0), (-70.0, 44.0)] {
            let (x, y) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert_approx_eq!(lon, lon2, 1e-8);
            assert_approx_eq!(lat, lat2, 1e-8);
        }
    }

    #[test]
    fn test_meridians_converge_north() {
        // East of the central meridian, grid north leans west (positive
        // counter-clockwise angle from +y is towards -x).
        let proj = conus();
        let east = proj.north_angle(-80.0, 40.0);
        let west = proj.north_angle(-110.0, 40.0);
        assert!(east > 0.0, "east angle {}", east);
        assert!(west < 0.0, "west angle {}", west);

        // Analytic angle agrees with a numeric estimate
        let (x0, y0) = proj.forward(-80.0, 40.0).unwrap();
        let (x1, y1) = proj.forward(-80.0, 40.01).unwrap();
        let numeric = (-(x1 - x0)).atan2(y1 - y0);
        assert_approx_eq!(east, numeric, 1e-4);
    }

    #[test]
    fn test_rotate_to_map_preserves_magnitude() {
        let proj = conus();
        let (x, y) = proj.rotate_to_map(-75.0, 40.0, 10.0, 0.0);
        assert_approx_eq!(x.hypot(y), 10.0, 1e-9);
        // A westerly wind east of center points slightly south of +x
        assert!(y != 0.0);
    }

    #[test]
    fn test_projected_bounds_enclose_box() {
        let proj = conus();
        let geo = BoundingBox::from_extent([-120.0, -73.0, 23.0, 50.0]);
        let bounds = proj.projected_bounds(&geo).unwrap();
        assert!(bounds.width() > 4.5e6 && bounds.width() < 5.5e6, "{}", bounds.width());
        // Northern edge bows upward at the central meridian
        let (_, y_mid_north) = proj.forward(-96.0, 50.0).unwrap();
        assert!(bounds.max_y >= y_mid_north);
    }

    #[test]
    fn test_invalid_parameters() {
        let bad = LambertParams {
            standard_parallels: [-30.0, 30.0],
            ..LambertParams::default()
        };
        assert!(LambertConformal::new(bad).is_err());
        let pole = LambertParams {
            standard_parallels: [90.0, 45.0],
            ..LambertParams::default()
        };
        assert!(LambertConformal::new(pole).is_err());
    }
}
