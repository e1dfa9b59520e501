//! Geostationary satellite projection.
//!
//! GOES-R imagery is delivered on a fixed grid of scan angles (radians from
//! nadir). Rendering satellite imagery onto a Lambert map inverts that grid:
//! each map pixel is taken back to lon/lat, then forward into scan angles,
//! then into a fractional pixel index of the source image.
//!
//! Reference: GOES-R Product Definition and Users' Guide (PUG) Volume 4

use wx_common::BoundingBox;

use crate::ProjectionError;

/// `goes_imager_projection` attributes from a CMI file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeosParams {
    /// Satellite altitude above the ellipsoid (meters)
    pub perspective_point_height: f64,
    pub semi_major_axis: f64,
    pub semi_minor_axis: f64,
    /// Sub-satellite longitude (degrees, negative west)
    pub longitude_of_projection_origin: f64,
}

impl GeosParams {
    /// GOES-East (GOES-16/19 at 75.2W) on the GRS80 ellipsoid.
    pub fn goes_east() -> Self {
        Self {
            perspective_point_height: 35_786_023.0,
            semi_major_axis: 6_378_137.0,
            semi_minor_axis: 6_356_752.31414,
            longitude_of_projection_origin: -75.0,
        }
    }
}

/// Geostationary scan geometry for one image.
#[derive(Debug, Clone)]
pub struct Geostationary {
    /// Satellite distance from Earth center (meters)
    h: f64,
    /// Semi-major axis of Earth ellipsoid (meters)
    req: f64,
    /// Semi-minor axis of Earth ellipsoid (meters)
    rpol: f64,
    /// Longitude of satellite nadir point (radians)
    lambda_0: f64,
    /// X scan angle of the first column (radians)
    pub x_origin: f64,
    /// Y scan angle of the first row (radians)
    pub y_origin: f64,
    /// Column spacing (radians)
    pub dx: f64,
    /// Row spacing (radians, negative for north-to-south rows)
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
}

impl Geostationary {
    /// Build the projection from CF attributes and the image's scan axes.
    ///
    /// Axes must be evenly spaced with at least two samples each, as in the
    /// GOES fixed grid.
    pub fn from_scan_axes(params: GeosParams, x: &[f64], y: &[f64]) -> Result<Self, ProjectionError> {
        if x.len() < 2 || y.len() < 2 {
            return Err(ProjectionError::InvalidParameters(format!(
                "scan axes need two or more samples, got {}x{}",
                x.len(),
                y.len()
            )));
        }
        if params.semi_minor_axis <= 0.0 || params.semi_major_axis <= 0.0 {
            return Err(ProjectionError::InvalidParameters(
                "ellipsoid axes must be positive".to_string(),
            ));
        }

        let dx = (x[x.len() - 1] - x[0]) / (x.len() - 1) as f64;
        let dy = (y[y.len() - 1] - y[0]) / (y.len() - 1) as f64;
        if dx == 0.0 || dy == 0.0 || !dx.is_finite() || !dy.is_finite() {
            return Err(ProjectionError::InvalidParameters(
                "scan axes are degenerate".to_string(),
            ));
        }

        Ok(Self {
            h: params.perspective_point_height + params.semi_major_axis,
            req: params.semi_major_axis,
            rpol: params.semi_minor_axis,
            lambda_0: params.longitude_of_projection_origin.to_radians(),
            x_origin: x[0],
            y_origin: y[0],
            dx,
            dy,
            nx: x.len(),
            ny: y.len(),
        })
    }

    /// Convert grid indices (i, j) to scan angles (x, y) in radians.
    #[inline]
    pub fn grid_to_scan(&self, i: f64, j: f64) -> (f64, f64) {
        (self.x_origin + i * self.dx, self.y_origin + j * self.dy)
    }

    /// Convert scan angles (x, y) to fractional grid indices (i, j).
    #[inline]
    pub fn scan_to_grid(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.x_origin) / self.dx, (y - self.y_origin) / self.dy)
    }

    /// Convert scan angles (radians) to geographic (lon, lat) degrees.
    ///
    /// Based on GOES-R PUG Volume 4, Section 4.2.8.
    /// Returns None if the scan angle points to space (off Earth).
    pub fn scan_to_geo(&self, x_rad: f64, y_rad: f64) -> Option<(f64, f64)> {
        let (sin_x, cos_x) = x_rad.sin_cos();
        let (sin_y, cos_y) = y_rad.sin_cos();
        let axis_ratio = (self.req / self.rpol).powi(2);

        // Distance from the satellite to the surface along the scan ray
        let a = sin_x.powi(2) + cos_x.powi(2) * (cos_y.powi(2) + axis_ratio * sin_y.powi(2));
        let b = -2.0 * self.h * cos_x * cos_y;
        let c = self.h.powi(2) - self.req.powi(2);

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let rs = (-b - discriminant.sqrt()) / (2.0 * a);

        let sx = rs * cos_x * cos_y;
        let sy = -rs * sin_x;
        let sz = rs * cos_x * sin_y;

        let lat = (axis_ratio * sz / (self.h - sx).hypot(sy)).atan();
        let lon = self.lambda_0 - sy.atan2(self.h - sx);

        Some((lon.to_degrees(), lat.to_degrees()))
    }

    /// Convert geographic (lon, lat) degrees to scan angles (radians).
    ///
    /// Returns None if the point is not visible from the satellite.
    pub fn geo_to_scan(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let lat_rad = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lambda_0;

        // Beyond the limb as seen from the satellite
        let cos_c = lat_rad.cos() * dlon.cos();
        if cos_c.acos() > (self.req / self.h).acos() {
            return None;
        }

        // Geocentric latitude and surface radius on the ellipsoid
        let phi_c = ((self.rpol / self.req).powi(2) * lat_rad.tan()).atan();
        let e2 = 1.0 - (self.rpol / self.req).powi(2);
        let rc = self.rpol / (1.0 - e2 * phi_c.cos().powi(2)).sqrt();

        let sx = self.h - rc * phi_c.cos() * dlon.cos();
        let sy = -rc * phi_c.cos() * dlon.sin();
        let sz = rc * phi_c.sin();
        if sx <= 0.0 {
            return None;
        }

        // GOES-R sweeps along x
        let x_rad = (-sy / (sx * sx + sy * sy + sz * sz).sqrt()).asin();
        let y_rad = (sz / sx).atan();
        Some((x_rad, y_rad))
    }

    /// Geographic (lon, lat) to fractional grid indices (i, j).
    pub fn geo_to_grid(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let (x, y) = self.geo_to_scan(lon_deg, lat_deg)?;
        Some(self.scan_to_grid(x, y))
    }

    /// Fractional grid indices (i, j) to geographic (lon, lat).
    pub fn grid_to_geo(&self, i: f64, j: f64) -> Option<(f64, f64)> {
        let (x, y) = self.grid_to_scan(i, j);
        self.scan_to_geo(x, y)
    }

    /// Nearest source pixel for a geographic point, if inside the image.
    #[inline]
    pub fn nearest_pixel(&self, lon_deg: f64, lat_deg: f64) -> Option<(usize, usize)> {
        let (i, j) = self.geo_to_grid(lon_deg, lat_deg)?;
        let (i, j) = (i.round(), j.round());
        if i < 0.0 || j < 0.0 || i >= self.nx as f64 || j >= self.ny as f64 {
            return None;
        }
        Some((i as usize, j as usize))
    }

    /// Approximate geographic bounds from samples along the image edges.
    pub fn geographic_bounds(&self) -> Option<BoundingBox> {
        let samples = 50;
        let last_i = self.nx as f64 - 1.0;
        let last_j = self.ny as f64 - 1.0;
        let edge_points = (0..=samples).flat_map(|t| {
            let frac = t as f64 / samples as f64;
            [
                (frac * last_i, 0.0),
                (frac * last_i, last_j),
                (0.0, frac * last_j),
                (last_i, frac * last_j),
            ]
        });
        BoundingBox::enclosing(edge_points.filter_map(|(i, j)| self.grid_to_geo(i, j)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// GOES-East CONUS fixed grid: 5000 x 3000 at 28 microradians.
    fn goes_east_conus() -> Geostationary {
        let x: Vec<f64> = (0..5000).map(|i| -0.101360 + i as f64 * 0.000028).collect();
        let y: Vec<f64> = (0..3000).map(|j| 0.128226 - j as f64 * 0.000028).collect();
        Geostationary::from_scan_axes(GeosParams::goes_east(), &x, &y).unwrap()
    }

    #[test]
    fn test_axes_define_spacing() {
        let proj = goes_east_conus();
        assert!((proj.dx - 0.000028).abs() < 1e-12);
        assert!((proj.dy + 0.000028).abs() < 1e-12);
        assert_eq!((proj.nx, proj.ny), (5000, 3000));
    }

    #[test]
    fn test_kansas_inside_conus_sector() {
        let proj = goes_east_conus();
        let (i, j) = proj.geo_to_grid(-95.0, 39.0).unwrap();
        assert!((0.0..5000.0).contains(&i), "i = {}", i);
        assert!((0.0..3000.0).contains(&j), "j = {}", j);

        let (lon, lat) = proj.grid_to_geo(i, j).unwrap();
        assert!((lon + 95.0).abs() < 1e-6, "lon roundtrip {}", lon);
        assert!((lat - 39.0).abs() < 1e-6, "lat roundtrip {}", lat);
    }

    #[test]
    fn test_nadir() {
        let proj = goes_east_conus();
        let (lon, lat) = proj.scan_to_geo(0.0, 0.0).unwrap();
        assert!((lon + 75.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn test_not_visible() {
        let proj = goes_east_conus();
        assert!(proj.geo_to_scan(180.0, 0.0).is_none());
        assert!(proj.scan_to_geo(0.5, 0.5).is_none());
        // Visible but west of the sector
        assert!(proj.nearest_pixel(-160.0, 20.0).is_none());
    }

    #[test]
    fn test_conus_bounds() {
        let bounds = goes_east_conus().geographic_bounds().unwrap();
        assert!(bounds.min_x < -130.0, "{:?}", bounds);
        assert!(bounds.max_x > -60.0, "{:?}", bounds);
        assert!(bounds.min_y > 10.0 && bounds.min_y < 20.0, "{:?}", bounds);
        assert!(bounds.max_y > 50.0, "{:?}", bounds);
    }

    #[test]
    fn test_degenerate_axes_rejected() {
        assert!(Geostationary::from_scan_axes(GeosParams::goes_east(), &[0.0], &[0.0, 1.0]).is_err());
        assert!(
            Geostationary::from_scan_axes(GeosParams::goes_east(), &[0.1, 0.1], &[0.0, 1.0]).is_err()
        );
    }
}
