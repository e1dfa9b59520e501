//! Gridded fields and the longitude/latitude grids they live on.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{WxError, WxResult};
use crate::units::Unit;
use crate::BoundingBox;

/// Longitude/latitude coordinates of a grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridCoords {
    /// 1-D axes: `lon.len() == nx`, `lat.len() == ny`.
    Rectilinear { lon: Vec<f64>, lat: Vec<f64> },
    /// 2-D arrays, row-major with `nx * ny` entries each.
    Curvilinear { lon: Vec<f64>, lat: Vec<f64> },
}

/// Shape and coordinates shared by every field of one subset.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoGrid {
    pub nx: usize,
    pub ny: usize,
    pub coords: GridCoords,
}

impl GeoGrid {
    /// Build a grid from 1-D axes.
    pub fn rectilinear(lon: Vec<f64>, lat: Vec<f64>) -> Self {
        Self {
            nx: lon.len(),
            ny: lat.len(),
            coords: GridCoords::Rectilinear { lon, lat },
        }
    }

    /// Build a grid from 2-D coordinate arrays.
    pub fn curvilinear(nx: usize, ny: usize, lon: Vec<f64>, lat: Vec<f64>) -> WxResult<Self> {
        if lon.len() != nx * ny || lat.len() != nx * ny {
            return Err(WxError::ShapeMismatch(format!(
                "2-D coordinates have {} / {} points, expected {}x{}",
                lon.len(),
                lat.len(),
                nx,
                ny
            )));
        }
        Ok(Self {
            nx,
            ny,
            coords: GridCoords::Curvilinear { lon, lat },
        })
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }

    /// Longitude and latitude of grid point (i, j), with longitudes
    /// normalized to [-180, 180).
    #[inline]
    pub fn lon_lat(&self, i: usize, j: usize) -> (f64, f64) {
        let (lon, lat) = match &self.coords {
            GridCoords::Rectilinear { lon, lat } => (lon[i], lat[j]),
            GridCoords::Curvilinear { lon, lat } => {
                let idx = j * self.nx + i;
                (lon[idx], lat[idx])
            }
        };
        (normalize_longitude(lon), lat)
    }

    /// Geographic bounds of the grid.
    pub fn bbox(&self) -> Option<BoundingBox> {
        let pts = (0..self.ny).flat_map(move |j| (0..self.nx).map(move |i| self.lon_lat(i, j)));
        BoundingBox::enclosing(pts)
    }
}

/// Map a longitude in degrees into [-180, 180).
#[inline]
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped.is_nan() {
        lon
    } else {
        wrapped
    }
}

/// A 2-D scalar field on a lon/lat grid.
#[derive(Debug, Clone)]
pub struct GriddedField {
    /// Variable name as found in the dataset.
    pub name: String,
    pub unit: Unit,
    pub grid: Arc<GeoGrid>,
    /// Row-major values, `grid.nx * grid.ny` entries. NaN marks missing data.
    pub values: Vec<f32>,
    pub valid_time: Option<DateTime<Utc>>,
}

impl GriddedField {
    pub fn new(
        name: impl Into<String>,
        unit: Unit,
        grid: Arc<GeoGrid>,
        values: Vec<f32>,
        valid_time: Option<DateTime<Utc>>,
    ) -> WxResult<Self> {
        let name = name.into();
        if values.len() != grid.len() {
            return Err(WxError::ShapeMismatch(format!(
                "{}: {} values for a {}x{} grid",
                name,
                values.len(),
                grid.nx,
                grid.ny
            )));
        }
        Ok(Self {
            name,
            unit,
            grid,
            values,
            valid_time,
        })
    }

    pub fn nx(&self) -> usize {
        self.grid.nx
    }

    pub fn ny(&self) -> usize {
        self.grid.ny
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[j * self.grid.nx + i]
    }

    /// Same grid and metadata, new values.
    pub fn with_values(&self, values: Vec<f32>) -> WxResult<Self> {
        GriddedField::new(
            self.name.clone(),
            self.unit,
            Arc::clone(&self.grid),
            values,
            self.valid_time,
        )
    }

    /// Minimum and maximum finite value, if any.
    pub fn finite_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Earth-relative wind components sharing one grid.
#[derive(Debug, Clone)]
pub struct VectorOverlay {
    pub u: GriddedField,
    pub v: GriddedField,
}

impl VectorOverlay {
    /// Pair two components. Only the value counts are checked; the grids
    /// are assumed to be the same subset.
    pub fn new(u: GriddedField, v: GriddedField) -> WxResult<Self> {
        if u.values.len() != v.values.len() {
            return Err(WxError::ShapeMismatch(format!(
                "u ({}) has {} values, v ({}) has {}",
                u.name,
                u.values.len(),
                v.name,
                v.values.len()
            )));
        }
        if u.unit != v.unit {
            return Err(WxError::IncompatibleUnits {
                from: u.unit,
                to: v.unit,
            });
        }
        Ok(Self { u, v })
    }

    pub fn grid(&self) -> &GeoGrid {
        &self.u.grid
    }

    pub fn unit(&self) -> Unit {
        self.u.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(nx: usize, ny: usize) -> Arc<GeoGrid> {
        let lon = (0..nx).map(|i| 250.0 + i as f64).collect();
        let lat = (0..ny).map(|j| 30.0 + j as f64).collect();
        Arc::new(GeoGrid::rectilinear(lon, lat))
    }

    #[test]
    fn test_field_shape_checked() {
        let g = grid(3, 2);
        assert!(GriddedField::new("t", Unit::Kelvin, g.clone(), vec![0.0; 6], None).is_ok());
        assert!(matches!(
            GriddedField::new("t", Unit::Kelvin, g, vec![0.0; 5], None),
            Err(WxError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_longitudes_normalized() {
        let g = grid(3, 2);
        let (lon, lat) = g.lon_lat(0, 1);
        assert_eq!(lon, -110.0);
        assert_eq!(lat, 31.0);
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(-75.0), -75.0);
    }

    #[test]
    fn test_vector_overlay_count_check() {
        let g = grid(3, 2);
        let u = GriddedField::new("u", Unit::MetersPerSecond, g.clone(), vec![1.0; 6], None).unwrap();
        let v = GriddedField::new("v", Unit::MetersPerSecond, g, vec![1.0; 6], None).unwrap();
        assert!(VectorOverlay::new(u.clone(), v).is_ok());

        let small = Arc::new(GeoGrid::rectilinear(vec![0.0, 1.0], vec![0.0]));
        let v2 = GriddedField::new("v", Unit::MetersPerSecond, small, vec![1.0; 2], None).unwrap();
        assert!(VectorOverlay::new(u, v2).is_err());
    }

    #[test]
    fn test_finite_range_ignores_nan() {
        let g = grid(2, 2);
        let f = GriddedField::new("x", Unit::Meters, g, vec![f32::NAN, 2.0, -1.0, 5.0], None).unwrap();
        assert_eq!(f.finite_range(), Some((-1.0, 5.0)));
    }
}
