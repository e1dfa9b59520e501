//! NetCDF Subset Service (NCSS) grid files.
//!
//! A subset requested with `addLatLon=true` holds each variable as
//! `(time, [vertical,] y, x)` with degenerate leading dimensions, and either
//! 1-D `lat`/`lon` axes (lat/lon grids) or 2-D `lat(y, x)` / `lon(y, x)`
//! arrays (projected grids such as RAP and HRRR).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use wx_common::{GeoGrid, GriddedField, Unit};

use crate::cftime::CfTimeUnits;
use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{attr_string, open_from_bytes, read_f64_values, Packing};

/// One variable to extract from a subset.
#[derive(Debug, Clone, Copy)]
pub struct FieldRequest<'a> {
    pub variable: &'a str,
    /// Unit to assume when the file's `units` attribute is missing or not
    /// in the supported table.
    pub unit: Option<Unit>,
}

impl<'a> FieldRequest<'a> {
    pub fn new(variable: &'a str) -> Self {
        Self {
            variable,
            unit: None,
        }
    }

    pub fn with_unit(variable: &'a str, unit: Unit) -> Self {
        Self {
            variable,
            unit: Some(unit),
        }
    }
}

/// Read the requested variables from one NCSS subset.
///
/// All fields share one [`GeoGrid`]; a variable on a different horizontal
/// shape is rejected.
pub fn read_grid_fields(data: &[u8], requests: &[FieldRequest<'_>]) -> NetCdfResult<Vec<GriddedField>> {
    let spilled = open_from_bytes(data, "ncss_")?;
    let file = &spilled.file;

    let mut grid: Option<Arc<GeoGrid>> = None;
    let mut fields = Vec::with_capacity(requests.len());

    for request in requests {
        let var = file
            .variable(request.variable)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable '{}'", request.variable)))?;

        let dims: Vec<(String, usize)> = var
            .dimensions()
            .iter()
            .map(|d| (d.name(), d.len()))
            .collect();
        let (ny, nx) = horizontal_shape(request.variable, &dims)?;

        let raw = read_f64_values(&var)?;
        if raw.len() != nx * ny {
            return Err(NetCdfError::InvalidFormat(format!(
                "'{}' has {} values for a {}x{} grid",
                request.variable,
                raw.len(),
                nx,
                ny
            )));
        }
        let packing = Packing::of(&var);
        let values: Vec<f32> = raw.iter().map(|&v| packing.unpack(v)).collect();

        let grid = match &grid {
            Some(g) if g.nx == nx && g.ny == ny => Arc::clone(g),
            Some(g) => {
                return Err(NetCdfError::InvalidFormat(format!(
                    "'{}' is {}x{}, other fields are {}x{}",
                    request.variable, nx, ny, g.nx, g.ny
                )))
            }
            None => {
                let built = Arc::new(read_lon_lat(file, &dims, nx, ny)?);
                grid = Some(Arc::clone(&built));
                built
            }
        };

        let unit = resolve_unit(request, attr_string(&var, "units").as_deref())?;
        let valid_time = read_valid_time(file, &dims);

        debug!(
            variable = request.variable,
            nx,
            ny,
            unit = %unit,
            valid_time = ?valid_time,
            "Read NCSS field"
        );

        let field = GriddedField::new(request.variable, unit, grid, values, valid_time)
            .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;
        fields.push(field);
    }

    Ok(fields)
}

/// The trailing (y, x) sizes, requiring every other dimension to be
/// degenerate.
fn horizontal_shape(name: &str, dims: &[(String, usize)]) -> NetCdfResult<(usize, usize)> {
    if dims.len() < 2 {
        return Err(NetCdfError::InvalidFormat(format!(
            "'{}' has {} dimensions, expected a 2-D grid",
            name,
            dims.len()
        )));
    }
    let (leading, horizontal) = dims.split_at(dims.len() - 2);
    if let Some((dim, len)) = leading.iter().find(|(_, len)| *len != 1) {
        return Err(NetCdfError::InvalidFormat(format!(
            "'{}' has {} values along '{}'; subset a single time and level",
            name, len, dim
        )));
    }
    Ok((horizontal[0].1, horizontal[1].1))
}

fn resolve_unit(request: &FieldRequest<'_>, attribute: Option<&str>) -> NetCdfResult<Unit> {
    match (attribute.and_then(Unit::from_attribute), request.unit) {
        (Some(unit), _) => Ok(unit),
        (None, Some(fallback)) => {
            if let Some(attr) = attribute {
                warn!(variable = request.variable, units = attr, fallback = %fallback, "Unrecognized units attribute");
            }
            Ok(fallback)
        }
        (None, None) => Err(NetCdfError::InvalidFormat(format!(
            "'{}' has unsupported units {:?}",
            request.variable, attribute
        ))),
    }
}

fn find_variable<'f>(file: &'f netcdf::File, names: &[&str]) -> Option<netcdf::Variable<'f>> {
    names.iter().find_map(|n| file.variable(n))
}

/// Build the horizontal grid from `lat`/`lon` variables, falling back to
/// coordinate variables named after the x/y dimensions.
fn read_lon_lat(file: &netcdf::File, dims: &[(String, usize)], nx: usize, ny: usize) -> NetCdfResult<GeoGrid> {
    let x_dim = dims[dims.len() - 1].0.as_str();
    let y_dim = dims[dims.len() - 2].0.as_str();

    let lon_var = find_variable(file, &["lon", "longitude", x_dim])
        .ok_or_else(|| NetCdfError::MissingData("longitude coordinate".to_string()))?;
    let lat_var = find_variable(file, &["lat", "latitude", y_dim])
        .ok_or_else(|| NetCdfError::MissingData("latitude coordinate".to_string()))?;

    let lon = read_f64_values(&lon_var)?;
    let lat = read_f64_values(&lat_var)?;

    match (lon_var.dimensions().len(), lat_var.dimensions().len()) {
        (1, 1) if lon.len() == nx && lat.len() == ny => Ok(GeoGrid::rectilinear(lon, lat)),
        (2, 2) => GeoGrid::curvilinear(nx, ny, lon, lat)
            .map_err(|e| NetCdfError::InvalidFormat(e.to_string())),
        (lon_dims, lat_dims) => Err(NetCdfError::InvalidFormat(format!(
            "lon ({}-D, {} values) / lat ({}-D, {} values) do not match a {}x{} grid",
            lon_dims,
            lon.len(),
            lat_dims,
            lat.len(),
            nx,
            ny
        ))),
    }
}

/// Valid time from the first leading dimension with a CF time coordinate.
fn read_valid_time(file: &netcdf::File, dims: &[(String, usize)]) -> Option<DateTime<Utc>> {
    dims[..dims.len().saturating_sub(2)].iter().find_map(|(name, _)| {
        let var = file.variable(name)?;
        let units = CfTimeUnits::parse(&attr_string(&var, "units")?).ok()?;
        let values = read_f64_values(&var).ok()?;
        units.instant(*values.first()?)
    })
}
