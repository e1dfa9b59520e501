//! GOES-R ABI Cloud and Moisture Imagery (CMI) files.
//!
//! The main data variable is `CMI`, packed as i16 with `scale_factor`,
//! `add_offset` and `_FillValue`. It holds reflectance factors for bands 1-6
//! and brightness temperatures for bands 7-16. The `x`/`y` axes are packed
//! scan angles in radians.

use chrono::{DateTime, Utc};
use tracing::debug;

use projection::geostationary::GeosParams;
use projection::Geostationary;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{attr_f64, global_attr_string, open_from_bytes, read_f64_values, Packing};

/// A decoded CMI image on its native scan grid.
#[derive(Debug, Clone)]
pub struct GoesImage {
    /// Row-major, row 0 northernmost. NaN outside the disk or where filled.
    pub values: Vec<f32>,
    pub nx: usize,
    pub ny: usize,
    /// Scan-angle axes (radians)
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub params: GeosParams,
    /// `time_coverage_start` of the scan
    pub start_time: Option<DateTime<Utc>>,
    pub band_id: Option<i32>,
}

impl GoesImage {
    /// Geometry for reprojecting this image.
    pub fn projection(&self) -> NetCdfResult<Geostationary> {
        Geostationary::from_scan_axes(self.params, &self.x, &self.y)
            .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))
    }
}

/// Decode a CMI file from downloaded bytes.
pub fn read_goes_cmi(data: &[u8]) -> NetCdfResult<GoesImage> {
    let spilled = open_from_bytes(data, "goes_")?;
    let file = &spilled.file;

    let nx = file
        .dimension("x")
        .ok_or_else(|| NetCdfError::MissingData("x dimension".to_string()))?
        .len();
    let ny = file
        .dimension("y")
        .ok_or_else(|| NetCdfError::MissingData("y dimension".to_string()))?
        .len();

    let cmi_var = file
        .variable("CMI")
        .ok_or_else(|| NetCdfError::MissingData("CMI variable".to_string()))?;
    let raw: Vec<i16> = cmi_var.get_values::<i16, _>(..)?;
    if raw.len() != nx * ny {
        return Err(NetCdfError::InvalidFormat(format!(
            "CMI has {} values for {}x{}",
            raw.len(),
            nx,
            ny
        )));
    }
    let packing = Packing::of(&cmi_var);
    let values: Vec<f32> = raw.iter().map(|&v| packing.unpack(v as f64)).collect();

    let x = read_scan_axis(file, "x")?;
    let y = read_scan_axis(file, "y")?;

    let proj_var = file
        .variable("goes_imager_projection")
        .ok_or_else(|| NetCdfError::MissingData("goes_imager_projection variable".to_string()))?;
    let defaults = GeosParams::goes_east();
    let params = GeosParams {
        perspective_point_height: attr_f64(&proj_var, "perspective_point_height")
            .unwrap_or(defaults.perspective_point_height),
        semi_major_axis: attr_f64(&proj_var, "semi_major_axis").unwrap_or(defaults.semi_major_axis),
        semi_minor_axis: attr_f64(&proj_var, "semi_minor_axis").unwrap_or(defaults.semi_minor_axis),
        longitude_of_projection_origin: attr_f64(&proj_var, "longitude_of_projection_origin")
            .unwrap_or(defaults.longitude_of_projection_origin),
    };

    let start_time = global_attr_string(file, "time_coverage_start")
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    let band_id = file
        .variable("band_id")
        .and_then(|v| read_f64_values(&v).ok())
        .and_then(|v| v.first().map(|&b| b as i32));

    debug!(nx, ny, band = ?band_id, start = ?start_time, "Read GOES CMI");

    Ok(GoesImage {
        values,
        nx,
        ny,
        x,
        y,
        params,
        start_time,
        band_id,
    })
}

/// Unpack an i16 scan-angle axis into radians.
fn read_scan_axis(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
    let raw = read_f64_values(&var)?;
    let scale = attr_f64(&var, "scale_factor").unwrap_or(1.0);
    let offset = attr_f64(&var, "add_offset").unwrap_or(0.0);
    Ok(raw.into_iter().map(|v| v * scale + offset).collect())
}
