//! Native NetCDF access using the netcdf library.
//!
//! The netcdf library requires a file path (it wraps libnetcdf/HDF5 which need
//! file handles). When reading from bytes, we write to a temp file first.
//! On Linux, `/dev/shm` (memory-backed tmpfs) is used when writable.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Once;

use tempfile::NamedTempFile;

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This function disables that output by
/// calling H5Eset_auto2 with null handlers. Call it early in `main()`; it is
/// safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// An open netCDF file backed by a temporary copy of downloaded bytes.
///
/// The temporary file is removed when this value is dropped.
pub struct SpilledFile {
    pub file: netcdf::File,
    _backing: NamedTempFile,
}

/// Write `data` to a temp file and open it.
pub fn open_from_bytes(data: &[u8], prefix: &str) -> NetCdfResult<SpilledFile> {
    silence_hdf5_errors();

    let mut backing = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".nc")
        .tempfile_in(optimal_temp_dir())?;
    backing.write_all(data)?;
    backing.flush()?;

    let file = netcdf::open(backing.path())
        .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    Ok(SpilledFile {
        file,
        _backing: backing,
    })
}

/// Get the optimal temp directory for NetCDF file operations.
///
/// On Linux, uses /dev/shm if available and writable; otherwise the system
/// temp directory.
fn optimal_temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm_path = std::path::Path::new("/dev/shm");
        if shm_path.is_dir() {
            let probe = shm_path.join(format!(".wxmap_probe_{}", std::process::id()));
            if std::fs::write(&probe, b"probe").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return shm_path.to_path_buf();
            }
        }
    }

    std::env::temp_dir()
}

// =============================================================================
// Attribute helpers
// =============================================================================

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
pub(crate) fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

pub(crate) fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    use netcdf::AttributeValue as V;
    let value = match var.attribute_value(name)?.ok()? {
        V::Double(v) => v,
        V::Float(v) => v as f64,
        V::Short(v) => v as f64,
        V::Int(v) => v as f64,
        V::Longlong(v) => v as f64,
        V::Schar(v) => v as f64,
        V::Uchar(v) => v as f64,
        V::Ushort(v) => v as f64,
        V::Uint(v) => v as f64,
        V::Ulonglong(v) => v as f64,
        V::Doubles(v) => *v.first()?,
        V::Floats(v) => *v.first()? as f64,
        V::Shorts(v) => *v.first()? as f64,
        V::Ints(v) => *v.first()? as f64,
        _ => return None,
    };
    Some(value)
}

/// Read a whole numeric variable as f64, whatever its stored type.
pub(crate) fn read_f64_values(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    if let Ok(values) = var.get_values::<f64, _>(..) {
        return Ok(values);
    }
    if let Ok(values) = var.get_values::<f32, _>(..) {
        return Ok(values.into_iter().map(f64::from).collect());
    }
    if let Ok(values) = var.get_values::<i32, _>(..) {
        return Ok(values.into_iter().map(f64::from).collect());
    }
    let values = var.get_values::<i16, _>(..)?;
    Ok(values.into_iter().map(f64::from).collect())
}

pub(crate) fn attr_string(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        netcdf::AttributeValue::Strs(mut v) if !v.is_empty() => Some(v.swap_remove(0)),
        _ => None,
    }
}

pub(crate) fn global_attr_string(file: &netcdf::File, name: &str) -> Option<String> {
    if !file.attributes().any(|attr| attr.name() == name) {
        return None;
    }
    match file.attribute(name)?.value().ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        netcdf::AttributeValue::Strs(mut v) if !v.is_empty() => Some(v.swap_remove(0)),
        _ => None,
    }
}

/// CF packing and missing-value attributes of one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
}

impl Packing {
    pub fn of(var: &netcdf::Variable) -> Self {
        Self {
            scale_factor: attr_f64(var, "scale_factor").unwrap_or(1.0),
            add_offset: attr_f64(var, "add_offset").unwrap_or(0.0),
            fill_value: attr_f64(var, "_FillValue"),
            missing_value: attr_f64(var, "missing_value"),
        }
    }

    /// Unpack one stored value; fill and missing values become NaN.
    #[inline]
    pub fn unpack(&self, raw: f64) -> f32 {
        if raw.is_nan()
            || self.fill_value.map_or(false, |f| raw == f)
            || self.missing_value.map_or(false, |m| raw == m)
        {
            return f32::NAN;
        }
        (raw * self.scale_factor + self.add_offset) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_temp_dir() {
        let dir = optimal_temp_dir();
        assert!(dir.exists(), "Temp dir should exist");
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let result = open_from_bytes(b"<html>502 Bad Gateway</html>", "garbage_");
        assert!(matches!(result, Err(NetCdfError::InvalidFormat(_))));
    }

    #[test]
    fn test_packing_unpack() {
        let packing = Packing {
            scale_factor: 0.5,
            add_offset: 10.0,
            fill_value: Some(-1.0),
            missing_value: None,
        };
        assert_eq!(packing.unpack(4.0), 12.0);
        assert!(packing.unpack(-1.0).is_nan());
        assert!(packing.unpack(f64::NAN).is_nan());
    }
}
