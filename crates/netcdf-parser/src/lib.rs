//! NetCDF readers for map data.
//!
//! Two kinds of file arrive from THREDDS:
//!
//! - **NCSS subsets** of model grids (RAP, HRRR): one or more 2-D variables,
//!   possibly with degenerate time and vertical dimensions, plus `lat`/`lon`
//!   coordinates added by the subset service. See [`ncss`].
//! - **GOES-R ABI CMI** files: a packed `CMI` scan-angle image with its
//!   `goes_imager_projection` attributes. See [`goes`].
//!
//! Both are read with the native netcdf library. Downloads arrive as bytes
//! and are spilled to a temporary file first (see [`native`]).

pub mod cftime;
pub mod error;
pub mod goes;
pub mod native;
pub mod ncss;

pub use error::{NetCdfError, NetCdfResult};
pub use goes::{read_goes_cmi, GoesImage};
pub use native::silence_hdf5_errors;
pub use ncss::{read_grid_fields, FieldRequest};
