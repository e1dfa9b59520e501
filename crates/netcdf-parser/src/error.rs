//! Error types for NetCDF parsing operations.

use thiserror::Error;
use wx_common::WxError;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The netcdf library rejected the file or a read
    #[error("NetCDF library error: {0}")]
    Library(String),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl From<netcdf::Error> for NetCdfError {
    fn from(err: netcdf::Error) -> Self {
        NetCdfError::Library(err.to_string())
    }
}

impl From<NetCdfError> for WxError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::MissingData(what) => WxError::MissingVariable(what),
            other => WxError::DataReadError(other.to_string()),
        }
    }
}
