//! ESRI shapefile reader.
//!
//! Reads the `.shp` main file only: geometry without attributes. That is all
//! the map layers need, and it means `.dbf` / `.shx` companions may be absent.
//!
//! Supported record types are Null, Point, MultiPoint, PolyLine and Polygon,
//! plus their Z and M variants with the extra ordinates ignored.

pub mod header;
pub mod records;

use std::path::Path;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use wx_common::BoundingBox;

pub use header::{ShapeType, ShapefileHeader};
pub use records::{Shape, ShapeRecord};

/// Result type alias using ShapefileError.
pub type ShapefileResult<T> = Result<T, ShapefileError>;

#[derive(Debug, Error)]
pub enum ShapefileError {
    #[error("Cannot read shapefile {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid shapefile header: {0}")]
    InvalidHeader(String),

    #[error("Invalid record {record}: {reason}")]
    InvalidRecord { record: usize, reason: String },

    #[error("Unsupported shape type: {0}")]
    UnsupportedShapeType(i32),
}

impl ShapefileError {
    /// Whether the file itself could not be opened (as opposed to being
    /// present but malformed).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShapefileError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// A decoded shapefile.
#[derive(Debug, Clone)]
pub struct Shapefile {
    pub header: ShapefileHeader,
    pub records: Vec<ShapeRecord>,
}

impl Shapefile {
    /// Read and decode a `.shp` file.
    pub fn open(path: impl AsRef<Path>) -> ShapefileResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ShapefileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let shapefile = Self::parse(Bytes::from(data))?;
        debug!(
            path = %path.display(),
            shape_type = ?shapefile.header.shape_type,
            records = shapefile.records.len(),
            "Loaded shapefile"
        );
        Ok(shapefile)
    }

    /// Decode a `.shp` file already in memory.
    pub fn parse(data: Bytes) -> ShapefileResult<Self> {
        let header = header::parse_header(&data)?;
        let body_end = header.file_length_bytes().min(data.len());
        let records = records::parse_records(&data[header::HEADER_LEN..body_end])?;
        Ok(Self { header, records })
    }

    /// Number of records, including null shapes.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-null shapes in file order.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.records.iter().map(|r| &r.shape).filter(|s| !s.is_null())
    }

    /// Shapes whose bounding box intersects `bbox`.
    pub fn shapes_intersecting<'a>(&'a self, bbox: &'a BoundingBox) -> impl Iterator<Item = &'a Shape> {
        self.shapes().filter(move |s| s.bbox().map_or(false, |b| b.intersects(bbox)))
    }

    /// Shape at `index`, counting from the end when `index` is negative
    /// (`-1` is the last record).
    pub fn shape_at(&self, index: isize) -> Option<&Shape> {
        let len = self.records.len() as isize;
        let idx = if index < 0 { len + index } else { index };
        if idx < 0 || idx >= len {
            return None;
        }
        Some(&self.records[idx as usize].shape)
    }
}
