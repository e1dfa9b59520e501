//! The 100-byte main file header.
//!
//! Byte layout:
//! - 0..4: file code 9994 (big-endian)
//! - 24..28: file length in 16-bit words (big-endian)
//! - 28..32: version 1000 (little-endian)
//! - 32..36: shape type (little-endian)
//! - 36..68: Xmin, Ymin, Xmax, Ymax (little-endian f64)
//! - 68..100: Z and M ranges

use wx_common::BoundingBox;

use crate::ShapefileError;

pub const HEADER_LEN: usize = 100;
const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;

/// Shape types from the ESRI whitepaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
}

impl ShapeType {
    pub fn from_code(code: i32) -> Result<Self, ShapefileError> {
        Ok(match code {
            0 => ShapeType::Null,
            1 => ShapeType::Point,
            3 => ShapeType::PolyLine,
            5 => ShapeType::Polygon,
            8 => ShapeType::MultiPoint,
            11 => ShapeType::PointZ,
            13 => ShapeType::PolyLineZ,
            15 => ShapeType::PolygonZ,
            18 => ShapeType::MultiPointZ,
            21 => ShapeType::PointM,
            23 => ShapeType::PolyLineM,
            25 => ShapeType::PolygonM,
            28 => ShapeType::MultiPointM,
            other => return Err(ShapefileError::UnsupportedShapeType(other)),
        })
    }

    /// The 2-D geometry family, ignoring Z/M.
    pub fn base(&self) -> ShapeType {
        match self {
            ShapeType::PointZ | ShapeType::PointM => ShapeType::Point,
            ShapeType::PolyLineZ | ShapeType::PolyLineM => ShapeType::PolyLine,
            ShapeType::PolygonZ | ShapeType::PolygonM => ShapeType::Polygon,
            ShapeType::MultiPointZ | ShapeType::MultiPointM => ShapeType::MultiPoint,
            other => *other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShapefileHeader {
    /// File length in 16-bit words, as stored.
    pub file_length_words: u32,
    pub shape_type: ShapeType,
    pub bbox: BoundingBox,
}

impl ShapefileHeader {
    pub fn file_length_bytes(&self) -> usize {
        self.file_length_words as usize * 2
    }
}

#[inline]
pub(crate) fn be_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

#[inline]
pub(crate) fn le_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

#[inline]
pub(crate) fn le_f64(data: &[u8], offset: usize) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    f64::from_le_bytes(buf)
}

/// Parse the main file header.
pub fn parse_header(data: &[u8]) -> Result<ShapefileHeader, ShapefileError> {
    if data.len() < HEADER_LEN {
        return Err(ShapefileError::InvalidHeader(format!(
            "file is {} bytes, header needs {}",
            data.len(),
            HEADER_LEN
        )));
    }

    let file_code = be_i32(data, 0);
    if file_code != FILE_CODE {
        return Err(ShapefileError::InvalidHeader(format!(
            "bad file code {} (expected {})",
            file_code, FILE_CODE
        )));
    }

    let version = le_i32(data, 28);
    if version != VERSION {
        return Err(ShapefileError::InvalidHeader(format!(
            "unsupported version {}",
            version
        )));
    }

    let file_length = be_i32(data, 24);
    if file_length < (HEADER_LEN / 2) as i32 {
        return Err(ShapefileError::InvalidHeader(format!(
            "file length {} words is shorter than the header",
            file_length
        )));
    }

    let shape_type = ShapeType::from_code(le_i32(data, 32))?;
    let bbox = BoundingBox::new(
        le_f64(data, 36),
        le_f64(data, 44),
        le_f64(data, 52),
        le_f64(data, 60),
    );

    Ok(ShapefileHeader {
        file_length_words: file_length as u32,
        shape_type,
        bbox,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::shapefile::{shapefile_bytes, square_ring, TestShape};

    #[test]
    fn test_parse_polygon_header() {
        let bytes = shapefile_bytes(&[TestShape::Polygon(vec![square_ring(-95.0, 35.0, 2.0)])]);
        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.shape_type, ShapeType::Polygon);
        assert_eq!(header.file_length_bytes(), bytes.len());
        assert_eq!(header.bbox, BoundingBox::new(-97.0, 33.0, -93.0, 37.0));
    }

    #[test]
    fn test_rejects_bad_file_code() {
        let mut bytes = shapefile_bytes(&[TestShape::Point(0.0, 0.0)]);
        bytes[3] = 0;
        assert!(matches!(parse_header(&bytes), Err(ShapefileError::InvalidHeader(_))));
    }

    #[test]
    fn test_rejects_truncated_header() {
        assert!(parse_header(&[0u8; 40]).is_err());
    }

    #[test]
    fn test_z_types_map_to_base() {
        assert_eq!(ShapeType::from_code(15).unwrap().base(), ShapeType::Polygon);
        assert_eq!(ShapeType::from_code(23).unwrap().base(), ShapeType::PolyLine);
        assert!(ShapeType::from_code(31).is_err()); // MultiPatch
    }
}
