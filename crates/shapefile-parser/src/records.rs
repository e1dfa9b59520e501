//! Record parsing.
//!
//! Each record is an 8-byte big-endian header (record number, content length
//! in words) followed by little-endian content starting with the shape type.

use wx_common::BoundingBox;

use crate::header::{be_i32, le_f64, le_i32, ShapeType};
use crate::ShapefileError;

/// Geometry of one record, longitude/latitude (or projected x/y) pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Null,
    Point(f64, f64),
    MultiPoint(Vec<(f64, f64)>),
    PolyLine {
        bbox: BoundingBox,
        parts: Vec<Vec<(f64, f64)>>,
    },
    Polygon {
        bbox: BoundingBox,
        rings: Vec<Vec<(f64, f64)>>,
    },
}

impl Shape {
    pub fn is_null(&self) -> bool {
        matches!(self, Shape::Null)
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Shape::Null => None,
            Shape::Point(x, y) => Some(BoundingBox::new(*x, *y, *x, *y)),
            Shape::MultiPoint(points) => BoundingBox::enclosing(points.iter().copied()),
            Shape::PolyLine { bbox, .. } | Shape::Polygon { bbox, .. } => Some(*bbox),
        }
    }

    /// Parts (polylines) or rings (polygons). Points have none.
    pub fn parts(&self) -> &[Vec<(f64, f64)>] {
        match self {
            Shape::PolyLine { parts, .. } => parts,
            Shape::Polygon { rings, .. } => rings,
            _ => &[],
        }
    }

    /// All vertices in file order, across parts.
    pub fn points(&self) -> Vec<(f64, f64)> {
        match self {
            Shape::Null => Vec::new(),
            Shape::Point(x, y) => vec![(*x, *y)],
            Shape::MultiPoint(points) => points.clone(),
            Shape::PolyLine { parts, .. } => parts.iter().flatten().copied().collect(),
            Shape::Polygon { rings, .. } => rings.iter().flatten().copied().collect(),
        }
    }

    /// Vertex by flat index across all parts.
    pub fn point_at(&self, index: usize) -> Option<(f64, f64)> {
        match self {
            Shape::Point(x, y) if index == 0 => Some((*x, *y)),
            Shape::MultiPoint(points) => points.get(index).copied(),
            _ => self.parts().iter().flatten().nth(index).copied(),
        }
    }
}

/// A record number (1-based, as stored) with its geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub number: i32,
    pub shape: Shape,
}

/// Parse all records following the header.
pub fn parse_records(body: &[u8]) -> Result<Vec<ShapeRecord>, ShapefileError> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset + 8 <= body.len() {
        let index = records.len();
        let number = be_i32(body, offset);
        let content_words = be_i32(body, offset + 4);
        if content_words < 2 {
            return Err(ShapefileError::InvalidRecord {
                record: index,
                reason: format!("content length {} words", content_words),
            });
        }
        let start = offset + 8;
        let end = start + content_words as usize * 2;
        if end > body.len() {
            return Err(ShapefileError::InvalidRecord {
                record: index,
                reason: format!("content runs past end of file ({} > {})", end, body.len()),
            });
        }

        let shape = parse_shape(&body[start..end], index)?;
        records.push(ShapeRecord { number, shape });
        offset = end;
    }

    Ok(records)
}

fn parse_shape(content: &[u8], record: usize) -> Result<Shape, ShapefileError> {
    let too_short = |need: usize| ShapefileError::InvalidRecord {
        record,
        reason: format!("content is {} bytes, needs {}", content.len(), need),
    };

    let shape_type = ShapeType::from_code(le_i32(content, 0))?;
    match shape_type.base() {
        ShapeType::Null => Ok(Shape::Null),
        ShapeType::Point => {
            if content.len() < 20 {
                return Err(too_short(20));
            }
            Ok(Shape::Point(le_f64(content, 4), le_f64(content, 12)))
        }
        ShapeType::MultiPoint => {
            if content.len() < 40 {
                return Err(too_short(40));
            }
            let num_points = checked_count(le_i32(content, 36), record)?;
            let need = 40 + num_points * 16;
            if content.len() < need {
                return Err(too_short(need));
            }
            Ok(Shape::MultiPoint(read_points(content, 40, num_points)))
        }
        ShapeType::PolyLine | ShapeType::Polygon => {
            // Type, bbox, NumParts, NumPoints
            if content.len() < 44 {
                return Err(too_short(44));
            }
            let bbox = BoundingBox::new(
                le_f64(content, 4),
                le_f64(content, 12),
                le_f64(content, 20),
                le_f64(content, 28),
            );
            let num_parts = checked_count(le_i32(content, 36), record)?;
            let num_points = checked_count(le_i32(content, 40), record)?;
            let points_offset = 44 + num_parts * 4;
            let need = points_offset + num_points * 16;
            if content.len() < need {
                return Err(too_short(need));
            }

            let mut starts = Vec::with_capacity(num_parts);
            for p in 0..num_parts {
                let start = checked_count(le_i32(content, 44 + p * 4), record)?;
                if start > num_points || starts.last().map_or(false, |&prev| start < prev) {
                    return Err(ShapefileError::InvalidRecord {
                        record,
                        reason: format!("part {} starts at point {} of {}", p, start, num_points),
                    });
                }
                starts.push(start);
            }

            let points = read_points(content, points_offset, num_points);
            let parts: Vec<Vec<(f64, f64)>> = starts
                .iter()
                .enumerate()
                .map(|(p, &s)| {
                    let e = starts.get(p + 1).copied().unwrap_or(num_points);
                    points[s..e].to_vec()
                })
                .collect();

            if shape_type.base() == ShapeType::Polygon {
                Ok(Shape::Polygon { bbox, rings: parts })
            } else {
                Ok(Shape::PolyLine { bbox, parts })
            }
        }
        other => Err(ShapefileError::InvalidRecord {
            record,
            reason: format!("unexpected base type {:?}", other),
        }),
    }
}

fn checked_count(value: i32, record: usize) -> Result<usize, ShapefileError> {
    usize::try_from(value).map_err(|_| ShapefileError::InvalidRecord {
        record,
        reason: format!("negative count {}", value),
    })
}

fn read_points(content: &[u8], offset: usize, count: usize) -> Vec<(f64, f64)> {
    (0..count)
        .map(|k| {
            let at = offset + k * 16;
            (le_f64(content, at), le_f64(content, at + 8))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::shapefile::{shapefile_bytes, square_ring, TestShape};

    fn body(shapes: &[TestShape]) -> Vec<u8> {
        shapefile_bytes(shapes)[100..].to_vec()
    }

    #[test]
    fn test_polygon_with_two_rings() {
        let outer = square_ring(0.0, 0.0, 4.0);
        let hole = square_ring(0.0, 0.0, 1.0);
        let records = parse_records(&body(&[TestShape::Polygon(vec![outer.clone(), hole.clone()])])).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, 1);
        let shape = &records[0].shape;
        assert_eq!(shape.parts().len(), 2);
        assert_eq!(shape.parts()[0], outer);
        assert_eq!(shape.parts()[1], hole);
        // Flat index crosses into the second ring
        assert_eq!(shape.point_at(5), Some(hole[0]));
        assert_eq!(shape.point_at(10), None);
    }

    #[test]
    fn test_polyline_and_null() {
        let line = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)];
        let records = parse_records(&body(&[TestShape::Null, TestShape::PolyLine(vec![line.clone()])])).unwrap();
        assert!(records[0].shape.is_null());
        assert!(matches!(&records[1].shape, Shape::PolyLine { parts, .. } if parts[0] == line));
        assert_eq!(records[1].shape.bbox(), Some(BoundingBox::new(0.0, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn test_truncated_record() {
        let mut data = body(&[TestShape::Polygon(vec![square_ring(0.0, 0.0, 1.0)])]);
        data.truncate(data.len() - 10);
        assert!(matches!(parse_records(&data), Err(ShapefileError::InvalidRecord { record: 0, .. })));
    }
}
