//! Minimal ESRI shapefile writer for test fixtures.
//!
//! Writes only the `.shp` main file: a 100-byte header (big-endian file code
//! and length, little-endian everything else) followed by records.

use std::io;
use std::path::Path;

/// One record of a test shapefile.
#[derive(Debug, Clone)]
pub enum TestShape {
    Null,
    Point(f64, f64),
    PolyLine(Vec<Vec<(f64, f64)>>),
    Polygon(Vec<Vec<(f64, f64)>>),
}

impl TestShape {
    fn type_code(&self) -> i32 {
        match self {
            TestShape::Null => 0,
            TestShape::Point(..) => 1,
            TestShape::PolyLine(_) => 3,
            TestShape::Polygon(_) => 5,
        }
    }

    fn points(&self) -> Vec<(f64, f64)> {
        match self {
            TestShape::Null => Vec::new(),
            TestShape::Point(x, y) => vec![(*x, *y)],
            TestShape::PolyLine(parts) | TestShape::Polygon(parts) => {
                parts.iter().flatten().copied().collect()
            }
        }
    }

    fn content(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.type_code().to_le_bytes());
        match self {
            TestShape::Null => {}
            TestShape::Point(x, y) => {
                buf.extend_from_slice(&x.to_le_bytes());
                buf.extend_from_slice(&y.to_le_bytes());
            }
            TestShape::PolyLine(parts) | TestShape::Polygon(parts) => {
                let points = self.points();
                write_bbox(&mut buf, &points);
                buf.extend_from_slice(&(parts.len() as i32).to_le_bytes());
                buf.extend_from_slice(&(points.len() as i32).to_le_bytes());
                let mut start = 0i32;
                for part in parts {
                    buf.extend_from_slice(&start.to_le_bytes());
                    start += part.len() as i32;
                }
                for (x, y) in points {
                    buf.extend_from_slice(&x.to_le_bytes());
                    buf.extend_from_slice(&y.to_le_bytes());
                }
            }
        }
        buf
    }
}

fn bbox_of(points: &[(f64, f64)]) -> [f64; 4] {
    if points.is_empty() {
        return [0.0; 4];
    }
    points.iter().fold(
        [f64::MAX, f64::MAX, f64::MIN, f64::MIN],
        |[x0, y0, x1, y1], &(x, y)| [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
    )
}

fn write_bbox(buf: &mut Vec<u8>, points: &[(f64, f64)]) {
    for v in bbox_of(points) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// Encode shapes as the bytes of a `.shp` file.
///
/// The header shape type is taken from the first non-null record.
pub fn shapefile_bytes(shapes: &[TestShape]) -> Vec<u8> {
    let mut records = Vec::new();
    for (n, shape) in shapes.iter().enumerate() {
        let content = shape.content();
        records.extend_from_slice(&((n + 1) as i32).to_be_bytes());
        records.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
        records.extend_from_slice(&content);
    }

    let shape_type = shapes
        .iter()
        .map(TestShape::type_code)
        .find(|&t| t != 0)
        .unwrap_or(0);
    let all_points: Vec<(f64, f64)> = shapes.iter().flat_map(TestShape::points).collect();

    let mut out = Vec::with_capacity(100 + records.len());
    out.extend_from_slice(&9994i32.to_be_bytes());
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&(((100 + records.len()) / 2) as i32).to_be_bytes());
    out.extend_from_slice(&1000i32.to_le_bytes());
    out.extend_from_slice(&shape_type.to_le_bytes());
    write_bbox(&mut out, &all_points);
    out.extend_from_slice(&[0u8; 32]); // Z and M ranges
    out.extend_from_slice(&records);
    out
}

/// Write shapes to `path` as a `.shp` file.
pub fn write_shapefile(path: &Path, shapes: &[TestShape]) -> io::Result<()> {
    std::fs::write(path, shapefile_bytes(shapes))
}

/// Closed square ring centred on (cx, cy), clockwise as polygons expect.
pub fn square_ring(cx: f64, cy: f64, half: f64) -> Vec<(f64, f64)> {
    vec![
        (cx - half, cy - half),
        (cx - half, cy + half),
        (cx + half, cy + half),
        (cx + half, cy - half),
        (cx - half, cy - half),
    ]
}

/// Closed ring with `n` vertices approximating a circle, clockwise.
pub fn circle_ring(cx: f64, cy: f64, radius: f64, n: usize) -> Vec<(f64, f64)> {
    let mut ring: Vec<(f64, f64)> = (0..n)
        .map(|k| {
            let a = -2.0 * std::f64::consts::PI * k as f64 / n as f64;
            (cx + radius * a.cos(), cy + radius * a.sin())
        })
        .collect();
    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    ring
}
