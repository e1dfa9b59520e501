//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// For geographic extents, coordinates are in degrees (x = longitude,
/// y = latitude). For projected extents, coordinates are in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a geographic box from a map extent `[west, east, south, north]`.
    pub fn from_extent(extent: [f64; 4]) -> Self {
        let [west, east, south, north] = extent;
        Self::new(west, south, east, north)
    }

    /// Parse an extent string: "west,east,south,north"
    pub fn from_extent_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
        }

        let bbox = Self::from_extent(values);
        bbox.validate()?;
        Ok(bbox)
    }

    /// The extent as `[west, east, south, north]`.
    pub fn to_extent(&self) -> [f64; 4] {
        [self.min_x, self.max_x, self.min_y, self.max_y]
    }

    /// Check that min < max on both axes and that all values are finite.
    pub fn validate(&self) -> Result<(), BboxParseError> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(BboxParseError::Degenerate(*self));
        }
        Ok(())
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grow the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> BoundingBox {
        BoundingBox::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    /// Smallest box containing all points, or None for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut bbox: Option<BoundingBox> = None;
        for (x, y) in points {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            bbox = Some(match bbox {
                None => BoundingBox::new(x, y, x, y),
                Some(b) => BoundingBox::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
            });
        }
        bbox
    }

    /// Points along the outline of the box, `per_side` samples per edge.
    ///
    /// Projected map extents are computed from this densified outline since
    /// the edges of a lon/lat box are curves in a conic projection.
    pub fn densified_outline(&self, per_side: usize) -> Vec<(f64, f64)> {
        let n = per_side.max(2);
        let mut points = Vec::with_capacity(n * 4);
        let step = |a: f64, b: f64, k: usize| a + (b - a) * k as f64 / (n - 1) as f64;

        for k in 0..n {
            points.push((step(self.min_x, self.max_x, k), self.min_y));
        }
        for k in 0..n {
            points.push((self.max_x, step(self.min_y, self.max_y, k)));
        }
        for k in 0..n {
            points.push((step(self.max_x, self.min_x, k), self.max_y));
        }
        for k in 0..n {
            points.push((self.min_x, step(self.max_y, self.min_y, k)));
        }
        points
    }

    /// Longitudes shifted into the 0-360 convention used by subset services.
    pub fn to_positive_longitudes(&self) -> BoundingBox {
        let wrap = |lon: f64| if lon < 0.0 { lon + 360.0 } else { lon };
        BoundingBox::new(wrap(self.min_x), self.min_y, wrap(self.max_x), self.max_y)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid extent format: {0}. Expected 'west,east,south,north'")]
    InvalidFormat(String),

    #[error("Invalid number in extent: {0}")]
    InvalidNumber(String),

    #[error("Degenerate extent: {0:?}")]
    Degenerate(BoundingBox),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extent_string() {
        let bbox = BoundingBox::from_extent_string("-125.0,-66.0,24.0,50.0").unwrap();
        assert_eq!(bbox.min_x, -125.0);
        assert_eq!(bbox.min_y, 24.0);
        assert_eq!(bbox.max_x, -66.0);
        assert_eq!(bbox.max_y, 50.0);
        assert_eq!(bbox.to_extent(), [-125.0, -66.0, 24.0, 50.0]);
    }

    #[test]
    fn test_parse_rejects_bad_extents() {
        assert!(BoundingBox::from_extent_string("1,2,3").is_err());
        assert!(BoundingBox::from_extent_string("a,2,3,4").is_err());
        // east < west
        assert!(BoundingBox::from_extent_string("10,0,20,30").is_err());
    }

    #[test]
    fn test_densified_outline_covers_corners() {
        let bbox = BoundingBox::new(-10.0, 20.0, 10.0, 40.0);
        let outline = bbox.densified_outline(5);
        assert_eq!(outline.len(), 20);
        assert!(outline.contains(&(-10.0, 20.0)));
        assert!(outline.contains(&(10.0, 40.0)));
        assert!(outline.iter().all(|&(x, y)| bbox.contains_point(x, y)));
    }

    #[test]
    fn test_enclosing_skips_nan() {
        let bbox =
            BoundingBox::enclosing(vec![(1.0, 2.0), (f64::NAN, 0.0), (-3.0, 5.0)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-3.0, 2.0, 1.0, 5.0));
        assert!(BoundingBox::enclosing(Vec::new()).is_none());
    }

    #[test]
    fn test_positive_longitudes() {
        let bbox = BoundingBox::from_extent([-130.0, -60.0, 20.0, 55.0]).to_positive_longitudes();
        assert_eq!(bbox.min_x, 230.0);
        assert_eq!(bbox.max_x, 300.0);
    }
}
