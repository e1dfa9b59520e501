//! Grid nodes placed on screen, and per-pixel resampling of grid values.
//!
//! Data grids are arbitrary (1-D lon/lat axes or 2-D curvilinear), so
//! values are carried to pixels by projecting every node and rasterizing
//! each grid cell as two triangles with linear interpolation. A NaN at any
//! corner leaves the cell unfilled.

use rayon::prelude::*;
use wx_common::GeoGrid;

use crate::viewport::Viewport;

/// Pixel position of every node of a grid, row-major. Nodes the projection
/// cannot place hold NaN.
#[derive(Debug, Clone)]
pub struct ScreenGrid {
    pub nx: usize,
    pub ny: usize,
    xs: Vec<f32>,
    ys: Vec<f32>,
}

impl ScreenGrid {
    pub fn project(grid: &GeoGrid, viewport: &Viewport) -> Self {
        let (nx, ny) = (grid.nx, grid.ny);
        let positions: Vec<(f32, f32)> = (0..nx * ny)
            .into_par_iter()
            .map(|idx| {
                let (lon, lat) = grid.lon_lat(idx % nx, idx / nx);
                viewport
                    .geo_to_pixel(lon, lat)
                    .unwrap_or((f32::NAN, f32::NAN))
            })
            .collect();
        let (xs, ys) = positions.into_iter().unzip();
        Self { nx, ny, xs, ys }
    }

    /// Build from explicit node positions (row-major).
    pub fn from_positions(nx: usize, ny: usize, positions: &[(f32, f32)]) -> Self {
        let (xs, ys) = positions.iter().copied().unzip();
        Self { nx, ny, xs, ys }
    }

    #[inline]
    pub fn node(&self, i: usize, j: usize) -> (f32, f32) {
        let idx = j * self.nx + i;
        (self.xs[idx], self.ys[idx])
    }

    /// Bilinear position at fractional grid index (fi, fj).
    pub fn at(&self, fi: f32, fj: f32) -> Option<(f32, f32)> {
        if self.nx < 2 || self.ny < 2 || !(fi >= 0.0 && fj >= 0.0) {
            return None;
        }
        let i = (fi.floor() as usize).min(self.nx - 2);
        let j = (fj.floor() as usize).min(self.ny - 2);
        let ti = fi - i as f32;
        let tj = fj - j as f32;
        let (x00, y00) = self.node(i, j);
        let (x10, y10) = self.node(i + 1, j);
        let (x01, y01) = self.node(i, j + 1);
        let (x11, y11) = self.node(i + 1, j + 1);
        let x = (x00 * (1.0 - ti) + x10 * ti) * (1.0 - tj) + (x01 * (1.0 - ti) + x11 * ti) * tj;
        let y = (y00 * (1.0 - ti) + y10 * ti) * (1.0 - tj) + (y01 * (1.0 - ti) + y11 * ti) * tj;
        if x.is_finite() && y.is_finite() {
            Some((x, y))
        } else {
            None
        }
    }

    /// Same nodes with pixel coordinates multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            nx: self.nx,
            ny: self.ny,
            xs: self.xs.iter().map(|x| x * factor).collect(),
            ys: self.ys.iter().map(|y| y * factor).collect(),
        }
    }
}

/// Scalar values resampled onto a pixel raster. NaN where no data.
#[derive(Debug, Clone)]
pub struct ScalarRaster {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f32>,
}

impl ScalarRaster {
    /// Rasterize `values` (row-major on `grid`) onto a `width` x `height`
    /// raster. Pixel centres are sampled.
    pub fn rasterize(grid: &ScreenGrid, values: &[f32], width: usize, height: usize) -> Self {
        let mut raster = vec![f32::NAN; width * height];
        if grid.nx < 2 || grid.ny < 2 || values.len() != grid.nx * grid.ny {
            return Self {
                width,
                height,
                values: raster,
            };
        }

        for j in 0..grid.ny - 1 {
            for i in 0..grid.nx - 1 {
                let idx = |ii: usize, jj: usize| jj * grid.nx + ii;
                let corners = [
                    (grid.node(i, j), values[idx(i, j)]),
                    (grid.node(i + 1, j), values[idx(i + 1, j)]),
                    (grid.node(i + 1, j + 1), values[idx(i + 1, j + 1)]),
                    (grid.node(i, j + 1), values[idx(i, j + 1)]),
                ];
                if corners
                    .iter()
                    .any(|((x, y), v)| !x.is_finite() || !y.is_finite() || v.is_nan())
                {
                    continue;
                }
                fill_triangle(&mut raster, width, height, corners[0], corners[1], corners[2]);
                fill_triangle(&mut raster, width, height, corners[0], corners[2], corners[3]);
            }
        }

        Self {
            width,
            height,
            values: raster,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    /// Value at a pixel position, NaN outside the raster.
    pub fn sample(&self, px: f32, py: f32) -> f32 {
        if !(px >= 0.0 && py >= 0.0) {
            return f32::NAN;
        }
        let (x, y) = (px as usize, py as usize);
        if x >= self.width || y >= self.height {
            return f32::NAN;
        }
        self.get(x, y)
    }

    pub fn count_valid(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

type Vertex = ((f32, f32), f32);

fn fill_triangle(raster: &mut [f32], width: usize, height: usize, a: Vertex, b: Vertex, c: Vertex) {
    let ((ax, ay), av) = a;
    let ((bx, by), bv) = b;
    let ((cx, cy), cv) = c;

    let area = (bx - ax) * (cy - ay) - (cx - ax) * (by - ay);
    if area.abs() < 1e-12 {
        return;
    }

    let min_x = ax.min(bx).min(cx).floor().max(0.0) as usize;
    let min_y = ay.min(by).min(cy).floor().max(0.0) as usize;
    let max_x = ax.max(bx).max(cx).ceil().min(width as f32) as usize;
    let max_y = ay.max(by).max(cy).ceil().min(height as f32) as usize;
    let eps = -1e-4;

    for py in min_y..max_y {
        let y = py as f32 + 0.5;
        for px in min_x..max_x {
            let x = px as f32 + 0.5;
            let w0 = ((bx - x) * (cy - y) - (cx - x) * (by - y)) / area;
            let w1 = ((cx - x) * (ay - y) - (ax - x) * (cy - y)) / area;
            let w2 = 1.0 - w0 - w1;
            if w0 >= eps && w1 >= eps && w2 >= eps {
                raster[py * width + px] = w0 * av + w1 * bv + w2 * cv;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x3 nodes spaced 10 px apart starting at (0, 0).
    fn square_grid() -> ScreenGrid {
        let mut pos = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                pos.push((i as f32 * 10.0, j as f32 * 10.0));
            }
        }
        ScreenGrid::from_positions(3, 3, &pos)
    }

    #[test]
    fn test_constant_field_fills_hull() {
        let grid = square_grid();
        let raster = ScalarRaster::rasterize(&grid, &[7.0; 9], 30, 30);
        assert_eq!(raster.get(5, 5), 7.0);
        assert_eq!(raster.get(19, 19), 7.0);
        assert!(raster.get(25, 25).is_nan());
        assert_eq!(raster.count_valid(), 400);
    }

    #[test]
    fn test_linear_interpolation() {
        let grid = square_grid();
        // value = x pixel position
        let values: Vec<f32> = (0..9).map(|k| (k % 3) as f32 * 10.0).collect();
        let raster = ScalarRaster::rasterize(&grid, &values, 30, 30);
        assert!((raster.get(4, 12) - 4.5).abs() < 1e-4);
        assert!((raster.get(15, 3) - 15.5).abs() < 1e-4);
    }

    #[test]
    fn test_nan_corner_leaves_cell_empty() {
        let grid = square_grid();
        let mut values = [1.0f32; 9];
        values[0] = f32::NAN;
        let raster = ScalarRaster::rasterize(&grid, &values, 30, 30);
        assert!(raster.get(2, 2).is_nan());
        assert_eq!(raster.get(15, 15), 1.0);
    }

    #[test]
    fn test_bilinear_node_position() {
        let grid = square_grid();
        assert_eq!(grid.at(0.5, 1.5), Some((5.0, 15.0)));
        assert_eq!(grid.at(2.0, 2.0), Some((20.0, 20.0)));
        assert_eq!(grid.at(-1.0, 0.0), None);
    }

    #[test]
    fn test_sample_outside() {
        let raster = ScalarRaster {
            width: 2,
            height: 2,
            values: vec![1.0; 4],
        };
        assert!(raster.sample(-0.5, 0.0).is_nan());
        assert!(raster.sample(2.0, 0.0).is_nan());
        assert_eq!(raster.sample(1.9, 1.9), 1.0);
    }
}
