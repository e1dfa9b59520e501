//! Separable Gaussian filter.
//!
//! Matches the usual scientific-Python definition: kernel radius
//! `round(truncate * sigma)`, weights `exp(-x² / 2σ²)` normalized to sum 1,
//! and "reflect" boundaries where the edge sample is repeated
//! (`d c b a | a b c d | d c b a`).
//!
//! A NaN anywhere inside a kernel window makes that output NaN.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use wx_common::{GriddedField, WxResult};

/// Gaussian filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianFilter {
    /// Standard deviation in grid cells.
    pub sigma: f64,
    /// Kernel half-width in standard deviations.
    #[serde(default = "default_truncate")]
    pub truncate: f64,
}

fn default_truncate() -> f64 {
    4.0
}

impl Default for GaussianFilter {
    fn default() -> Self {
        Self {
            sigma: 2.0,
            truncate: default_truncate(),
        }
    }
}

impl GaussianFilter {
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            ..Self::default()
        }
    }

    /// Kernel half-width in cells.
    pub fn radius(&self) -> usize {
        (self.truncate * self.sigma + 0.5) as usize
    }

    /// Normalized 1-D kernel of length `2 * radius + 1`.
    pub fn kernel(&self) -> Vec<f64> {
        let radius = self.radius() as i64;
        if self.sigma <= 0.0 {
            return vec![1.0];
        }
        let two_sigma_sq = 2.0 * self.sigma * self.sigma;
        let raw: Vec<f64> = (-radius..=radius)
            .map(|x| (-((x * x) as f64) / two_sigma_sq).exp())
            .collect();
        let sum: f64 = raw.iter().sum();
        raw.into_iter().map(|w| w / sum).collect()
    }

    /// Filter a row-major `width x height` array.
    pub fn apply(&self, data: &[f32], width: usize, height: usize) -> Vec<f32> {
        gaussian_filter(data, width, height, self)
    }
}

/// Map an out-of-range index into `[0, n)` with half-sample symmetric
/// reflection.
#[inline]
fn reflect_index(idx: i64, n: usize) -> usize {
    let n = n as i64;
    let period = 2 * n;
    let m = idx.rem_euclid(period);
    (if m >= n { period - 1 - m } else { m }) as usize
}

fn convolve_line(input: &[f64], output: &mut [f64], kernel: &[f64]) {
    let n = input.len();
    let radius = (kernel.len() / 2) as i64;
    for (i, out) in output.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, w) in kernel.iter().enumerate() {
            let src = reflect_index(i as i64 + k as i64 - radius, n);
            acc += w * input[src];
        }
        *out = acc;
    }
}

/// Apply a 2-D Gaussian filter to a row-major `width x height` grid.
///
/// Each axis is convolved separately. Rows are processed in parallel.
pub fn gaussian_filter(data: &[f32], width: usize, height: usize, filter: &GaussianFilter) -> Vec<f32> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    debug_assert_eq!(data.len(), width * height);

    let kernel = filter.kernel();
    if kernel.len() == 1 {
        return data.to_vec();
    }

    // Along x
    let mut pass_x = vec![0.0f64; width * height];
    pass_x
        .par_chunks_mut(width)
        .zip(data.par_chunks(width))
        .for_each(|(out_row, in_row)| {
            let row: Vec<f64> = in_row.iter().map(|&v| v as f64).collect();
            convolve_line(&row, out_row, &kernel);
        });

    // Along y, one column at a time
    let columns: Vec<Vec<f64>> = (0..width)
        .into_par_iter()
        .map(|i| {
            let column: Vec<f64> = (0..height).map(|j| pass_x[j * width + i]).collect();
            let mut out = vec![0.0f64; height];
            convolve_line(&column, &mut out, &kernel);
            out
        })
        .collect();

    let mut result = vec![0.0f32; width * height];
    for (i, column) in columns.iter().enumerate() {
        for (j, v) in column.iter().enumerate() {
            result[j * width + i] = *v as f32;
        }
    }
    result
}

/// Smooth a field, keeping its grid, unit and valid time.
pub fn smooth_field(field: &GriddedField, filter: &GaussianFilter) -> WxResult<GriddedField> {
    debug!(
        field = %field.name,
        sigma = filter.sigma,
        radius = filter.radius(),
        nx = field.nx(),
        ny = field.ny(),
        "Smoothing field"
    );
    let smoothed = filter.apply(&field.values, field.nx(), field.ny());
    field.with_values(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_default_radius_and_normalization() {
        let filter = GaussianFilter::default();
        assert_eq!(filter.radius(), 8);
        let kernel = filter.kernel();
        assert_eq!(kernel.len(), 17);
        assert_approx_eq!(kernel.iter().sum::<f64>(), 1.0, 1e-12);
        assert_approx_eq!(kernel[0], kernel[16], 1e-15);
        assert!(kernel[8] > kernel[7]);
    }

    #[test]
    fn test_reflect_index() {
        // d c b a | a b c d | d c b a
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(8, 4), 0);
        // Windows wider than the line keep folding
        assert_eq!(reflect_index(-9, 4), 0);
        assert_eq!(reflect_index(2, 1), 0);
    }

    #[test]
    fn test_constant_field_unchanged() {
        let data = vec![5.0f32; 20 * 12];
        let out = gaussian_filter(&data, 20, 12, &GaussianFilter::default());
        for v in out {
            assert_approx_eq!(v, 5.0f32, 1e-5);
        }
    }

    #[test]
    fn test_impulse_spreads_and_conserves_mass() {
        let (w, h) = (41, 41);
        let mut data = vec![0.0f32; w * h];
        data[20 * w + 20] = 1.0;
        let out = gaussian_filter(&data, w, h, &GaussianFilter::default());

        let total: f32 = out.iter().sum();
        assert_approx_eq!(total, 1.0f32, 1e-5);
        let peak = out[20 * w + 20];
        assert!(peak < 1.0 && peak > 0.0);
        // Symmetric response
        assert_approx_eq!(out[20 * w + 18], out[20 * w + 22], 1e-7);
        assert_approx_eq!(out[18 * w + 20], out[20 * w + 18], 1e-7);
        // Nothing beyond the kernel radius
        assert_eq!(out[20 * w + 29], 0.0);
    }

    #[test]
    fn test_nan_contaminates_window() {
        let (w, h) = (30, 30);
        let mut data = vec![1.0f32; w * h];
        data[15 * w + 15] = f32::NAN;
        let out = gaussian_filter(&data, w, h, &GaussianFilter::default());
        assert!(out[15 * w + 15].is_nan());
        assert!(out[15 * w + 20].is_nan());
        assert!(!out[15 * w + 24].is_nan());
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let out = gaussian_filter(&data, 4, 3, &GaussianFilter::new(0.0));
        assert_eq!(out, data);
    }
}
