//! Test data generators for creating synthetic weather-like data.
//!
//! All grids are row-major (`row * width + col`), row 0 southernmost, which
//! matches how NCSS subsets are laid out after reading.

use std::f32::consts::PI;

/// Lon/lat axes for a regular grid over `(west, east, south, north)`.
///
/// Longitudes are returned in the 0-360 convention used by NCSS subsets.
pub fn create_lon_lat_axes(
    width: usize,
    height: usize,
    extent: (f64, f64, f64, f64),
) -> (Vec<f64>, Vec<f64>) {
    let (west, east, south, north) = extent;
    let step = |a: f64, b: f64, n: usize, k: usize| {
        if n <= 1 {
            a
        } else {
            a + (b - a) * k as f64 / (n - 1) as f64
        }
    };
    let lon = (0..width)
        .map(|i| step(west, east, width, i).rem_euclid(360.0))
        .collect();
    let lat = (0..height).map(|j| step(south, north, height, j)).collect();
    (lon, lat)
}

/// Creates a test grid with temperature-like values in Kelvin.
///
/// The values range from approximately 250K (-23C) to 310K (37C), cold in
/// the north-west and warm in the south-east.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = 1.0 - row as f32 / height.max(1) as f32;
            data.push(250.0 + x_factor * 30.0 + y_factor * 30.0);
        }
    }
    data
}

/// Creates a 500 hPa geopotential height-like grid in metres.
///
/// Heights fall poleward from ~5900 m to ~5300 m with a long-wave trough
/// pattern superimposed, so both contours and gradients are non-trivial.
pub fn create_height_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let fx = col as f32 / width.max(1) as f32;
            let fy = row as f32 / height.max(1) as f32;
            let base = 5900.0 - 600.0 * fy;
            let wave = 120.0 * (fx * 2.0 * PI * 1.5).sin() * (fy * PI).sin();
            data.push(base + wave);
        }
    }
    data
}

/// Creates a U-component wind grid (west-east component) in m/s.
///
/// Westerlies strengthen towards the middle rows, like a jet axis.
pub fn create_u_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let lat_factor = (row as f32 / height.max(1) as f32 - 0.5) * 2.0; // -1 to 1
        let u = 40.0 * (1.0 - lat_factor * lat_factor);
        data.extend(std::iter::repeat(u).take(width));
    }
    data
}

/// Creates a V-component wind grid (south-north component) in m/s.
pub fn create_v_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let lon_factor = (col as f32 / width.max(1) as f32 - 0.5) * 2.0; // -1 to 1
            data.push(lon_factor * 15.0);
        }
    }
    data
}

/// Creates visible reflectance in [0, 1] with bright cloud bands.
pub fn create_reflectance_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let fx = col as f32 / width.max(1) as f32;
            let fy = row as f32 / height.max(1) as f32;
            let cloud = ((fx * 3.0 + fy * 2.0) * PI).sin().max(0.0);
            data.push(0.05 + 0.85 * cloud * cloud);
        }
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with NaN values at specified `(col, row)` positions,
/// zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Creates RGBA pixel data for a simple gradient test pattern.
pub fn create_test_rgba_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = ((x as f32 / width as f32) * 255.0) as u8;
            let g = ((y as f32 / height as f32) * 255.0) as u8;
            pixels.extend_from_slice(&[r, g, 128, 255]);
        }
    }
    pixels
}
