//! Quantities derived from acquired fields.

use rayon::prelude::*;

use wx_common::{GriddedField, VectorOverlay, WxResult};

/// Wind speed `sqrt(u² + v²)` in the component unit.
///
/// Call this on smoothed components, then convert the result.
pub fn wind_speed(wind: &VectorOverlay) -> WxResult<GriddedField> {
    let speed: Vec<f32> = wind
        .u
        .values
        .par_iter()
        .zip(wind.v.values.par_iter())
        .map(|(&u, &v)| u.hypot(v))
        .collect();

    let mut field = wind.u.with_values(speed)?;
    field.name = format!("speed({},{})", wind.u.name, wind.v.name);
    Ok(field)
}

/// Brightness correction for visible reflectance: `sqrt(r)`.
///
/// Negative reflectance (sensor noise near the terminator) clips to zero.
pub fn sqrt_reflectance(values: &mut [f32]) {
    values.par_iter_mut().for_each(|v| {
        if v.is_finite() {
            *v = v.max(0.0).sqrt();
        }
    });
}
