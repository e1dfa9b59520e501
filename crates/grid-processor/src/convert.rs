//! Unit conversion applied to whole fields.

use tracing::debug;

use wx_common::{GriddedField, Unit, WxResult};

/// Convert a field into `target`, returning a new field.
///
/// Fails with `IncompatibleUnits` across quantities (e.g. K -> kt).
pub fn convert_field(field: &GriddedField, target: Unit) -> WxResult<GriddedField> {
    let mut out = field.clone();
    convert_in_place(&mut out, target)?;
    Ok(out)
}

/// Convert a field into `target` without allocating.
pub fn convert_in_place(field: &mut GriddedField, target: Unit) -> WxResult<()> {
    let conversion = field.unit.conversion_to(target)?;
    if !conversion.is_identity() {
        debug!(field = %field.name, from = %field.unit, to = %target, "Converting units");
        for v in field.values.iter_mut() {
            *v = conversion.apply_f32(*v);
        }
    }
    field.unit = target;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use test_utils::assert_approx_eq;
    use wx_common::{GeoGrid, WxError};

    fn field(unit: Unit, values: Vec<f32>) -> GriddedField {
        let grid = Arc::new(GeoGrid::rectilinear(vec![0.0, 1.0], vec![0.0, 1.0]));
        GriddedField::new("f", unit, grid, values, None).unwrap()
    }

    #[test]
    fn test_kelvin_to_fahrenheit_keeps_nan() {
        let f = convert_field(&field(Unit::Kelvin, vec![273.15, 300.0, f32::NAN, 255.0]), Unit::Fahrenheit)
            .unwrap();
        assert_eq!(f.unit, Unit::Fahrenheit);
        assert_approx_eq!(f.values[0], 32.0, 1e-3);
        assert_approx_eq!(f.values[1], 80.33, 1e-2);
        assert!(f.values[2].is_nan());
    }

    #[test]
    fn test_pascal_to_hectopascal() {
        let mut f = field(Unit::Pascal, vec![101_325.0, 100_000.0, 98_000.0, 102_000.0]);
        convert_in_place(&mut f, Unit::Hectopascal).unwrap();
        assert_approx_eq!(f.values[0], 1013.25, 1e-3);
        assert_approx_eq!(f.values[2], 980.0, 1e-3);
    }

    #[test]
    fn test_incompatible_leaves_field_untouched() {
        let mut f = field(Unit::Kelvin, vec![1.0; 4]);
        let err = convert_in_place(&mut f, Unit::Knots).unwrap_err();
        assert!(matches!(err, WxError::IncompatibleUnits { .. }));
        assert_eq!(f.unit, Unit::Kelvin);
        assert_eq!(f.values, vec![1.0; 4]);
    }
}
