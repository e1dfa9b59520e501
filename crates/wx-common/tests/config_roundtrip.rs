//! Shared types as they appear in product configuration files.

use wx_common::{BoundingBox, Unit};

#[test]
fn test_units_deserialize_from_yaml_symbols() {
    let units: Vec<Unit> = serde_yaml::from_str("[K, degF, m/s, kt, Pa, hPa, m]").unwrap();
    assert_eq!(
        units,
        vec![
            Unit::Kelvin,
            Unit::Fahrenheit,
            Unit::MetersPerSecond,
            Unit::Knots,
            Unit::Pascal,
            Unit::Hectopascal,
            Unit::Meters
        ]
    );
}

#[test]
fn test_bbox_deserialize() {
    let bbox: BoundingBox =
        serde_yaml::from_str("{min_x: -120, min_y: 20, max_x: -70, max_y: 50}").unwrap();
    assert_eq!(bbox.width(), 50.0);
    assert_eq!(bbox.height(), 30.0);
}
