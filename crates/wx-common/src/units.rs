//! Physical units and the conversions between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{WxError, WxResult};

/// Physical unit carried by a gridded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "K")]
    Kelvin,
    #[serde(rename = "degC")]
    Celsius,
    #[serde(rename = "degF")]
    Fahrenheit,
    #[serde(rename = "m/s")]
    MetersPerSecond,
    #[serde(rename = "kt")]
    Knots,
    #[serde(rename = "Pa")]
    Pascal,
    #[serde(rename = "hPa")]
    Hectopascal,
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "1")]
    Dimensionless,
}

/// Quantity a unit measures; conversions only exist within one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    Speed,
    Pressure,
    Length,
    Dimensionless,
}

impl Unit {
    pub fn quantity(&self) -> Quantity {
        match self {
            Unit::Kelvin | Unit::Celsius | Unit::Fahrenheit => Quantity::Temperature,
            Unit::MetersPerSecond | Unit::Knots => Quantity::Speed,
            Unit::Pascal | Unit::Hectopascal => Quantity::Pressure,
            Unit::Meters => Quantity::Length,
            Unit::Dimensionless => Quantity::Dimensionless,
        }
    }

    /// Short label used in legends and logs.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Kelvin => "K",
            Unit::Celsius => "degC",
            Unit::Fahrenheit => "degF",
            Unit::MetersPerSecond => "m/s",
            Unit::Knots => "kt",
            Unit::Pascal => "Pa",
            Unit::Hectopascal => "hPa",
            Unit::Meters => "m",
            Unit::Dimensionless => "1",
        }
    }

    /// Interpret a netCDF `units` attribute.
    ///
    /// Returns None for unit strings outside the supported table so callers
    /// can decide whether an unknown unit is fatal.
    pub fn from_attribute(s: &str) -> Option<Unit> {
        let normalized = s.trim();
        let unit = match normalized {
            "K" | "kelvin" | "Kelvin" | "degK" => Unit::Kelvin,
            "degC" | "C" | "celsius" | "Celsius" | "degree_Celsius" => Unit::Celsius,
            "degF" | "F" | "fahrenheit" | "Fahrenheit" => Unit::Fahrenheit,
            "m/s" | "m s-1" | "m.s-1" | "m s**-1" | "meters/second" => Unit::MetersPerSecond,
            "kt" | "kts" | "knot" | "knots" => Unit::Knots,
            "Pa" | "pascal" | "Pascal" => Unit::Pascal,
            "hPa" | "mb" | "mbar" | "millibar" => Unit::Hectopascal,
            "m" | "gpm" | "meters" | "metre" | "meter" => Unit::Meters,
            "1" | "" | "dimensionless" | "fraction" | "none" => Unit::Dimensionless,
            _ => return None,
        };
        Some(unit)
    }

    /// Affine map `value * scale + offset` from this unit to `target`.
    pub fn conversion_to(&self, target: Unit) -> WxResult<Conversion> {
        if self.quantity() != target.quantity() {
            return Err(WxError::IncompatibleUnits {
                from: *self,
                to: target,
            });
        }
        if *self == target {
            return Ok(Conversion::IDENTITY);
        }
        // Both units expressed relative to the canonical unit of the quantity,
        // then composed: base = a_s * x + b_s, target = (base - b_t) / a_t.
        let (a_s, b_s) = self.to_base();
        let (a_t, b_t) = target.to_base();
        Ok(Conversion {
            scale: a_s / a_t,
            offset: (b_s - b_t) / a_t,
        })
    }

    /// Convert a single value into `target`.
    pub fn convert(&self, value: f64, target: Unit) -> WxResult<f64> {
        Ok(self.conversion_to(target)?.apply(value))
    }

    fn to_base(self) -> (f64, f64) {
        match self {
            Unit::Kelvin => (1.0, 0.0),
            Unit::Celsius => (1.0, 273.15),
            Unit::Fahrenheit => (5.0 / 9.0, 273.15 - 32.0 * 5.0 / 9.0),
            Unit::MetersPerSecond => (1.0, 0.0),
            Unit::Knots => (1852.0 / 3600.0, 0.0),
            Unit::Pascal => (1.0, 0.0),
            Unit::Hectopascal => (100.0, 0.0),
            Unit::Meters => (1.0, 0.0),
            Unit::Dimensionless => (1.0, 0.0),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = WxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::from_attribute(s).ok_or_else(|| WxError::InvalidConfig(format!("unknown unit '{}'", s)))
    }
}

/// Linear unit transform: `value * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub scale: f64,
    pub offset: f64,
}

impl Conversion {
    pub const IDENTITY: Conversion = Conversion {
        scale: 1.0,
        offset: 0.0,
    };

    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    #[inline]
    pub fn apply_f32(&self, value: f32) -> f32 {
        (value as f64 * self.scale + self.offset) as f32
    }

    pub fn is_identity(&self) -> bool {
        *self == Conversion::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelvin_fahrenheit_round_trip() {
        for k in [0.0, 233.15, 273.15, 288.7, 310.0] {
            let f = Unit::Kelvin.convert(k, Unit::Fahrenheit).unwrap();
            let back = Unit::Fahrenheit.convert(f, Unit::Kelvin).unwrap();
            assert!((back - k).abs() < 1e-6, "{} -> {} -> {}", k, f, back);
        }
    }

    #[test]
    fn test_known_temperatures() {
        let f = Unit::Kelvin.convert(273.15, Unit::Fahrenheit).unwrap();
        assert!((f - 32.0).abs() < 1e-9);
        let c = Unit::Fahrenheit.convert(212.0, Unit::Celsius).unwrap();
        assert!((c - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_and_pressure() {
        let kt = Unit::MetersPerSecond.convert(10.0, Unit::Knots).unwrap();
        assert!((kt - 19.438_444_924).abs() < 1e-6);
        let hpa = Unit::Pascal.convert(101_325.0, Unit::Hectopascal).unwrap();
        assert!((hpa - 1013.25).abs() < 1e-9);
    }

    #[test]
    fn test_incompatible() {
        assert!(matches!(
            Unit::Kelvin.conversion_to(Unit::Knots),
            Err(WxError::IncompatibleUnits { .. })
        ));
        assert!(Unit::Meters.conversion_to(Unit::Meters).unwrap().is_identity());
    }

    #[test]
    fn test_attribute_parsing() {
        assert_eq!(Unit::from_attribute("m s-1"), Some(Unit::MetersPerSecond));
        assert_eq!(Unit::from_attribute("gpm"), Some(Unit::Meters));
        assert_eq!(Unit::from_attribute("furlongs"), None);
        assert!("parsecs".parse::<Unit>().is_err());
    }
}
