//! Field post-processing for one run.
//!
//! Order per grid field: smooth the raw values, derive quantities from the
//! smoothed fields, then convert units. Satellite reflectance is square-root
//! corrected.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use grid_processor::{convert_in_place, smooth_field, sqrt_reflectance, wind_speed, GaussianFilter};
use renderer::SatelliteImage;
use wx_common::{GriddedField, Unit, VectorOverlay, WxError, WxResult};

use crate::acquisition::AcquiredData;
use crate::config::{DerivedConfig, SourceConfig};

/// Plot-ready data, keyed by configured name.
#[derive(Debug, Default)]
pub struct ProcessedData {
    pub fields: HashMap<String, Arc<GriddedField>>,
    pub images: HashMap<String, Arc<SatelliteImage>>,
    /// Earliest valid time among grid fields
    pub valid_time: Option<DateTime<Utc>>,
    /// Scan start of the first satellite image carrying one
    pub scan_time: Option<DateTime<Utc>>,
}

impl ProcessedData {
    pub fn field(&self, name: &str) -> WxResult<&Arc<GriddedField>> {
        self.fields
            .get(name)
            .ok_or_else(|| WxError::MissingVariable(name.to_string()))
    }

    pub fn image(&self, name: &str) -> WxResult<&Arc<SatelliteImage>> {
        self.images
            .get(name)
            .ok_or_else(|| WxError::DataUnavailable(format!("no satellite image from source {name}")))
    }

    /// Wind components paired and converted to knots for barbs.
    pub fn wind_knots(&self, u: &str, v: &str) -> WxResult<VectorOverlay> {
        let mut u = GriddedField::clone(self.field(u)?);
        let mut v = GriddedField::clone(self.field(v)?);
        convert_in_place(&mut u, Unit::Knots)?;
        convert_in_place(&mut v, Unit::Knots)?;
        VectorOverlay::new(u, v)
    }
}

fn take_field(fields: &mut HashMap<String, GriddedField>, name: &str) -> WxResult<GriddedField> {
    fields
        .remove(name)
        .ok_or_else(|| WxError::MissingVariable(name.to_string()))
}

#[instrument(name = "processing", skip_all)]
pub fn process(
    acquired: AcquiredData,
    sources: &BTreeMap<String, SourceConfig>,
    derived: &[DerivedConfig],
) -> WxResult<ProcessedData> {
    let AcquiredData { mut fields, images } = acquired;

    // smooth raw fields, remembering the conversion each one wants
    let mut smoothed: HashMap<String, GriddedField> = HashMap::new();
    let mut conversions: Vec<(String, Unit)> = Vec::new();
    for source in sources.values() {
        let SourceConfig::Grid(grid) = source else {
            continue;
        };
        for config in &grid.fields {
            let raw = take_field(&mut fields, &config.name)?;
            let field = match config.smooth {
                Some(sigma) => smooth_field(&raw, &GaussianFilter::new(sigma))?,
                None => raw,
            };
            if let Some(unit) = config.convert {
                conversions.push((config.name.clone(), unit));
            }
            smoothed.insert(config.name.clone(), field);
        }
    }

    for config in derived {
        match config {
            DerivedConfig::WindSpeed { name, u, v, convert } => {
                let components = VectorOverlay::new(take_clone(&smoothed, u)?, take_clone(&smoothed, v)?)?;
                let mut speed = wind_speed(&components)?;
                speed.name = name.clone();
                debug!(field = %name, range = ?speed.finite_range(), "Derived wind speed");
                if let Some(unit) = convert {
                    conversions.push((name.clone(), *unit));
                }
                smoothed.insert(name.clone(), speed);
            }
        }
    }

    for (name, unit) in &conversions {
        if let Some(field) = smoothed.get_mut(name) {
            convert_in_place(field, *unit)?;
        }
    }

    let valid_time = {
        let mut times: Vec<_> = smoothed.values().filter_map(|f| f.valid_time).collect();
        times.sort();
        times.first().copied()
    };

    let mut processed = ProcessedData {
        fields: smoothed.into_iter().map(|(k, f)| (k, Arc::new(f))).collect(),
        valid_time,
        ..ProcessedData::default()
    };

    for (name, image) in images {
        let sqrt = matches!(sources.get(&name), Some(SourceConfig::Satellite(s)) if s.sqrt);
        let projection = image.projection()?;
        let mut values = image.values;
        if sqrt {
            sqrt_reflectance(&mut values);
        }
        if processed.scan_time.is_none() {
            processed.scan_time = image.start_time;
        }
        processed
            .images
            .insert(name, Arc::new(SatelliteImage::new(projection, values)));
    }

    Ok(processed)
}

fn take_clone(fields: &HashMap<String, GriddedField>, name: &str) -> WxResult<GriddedField> {
    fields
        .get(name)
        .cloned()
        .ok_or_else(|| WxError::MissingVariable(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldConfig, GridSource, LonLatBox};
    use test_utils::assert_approx_eq;
    use test_utils::{create_constant_grid, create_lon_lat_axes, create_temperature_grid};
    use thredds_client::SelectionPolicy;
    use wx_common::GeoGrid;

    const NX: usize = 20;
    const NY: usize = 16;

    fn grid() -> Arc<GeoGrid> {
        let (lon, lat) = create_lon_lat_axes(NX, NY, (-110.0, -90.0, 28.0, 44.0));
        Arc::new(GeoGrid::rectilinear(lon, lat))
    }

    fn field_config(name: &str, unit: Unit, smooth: Option<f64>, convert: Option<Unit>) -> FieldConfig {
        FieldConfig {
            variable: format!("{name}_var"),
            name: name.to_string(),
            unit: Some(unit),
            smooth,
            convert,
        }
    }

    fn sources(fields: Vec<FieldConfig>) -> BTreeMap<String, SourceConfig> {
        let mut map = BTreeMap::new();
        map.insert(
            "model".to_string(),
            SourceConfig::Grid(GridSource {
                catalog: "https://thredds.example/latest.xml".to_string(),
                selection: SelectionPolicy::Latest,
                vertical_level: None,
                bbox: LonLatBox {
                    north: 44.0,
                    south: 28.0,
                    east: 270.0,
                    west: 250.0,
                },
                fields,
            }),
        );
        map
    }

    fn acquired(fields: Vec<GriddedField>) -> AcquiredData {
        AcquiredData {
            fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect(),
            images: HashMap::new(),
        }
    }

    #[test]
    fn test_smooth_then_convert_temperature() {
        let g = grid();
        let raw = create_temperature_grid(NX, NY);
        let field = GriddedField::new("t2m", Unit::Kelvin, Arc::clone(&g), raw.clone(), None).unwrap();

        let cfg = sources(vec![field_config("t2m", Unit::Kelvin, Some(2.0), Some(Unit::Fahrenheit))]);
        let out = process(acquired(vec![field]), &cfg, &[]).unwrap();
        let t2m = out.field("t2m").unwrap();
        assert_eq!(t2m.unit, Unit::Fahrenheit);

        let expected = GaussianFilter::new(2.0).apply(&raw, NX, NY);
        for (got, k) in t2m.values.iter().zip(&expected) {
            assert_approx_eq!(*got, (k - 273.15) * 9.0 / 5.0 + 32.0, 1e-3);
        }
    }

    #[test]
    fn test_wind_speed_derived_in_knots() {
        let g = grid();
        let u = GriddedField::new("u", Unit::MetersPerSecond, Arc::clone(&g), create_constant_grid(NX, NY, 10.0), None).unwrap();
        let v = GriddedField::new("v", Unit::MetersPerSecond, Arc::clone(&g), create_constant_grid(NX, NY, 0.0), None).unwrap();

        let cfg = sources(vec![
            field_config("u", Unit::MetersPerSecond, Some(2.0), None),
            field_config("v", Unit::MetersPerSecond, Some(2.0), None),
        ]);
        let derived = vec![DerivedConfig::WindSpeed {
            name: "speed".to_string(),
            u: "u".to_string(),
            v: "v".to_string(),
            convert: Some(Unit::Knots),
        }];
        let out = process(acquired(vec![u, v]), &cfg, &derived).unwrap();

        let speed = out.field("speed").unwrap();
        assert_eq!(speed.unit, Unit::Knots);
        assert_approx_eq!(speed.values[0], 19.4384, 1e-3);
        // components stay in m/s unless asked
        assert_eq!(out.field("u").unwrap().unit, Unit::MetersPerSecond);

        let wind = out.wind_knots("u", "v").unwrap();
        assert_eq!(wind.unit(), Unit::Knots);
        assert_approx_eq!(wind.u.values[0], 19.4384, 1e-3);
    }

    #[test]
    fn test_missing_field_is_missing_variable() {
        let cfg = sources(vec![field_config("mslp", Unit::Pascal, None, Some(Unit::Hectopascal))]);
        let err = process(AcquiredData::default(), &cfg, &[]).unwrap_err();
        assert!(matches!(err, WxError::MissingVariable(ref name) if name == "mslp"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unsmoothed_field_passes_through() {
        let g = grid();
        let values = create_constant_grid(NX, NY, 101_325.0);
        let field = GriddedField::new("mslp", Unit::Pascal, g, values, None).unwrap();
        let cfg = sources(vec![field_config("mslp", Unit::Pascal, None, Some(Unit::Hectopascal))]);
        let out = process(acquired(vec![field]), &cfg, &[]).unwrap();
        assert_approx_eq!(out.field("mslp").unwrap().values[7], 1013.25, 1e-3);
    }

    #[test]
    fn test_valid_time_is_earliest_field_time() {
        use chrono::TimeZone;
        let g = grid();
        let early = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap();
        let a = GriddedField::new("a", Unit::Kelvin, Arc::clone(&g), create_constant_grid(NX, NY, 280.0), Some(late)).unwrap();
        let b = GriddedField::new("b", Unit::Kelvin, g, create_constant_grid(NX, NY, 280.0), Some(early)).unwrap();
        let cfg = sources(vec![
            field_config("a", Unit::Kelvin, None, None),
            field_config("b", Unit::Kelvin, None, None),
        ]);
        let out = process(acquired(vec![a, b]), &cfg, &[]).unwrap();
        assert_eq!(out.valid_time, Some(early));
    }
}
