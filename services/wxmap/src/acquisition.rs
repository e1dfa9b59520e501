//! Remote data acquisition.
//!
//! Sources are fetched one after another: catalog, dataset selection, then
//! either an NCSS subset (grids) or the whole file (satellite imagery).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use netcdf_parser::{read_goes_cmi, read_grid_fields, FieldRequest, GoesImage};
use thredds_client::{NcssQuery, ThreddsClient};
use wx_common::{GriddedField, WxError, WxResult};

use crate::config::{GridSource, SatelliteSource, SourceConfig};

/// Raw data for one run, keyed by configured field or source name.
#[derive(Debug, Default)]
pub struct AcquiredData {
    pub fields: HashMap<String, GriddedField>,
    pub images: HashMap<String, GoesImage>,
}

/// NCSS query for a grid source at `time`.
pub fn grid_query(source: &GridSource, time: DateTime<Utc>) -> NcssQuery {
    let mut query = NcssQuery::new()
        .variables(source.fields.iter().map(|f| f.variable.clone()))
        .time(time)
        .lon_lat_box(source.bbox.to_bbox())
        .add_lat_lon();
    if let Some(level) = source.vertical_level {
        query = query.vertical_level(level);
    }
    query
}

/// Fetch every source. The first failure aborts the run.
#[instrument(name = "acquisition", skip_all, fields(sources = sources.len()))]
pub async fn acquire(
    client: &ThreddsClient,
    sources: &BTreeMap<String, SourceConfig>,
    time: DateTime<Utc>,
) -> WxResult<AcquiredData> {
    let mut data = AcquiredData::default();
    for (name, source) in sources {
        match source {
            SourceConfig::Grid(grid) => {
                for field in acquire_grid(client, name, grid, time).await? {
                    data.fields.insert(field.name.clone(), field);
                }
            }
            SourceConfig::Satellite(sat) => {
                let image = acquire_satellite(client, name, sat).await?;
                data.images.insert(name.clone(), image);
            }
        }
    }
    Ok(data)
}

async fn acquire_grid(
    client: &ThreddsClient,
    name: &str,
    source: &GridSource,
    time: DateTime<Utc>,
) -> WxResult<Vec<GriddedField>> {
    let selected = client.select_dataset(&source.catalog, source.selection).await?;
    let query = grid_query(source, time);
    let payload = client.fetch_subset(&selected, &query).await?;
    info!(source = name, dataset = %selected.dataset.name, bytes = payload.len(), "Fetched grid subset");

    let requests: Vec<FieldRequest<'_>> = source
        .fields
        .iter()
        .map(|f| match f.unit {
            Some(unit) => FieldRequest::with_unit(&f.variable, unit),
            None => FieldRequest::new(&f.variable),
        })
        .collect();
    let fields = read_grid_fields(&payload, &requests)?;
    if fields.len() != source.fields.len() {
        return Err(WxError::DataReadError(format!(
            "{}: expected {} fields, read {}",
            name,
            source.fields.len(),
            fields.len()
        )));
    }

    Ok(fields
        .into_iter()
        .zip(&source.fields)
        .map(|(mut field, config)| {
            field.name = config.name.clone();
            field
        })
        .collect())
}

async fn acquire_satellite(client: &ThreddsClient, name: &str, source: &SatelliteSource) -> WxResult<GoesImage> {
    let selected = client.select_dataset(&source.catalog, source.selection).await?;
    let payload = client.download(&selected).await?;
    let image = read_goes_cmi(&payload)?;
    info!(
        source = name,
        dataset = %selected.dataset.name,
        nx = image.nx,
        ny = image.ny,
        band = ?image.band_id,
        "Fetched satellite image"
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldConfig, LonLatBox};
    use chrono::TimeZone;
    use thredds_client::SelectionPolicy;

    fn temperature_source(level: Option<f64>) -> GridSource {
        GridSource {
            catalog: "https://thredds.example/catalog/HRRR/latest.xml".to_string(),
            selection: SelectionPolicy::Latest,
            vertical_level: level,
            bbox: LonLatBox {
                north: 44.0,
                south: 27.0,
                east: 271.0,
                west: 250.0,
            },
            fields: vec![FieldConfig {
                variable: "Temperature_height_above_ground".to_string(),
                name: "t2m".to_string(),
                unit: None,
                smooth: Some(2.0),
                convert: None,
            }],
        }
    }

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_grid_query_parameters() {
        let time = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let query = grid_query(&temperature_source(Some(2.0)), time);
        let params = query.params();
        assert_eq!(param(&params, "var"), Some("Temperature_height_above_ground"));
        assert_eq!(param(&params, "north"), Some("44"));
        assert_eq!(param(&params, "west"), Some("250"));
        assert_eq!(param(&params, "addLatLon"), Some("true"));
        assert!(param(&params, "vertCoord").is_some());
    }

    #[test]
    fn test_grid_query_without_level() {
        let time = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let params = grid_query(&temperature_source(None), time).params();
        assert!(param(&params, "vertCoord").is_none());
    }
}
