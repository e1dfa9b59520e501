//! NetCDF Subset Service query construction.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use wx_common::BoundingBox;

/// A grid subset request against one NCSS dataset endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NcssQuery {
    variables: Vec<String>,
    vertical_level: Option<f64>,
    time: Option<DateTime<Utc>>,
    bbox: Option<BoundingBox>,
    add_lat_lon: bool,
}

impl NcssQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.variables.push(name.into());
        self
    }

    pub fn variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables.extend(names.into_iter().map(Into::into));
        self
    }

    /// Vertical coordinate in the dataset's own units (Pa for isobaric
    /// levels, metres for height above ground).
    pub fn vertical_level(mut self, level: f64) -> Self {
        self.vertical_level = Some(level);
        self
    }

    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Geographic box in -180..180 longitudes; sent as 0..360.
    pub fn lon_lat_box(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn add_lat_lon(mut self) -> Self {
        self.add_lat_lon = true;
        self
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variables
    }

    /// Query string pairs in the order NCSS documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = self
            .variables
            .iter()
            .map(|v| ("var", v.clone()))
            .collect();

        if let Some(level) = self.vertical_level {
            params.push(("vertCoord", format_number(level)));
        }
        if let Some(time) = self.time {
            params.push(("time", time.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(bbox) = self.bbox {
            let bbox = bbox.to_positive_longitudes();
            params.push(("north", format_number(bbox.max_y)));
            params.push(("south", format_number(bbox.min_y)));
            params.push(("east", format_number(bbox.max_x)));
            params.push(("west", format_number(bbox.min_x)));
        }
        if self.add_lat_lon {
            params.push(("addLatLon", "true".to_string()));
        }
        params.push(("accept", "netcdf".to_string()));
        params
    }

    /// Full request URL for the dataset's NCSS endpoint.
    pub fn url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.params() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
