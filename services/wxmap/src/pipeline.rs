//! One product run: acquire, process, build the map, overlay and save.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use projection::{LambertConformal, MapProjection};
use renderer::{Colorbar, Decorations, Figure, FigureSpec, FontSet, MapCanvas, Suptitle, TextStyle, Titles};
use thredds_client::ThreddsClient;
use wx_common::{format_timestamp, format_valid_label, WxResult};

use crate::acquisition::{acquire, AcquiredData};
use crate::basemap::add_base_layers;
use crate::confidence::{add_confidence_layers, OverlayStatus};
use crate::config::{OverlayConfig, ProductConfig, RightTitle, WxmapConfig};
use crate::overlays::add_overlays;
use crate::processing::{process, ProcessedData};

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Render time; also the time requested from NCSS
    pub now: DateTime<Utc>,
    /// Overrides `output.dir` joined with the product file name
    pub output: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            now: Utc::now(),
            output: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
    /// Layer names in draw order
    pub layers: Vec<String>,
    pub overlays: Vec<OverlayStatus>,
}

/// Run one product end to end. Any required-resource failure aborts before
/// the output file is touched.
#[instrument(name = "run", skip_all, fields(product = %product.id))]
pub async fn run(config: &WxmapConfig, product: &ProductConfig, options: &RunOptions) -> WxResult<RunReport> {
    let acquired = if product.sources.is_empty() {
        AcquiredData::default()
    } else {
        let client = ThreddsClient::new(&config.http)?;
        acquire(&client, &product.sources, options.now).await?
    };
    let data = process(acquired, &product.sources, &product.derived)?;
    render(config, product, &data, options)
}

pub fn output_path(config: &WxmapConfig, product: &ProductConfig, options: &RunOptions) -> PathBuf {
    options
        .output
        .clone()
        .unwrap_or_else(|| config.output.dir.join(&product.output))
}

/// Everything after acquisition.
#[instrument(name = "render", skip_all, fields(product = %product.id))]
pub fn render(
    config: &WxmapConfig,
    product: &ProductConfig,
    data: &ProcessedData,
    options: &RunOptions,
) -> WxResult<RunReport> {
    let with_colorbar = product.overlays.iter().any(|o| matches!(o, OverlayConfig::Fill(f) if f.colorbar));
    let (figure, mut canvas) = build_map(config, product, with_colorbar)?;

    let bands = add_overlays(&mut canvas, &product.overlays, data)?;

    let overlays = match &product.confidence {
        Some(confidence) => {
            let dir = confidence_dir(config, confidence.dir.as_deref());
            add_confidence_layers(&mut canvas, confidence, &dir)
        }
        None => Vec::new(),
    };

    let decorations = decorations(product, data, options.now, bands.map(Colorbar::new));
    let fonts = FontSet::load(
        config.resources.fonts.regular.as_deref(),
        config.resources.fonts.bold.as_deref(),
    );
    let image = figure.render(&canvas, &decorations, &fonts)?;

    let output = output_path(config, product, options);
    image.save(&output)?;
    info!(
        path = %output.display(),
        width = image.width,
        height = image.height,
        layers = canvas.len(),
        "Product written"
    );

    Ok(RunReport {
        output,
        width: image.width,
        height: image.height,
        layers: canvas.layer_names().into_iter().map(str::to_string).collect(),
        overlays,
    })
}

/// Figure geometry plus the base layers.
#[instrument(name = "map", skip_all)]
pub fn build_map(config: &WxmapConfig, product: &ProductConfig, with_colorbar: bool) -> WxResult<(Figure, MapCanvas)> {
    let projection: Arc<dyn MapProjection> = Arc::new(LambertConformal::new(product.map.projection)?);
    let spec = FigureSpec {
        width: product.figure.width,
        height: product.figure.height,
        dpi: product.figure.dpi.unwrap_or(config.output.dpi),
        ..FigureSpec::default()
    };
    let extent = product.map.extent_bbox();
    let figure = Figure::new(spec, projection, extent, with_colorbar)?;

    let mut canvas = MapCanvas::new();
    add_base_layers(&mut canvas, &product.map.layers, &config.resources, &extent)?;
    Ok((figure, canvas))
}

fn confidence_dir(config: &WxmapConfig, dir: Option<&Path>) -> PathBuf {
    let base = &config.resources.forecast_dir;
    match dir {
        Some(d) if d.is_absolute() => d.to_path_buf(),
        Some(d) => base.join(d),
        None => base.clone(),
    }
}

fn right_title(product: &ProductConfig, data: &ProcessedData, now: DateTime<Utc>) -> String {
    match (product.titles.right, data.scan_time) {
        (RightTitle::ScanTime, Some(scan)) => scan.format("Valid Time: %Y-%m-%d %H:%M:%S").to_string(),
        _ => format_timestamp(&now),
    }
}

pub fn decorations(
    product: &ProductConfig,
    data: &ProcessedData,
    now: DateTime<Utc>,
    colorbar: Option<Colorbar>,
) -> Decorations {
    let mut style = TextStyle::new(product.titles.size);
    if product.titles.bold {
        style = style.bold();
    }
    let titles = Titles {
        left: Some(product.title.clone()),
        right: Some(right_title(product, data, now)),
        style,
        placement: product.titles.placement,
        ..Titles::default()
    };
    let suptitle = match (product.valid_label, data.valid_time) {
        (true, Some(valid)) => Some(Suptitle::new(format!("DATA VALID: {}", format_valid_label(&valid)))),
        _ => None,
    };
    Decorations {
        titles,
        suptitle,
        colorbar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_product_config;
    use chrono::TimeZone;
    use test_utils::time::{REFERENCE_TIME, REFERENCE_TITLE};
    use wx_common::time::parse_iso8601;

    const PRODUCT: &str = r#"
id: test
title: "TEST MAP"
output: TEST.png
map:
  projection:
    central_longitude: -98.0
    central_latitude: 35.0
    standard_parallels: [30.0, 60.0]
  extent: [-104.1, -95.5, 32.1, 39.1]
"#;

    #[test]
    fn test_render_timestamp_title() {
        let product = parse_product_config(PRODUCT).unwrap();
        let now = parse_iso8601(REFERENCE_TIME).unwrap();
        let d = decorations(&product, &ProcessedData::default(), now, None);
        assert_eq!(d.titles.left.as_deref(), Some("TEST MAP"));
        assert_eq!(d.titles.right.as_deref(), Some(REFERENCE_TITLE));
        assert!(d.titles.style.bold);
        assert!(d.suptitle.is_none());
    }

    #[test]
    fn test_scan_time_title_and_valid_label() {
        let mut product = parse_product_config(PRODUCT).unwrap();
        product.titles.right = RightTitle::ScanTime;
        product.valid_label = true;
        let data = ProcessedData {
            valid_time: Some(Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()),
            scan_time: Some(Utc.with_ymd_and_hms(2024, 3, 5, 13, 56, 17).unwrap()),
            ..ProcessedData::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        let d = decorations(&product, &data, now, None);
        assert_eq!(d.titles.right.as_deref(), Some("Valid Time: 2024-03-05 13:56:17"));
        assert_eq!(d.suptitle.map(|s| s.text).as_deref(), Some("DATA VALID: 12:00Z"));
    }

    #[test]
    fn test_scan_time_falls_back_to_render_time() {
        let mut product = parse_product_config(PRODUCT).unwrap();
        product.titles.right = RightTitle::ScanTime;
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap();
        assert_eq!(right_title(&product, &ProcessedData::default(), now), "03/05/2024 14:07Z");
    }

    #[test]
    fn test_confidence_dir_resolution() {
        let config = crate::config::parse_config("resources:\n  natural_earth_dir: /ne\n  forecast_dir: /srv/forecast\n").unwrap();
        assert_eq!(confidence_dir(&config, None), PathBuf::from("/srv/forecast"));
        assert_eq!(confidence_dir(&config, Some(Path::new("day1"))), PathBuf::from("/srv/forecast/day1"));
        assert_eq!(confidence_dir(&config, Some(Path::new("/tmp/x"))), PathBuf::from("/tmp/x"));
    }
}
