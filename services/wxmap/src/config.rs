//! Configuration loader for wxmap
//!
//! Loads and validates YAML configuration files for:
//! - Global settings (wxmap.yaml): resource locations, HTTP, output
//! - Product definitions (products/*.yaml), one map per file
//!
//! Supports environment variable substitution using ${VAR} syntax.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use projection::LambertParams;
use renderer::{
    BarbSpec, Color, ContourSpec, FillSpec, HatchSpec, ImagerySpec, PolygonStyle, TitlePlacement,
};
use thredds_client::{ClientConfig, SelectionPolicy};
use wx_common::{BoundingBox, Unit};

use crate::basemap::BaseLayer;

// ============================================================================
// Global Configuration (wxmap.yaml)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WxmapConfig {
    pub resources: ResourceConfig,
    #[serde(default)]
    pub http: ClientConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Static map resources on local disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Directory holding the Natural Earth shapefiles (`ne_50m_land.shp`, ...)
    pub natural_earth_dir: PathBuf,
    #[serde(default = "default_scale")]
    pub natural_earth_scale: String,
    #[serde(default)]
    pub counties: Option<PathBuf>,
    #[serde(default)]
    pub forecast_area: Option<PathBuf>,
    /// Where forecasters drop the confidence shapefiles
    #[serde(default = "default_forecast_dir")]
    pub forecast_dir: PathBuf,
    #[serde(default)]
    pub fonts: FontConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontConfig {
    #[serde(default)]
    pub regular: Option<PathBuf>,
    #[serde(default)]
    pub bold: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_dpi")]
    pub dpi: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            dpi: default_dpi(),
        }
    }
}

fn default_scale() -> String {
    "50m".to_string()
}

fn default_forecast_dir() -> PathBuf {
    PathBuf::from("forecast")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_dpi() -> f32 {
    300.0
}

impl WxmapConfig {
    /// Make every relative path absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        let res = &mut self.resources;
        resolve(&mut res.natural_earth_dir);
        resolve(&mut res.forecast_dir);
        res.counties.iter_mut().for_each(resolve);
        res.forecast_area.iter_mut().for_each(resolve);
        res.fonts.regular.iter_mut().for_each(resolve);
        res.fonts.bold.iter_mut().for_each(resolve);
        resolve(&mut self.output.dir);
    }
}

// ============================================================================
// Product Configuration (products/*.yaml)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    pub id: String,
    /// Left title
    pub title: String,
    /// Output file name, relative to the output directory
    pub output: String,
    #[serde(default)]
    pub figure: FigureConfig,
    #[serde(default)]
    pub titles: TitleConfig,
    pub map: MapConfig,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
    #[serde(default)]
    pub derived: Vec<DerivedConfig>,
    #[serde(default)]
    pub overlays: Vec<OverlayConfig>,
    #[serde(default)]
    pub confidence: Option<ConfidenceConfig>,
    /// Stamp "DATA VALID: HH:MMZ" from the data valid time
    #[serde(default)]
    pub valid_label: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureConfig {
    /// Inches
    #[serde(default = "default_figure_size")]
    pub width: f32,
    #[serde(default = "default_figure_size")]
    pub height: f32,
    /// Falls back to `output.dpi`
    #[serde(default)]
    pub dpi: Option<f32>,
}

fn default_figure_size() -> f32 {
    10.0
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: default_figure_size(),
            height: default_figure_size(),
            dpi: None,
        }
    }
}

/// What goes in the right-hand title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RightTitle {
    /// Render time, `MM/DD/YYYY HH:MMZ`
    #[default]
    RenderTime,
    /// "Valid Time: " and the satellite scan start
    ScanTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleConfig {
    #[serde(default)]
    pub placement: TitlePlacement,
    #[serde(default = "default_title_size")]
    pub size: f32,
    #[serde(default = "default_true")]
    pub bold: bool,
    #[serde(default)]
    pub right: RightTitle,
}

fn default_title_size() -> f32 {
    8.0
}

fn default_true() -> bool {
    true
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            placement: TitlePlacement::default(),
            size: default_title_size(),
            bold: true,
            right: RightTitle::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub projection: LambertParams,
    /// `[west, east, south, north]` in degrees
    pub extent: [f64; 4],
    #[serde(default)]
    pub layers: Vec<BaseLayerConfig>,
}

impl MapConfig {
    pub fn extent_bbox(&self) -> BoundingBox {
        BoundingBox::from_extent(self.extent)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseLayerConfig {
    pub layer: BaseLayer,
    pub style: PolygonStyle,
}

// ----------------------------------------------------------------------------
// Data sources
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Model grid subset through NCSS
    Grid(GridSource),
    /// Whole GOES CMI file through HTTPServer
    Satellite(SatelliteSource),
}

impl SourceConfig {
    pub fn catalog(&self) -> &str {
        match self {
            SourceConfig::Grid(g) => &g.catalog,
            SourceConfig::Satellite(s) => &s.catalog,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSource {
    pub catalog: String,
    #[serde(default)]
    pub selection: SelectionPolicy,
    /// Pa for isobaric levels, metres for height above ground
    #[serde(default)]
    pub vertical_level: Option<f64>,
    pub bbox: LonLatBox,
    pub fields: Vec<FieldConfig>,
}

/// NCSS horizontal subset, longitudes 0-360.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLatBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl LonLatBox {
    pub fn to_bbox(&self) -> BoundingBox {
        BoundingBox::new(self.west, self.south, self.east, self.north)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Variable name in the dataset
    pub variable: String,
    /// Name overlays refer to
    pub name: String,
    /// Assumed when the file carries no recognised `units`
    #[serde(default)]
    pub unit: Option<Unit>,
    /// Gaussian sigma in grid cells
    #[serde(default)]
    pub smooth: Option<f64>,
    /// Applied after smoothing and derivation
    #[serde(default)]
    pub convert: Option<Unit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteSource {
    pub catalog: String,
    #[serde(default)]
    pub selection: SelectionPolicy,
    /// Square-root reflectance correction
    #[serde(default = "default_true")]
    pub sqrt: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivedConfig {
    WindSpeed {
        name: String,
        u: String,
        v: String,
        #[serde(default)]
        convert: Option<Unit>,
    },
}

impl DerivedConfig {
    pub fn name(&self) -> &str {
        match self {
            DerivedConfig::WindSpeed { name, .. } => name,
        }
    }
}

// ----------------------------------------------------------------------------
// Overlays
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayConfig {
    Fill(FillOverlay),
    Contours(ContourOverlay),
    Barbs(BarbOverlay),
    Imagery(ImageryOverlay),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillOverlay {
    pub field: String,
    pub style: FillSpec,
    #[serde(default)]
    pub colorbar: bool,
    #[serde(default)]
    pub z: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourOverlay {
    pub field: String,
    pub style: ContourSpec,
    #[serde(default)]
    pub z: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarbOverlay {
    pub u: String,
    pub v: String,
    #[serde(default)]
    pub style: BarbSpec,
    #[serde(default)]
    pub z: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageryOverlay {
    pub source: String,
    #[serde(default)]
    pub style: ImagerySpec,
    #[serde(default)]
    pub z: Option<i32>,
}

// ----------------------------------------------------------------------------
// Confidence overlays
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Overrides `resources.forecast_dir`
    #[serde(default)]
    pub dir: Option<PathBuf>,
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub highlight: Option<HighlightConfig>,
    #[serde(default)]
    pub label: RegionLabelConfig,
    #[serde(default)]
    pub outline: OutlineConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Text drawn at the region anchor.
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "LOW",
            ConfidenceLevel::Medium => "MED",
            ConfidenceLevel::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub level: ConfidenceLevel,
    /// Shapefile name inside the forecast directory
    pub file: String,
    pub color: Color,
    pub anchor: AnchorRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    pub file: String,
    /// Checked for presence only; the hatch has no label
    #[serde(default)]
    pub anchor: Option<AnchorRef>,
    #[serde(default)]
    pub hatch: HatchSpec,
}

/// `last`, counting back from the final record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LastShape {
    #[serde(rename = "last")]
    Last,
}

/// Which record holds the anchor vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeIndex {
    At(usize),
    Last(LastShape),
}

impl Default for ShapeIndex {
    fn default() -> Self {
        ShapeIndex::Last(LastShape::Last)
    }
}

impl ShapeIndex {
    /// Index in the form `Shapefile::shape_at` takes.
    pub fn as_signed(&self) -> isize {
        match self {
            ShapeIndex::At(i) => *i as isize,
            ShapeIndex::Last(_) => -1,
        }
    }
}

/// A vertex of one shape, used to place the region label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRef {
    #[serde(default)]
    pub shape: ShapeIndex,
    pub point: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionLabelConfig {
    /// Degrees added to the anchor (lon, lat)
    #[serde(default = "default_label_offset")]
    pub offset: [f64; 2],
    #[serde(default = "default_label_size")]
    pub size: f32,
    #[serde(default = "default_halo_color")]
    pub halo_color: Color,
    #[serde(default = "default_label_halo")]
    pub halo_width: f32,
}

fn default_label_offset() -> [f64; 2] {
    [-0.1, -0.1]
}

fn default_label_size() -> f32 {
    7.0
}

fn default_halo_color() -> Color {
    Color::BLACK
}

fn default_label_halo() -> f32 {
    3.0
}

impl Default for RegionLabelConfig {
    fn default() -> Self {
        Self {
            offset: default_label_offset(),
            size: default_label_size(),
            halo_color: default_halo_color(),
            halo_width: default_label_halo(),
        }
    }
}

/// Dark halo stroke under a thin stroke in the region colour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineConfig {
    #[serde(default = "default_halo_color")]
    pub halo_color: Color,
    #[serde(default = "default_outline_halo")]
    pub halo_width: f32,
    #[serde(default = "default_outline_width")]
    pub width: f32,
}

fn default_outline_halo() -> f32 {
    3.0
}

fn default_outline_width() -> f32 {
    1.0
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            halo_color: default_halo_color(),
            halo_width: default_outline_halo(),
            width: default_outline_width(),
        }
    }
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Load and parse wxmap.yaml with environment variable substitution.
///
/// Relative resource paths are resolved against the file's directory.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<WxmapConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;

    let mut config = parse_config(&content)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);

    Ok(config)
}

/// Parse wxmap.yaml content; paths are left as written.
pub fn parse_config(content: &str) -> Result<WxmapConfig> {
    let expanded = expand_env_vars(content)?;

    let config: WxmapConfig = serde_yaml::from_str(&expanded)
        .with_context(|| "Failed to parse wxmap config YAML")?;

    validate_config(&config)?;

    Ok(config)
}

/// Load and parse a product configuration YAML file
pub fn load_product_config<P: AsRef<Path>>(path: P) -> Result<ProductConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read product config from {:?}", path))?;

    parse_product_config(&content)
        .with_context(|| format!("Failed to load product config from {:?}", path))
}

pub fn parse_product_config(content: &str) -> Result<ProductConfig> {
    let expanded = expand_env_vars(content)?;

    let config: ProductConfig =
        serde_yaml::from_str(&expanded).with_context(|| "Failed to parse product config YAML")?;

    validate_product_config(&config)?;

    Ok(config)
}

/// Load all product configs from a directory, keyed by product id
pub fn load_product_configs<P: AsRef<Path>>(products_dir: P) -> Result<BTreeMap<String, ProductConfig>> {
    let mut products = BTreeMap::new();

    let entries = fs::read_dir(products_dir.as_ref())
        .with_context(|| format!("Failed to read products directory {:?}", products_dir.as_ref()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if matches!(path.extension().and_then(|s| s.to_str()), Some("yaml" | "yml")) {
            let config = load_product_config(&path)?;
            anyhow::ensure!(
                !products.contains_key(&config.id),
                "Duplicate product id '{}' in {:?}",
                config.id,
                path
            );
            products.insert(config.id.clone(), config);
        }
    }

    Ok(products)
}

/// Find one product by id
pub fn find_product<P: AsRef<Path>>(products_dir: P, id: &str) -> Result<ProductConfig> {
    let mut products = load_product_configs(&products_dir)?;
    products.remove(id).with_context(|| {
        format!(
            "Unknown product '{}' (known: {})",
            id,
            products.keys().cloned().collect::<Vec<_>>().join(", ")
        )
    })
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            let value = resolve_var_expr(&var_expr)?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_config(config: &WxmapConfig) -> Result<()> {
    anyhow::ensure!(
        config.output.dpi > 0.0,
        "output.dpi must be positive, got {}",
        config.output.dpi
    );

    anyhow::ensure!(
        config.http.timeout_secs > 0,
        "http.timeout_secs must be positive"
    );

    anyhow::ensure!(
        !config.resources.natural_earth_scale.is_empty(),
        "resources.natural_earth_scale must not be empty"
    );

    Ok(())
}

fn validate_product_config(config: &ProductConfig) -> Result<()> {
    anyhow::ensure!(!config.id.is_empty(), "Product id must not be empty");

    anyhow::ensure!(
        config.output.ends_with(".png"),
        "Product {}: output must be a .png file name, got {}",
        config.id,
        config.output
    );

    let [west, east, south, north] = config.map.extent;
    anyhow::ensure!(
        west < east && south < north,
        "Product {}: extent must be [west, east, south, north], got {:?}",
        config.id,
        config.map.extent
    );

    anyhow::ensure!(
        config.figure.width > 0.0 && config.figure.height > 0.0,
        "Product {}: figure size must be positive",
        config.id
    );

    if let Some(dpi) = config.figure.dpi {
        anyhow::ensure!(dpi > 0.0, "Product {}: figure.dpi must be positive", config.id);
    }

    // Every name an overlay can reference, and where it comes from.
    let mut fields = HashSet::new();
    let mut satellites = HashSet::new();
    for (name, source) in &config.sources {
        anyhow::ensure!(
            !source.catalog().is_empty(),
            "Product {}: source {} has no catalog URL",
            config.id,
            name
        );
        match source {
            SourceConfig::Grid(grid) => {
                anyhow::ensure!(
                    !grid.fields.is_empty(),
                    "Product {}: grid source {} requests no fields",
                    config.id,
                    name
                );
                anyhow::ensure!(
                    grid.bbox.south < grid.bbox.north && grid.bbox.west < grid.bbox.east,
                    "Product {}: source {} bbox is inverted",
                    config.id,
                    name
                );
                for field in &grid.fields {
                    if let Some(sigma) = field.smooth {
                        anyhow::ensure!(
                            sigma > 0.0,
                            "Product {}: field {} smoothing sigma must be positive",
                            config.id,
                            field.name
                        );
                    }
                    anyhow::ensure!(
                        fields.insert(field.name.as_str()),
                        "Product {}: field name {} defined twice",
                        config.id,
                        field.name
                    );
                }
            }
            SourceConfig::Satellite(_) => {
                satellites.insert(name.as_str());
            }
        }
    }

    for derived in &config.derived {
        match derived {
            DerivedConfig::WindSpeed { u, v, .. } => {
                for component in [u, v] {
                    anyhow::ensure!(
                        fields.contains(component.as_str()),
                        "Product {}: {} derives from unknown field {}",
                        config.id,
                        derived.name(),
                        component
                    );
                }
            }
        }
        anyhow::ensure!(
            fields.insert(derived.name()),
            "Product {}: field name {} defined twice",
            config.id,
            derived.name()
        );
    }

    let mut colorbars = 0;
    for overlay in &config.overlays {
        let referenced: Vec<&str> = match overlay {
            OverlayConfig::Fill(fill) => {
                if fill.colorbar {
                    colorbars += 1;
                }
                vec![fill.field.as_str()]
            }
            OverlayConfig::Contours(c) => vec![c.field.as_str()],
            OverlayConfig::Barbs(b) => vec![b.u.as_str(), b.v.as_str()],
            OverlayConfig::Imagery(img) => {
                anyhow::ensure!(
                    satellites.contains(img.source.as_str()),
                    "Product {}: imagery refers to unknown satellite source {}",
                    config.id,
                    img.source
                );
                Vec::new()
            }
        };
        for name in referenced {
            anyhow::ensure!(
                fields.contains(name),
                "Product {}: overlay refers to unknown field {}",
                config.id,
                name
            );
        }
    }

    anyhow::ensure!(
        colorbars <= 1,
        "Product {}: at most one fill may carry the colorbar",
        config.id
    );

    if let Some(confidence) = &config.confidence {
        let mut levels = HashSet::new();
        for region in &confidence.regions {
            anyhow::ensure!(
                levels.insert(region.level),
                "Product {}: confidence level {:?} configured twice",
                config.id,
                region.level
            );
            anyhow::ensure!(
                !region.file.is_empty(),
                "Product {}: confidence region {:?} has no file",
                config.id,
                region.level
            );
        }
    }

    if config.titles.right == RightTitle::ScanTime {
        anyhow::ensure!(
            !satellites.is_empty(),
            "Product {}: scan_time title needs a satellite source",
            config.id
        );
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DAY1: &str = r#"
id: day1-convective
title: DAY 1 CONVECTIVE FORECAST
output: DAY1_FORECAST.png
map:
  projection: { central_longitude: -98, central_latitude: 35, standard_parallels: [30, 60] }
  extent: [-104.1, -95.5, 32.1, 39.1]
  layers:
    - layer: land
      style: { fill: "#626262", strokes: [{ color: dimgray, width: 1 }] }
confidence:
  regions:
    - { level: low, file: lowConfidence.shp, color: mediumseagreen, anchor: { point: 5 } }
    - { level: high, file: hiConfidence.shp, color: orangered, anchor: { shape: 0, point: 7 } }
  highlight:
    file: highlightedArea.shp
    anchor: { point: 4 }
"#;

    const WIND: &str = r#"
id: rap-500mb-wind
title: 500MB WINDS
output: 500MB_WIND.png
valid_label: true
map:
  projection: { central_longitude: -101, central_latitude: 35, standard_parallels: [30, 60] }
  extent: [-125, -89, 25, 50]
sources:
  rap:
    kind: grid
    catalog: https://thredds.example/latest.xml
    vertical_level: 50000
    bbox: { north: 55, south: 20, east: 281, west: 230 }
    fields:
      - { variable: u-component_of_wind_isobaric, name: u, unit: m/s, smooth: 2, convert: kt }
      - { variable: v-component_of_wind_isobaric, name: v, unit: m/s, smooth: 2, convert: kt }
derived:
  - { kind: wind_speed, name: speed, u: u, v: v, convert: kt }
overlays:
  - kind: fill
    field: speed
    colorbar: true
    style: { levels: { start: 30, stop: 160, step: 10 }, colormap: PuBu, vmin: -5, vmax: 150 }
  - kind: barbs
    u: u
    v: v
"#;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("WXMAP_TEST_VAR", "test_value");
        let result = expand_env_vars("prefix_${WXMAP_TEST_VAR}_suffix").unwrap();
        assert_eq!(result, "prefix_test_value_suffix");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("WXMAP_NONEXISTENT_VAR");
        let result = expand_env_vars("value_${WXMAP_NONEXISTENT_VAR:-default}_end").unwrap();
        assert_eq!(result, "value_default_end");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("WXMAP_REQUIRED_VAR");
        assert!(expand_env_vars("${WXMAP_REQUIRED_VAR}").is_err());
    }

    #[test]
    fn test_expand_env_vars_unclosed() {
        assert!(expand_env_vars("dir: ${WXMAP_DIR").is_err());
    }

    #[test]
    fn test_resolve_var_expr_empty_value_takes_default() {
        std::env::set_var("WXMAP_EMPTY_VAR", "");
        assert_eq!(resolve_var_expr("WXMAP_EMPTY_VAR:-fallback").unwrap(), "fallback");
    }

    #[test]
    fn test_resolve_var_expr_override_default() {
        std::env::set_var("WXMAP_SET_VAR", "custom");
        assert_eq!(resolve_var_expr("WXMAP_SET_VAR:-default").unwrap(), "custom");
    }

    #[test]
    fn test_parse_global_config_defaults() {
        let config = parse_config("resources:\n  natural_earth_dir: data/natural_earth\n").unwrap();
        assert_eq!(config.resources.natural_earth_scale, "50m");
        assert_eq!(config.resources.forecast_dir, PathBuf::from("forecast"));
        assert_eq!(config.output.dpi, 300.0);
        assert_eq!(config.http.timeout_secs, 120);
        assert!(config.resources.counties.is_none());
    }

    #[test]
    fn test_resolve_paths_keeps_absolute() {
        let mut config = parse_config(
            "resources:\n  natural_earth_dir: ne\n  counties: /srv/counties.shp\n",
        )
        .unwrap();
        config.resolve_paths(Path::new("/etc/wxmap"));
        assert_eq!(config.resources.natural_earth_dir, PathBuf::from("/etc/wxmap/ne"));
        assert_eq!(config.resources.counties, Some(PathBuf::from("/srv/counties.shp")));
        assert_eq!(config.output.dir, PathBuf::from("/etc/wxmap/images"));
    }

    #[test]
    fn test_parse_confidence_product() {
        let product = parse_product_config(DAY1).unwrap();
        assert!(product.sources.is_empty());
        let confidence = product.confidence.unwrap();
        assert_eq!(confidence.regions[0].anchor.shape, ShapeIndex::default());
        assert_eq!(confidence.regions[0].anchor.shape.as_signed(), -1);
        assert_eq!(confidence.regions[1].anchor.shape, ShapeIndex::At(0));
        assert_eq!(confidence.label.offset, [-0.1, -0.1]);
        assert_eq!(confidence.outline.halo_width, 3.0);
        assert_eq!(confidence.highlight.unwrap().hatch.pattern, "//////");
        assert_eq!(product.map.layers[0].layer, BaseLayer::Land);
    }

    #[test]
    fn test_parse_grid_product() {
        let product = parse_product_config(WIND).unwrap();
        let SourceConfig::Grid(rap) = &product.sources["rap"] else {
            panic!("expected grid source");
        };
        assert_eq!(rap.selection, SelectionPolicy::Latest);
        assert_eq!(rap.vertical_level, Some(50000.0));
        assert_eq!(rap.fields[0].smooth, Some(2.0));
        assert!(matches!(product.overlays[0], OverlayConfig::Fill(ref f) if f.colorbar));
        assert!(matches!(product.overlays[1], OverlayConfig::Barbs(ref b) if b.style.regrid_shape == 15));
        assert_eq!(product.figure.dpi, None);
    }

    #[test]
    fn test_unknown_overlay_field_rejected() {
        let broken = WIND.replace("field: speed", "field: gust");
        let err = parse_product_config(&broken).unwrap_err();
        assert!(format!("{err:#}").contains("gust"));
    }

    #[test]
    fn test_inverted_extent_rejected() {
        let broken = DAY1.replace("[-104.1, -95.5, 32.1, 39.1]", "[-95.5, -104.1, 32.1, 39.1]");
        assert!(parse_product_config(&broken).is_err());
    }

    #[test]
    fn test_duplicate_confidence_level_rejected() {
        let broken = DAY1.replace("level: high", "level: low");
        assert!(parse_product_config(&broken).is_err());
    }

    #[test]
    fn test_product_env_expansion() {
        std::env::set_var("WXMAP_TEST_RAP_CATALOG", "https://mirror.example/rap.xml");
        let templated = WIND.replace(
            "https://thredds.example/latest.xml",
            "${WXMAP_TEST_RAP_CATALOG:-https://thredds.example/latest.xml}",
        );
        let product = parse_product_config(&templated).unwrap();
        assert_eq!(product.sources["rap"].catalog(), "https://mirror.example/rap.xml");
    }
}
