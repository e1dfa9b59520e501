//! Static cartographic layers.
//!
//! Ocean, land, lakes, borders, coastline and states come from Natural Earth
//! shapefiles; counties and the forecast area from configured paths. Every
//! layer a product lists is required: a missing or unreadable file stops the
//! run with [`WxError::ResourceUnavailable`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use renderer::{Feature, LayerContent, MapCanvas, ZOrder};
use shapefile_parser::{Shape, Shapefile};
use wx_common::{BoundingBox, WxError, WxResult};

use crate::config::{BaseLayerConfig, ResourceConfig};

/// Degrees of slack when picking shapes for the map extent.
const SELECT_MARGIN_DEG: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseLayer {
    Ocean,
    Land,
    Lakes,
    Borders,
    Coastline,
    States,
    Counties,
    ForecastArea,
}

impl BaseLayer {
    pub fn name(&self) -> &'static str {
        match self {
            BaseLayer::Ocean => "ocean",
            BaseLayer::Land => "land",
            BaseLayer::Lakes => "lakes",
            BaseLayer::Borders => "borders",
            BaseLayer::Coastline => "coastline",
            BaseLayer::States => "states",
            BaseLayer::Counties => "counties",
            BaseLayer::ForecastArea => "forecast_area",
        }
    }

    /// Fixed stacking slot. Borders and coastline share one.
    pub fn z_order(&self) -> i32 {
        match self {
            BaseLayer::Ocean => ZOrder::OCEAN,
            BaseLayer::Land => ZOrder::LAND,
            BaseLayer::Lakes => ZOrder::LAKES,
            BaseLayer::Borders | BaseLayer::Coastline => ZOrder::BORDERS,
            BaseLayer::Counties => ZOrder::COUNTIES,
            BaseLayer::ForecastArea => ZOrder::FORECAST_AREA,
            BaseLayer::States => ZOrder::STATES,
        }
    }

    fn natural_earth_name(&self) -> Option<&'static str> {
        match self {
            BaseLayer::Ocean => Some("ocean"),
            BaseLayer::Land => Some("land"),
            BaseLayer::Lakes => Some("lakes"),
            BaseLayer::Borders => Some("admin_0_boundary_lines_land"),
            BaseLayer::Coastline => Some("coastline"),
            BaseLayer::States => Some("admin_1_states_provinces_lakes"),
            BaseLayer::Counties | BaseLayer::ForecastArea => None,
        }
    }

    /// Shapefile backing this layer.
    pub fn source_path(&self, resources: &ResourceConfig) -> WxResult<PathBuf> {
        if let Some(name) = self.natural_earth_name() {
            let file = format!("ne_{}_{}.shp", resources.natural_earth_scale, name);
            return Ok(resources.natural_earth_dir.join(file));
        }
        let configured = match self {
            BaseLayer::Counties => resources.counties.clone(),
            _ => resources.forecast_area.clone(),
        };
        configured.ok_or_else(|| WxError::ResourceUnavailable {
            path: format!("resources.{}", self.name()),
            message: "layer requested but no shapefile configured".to_string(),
        })
    }
}

/// Map geometry of one shapefile record. Points carry no area or line and
/// are dropped.
pub fn shape_to_feature(shape: &Shape) -> Option<Feature> {
    match shape {
        Shape::Polygon { rings, .. } if !rings.is_empty() => Some(Feature::polygon(rings.clone())),
        Shape::PolyLine { parts, .. } if !parts.is_empty() => Some(Feature::line(parts.clone())),
        _ => None,
    }
}

/// Read a required shapefile, keeping shapes near `extent`.
pub fn load_features(path: &Path, extent: &BoundingBox) -> WxResult<Vec<Feature>> {
    let shapefile = Shapefile::open(path).map_err(|e| WxError::ResourceUnavailable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let window = extent.expand(SELECT_MARGIN_DEG);
    Ok(shapefile
        .shapes_intersecting(&window)
        .filter_map(shape_to_feature)
        .collect())
}

/// Add every configured base layer to `canvas` at its fixed z-order.
pub fn add_base_layers(
    canvas: &mut MapCanvas,
    layers: &[BaseLayerConfig],
    resources: &ResourceConfig,
    extent: &BoundingBox,
) -> WxResult<()> {
    for config in layers {
        let path = config.layer.source_path(resources)?;
        let features = load_features(&path, extent)?;
        info!(
            layer = config.layer.name(),
            features = features.len(),
            path = %path.display(),
            "Loaded base layer"
        );
        canvas.add(
            config.layer.name(),
            config.layer.z_order(),
            LayerContent::Features {
                features: Arc::new(features),
                style: config.style.clone(),
            },
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::PolygonStyle;
    use test_utils::shapefile::{square_ring, write_shapefile, TestShape};

    fn resources(dir: &Path) -> ResourceConfig {
        ResourceConfig {
            natural_earth_dir: dir.to_path_buf(),
            natural_earth_scale: "50m".to_string(),
            counties: None,
            forecast_area: Some(dir.join("fa3.shp")),
            forecast_dir: dir.join("forecast"),
            fonts: Default::default(),
        }
    }

    #[test]
    fn test_base_z_order_strictly_increasing() {
        let order = [
            BaseLayer::Ocean,
            BaseLayer::Land,
            BaseLayer::Lakes,
            BaseLayer::Borders,
            BaseLayer::Counties,
            BaseLayer::ForecastArea,
            BaseLayer::States,
        ];
        assert!(order.windows(2).all(|w| w[0].z_order() < w[1].z_order()));
        assert_eq!(BaseLayer::Coastline.z_order(), BaseLayer::Borders.z_order());
    }

    #[test]
    fn test_natural_earth_file_names() {
        let res = resources(Path::new("/data/ne"));
        assert_eq!(
            BaseLayer::States.source_path(&res).unwrap(),
            PathBuf::from("/data/ne/ne_50m_admin_1_states_provinces_lakes.shp")
        );
        assert_eq!(
            BaseLayer::ForecastArea.source_path(&res).unwrap(),
            PathBuf::from("/data/ne/fa3.shp")
        );
    }

    #[test]
    fn test_unconfigured_counties_is_resource_error() {
        let res = resources(Path::new("/data/ne"));
        let err = BaseLayer::Counties.source_path(&res).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_shape_conversion() {
        let polygon = Shape::Polygon {
            bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            rings: vec![square_ring(0.5, 0.5, 0.5)],
        };
        assert_eq!(shape_to_feature(&polygon).map(|f| f.point_count()), Some(5));
        assert!(shape_to_feature(&Shape::Null).is_none());
    }

    #[test]
    fn test_missing_required_layer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let layers = vec![BaseLayerConfig {
            layer: BaseLayer::Land,
            style: PolygonStyle::filled(renderer::Color::BLACK),
        }];
        let mut canvas = MapCanvas::new();
        let err = add_base_layers(
            &mut canvas,
            &layers,
            &resources(dir.path()),
            &BoundingBox::new(-104.0, 32.0, -95.0, 39.0),
        )
        .unwrap_err();
        assert!(matches!(err, WxError::ResourceUnavailable { .. }));
        assert!(canvas.is_empty());
    }

    #[test]
    fn test_far_shapes_are_culled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ne_50m_land.shp");
        write_shapefile(
            &path,
            &[
                TestShape::Polygon(vec![square_ring(-100.0, 35.0, 2.0)]),
                TestShape::Polygon(vec![square_ring(20.0, 50.0, 2.0)]),
            ],
        )
        .unwrap();
        let features = load_features(&path, &BoundingBox::new(-104.0, 32.0, -95.0, 39.0)).unwrap();
        assert_eq!(features.len(), 1);
    }
}
