//! Data overlays: fills, contours, barbs and imagery.

use std::sync::Arc;

use tracing::debug;

use renderer::{
    Bands, FilledContours, LayerContent, LineContours, MapCanvas, SatelliteImagery, WindBarbs, ZOrder,
};
use wx_common::WxResult;

use crate::config::OverlayConfig;
use crate::processing::ProcessedData;

impl OverlayConfig {
    /// Default slot for the overlay kind unless the product overrides it.
    pub fn z_order(&self) -> i32 {
        match self {
            OverlayConfig::Fill(o) => o.z.unwrap_or(ZOrder::FIELD_FILL),
            OverlayConfig::Contours(o) => o.z.unwrap_or(ZOrder::ISOPLETHS),
            OverlayConfig::Barbs(o) => o.z.unwrap_or(ZOrder::BARBS),
            OverlayConfig::Imagery(o) => o.z.unwrap_or(ZOrder::IMAGERY),
        }
    }

    pub fn name(&self) -> String {
        match self {
            OverlayConfig::Fill(o) => format!("{}_fill", o.field),
            OverlayConfig::Contours(o) => format!("{}_contours", o.field),
            OverlayConfig::Barbs(_) => "barbs".to_string(),
            OverlayConfig::Imagery(o) => format!("{}_imagery", o.source),
        }
    }
}

/// Add every overlay to `canvas`. Returns the bands of the fill that
/// carries the colorbar, if any.
pub fn add_overlays(canvas: &mut MapCanvas, overlays: &[OverlayConfig], data: &ProcessedData) -> WxResult<Option<Bands>> {
    let mut colorbar = None;
    for overlay in overlays {
        let content = match overlay {
            OverlayConfig::Fill(fill) => {
                let layer = FilledContours::new(Arc::clone(data.field(&fill.field)?), fill.style.clone());
                if fill.colorbar {
                    colorbar = Some(layer.bands());
                }
                LayerContent::Fill(layer)
            }
            OverlayConfig::Contours(contours) => {
                let field = data.field(&contours.field)?;
                LayerContent::Contours(LineContours::new(Arc::clone(field), contours.style.clone()))
            }
            OverlayConfig::Barbs(barbs) => {
                let wind = data.wind_knots(&barbs.u, &barbs.v)?;
                LayerContent::Barbs(WindBarbs::new(Arc::new(wind), barbs.style.clone()))
            }
            OverlayConfig::Imagery(imagery) => {
                let image = data.image(&imagery.source)?;
                LayerContent::Imagery(SatelliteImagery::new(Arc::clone(image), imagery.style.clone()))
            }
        };
        let name = overlay.name();
        debug!(overlay = %name, z = overlay.z_order(), "Adding overlay");
        canvas.add(name, overlay.z_order(), content);
    }
    Ok(colorbar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BarbOverlay, ContourOverlay, FillOverlay};
    use renderer::{Colormap, ContourSpec, FillSpec, Levels, StrokeStyle};
    use test_utils::{create_lon_lat_axes, create_temperature_grid, create_u_wind_grid, create_v_wind_grid};
    use wx_common::{GeoGrid, GriddedField, Unit, WxError};

    fn data() -> ProcessedData {
        let (lon, lat) = create_lon_lat_axes(24, 18, (-110.0, -90.0, 28.0, 44.0));
        let g = Arc::new(GeoGrid::rectilinear(lon, lat));
        let field = |name: &str, unit, values| Arc::new(GriddedField::new(name, unit, Arc::clone(&g), values, None).unwrap());
        let mut data = ProcessedData::default();
        data.fields.insert("t".into(), field("t", Unit::Kelvin, create_temperature_grid(24, 18)));
        data.fields.insert("u".into(), field("u", Unit::MetersPerSecond, create_u_wind_grid(24, 18)));
        data.fields.insert("v".into(), field("v", Unit::MetersPerSecond, create_v_wind_grid(24, 18)));
        data
    }

    fn fill(colorbar: bool) -> OverlayConfig {
        OverlayConfig::Fill(FillOverlay {
            field: "t".into(),
            style: FillSpec {
                levels: Levels::range(250.0, 312.0, 2.0),
                colormap: Colormap::TwilightShifted,
                vmin: None,
                vmax: None,
                alpha: 1.0,
            },
            colorbar,
            z: None,
        })
    }

    #[test]
    fn test_overlays_slot_by_kind() {
        let overlays = vec![
            OverlayConfig::Barbs(BarbOverlay {
                u: "u".into(),
                v: "v".into(),
                style: Default::default(),
                z: None,
            }),
            OverlayConfig::Contours(ContourOverlay {
                field: "t".into(),
                style: ContourSpec {
                    levels: Levels::default(),
                    strokes: vec![StrokeStyle::new(renderer::Color::BLACK, 0.5)],
                    labels: None,
                },
                z: Some(ZOrder::FIELD_CONTOUR),
            }),
            fill(true),
        ];
        let mut canvas = MapCanvas::new();
        let bands = add_overlays(&mut canvas, &overlays, &data()).unwrap();
        assert_eq!(canvas.layer_names(), vec!["t_fill", "t_contours", "barbs"]);
        assert_eq!(bands.map(|b| b.colors.len()), Some(30));
    }

    #[test]
    fn test_no_colorbar_without_flag() {
        let mut canvas = MapCanvas::new();
        assert!(add_overlays(&mut canvas, &[fill(false)], &data()).unwrap().is_none());
    }

    #[test]
    fn test_unknown_field_errors() {
        let overlay = OverlayConfig::Contours(ContourOverlay {
            field: "mslp".into(),
            style: ContourSpec {
                levels: Levels::default(),
                strokes: Vec::new(),
                labels: None,
            },
            z: None,
        });
        let mut canvas = MapCanvas::new();
        let err = add_overlays(&mut canvas, &[overlay], &data()).unwrap_err();
        assert!(matches!(err, WxError::MissingVariable(_)));
    }
}
