//! Forecast confidence overlays.
//!
//! Forecasters drop `lowConfidence.shp`, `medConfidence.shp`,
//! `hiConfidence.shp` and `highlightedArea.shp` into the forecast directory
//! when a region applies. Any of them may be missing or broken; each gets a
//! typed [`ConfidenceOutcome`], logged at info, and the map is drawn with
//! whatever loaded.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use renderer::{
    Anchor, Feature, HatchedArea, LayerContent, MapCanvas, MapLabel, PolygonStyle, StrokeStyle,
    TextStyle, ZOrder,
};
use shapefile_parser::Shapefile;

use crate::basemap::shape_to_feature;
use crate::config::{AnchorRef, ConfidenceConfig, RegionConfig};

/// Result of loading one optional overlay shapefile.
#[derive(Debug, Clone)]
pub enum ConfidenceOutcome {
    Loaded {
        features: Vec<Feature>,
        /// Anchor vertex (lon, lat), when one was asked for
        anchor: Option<(f64, f64)>,
    },
    Absent {
        path: PathBuf,
    },
    Corrupt {
        path: PathBuf,
        reason: String,
    },
}

/// Outcome without the geometry, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Loaded,
    Absent,
    Corrupt,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutcomeKind::Loaded => "loaded",
            OutcomeKind::Absent => "absent",
            OutcomeKind::Corrupt => "corrupt",
        })
    }
}

impl ConfidenceOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ConfidenceOutcome::Loaded { .. } => OutcomeKind::Loaded,
            ConfidenceOutcome::Absent { .. } => OutcomeKind::Absent,
            ConfidenceOutcome::Corrupt { .. } => OutcomeKind::Corrupt,
        }
    }
}

/// What happened to one overlay during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayStatus {
    pub name: String,
    pub outcome: OutcomeKind,
}

/// Load an overlay shapefile and resolve its anchor vertex.
///
/// A file that is not there is `Absent`. A file that cannot be decoded, has
/// no polygon or line geometry, or lacks the anchor vertex is `Corrupt`.
pub fn load_overlay(path: &Path, anchor: Option<&AnchorRef>) -> ConfidenceOutcome {
    let shapefile = match Shapefile::open(path) {
        Ok(sf) => sf,
        Err(e) if e.is_not_found() => {
            return ConfidenceOutcome::Absent {
                path: path.to_path_buf(),
            }
        }
        Err(e) => {
            return ConfidenceOutcome::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    };

    let anchor = match anchor {
        None => None,
        Some(a) => {
            let vertex = shapefile
                .shape_at(a.shape.as_signed())
                .and_then(|shape| shape.point_at(a.point));
            match vertex {
                Some(v) => Some(v),
                None => {
                    return ConfidenceOutcome::Corrupt {
                        path: path.to_path_buf(),
                        reason: format!(
                            "no point {} in shape {:?} of {} records",
                            a.point,
                            a.shape,
                            shapefile.len()
                        ),
                    }
                }
            }
        }
    };

    let features: Vec<Feature> = shapefile.shapes().filter_map(shape_to_feature).collect();
    if features.is_empty() {
        return ConfidenceOutcome::Corrupt {
            path: path.to_path_buf(),
            reason: "no polygon or line geometry".to_string(),
        };
    }

    ConfidenceOutcome::Loaded { features, anchor }
}

fn log_outcome(name: &str, outcome: &ConfidenceOutcome) {
    match outcome {
        ConfidenceOutcome::Loaded { features, anchor } => {
            info!(overlay = name, outcome = %outcome.kind(), features = features.len(), ?anchor, "Confidence overlay loaded");
        }
        ConfidenceOutcome::Absent { path } => {
            info!(overlay = name, outcome = %outcome.kind(), path = %path.display(), "Confidence overlay skipped");
        }
        ConfidenceOutcome::Corrupt { path, reason } => {
            info!(overlay = name, outcome = %outcome.kind(), path = %path.display(), reason = %reason, "Confidence overlay skipped");
        }
    }
}

fn add_region(canvas: &mut MapCanvas, config: &ConfidenceConfig, region: &RegionConfig, features: Vec<Feature>, anchor: (f64, f64)) {
    let name = region.level.label().to_lowercase();
    let outline = &config.outline;
    let style = PolygonStyle::outline(vec![
        StrokeStyle::new(outline.halo_color, outline.halo_width),
        StrokeStyle::new(region.color, outline.width),
    ]);
    canvas.add(
        format!("{name}_confidence"),
        ZOrder::CONFIDENCE,
        LayerContent::Features {
            features: Arc::new(features),
            style,
        },
    );

    let label = &config.label;
    let (lon, lat) = anchor;
    canvas.add(
        format!("{name}_label"),
        ZOrder::CONFIDENCE_LABEL,
        LayerContent::Text(MapLabel {
            text: region.level.label().to_string(),
            lon: lon + label.offset[0],
            lat: lat + label.offset[1],
            style: TextStyle::new(label.size)
                .bold()
                .with_color(region.color)
                .with_halo(label.halo_color, label.halo_width),
            anchor: Anchor::BOTTOM_LEFT,
        }),
    );
}

/// Add every confidence region and the highlight hatch that loads.
pub fn add_confidence_layers(canvas: &mut MapCanvas, config: &ConfidenceConfig, dir: &Path) -> Vec<OverlayStatus> {
    let mut statuses = Vec::with_capacity(config.regions.len() + 1);

    for region in &config.regions {
        let name = region.level.label();
        let outcome = load_overlay(&dir.join(&region.file), Some(&region.anchor));
        log_outcome(name, &outcome);
        statuses.push(OverlayStatus {
            name: name.to_string(),
            outcome: outcome.kind(),
        });
        if let ConfidenceOutcome::Loaded {
            features,
            anchor: Some(anchor),
        } = outcome
        {
            add_region(canvas, config, region, features, anchor);
        }
    }

    if let Some(highlight) = &config.highlight {
        let outcome = load_overlay(&dir.join(&highlight.file), highlight.anchor.as_ref());
        log_outcome("HIGHLIGHT", &outcome);
        statuses.push(OverlayStatus {
            name: "HIGHLIGHT".to_string(),
            outcome: outcome.kind(),
        });
        if let ConfidenceOutcome::Loaded { features, .. } = outcome {
            canvas.add(
                "highlight_hatch",
                ZOrder::HIGHLIGHT_HATCH,
                LayerContent::Hatch(HatchedArea::new(Arc::new(features), highlight.hatch.clone())),
            );
        }
    }

    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfidenceLevel, HighlightConfig, ShapeIndex};
    use renderer::{Color, HatchSpec};
    use test_utils::shapefile::{circle_ring, square_ring, write_shapefile, TestShape};

    fn region(level: ConfidenceLevel, file: &str, point: usize) -> RegionConfig {
        RegionConfig {
            level,
            file: file.to_string(),
            color: Color::rgb(255, 215, 0),
            anchor: AnchorRef {
                shape: ShapeIndex::default(),
                point,
            },
        }
    }

    fn config(regions: Vec<RegionConfig>) -> ConfidenceConfig {
        ConfidenceConfig {
            dir: None,
            regions,
            highlight: Some(HighlightConfig {
                file: "highlightedArea.shp".to_string(),
                anchor: Some(AnchorRef {
                    shape: ShapeIndex::default(),
                    point: 4,
                }),
                hatch: HatchSpec::default(),
            }),
            label: Default::default(),
            outline: Default::default(),
        }
    }

    #[test]
    fn test_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load_overlay(&dir.path().join("lowConfidence.shp"), None);
        assert_eq!(outcome.kind(), OutcomeKind::Absent);
    }

    #[test]
    fn test_garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medConfidence.shp");
        std::fs::write(&path, b"not a shapefile").unwrap();
        assert_eq!(load_overlay(&path, None).kind(), OutcomeKind::Corrupt);
    }

    #[test]
    fn test_anchor_out_of_range_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hiConfidence.shp");
        // five vertices, anchor asks for the eighth
        write_shapefile(&path, &[TestShape::Polygon(vec![square_ring(-100.0, 35.0, 1.0)])]).unwrap();
        let anchor = AnchorRef {
            shape: ShapeIndex::default(),
            point: 7,
        };
        let outcome = load_overlay(&path, Some(&anchor));
        match outcome {
            ConfidenceOutcome::Corrupt { reason, .. } => assert!(reason.contains("no point 7")),
            other => panic!("expected corrupt, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_anchor_taken_from_last_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lowConfidence.shp");
        write_shapefile(
            &path,
            &[
                TestShape::Polygon(vec![square_ring(-101.0, 34.0, 1.0)]),
                TestShape::Polygon(vec![circle_ring(-99.0, 36.0, 1.0, 12)]),
            ],
        )
        .unwrap();
        let anchor = AnchorRef {
            shape: ShapeIndex::default(),
            point: 0,
        };
        let ConfidenceOutcome::Loaded { features, anchor } = load_overlay(&path, Some(&anchor)) else {
            panic!("expected loaded");
        };
        assert_eq!(features.len(), 2);
        let (lon, lat) = anchor.unwrap();
        assert!((lon - -98.0).abs() < 1e-9 && (lat - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_layers_skips_absent_and_labels_loaded() {
        let dir = tempfile::tempdir().unwrap();
        write_shapefile(
            &dir.path().join("medConfidence.shp"),
            &[TestShape::Polygon(vec![circle_ring(-100.0, 35.0, 1.5, 16)])],
        )
        .unwrap();

        let cfg = config(vec![
            region(ConfidenceLevel::Low, "lowConfidence.shp", 5),
            region(ConfidenceLevel::Medium, "medConfidence.shp", 5),
        ]);
        let mut canvas = MapCanvas::new();
        let statuses = add_confidence_layers(&mut canvas, &cfg, dir.path());

        assert_eq!(
            statuses,
            vec![
                OverlayStatus { name: "LOW".into(), outcome: OutcomeKind::Absent },
                OverlayStatus { name: "MED".into(), outcome: OutcomeKind::Loaded },
                OverlayStatus { name: "HIGHLIGHT".into(), outcome: OutcomeKind::Absent },
            ]
        );
        assert_eq!(canvas.layer_names(), vec!["med_confidence", "med_label"]);

        let label = canvas
            .ordered()
            .iter()
            .find_map(|l| match &l.content {
                LayerContent::Text(label) => Some(label.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(label.text, "MED");
        assert!(label.style.bold);
        assert_eq!(label.style.halo.map(|h| h.width), Some(3.0));
    }

    #[test]
    fn test_highlight_hatched_below_outlines() {
        let dir = tempfile::tempdir().unwrap();
        write_shapefile(
            &dir.path().join("highlightedArea.shp"),
            &[TestShape::Polygon(vec![square_ring(-100.0, 35.0, 1.0)])],
        )
        .unwrap();
        write_shapefile(
            &dir.path().join("hiConfidence.shp"),
            &[TestShape::Polygon(vec![circle_ring(-100.0, 35.0, 2.0, 16)])],
        )
        .unwrap();

        let cfg = config(vec![region(ConfidenceLevel::High, "hiConfidence.shp", 7)]);
        let mut canvas = MapCanvas::new();
        add_confidence_layers(&mut canvas, &cfg, dir.path());
        assert_eq!(canvas.layer_names(), vec!["highlight_hatch", "high_confidence", "high_label"]);
    }
}
