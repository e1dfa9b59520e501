//! Weather map products.
//!
//! A product YAML names its data sources, base layers and overlays; a run
//! fetches the data from THREDDS, smooths and converts it, draws the map and
//! writes one PNG.

pub mod acquisition;
pub mod basemap;
pub mod confidence;
pub mod config;
pub mod overlays;
pub mod pipeline;
pub mod processing;

pub use config::{find_product, load_config, load_product_configs, ProductConfig, WxmapConfig};
pub use confidence::{ConfidenceOutcome, OutcomeKind, OverlayStatus};
pub use pipeline::{render, run, RunOptions, RunReport};
