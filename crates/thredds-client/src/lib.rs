//! THREDDS Data Server access.
//!
//! Reads catalogs, picks a dataset with an explicit [`SelectionPolicy`],
//! and fetches either an NCSS grid subset or the whole file. Every failure
//! converts into `WxError::DataUnavailable`.

pub mod catalog;
pub mod client;
pub mod error;
pub mod ncss;
pub mod selection;

pub use catalog::{Catalog, CatalogRef, Dataset, Service, ServiceType};
pub use client::{next_step, CatalogStep, ClientConfig, SelectedDataset, ThreddsClient};
pub use error::{ThreddsError, ThreddsResult};
pub use ncss::NcssQuery;
pub use selection::{name_timestamp, SelectionPolicy};
