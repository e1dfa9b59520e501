//! HTTP access to THREDDS servers.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::catalog::{Catalog, Dataset, ServiceType};
use crate::error::{ThreddsError, ThreddsResult};
use crate::ncss::NcssQuery;
use crate::selection::SelectionPolicy;

/// HTTP settings for catalog and data requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            connect_timeout_secs: 30,
            user_agent: concat!("wxmap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A selected dataset together with the catalog it came from.
#[derive(Debug, Clone)]
pub struct SelectedDataset {
    pub catalog: Catalog,
    pub dataset: Dataset,
}

impl SelectedDataset {
    pub fn ncss_endpoint(&self) -> ThreddsResult<Url> {
        self.catalog
            .access_url(&self.dataset, &ServiceType::NetcdfSubset)
    }

    pub fn download_url(&self) -> ThreddsResult<Url> {
        self.catalog
            .access_url(&self.dataset, &ServiceType::HttpServer)
    }
}

/// Sub-catalog hops followed before giving up.
const MAX_CATALOG_DEPTH: usize = 4;

/// What to do with a fetched catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogStep {
    Dataset(Dataset),
    /// The catalog lists no datasets; continue at this sub-catalog.
    Follow(Url),
}

/// Pick a dataset, or a `catalogRef` to follow when the catalog has no
/// datasets of its own (`latest.xml` resolvers, dated directories).
pub fn next_step(catalog: &Catalog, policy: SelectionPolicy) -> ThreddsResult<CatalogStep> {
    if let Some(dataset) = policy.select(&catalog.datasets) {
        return Ok(CatalogStep::Dataset(dataset.clone()));
    }
    match policy.select_ref(&catalog.catalog_refs) {
        Some(catalog_ref) => Ok(CatalogStep::Follow(catalog.resolve_ref(catalog_ref)?)),
        None => Err(ThreddsError::NoDatasets(catalog.url.to_string())),
    }
}

/// Sequential THREDDS client. One request is in flight at a time.
pub struct ThreddsClient {
    client: Client,
}

impl ThreddsClient {
    pub fn new(config: &ClientConfig) -> ThreddsResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ThreddsError::http("<client>", e))?;
        Ok(Self { client })
    }

    /// Fetch and parse a `catalog.xml` document.
    #[instrument(skip(self))]
    pub async fn fetch_catalog(&self, url: &str) -> ThreddsResult<Catalog> {
        let body = self.get(url).await?;
        let text = String::from_utf8_lossy(&body);
        Catalog::parse(url, &text)
    }

    /// Fetch a catalog and pick one dataset from it, following
    /// sub-catalogs when the listing has no datasets.
    #[instrument(skip(self))]
    pub async fn select_dataset(
        &self,
        catalog_url: &str,
        policy: SelectionPolicy,
    ) -> ThreddsResult<SelectedDataset> {
        let mut url = catalog_url.to_string();
        for _ in 0..=MAX_CATALOG_DEPTH {
            let catalog = self.fetch_catalog(&url).await?;
            match next_step(&catalog, policy)? {
                CatalogStep::Dataset(dataset) => {
                    info!(dataset = %dataset.name, ?policy, "Selected dataset");
                    return Ok(SelectedDataset { catalog, dataset });
                }
                CatalogStep::Follow(next) => {
                    debug!(from = %url, to = %next, "Following catalogRef");
                    url = next.to_string();
                }
            }
        }
        Err(ThreddsError::NoDatasets(catalog_url.to_string()))
    }

    /// Run an NCSS grid subset request and return the netCDF payload.
    #[instrument(skip(self, selected, query), fields(dataset = %selected.dataset.name))]
    pub async fn fetch_subset(
        &self,
        selected: &SelectedDataset,
        query: &NcssQuery,
    ) -> ThreddsResult<Bytes> {
        let url = query.url(&selected.ncss_endpoint()?);
        self.get(url.as_str()).await
    }

    /// Download a dataset file whole through the HTTPServer service.
    #[instrument(skip(self, selected), fields(dataset = %selected.dataset.name))]
    pub async fn download(&self, selected: &SelectedDataset) -> ThreddsResult<Bytes> {
        let url = selected.download_url()?;
        self.get(url.as_str()).await
    }

    async fn get(&self, url: &str) -> ThreddsResult<Bytes> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ThreddsError::http(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThreddsError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ThreddsError::http(url, e))?;
        debug!(url, bytes = body.len(), "Response received");
        Ok(body)
    }
}
