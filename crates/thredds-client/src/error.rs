//! Error types for catalog access.

use thiserror::Error;
use wx_common::WxError;

pub type ThreddsResult<T> = Result<T, ThreddsError>;

#[derive(Debug, Error)]
pub enum ThreddsError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse catalog: {0}")]
    CatalogParse(String),

    #[error("Catalog {0} lists no datasets")]
    NoDatasets(String),

    #[error("Catalog has no {0} service")]
    MissingService(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ThreddsError {
    pub(crate) fn http(url: &str, source: reqwest::Error) -> Self {
        ThreddsError::Http {
            url: url.to_string(),
            source,
        }
    }
}

impl From<ThreddsError> for WxError {
    fn from(err: ThreddsError) -> Self {
        WxError::DataUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_maps_to_data_unavailable() {
        let errors = [
            ThreddsError::Status {
                url: "https://example.test/catalog.xml".into(),
                status: 404,
            },
            ThreddsError::CatalogParse("bad".into()),
            ThreddsError::NoDatasets("catalog.xml".into()),
            ThreddsError::MissingService("NetcdfSubset".into()),
        ];
        for err in errors {
            let wx: WxError = err.into();
            assert!(matches!(wx, WxError::DataUnavailable(_)));
            assert_eq!(wx.exit_code(), 2);
        }
    }

    #[test]
    fn test_status_message() {
        let err = ThreddsError::Status {
            url: "https://example.test/x".into(),
            status: 503,
        };
        assert_eq!(err.to_string(), "HTTP 503 from https://example.test/x");
    }
}
