use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::PAGE_SIZE;

pub const ENVIRONMENTS_PATH: &str = "plants_environments";
pub const PLANTS_PATH: &str = "plants";

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error {code}")]
    Status { code: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("response had no body")]
    MissingBody,

    #[error("catalog url could not be built: {0}")]
    InvalidUrl(String),
}

/// Builds json-server style URLs for the plant catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogApi {
    base: Url,
}

impl CatalogApi {
    /// `base` must end in '/' so relative paths are appended, not substituted.
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn environments_url(&self) -> Result<String, FetchError> {
        let mut url = self.endpoint(ENVIRONMENTS_PATH)?;
        url.query_pairs_mut()
            .append_pair("_sort", "title")
            .append_pair("order", "asc");
        Ok(url.into())
    }

    pub fn plants_page_url(&self, page: u32) -> Result<String, FetchError> {
        let mut url = self.endpoint(PLANTS_PATH)?;
        url.query_pairs_mut()
            .append_pair("_sort", "name")
            .append_pair("order", "asc")
            .append_pair("_page", &page.to_string())
            .append_pair("_limit", &PAGE_SIZE.to_string());
        Ok(url.into())
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }
}

// crux_http turns 4xx/5xx responses into `Error::Http` before we see them.
impl From<crux_http::Error> for FetchError {
    fn from(e: crux_http::Error) -> Self {
        match e {
            crux_http::Error::Http(e) => {
                let code: u16 = e.code.into();
                // A 2xx only ends up here when the body could not be read.
                if (200..300).contains(&code) {
                    FetchError::MissingBody
                } else {
                    FetchError::Status { code }
                }
            }
            crux_http::Error::Timeout => FetchError::Timeout,
            crux_http::Error::Json(reason) => FetchError::Decode(reason),
            crux_http::Error::Url(reason) => FetchError::InvalidUrl(reason),
            crux_http::Error::Io(reason) => FetchError::Network(reason),
        }
    }
}

/// Turns a completed crux_http request into a decoded JSON body.
pub fn decode_response<T: DeserializeOwned>(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> Result<T, FetchError> {
    let mut response = result.map_err(FetchError::from)?;
    let code: u16 = response.status().into();
    let body = response.take_body();
    decode_body(code, body.as_deref())
}

pub fn decode_body<T: DeserializeOwned>(code: u16, body: Option<&[u8]>) -> Result<T, FetchError> {
    if !(200..300).contains(&code) {
        warn!(status = code, "catalog request rejected");
        return Err(FetchError::Status { code });
    }
    let body = body.ok_or(FetchError::MissingBody)?;
    serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
}
