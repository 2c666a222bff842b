use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::capabilities::CatalogApi;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3333/";
pub const DEFAULT_FONT_TIMEOUT_MS: u64 = 10_000;
pub const MAX_FONT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_AVATAR: &str = "sample-pfp.jpg";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(String),

    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("font timeout {0}ms outside 1..=60000")]
    InvalidFontTimeout(u64),
}

/// Settings handed over by the shell at startup. Missing fields fall back to
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub font_timeout_ms: u64,
    pub avatar: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            font_timeout_ms: DEFAULT_FONT_TIMEOUT_MS,
            avatar: DEFAULT_AVATAR.into(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base_url(&self.api_base_url)?;
        if self.font_timeout_ms == 0 || self.font_timeout_ms > MAX_FONT_TIMEOUT_MS {
            return Err(ConfigError::InvalidFontTimeout(self.font_timeout_ms));
        }
        Ok(())
    }

    /// Endpoint builder for the configured catalog server.
    pub fn catalog_api(&self) -> Result<CatalogApi, ConfigError> {
        parse_base_url(&self.api_base_url).map(CatalogApi::new)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }

    // Relative joins drop the last path segment unless it ends in '/'.
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash).map_err(|e| invalid(&e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("scheme '{other}' not allowed"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("credentials in url are not allowed"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("base url cannot carry a query or fragment"));
    }

    Ok(url)
}
