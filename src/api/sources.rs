//! Provider catalog client
//!
//! Fetches the published list of embed providers: a JSON array of
//! `{ key, name, movieUrlPattern, tvUrlPattern }`.

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::models::VideoSourceProvider;
use crate::player::catalog::{CatalogError, SourceCatalog};

/// Published default provider catalog
pub const DEFAULT_SOURCES_URL: &str =
    "https://raw.githubusercontent.com/chintan992/letsstream2/refs/heads/main/src/utils/video-sources.json";

/// Provider catalog fetch errors
#[derive(Error, Debug)]
pub enum SourcesError {
    #[error("Source catalog not found (404)")]
    NotFound,

    #[error("Source catalog request returned HTTP {0}")]
    Http(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Client for the remote provider catalog
pub struct SourcesClient {
    url: String,
    client: reqwest::Client,
}

impl SourcesClient {
    /// Create a client for the default catalog URL
    pub fn new() -> Self {
        Self::with_url(DEFAULT_SOURCES_URL)
    }

    /// Create a client for a custom catalog URL (also used for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and validate the catalog
    pub async fn fetch(&self) -> Result<SourceCatalog> {
        debug!(url = %self.url, "fetching source catalog");

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(SourcesError::from)?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(SourcesError::NotFound.into()),
            status if !status.is_success() => {
                return Err(SourcesError::Http(status.as_u16()).into())
            }
            _ => {}
        }

        let body = response.text().await.map_err(SourcesError::from)?;
        let providers: Vec<VideoSourceProvider> = serde_json::from_str(&body)
            .map_err(|e| SourcesError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        debug!(count = providers.len(), "source catalog fetched");
        Ok(SourceCatalog::new(providers).map_err(SourcesError::from)?)
    }
}

impl Default for SourcesClient {
    fn default() -> Self {
        Self::new()
    }
}
