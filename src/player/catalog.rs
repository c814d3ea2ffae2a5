//! Source catalog - provider list and URL templating
//!
//! Maps `(provider, content id, kind, season, episode)` to a concrete embed URL.
//! Pure and deterministic: building the same request twice yields the same URL.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::warn;

use crate::models::{ContentKind, VideoSourceProvider};

/// Recognized template placeholders
static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\{(id|season|episode)\}")
        .map_err(|e| warn!(error = %e, "placeholder pattern failed to compile"))
        .ok()
});

/// Errors from catalog construction and URL building
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Source catalog is empty")]
    EmptyCatalog,

    #[error("Source '{provider}' cannot serve {kind} content")]
    InvalidTemplate { provider: String, kind: ContentKind },
}

/// Build the embed URL for a provider and content request
///
/// Movies substitute `{id}` into the movie template; series substitute `{id}`,
/// `{season}` and `{episode}` into the episode template. Every occurrence of a
/// placeholder is replaced and a missing `{id}` is tolerated.
///
/// # Errors
/// `InvalidTemplate` when the template is blank, when a series template has
/// neither `{season}` nor `{episode}`, or when the result is not an absolute URL.
pub fn build_url(
    provider: &VideoSourceProvider,
    content_id: u64,
    kind: ContentKind,
    season: u32,
    episode: u32,
) -> Result<String, CatalogError> {
    let invalid = || CatalogError::InvalidTemplate {
        provider: provider.key.clone(),
        kind,
    };

    let template = provider.template_for(kind).trim();
    if template.is_empty() {
        return Err(invalid());
    }
    let placeholder = PLACEHOLDER.as_ref().ok_or_else(invalid)?;

    if kind.is_series() {
        let addresses_episode = placeholder
            .captures_iter(template)
            .any(|caps| &caps[1] != "id");
        if !addresses_episode {
            return Err(invalid());
        }
    }

    let url = placeholder
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "id" => content_id.to_string(),
            "season" if kind.is_series() => season.to_string(),
            "episode" if kind.is_series() => episode.to_string(),
            // Movie templates keep season/episode tokens literally
            _ => caps[0].to_string(),
        })
        .into_owned();

    // Rejects relative or garbled results before they reach the surface
    reqwest::Url::parse(&url).map_err(|_| invalid())?;

    Ok(url)
}

/// Non-empty, ordered list of providers; index 0 is the default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCatalog {
    providers: Vec<VideoSourceProvider>,
}

impl SourceCatalog {
    /// Create a catalog, rejecting an empty provider list
    pub fn new(providers: Vec<VideoSourceProvider>) -> Result<Self, CatalogError> {
        if providers.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        Ok(Self { providers })
    }

    /// Parse a catalog from the published JSON array shape
    pub fn from_json(json: &str) -> Result<Self> {
        let providers: Vec<VideoSourceProvider> =
            serde_json::from_str(json).context("Failed to parse source catalog JSON")?;
        Ok(Self::new(providers)?)
    }

    /// Load a catalog from a local JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source catalog {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VideoSourceProvider> {
        self.providers.get(index)
    }

    /// The default provider (index 0)
    pub fn default_provider(&self) -> &VideoSourceProvider {
        &self.providers[0]
    }

    /// Find a provider by its stable key
    pub fn position(&self, key: &str) -> Option<usize> {
        self.providers.iter().position(|p| p.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoSourceProvider> {
        self.providers.iter()
    }

    pub fn providers(&self) -> &[VideoSourceProvider] {
        &self.providers
    }

    /// Build a URL with the provider at `index`
    ///
    /// Returns `None` when the index is outside the catalog.
    pub fn build_url(
        &self,
        index: usize,
        content_id: u64,
        kind: ContentKind,
        season: u32,
        episode: u32,
    ) -> Option<Result<String, CatalogError>> {
        self.get(index)
            .map(|provider| build_url(provider, content_id, kind, season, episode))
    }
}
