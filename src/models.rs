//! Data structures shared across the player
//!
//! Organized by domain:
//! - **Content**: movie/series discriminator and season metadata
//! - **Providers**: interchangeable embed-URL template pairs
//! - **Playback**: the per-session selection and the route the player opens with

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Content Models
// =============================================================================

/// Content kind discriminator, resolved once when the player opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv", alias = "series")]
    Series,
}

impl ContentKind {
    pub fn is_series(&self) -> bool {
        matches!(self, ContentKind::Series)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Movie => write!(f, "Movie"),
            ContentKind::Series => write!(f, "TV Show"),
        }
    }
}

/// Summary of a TV season as reported by the metadata API
///
/// Season 0 holds specials; it may be present here but never takes part in
/// episode traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    pub episode_count: u32,
}

impl SeasonSummary {
    pub fn new(season_number: u32, episode_count: u32) -> Self {
        Self {
            season_number,
            episode_count,
        }
    }

    /// Whether this entry is the specials pseudo-season
    pub fn is_specials(&self) -> bool {
        self.season_number == 0
    }
}

impl fmt::Display for SeasonSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Season {} ({} episodes)",
            self.season_number, self.episode_count
        )
    }
}

// =============================================================================
// Provider Models
// =============================================================================

/// A third-party video source: one URL template per content kind
///
/// Templates use `{id}`, and for episodes also `{season}` and `{episode}`.
/// Field names on the wire match the published provider catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSourceProvider {
    pub key: String,
    pub name: String,
    #[serde(rename = "movieUrlPattern")]
    pub movie_url_template: String,
    #[serde(rename = "tvUrlPattern")]
    pub episode_url_template: String,
}

impl VideoSourceProvider {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        movie_url_template: impl Into<String>,
        episode_url_template: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            movie_url_template: movie_url_template.into(),
            episode_url_template: episode_url_template.into(),
        }
    }

    /// Template used for the given content kind
    pub fn template_for(&self, kind: ContentKind) -> &str {
        match kind {
            ContentKind::Movie => &self.movie_url_template,
            ContentKind::Series => &self.episode_url_template,
        }
    }
}

impl fmt::Display for VideoSourceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.key)
    }
}

// =============================================================================
// Playback Models
// =============================================================================

/// Mutable selection for one playback session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSelection {
    pub content_id: u64,
    pub content_kind: ContentKind,
    /// 0-based index into the provider catalog
    pub provider_index: usize,
    pub current_season: u32,
    pub current_episode: u32,
    /// URL currently pushed to the embedded surface
    pub resolved_url: String,
    pub is_loading: bool,
    pub is_source_picker_open: bool,
}

impl PlaybackSelection {
    /// Season/episode label, e.g. `S2:E5` (None for movies)
    pub fn episode_label(&self) -> Option<String> {
        self.content_kind
            .is_series()
            .then(|| format!("S{}:E{}", self.current_season, self.current_episode))
    }
}

fn default_position() -> u32 {
    1
}

/// Parameters the player is opened with
///
/// Mirrors the navigation params handed over by the details screen, so the
/// serialized field names follow that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRoute {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_position")]
    pub season: u32,
    #[serde(default = "default_position")]
    pub episode: u32,
    #[serde(rename = "seasonsData", default)]
    pub seasons: Vec<SeasonSummary>,
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
    pub sources: Vec<VideoSourceProvider>,
}
