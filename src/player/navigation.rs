//! Playback navigation - provider/season/episode state machine
//!
//! Owns the `PlaybackSelection` of one session and every transition on it.
//! A transition first builds the new URL and only then commits, so a provider
//! that cannot serve the request leaves the selection untouched.

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ContentKind, PlaybackSelection, SeasonSummary};
use crate::player::catalog::{CatalogError, SourceCatalog};

/// Errors from navigation transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("Provider index {index} out of range (catalog has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Outcome of a next/previous episode request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeStep {
    /// Content is a movie; nothing to traverse
    NotEpisodic,
    /// Selection moved; `url` is the new target for the surface
    Moved { season: u32, episode: u32, url: String },
    /// No episode after the current one
    EndOfSeries,
    /// No episode before the current one
    StartOfSeries,
}

/// Season metadata arranged for traversal
#[derive(Debug, Clone)]
struct SeasonIndex {
    /// As supplied, specials included
    seasons: Vec<SeasonSummary>,
    /// Ascending season numbers, specials excluded
    order: Vec<u32>,
}

impl SeasonIndex {
    fn new(seasons: &[SeasonSummary]) -> Self {
        let mut order: Vec<u32> = seasons
            .iter()
            .filter(|s| !s.is_specials())
            .map(|s| s.season_number)
            .collect();
        order.sort_unstable();
        order.dedup();

        Self {
            seasons: seasons.to_vec(),
            order,
        }
    }

    fn episode_count(&self, season: u32) -> Option<u32> {
        self.seasons
            .iter()
            .find(|s| s.season_number == season)
            .map(|s| s.episode_count)
    }

    fn next_after(&self, season: u32) -> Option<u32> {
        let pos = self.order.iter().position(|&n| n == season)?;
        self.order.get(pos + 1).copied()
    }

    fn previous_before(&self, season: u32) -> Option<u32> {
        let pos = self.order.iter().position(|&n| n == season)?;
        pos.checked_sub(1).map(|prev| self.order[prev])
    }
}

/// Traversal policy, fixed at construction from the content kind
#[derive(Debug, Clone)]
enum Traversal {
    Movie,
    Series(SeasonIndex),
}

/// State machine over one session's `PlaybackSelection`
#[derive(Debug, Clone)]
pub struct PlaybackNavigationState {
    catalog: SourceCatalog,
    traversal: Traversal,
    selection: PlaybackSelection,
}

impl PlaybackNavigationState {
    /// Create the state for a freshly opened player
    ///
    /// The selection starts on provider 0, loading, with the picker closed.
    /// `initial_url` is taken as-is; season/episode are ignored for movies.
    pub fn new(
        catalog: SourceCatalog,
        content_id: u64,
        kind: ContentKind,
        season: u32,
        episode: u32,
        seasons: &[SeasonSummary],
        initial_url: impl Into<String>,
    ) -> Self {
        let (traversal, season, episode) = match kind {
            ContentKind::Movie => (Traversal::Movie, 1, 1),
            ContentKind::Series => (Traversal::Series(SeasonIndex::new(seasons)), season, episode),
        };

        Self {
            catalog,
            traversal,
            selection: PlaybackSelection {
                content_id,
                content_kind: kind,
                provider_index: 0,
                current_season: season,
                current_episode: episode,
                resolved_url: initial_url.into(),
                is_loading: true,
                is_source_picker_open: false,
            },
        }
    }

    pub fn selection(&self) -> &PlaybackSelection {
        &self.selection
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn resolved_url(&self) -> &str {
        &self.selection.resolved_url
    }

    /// Recompute the URL for the current selection without changing it
    pub fn recompute_url(&self) -> Result<String, NavigationError> {
        let selection = &self.selection;
        self.build(
            selection.provider_index,
            selection.current_season,
            selection.current_episode,
        )
    }

    /// Switch to the provider at `index`
    ///
    /// On success the URL is rebuilt for the current season/episode, loading
    /// starts and the source picker closes. On failure nothing changes.
    pub fn select_provider(&mut self, index: usize) -> Result<&str, NavigationError> {
        let url = self.build(index, self.selection.current_season, self.selection.current_episode)?;

        debug!(index, url = %url, "switching provider");
        self.selection.provider_index = index;
        self.selection.is_source_picker_open = false;
        self.commit_url(url);
        Ok(&self.selection.resolved_url)
    }

    /// Advance one episode, rolling into the next season when needed
    pub fn next_episode(&mut self) -> Result<EpisodeStep, NavigationError> {
        let Traversal::Series(index) = &self.traversal else {
            return Ok(EpisodeStep::NotEpisodic);
        };

        let season = self.selection.current_season;
        let episode = self.selection.current_episode;
        // Unknown season: stay put rather than guess a cap
        let cap = index.episode_count(season).unwrap_or(episode);

        let target = if episode < cap {
            Some((season, episode + 1))
        } else {
            index.next_after(season).map(|next| (next, 1))
        };

        match target {
            Some((season, episode)) => self.move_to(season, episode),
            None => {
                debug!(season, episode, "end of series");
                Ok(EpisodeStep::EndOfSeries)
            }
        }
    }

    /// Step back one episode, rolling into the previous season's last episode
    pub fn previous_episode(&mut self) -> Result<EpisodeStep, NavigationError> {
        let Traversal::Series(index) = &self.traversal else {
            return Ok(EpisodeStep::NotEpisodic);
        };

        let season = self.selection.current_season;
        let episode = self.selection.current_episode;

        let target = if episode > 1 {
            Some((season, episode - 1))
        } else {
            index.previous_before(season).map(|prev| {
                let last = index.episode_count(prev).unwrap_or(1).max(1);
                (prev, last)
            })
        };

        match target {
            Some((season, episode)) => self.move_to(season, episode),
            None => {
                debug!(season, episode, "start of series");
                Ok(EpisodeStep::StartOfSeries)
            }
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.selection.is_loading = loading;
    }

    pub fn set_source_picker_open(&mut self, open: bool) {
        self.selection.is_source_picker_open = open;
    }

    fn move_to(&mut self, season: u32, episode: u32) -> Result<EpisodeStep, NavigationError> {
        let url = self.build(self.selection.provider_index, season, episode)?;

        debug!(season, episode, url = %url, "moving to episode");
        self.selection.current_season = season;
        self.selection.current_episode = episode;
        self.commit_url(url.clone());
        Ok(EpisodeStep::Moved { season, episode, url })
    }

    fn build(&self, index: usize, season: u32, episode: u32) -> Result<String, NavigationError> {
        let len = self.catalog.len();
        let result = self
            .catalog
            .build_url(
                index,
                self.selection.content_id,
                self.selection.content_kind,
                season,
                episode,
            )
            .ok_or(NavigationError::IndexOutOfRange { index, len })?;

        result.map_err(|e| {
            warn!(error = %e, "provider cannot build a URL");
            NavigationError::from(e)
        })
    }

    fn commit_url(&mut self, url: String) {
        self.selection.resolved_url = url;
        self.selection.is_loading = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoSourceProvider;

    fn catalog() -> SourceCatalog {
        SourceCatalog::new(vec![
            VideoSourceProvider::new(
                "alpha",
                "Alpha",
                "https://alpha.example/movie/{id}",
                "https://alpha.example/tv/{id}/{season}/{episode}",
            ),
            VideoSourceProvider::new(
                "beta",
                "Beta",
                "https://beta.example/m/{id}",
                "https://beta.example/t/{id}-{season}-{episode}",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_season_index_skips_specials_and_sorts() {
        let index = SeasonIndex::new(&[
            SeasonSummary::new(2, 8),
            SeasonSummary::new(0, 3),
            SeasonSummary::new(1, 10),
        ]);
        assert_eq!(index.order, vec![1, 2]);
        assert_eq!(index.next_after(1), Some(2));
        assert_eq!(index.next_after(2), None);
        assert_eq!(index.previous_before(1), None);
        assert_eq!(index.next_after(0), None);
        assert_eq!(index.episode_count(0), Some(3));
    }

    #[test]
    fn test_movie_is_not_episodic() {
        let mut state = PlaybackNavigationState::new(
            catalog(),
            550,
            ContentKind::Movie,
            4,
            9,
            &[],
            "https://alpha.example/movie/550",
        );
        let before = state.selection().clone();
        assert_eq!(state.next_episode().unwrap(), EpisodeStep::NotEpisodic);
        assert_eq!(state.previous_episode().unwrap(), EpisodeStep::NotEpisodic);
        assert_eq!(state.selection(), &before);
    }

    #[test]
    fn test_select_provider_rebuilds_for_current_episode() {
        let mut state = PlaybackNavigationState::new(
            catalog(),
            1396,
            ContentKind::Series,
            2,
            3,
            &[SeasonSummary::new(2, 13)],
            "https://alpha.example/tv/1396/2/3",
        );
        state.set_source_picker_open(true);
        state.set_loading(false);

        let url = state.select_provider(1).unwrap().to_string();

        assert_eq!(url, "https://beta.example/t/1396-2-3");
        let selection = state.selection();
        assert_eq!(selection.provider_index, 1);
        assert!(selection.is_loading);
        assert!(!selection.is_source_picker_open);
    }

    #[test]
    fn test_unknown_season_cannot_advance() {
        let mut state = PlaybackNavigationState::new(
            catalog(),
            1396,
            ContentKind::Series,
            5,
            2,
            &[SeasonSummary::new(1, 10)],
            "https://alpha.example/tv/1396/5/2",
        );
        assert_eq!(state.next_episode().unwrap(), EpisodeStep::EndOfSeries);
        assert_eq!(state.selection().current_episode, 2);
    }
}
