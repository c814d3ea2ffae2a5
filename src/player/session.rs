//! Player session - orchestrates one playback from open to close
//!
//! Owns the navigation state, the surface guard, the controls timer and the
//! host surface itself. Every operation the presentation layer can invoke
//! lives here, and none of them fail: problems become `PlayerNotice`s.
//!
//! Load events are correlated against the URL that is current when they
//! arrive. Anything for a superseded URL, or anything after `close`, is
//! dropped.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{ContentKind, PlaybackSelection, PlayerRoute, SeasonSummary};
use crate::player::catalog::{build_url, CatalogError, SourceCatalog};
use crate::player::controls::{
    Clock, ControlsVisibilityTimer, DEFAULT_DIMMED_OPACITY, DEFAULT_DIM_AFTER,
};
use crate::player::guard::{
    EmbeddedSurface, EmbeddedSurfaceGuard, GuardOptions, LoadVerdict, SurfaceEvent,
    DEFAULT_POPUP_SCAN_INTERVAL,
};
use crate::player::navigation::{EpisodeStep, NavigationError, PlaybackNavigationState};

// =============================================================================
// Options & Outcomes
// =============================================================================

/// Tunables for a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerOptions {
    pub dim_after: Duration,
    pub dimmed_opacity: f32,
    pub popup_scan_interval: Duration,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            dim_after: DEFAULT_DIM_AFTER,
            dimmed_opacity: DEFAULT_DIMMED_OPACITY,
            popup_scan_interval: DEFAULT_POPUP_SCAN_INTERVAL,
        }
    }
}

/// Ways out of a failed source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// Open the source picker
    ChooseAnotherSource,
    /// Leave the player
    ExitPlayer,
}

/// User-facing notice produced by a session operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum PlayerNotice {
    /// The selected provider cannot serve this content
    SourceUnavailable { provider: String, kind: ContentKind },
    EndOfSeries,
    StartOfSeries,
    /// The surface failed to load the current URL
    PlaybackSourceFailed {
        url: String,
        recoveries: [Recovery; 2],
    },
}

impl PlayerNotice {
    pub fn title(&self) -> &'static str {
        match self {
            PlayerNotice::SourceUnavailable { .. } => "Source Unavailable",
            PlayerNotice::EndOfSeries => "End of Series",
            PlayerNotice::StartOfSeries => "Start of Series",
            PlayerNotice::PlaybackSourceFailed { .. } => "Playback Error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            PlayerNotice::SourceUnavailable { kind, .. } => format!(
                "This source cannot play {} content. Please choose another source.",
                kind
            ),
            PlayerNotice::EndOfSeries => "No more episodes available.".to_string(),
            PlayerNotice::StartOfSeries => "This is the first episode.".to_string(),
            PlayerNotice::PlaybackSourceFailed { .. } => {
                "There was an error loading this source. Please try a different source."
                    .to_string()
            }
        }
    }
}

/// What the screen should do after back/recovery handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    Stay,
    Exit,
}

/// Load signal forwarded from the host surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceSignal {
    LoadComplete,
    LoadError,
}

/// One row of the source picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
    pub index: usize,
    pub key: String,
    pub name: String,
    pub selected: bool,
}

// =============================================================================
// Route Construction
// =============================================================================

impl PlayerRoute {
    /// Build the route for opening the player on the default provider
    ///
    /// Refuses when the default provider cannot serve the content, so the
    /// player is never opened on a dead URL.
    pub fn for_content(
        catalog: &SourceCatalog,
        id: u64,
        kind: ContentKind,
        title: impl Into<String>,
        season: u32,
        episode: u32,
        seasons: Vec<SeasonSummary>,
    ) -> Result<Self, CatalogError> {
        let source_url = build_url(catalog.default_provider(), id, kind, season, episode)?;
        Ok(Self {
            id,
            kind,
            title: title.into(),
            season,
            episode,
            seasons: if kind.is_series() { seasons } else { Vec::new() },
            source_url,
            sources: catalog.providers().to_vec(),
        })
    }
}

// =============================================================================
// Session
// =============================================================================

/// A single playback session bound to one host surface
pub struct PlayerSession<S: EmbeddedSurface, C: Clock> {
    id: Uuid,
    title: String,
    navigation: PlaybackNavigationState,
    guard: EmbeddedSurfaceGuard,
    controls: ControlsVisibilityTimer<C>,
    surface: S,
    closed: bool,
}

impl<S: EmbeddedSurface, C: Clock> PlayerSession<S, C> {
    /// Open the player: configure the surface, load the initial URL, show controls
    ///
    /// The caller-supplied URL is used as-is; a blank one is rebuilt from the
    /// default provider.
    pub fn open(
        route: PlayerRoute,
        mut surface: S,
        clock: C,
        options: PlayerOptions,
    ) -> Result<Self, CatalogError> {
        let id = Uuid::new_v4();
        let catalog = SourceCatalog::new(route.sources)?;

        let recomputed = build_url(
            catalog.default_provider(),
            route.id,
            route.kind,
            route.season,
            route.episode,
        );
        let initial_url = match route.source_url.trim() {
            "" => recomputed?,
            supplied => {
                if recomputed.as_deref().ok() != Some(supplied) {
                    warn!(session = %id, url = supplied, "initial URL differs from default provider's");
                }
                supplied.to_string()
            }
        };

        let navigation = PlaybackNavigationState::new(
            catalog,
            route.id,
            route.kind,
            route.season,
            route.episode,
            &route.seasons,
            initial_url,
        );

        let mut guard = EmbeddedSurfaceGuard::new(GuardOptions {
            popup_scan_interval: options.popup_scan_interval,
        });
        surface.configure(&guard.settings());
        guard.arm(&mut surface, navigation.resolved_url());

        let mut controls =
            ControlsVisibilityTimer::new(clock, options.dim_after, options.dimmed_opacity);
        controls.start();

        debug!(session = %id, content = route.id, kind = ?route.kind, "player opened");

        Ok(Self {
            id,
            title: route.title,
            navigation,
            guard,
            controls,
            surface,
            closed: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn selection(&self) -> &PlaybackSelection {
        self.navigation.selection()
    }

    pub fn catalog(&self) -> &SourceCatalog {
        self.navigation.catalog()
    }

    pub fn guard(&self) -> &EmbeddedSurfaceGuard {
        &self.guard
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // -------------------------------------------------------------------------
    // Source selection
    // -------------------------------------------------------------------------

    /// Switch provider and reload; invalid indices are logged and ignored
    pub fn select_provider(&mut self, index: usize) -> Option<PlayerNotice> {
        if self.closed {
            return None;
        }
        let result = self.navigation.select_provider(index).map(str::to_string);
        match result {
            Ok(url) => {
                self.guard.arm(&mut self.surface, &url);
                None
            }
            Err(e) => self.navigation_failed(e),
        }
    }

    pub fn open_source_picker(&mut self) {
        if !self.closed {
            self.navigation.set_source_picker_open(true);
        }
    }

    pub fn close_source_picker(&mut self) {
        if !self.closed {
            self.navigation.set_source_picker_open(false);
        }
    }

    /// Picker rows in catalog order
    pub fn source_entries(&self) -> Vec<SourceEntry> {
        let selected = self.selection().provider_index;
        self.catalog()
            .iter()
            .enumerate()
            .map(|(index, provider)| SourceEntry {
                index,
                key: provider.key.clone(),
                name: provider.name.clone(),
                selected: index == selected,
            })
            .collect()
    }

    pub fn current_source_name(&self) -> &str {
        self.catalog()
            .get(self.selection().provider_index)
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown")
    }

    /// Header/picker label: `Title` or `Title - S1:E2`
    pub fn title_label(&self) -> String {
        let title = if self.title.is_empty() {
            "Untitled"
        } else {
            &self.title
        };
        match self.selection().episode_label() {
            Some(label) => format!("{} - {}", title, label),
            None => title.to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Episode navigation
    // -------------------------------------------------------------------------

    pub fn next_episode(&mut self) -> Option<PlayerNotice> {
        if self.closed {
            return None;
        }
        let step = self.navigation.next_episode();
        self.apply_step(step)
    }

    pub fn previous_episode(&mut self) -> Option<PlayerNotice> {
        if self.closed {
            return None;
        }
        let step = self.navigation.previous_episode();
        self.apply_step(step)
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    /// Any press-in on a control
    pub fn on_control_interaction(&mut self) {
        self.controls.ping();
    }

    pub fn controls_visible(&mut self) -> bool {
        self.controls.is_visible()
    }

    pub fn controls_opacity(&mut self) -> f32 {
        self.controls.opacity()
    }

    /// When the host should poll next to catch the dim transition
    pub fn time_until_dim(&self) -> Option<Duration> {
        self.controls.time_until_dim()
    }

    // -------------------------------------------------------------------------
    // Surface events
    // -------------------------------------------------------------------------

    /// Navigation hook: allow only the exact current URL
    pub fn should_allow_navigation(&self, target_url: &str) -> bool {
        !self.closed && self.guard.should_allow_navigation(target_url)
    }

    /// Navigation hook for raw host payloads
    pub fn should_allow_navigation_payload(&self, payload: &Value) -> bool {
        !self.closed && self.guard.should_allow_payload(payload)
    }

    pub fn on_surface_load_complete(&mut self, event: &SurfaceEvent) {
        if !self.accepts(event) {
            return;
        }
        self.navigation.set_loading(false);
        debug!(session = %self.id, url = %event.url, "surface loaded");
    }

    /// A load error for the current URL becomes `PlaybackSourceFailed`
    pub fn on_surface_load_error(&mut self, event: &SurfaceEvent) -> Option<PlayerNotice> {
        if !self.accepts(event) {
            return None;
        }
        let failure = self.guard.report_load_error(event)?;
        self.navigation.set_loading(false);
        warn!(session = %self.id, error = %failure, "source failed");

        Some(PlayerNotice::PlaybackSourceFailed {
            url: failure.url,
            recoveries: [Recovery::ChooseAnotherSource, Recovery::ExitPlayer],
        })
    }

    /// Validate a raw host payload and dispatch it; malformed ones are dropped
    pub fn on_surface_signal(
        &mut self,
        signal: SurfaceSignal,
        payload: &Value,
    ) -> Option<PlayerNotice> {
        let Some(event) = SurfaceEvent::from_payload(payload) else {
            debug!(session = %self.id, ?signal, "ignoring malformed surface payload");
            return None;
        };
        match signal {
            SurfaceSignal::LoadComplete => {
                self.on_surface_load_complete(&event);
                None
            }
            SurfaceSignal::LoadError => self.on_surface_load_error(&event),
        }
    }

    // -------------------------------------------------------------------------
    // Exit paths
    // -------------------------------------------------------------------------

    /// Hardware back: close the picker first, otherwise leave
    pub fn handle_back(&mut self) -> ScreenAction {
        if !self.closed && self.selection().is_source_picker_open {
            self.navigation.set_source_picker_open(false);
            return ScreenAction::Stay;
        }
        ScreenAction::Exit
    }

    /// Apply the user's choice after a source failure
    pub fn recover(&mut self, recovery: Recovery) -> ScreenAction {
        match recovery {
            Recovery::ChooseAnotherSource if !self.closed => {
                self.open_source_picker();
                ScreenAction::Stay
            }
            _ => {
                self.close();
                ScreenAction::Exit
            }
        }
    }

    /// End the session: stop the timer, stop guarding, unload the surface
    ///
    /// Idempotent. Also runs on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.controls.stop();
        self.guard.disarm(&mut self.surface);
        debug!(session = %self.id, "player closed");
    }

    /// Events are matched by URL alone: after switching A -> B -> A, a late
    /// event from the first load of A counts as current.
    fn accepts(&self, event: &SurfaceEvent) -> bool {
        if self.closed {
            debug!(session = %self.id, url = %event.url, "surface event after close");
            return false;
        }
        if self.guard.classify(event) == LoadVerdict::Stale {
            debug!(session = %self.id, url = %event.url, "discarding stale surface event");
            return false;
        }
        true
    }

    fn apply_step(&mut self, step: Result<EpisodeStep, NavigationError>) -> Option<PlayerNotice> {
        match step {
            Ok(EpisodeStep::Moved { url, .. }) => {
                self.guard.arm(&mut self.surface, &url);
                None
            }
            Ok(EpisodeStep::NotEpisodic) => None,
            Ok(EpisodeStep::EndOfSeries) => Some(PlayerNotice::EndOfSeries),
            Ok(EpisodeStep::StartOfSeries) => Some(PlayerNotice::StartOfSeries),
            Err(e) => self.navigation_failed(e),
        }
    }

    fn navigation_failed(&self, error: NavigationError) -> Option<PlayerNotice> {
        match error {
            NavigationError::IndexOutOfRange { index, len } => {
                warn!(session = %self.id, index, len, "ignoring out-of-range provider index");
                None
            }
            NavigationError::Catalog(CatalogError::InvalidTemplate { provider, kind }) => {
                Some(PlayerNotice::SourceUnavailable { provider, kind })
            }
            NavigationError::Catalog(CatalogError::EmptyCatalog) => None,
        }
    }
}

impl<S: EmbeddedSurface, C: Clock> Drop for PlayerSession<S, C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: EmbeddedSurface, C: Clock> std::fmt::Debug for PlayerSession<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSession")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("selection", self.selection())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoSourceProvider;

    #[test]
    fn test_notice_texts() {
        assert_eq!(PlayerNotice::EndOfSeries.title(), "End of Series");
        assert_eq!(PlayerNotice::StartOfSeries.message(), "This is the first episode.");
        let notice = PlayerNotice::SourceUnavailable {
            provider: "alpha".into(),
            kind: ContentKind::Series,
        };
        assert!(notice.message().contains("TV Show"));
    }

    #[test]
    fn test_route_for_content_uses_default_provider() {
        let catalog = SourceCatalog::new(vec![VideoSourceProvider::new(
            "alpha",
            "Alpha",
            "https://alpha.example/movie/{id}",
            "https://alpha.example/tv/{id}/{season}/{episode}",
        )])
        .unwrap();

        let route = PlayerRoute::for_content(
            &catalog,
            1396,
            ContentKind::Series,
            "Breaking Bad",
            2,
            4,
            vec![SeasonSummary::new(2, 13)],
        )
        .unwrap();
        assert_eq!(route.source_url, "https://alpha.example/tv/1396/2/4");
        assert_eq!(route.sources.len(), 1);

        let movie = PlayerRoute::for_content(
            &catalog,
            550,
            ContentKind::Movie,
            "Fight Club",
            1,
            1,
            vec![SeasonSummary::new(1, 3)],
        )
        .unwrap();
        assert!(movie.seasons.is_empty());
    }

    #[test]
    fn test_route_for_content_refuses_dead_url() {
        let catalog = SourceCatalog::new(vec![VideoSourceProvider::new(
            "movies-only",
            "Movies Only",
            "https://m.example/{id}",
            "",
        )])
        .unwrap();
        let result = PlayerRoute::for_content(&catalog, 1, ContentKind::Series, "Show", 1, 1, vec![]);
        assert!(matches!(result, Err(CatalogError::InvalidTemplate { .. })));
    }
}
