//! Player subsystem
//!
//! - Catalog: provider list and URL templating
//! - Navigation: provider/season/episode state machine
//! - Guard: policy for the embedded web surface
//! - Controls: auto-dimming controls timer
//! - Session: orchestrates the above for one playback

pub mod catalog;
pub mod controls;
pub mod guard;
pub mod navigation;
pub mod session;

pub use catalog::{build_url, CatalogError, SourceCatalog};
pub use controls::{Clock, ControlsVisibilityTimer, ManualClock, SystemClock, Visibility};
pub use guard::{EmbeddedSurface, EmbeddedSurfaceGuard, SurfaceEvent, SurfaceSettings};
pub use navigation::{EpisodeStep, NavigationError, PlaybackNavigationState};
pub use session::{
    PlayerNotice, PlayerOptions, PlayerSession, Recovery, ScreenAction, SourceEntry,
    SurfaceSignal,
};
