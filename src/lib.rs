//! embedplay - player core for embed-URL video sources
//!
//! Resolves a playable URL from a catalog of interchangeable providers,
//! loads it into a host-supplied web surface, polices navigation inside that
//! surface, and tracks provider/season/episode selection across series
//! boundaries.
//!
//! # Modules
//!
//! - `models` - Content, provider, and playback data structures
//! - `player` - Catalog, navigation state, surface guard, controls timer, session
//! - `api` - Remote provider catalog client
//! - `config` - Config file and catalog location
//! - `cli` - Command-line argument and output types

pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod player;

// Re-export commonly used types
pub use models::{
    ContentKind, PlaybackSelection, PlayerRoute, SeasonSummary, VideoSourceProvider,
};

pub use api::SourcesClient;
pub use config::Config;
pub use player::{PlayerNotice, PlayerOptions, PlayerSession, SourceCatalog};
