//! API clients for external services
//!
//! - Sources: remote provider catalog

pub mod sources;

pub use sources::{SourcesClient, SourcesError};
