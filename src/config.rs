//! Configuration management for embedplay
//!
//! Handles config file loading/saving and source catalog location.
//! Config is stored at ~/.config/embedplay/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::sources::DEFAULT_SOURCES_URL;
use crate::player::controls::{DEFAULT_DIMMED_OPACITY, DEFAULT_DIM_AFTER};
use crate::player::guard::DEFAULT_POPUP_SCAN_INTERVAL;
use crate::player::session::PlayerOptions;

/// Environment override for a local catalog file
pub const SOURCES_FILE_ENV: &str = "EMBEDPLAY_SOURCES_FILE";

/// Environment override for the remote catalog URL
pub const SOURCES_URL_ENV: &str = "EMBEDPLAY_SOURCES_URL";

/// Controls overlay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Milliseconds without interaction before controls dim
    pub dim_after_ms: u64,
    /// Opacity of dimmed controls (0.0 - 1.0)
    pub dimmed_opacity: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            dim_after_ms: DEFAULT_DIM_AFTER.as_millis() as u64,
            dimmed_opacity: DEFAULT_DIMMED_OPACITY,
        }
    }
}

/// Embedded surface guard settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Iframe re-scan period for popup suppression
    pub popup_scan_interval_ms: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            popup_scan_interval_ms: DEFAULT_POPUP_SCAN_INTERVAL.as_millis() as u64,
        }
    }
}

/// Where the provider catalog comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcesLocation {
    File(PathBuf),
    Url(String),
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote provider catalog URL
    pub sources_url: Option<String>,
    /// Local provider catalog (takes precedence over the URL)
    pub sources_file: Option<PathBuf>,
    pub controls: ControlsConfig,
    pub guard: GuardConfig,
}

impl Config {
    /// Get config file path (~/.config/embedplay/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("embedplay").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load config from a specific file; missing or malformed files yield defaults
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Resolve the catalog location with fallback chain:
    /// 1. Explicit file / URL (CLI flags)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Built-in default URL
    pub fn sources_location(
        &self,
        file_flag: Option<&Path>,
        url_flag: Option<&str>,
    ) -> SourcesLocation {
        if let Some(file) = file_flag {
            return SourcesLocation::File(file.to_path_buf());
        }
        if let Some(url) = url_flag {
            return SourcesLocation::Url(url.to_string());
        }

        if let Ok(file) = std::env::var(SOURCES_FILE_ENV) {
            if !file.is_empty() {
                return SourcesLocation::File(PathBuf::from(file));
            }
        }
        if let Ok(url) = std::env::var(SOURCES_URL_ENV) {
            if !url.is_empty() {
                return SourcesLocation::Url(url);
            }
        }

        if let Some(ref file) = self.sources_file {
            return SourcesLocation::File(file.clone());
        }
        SourcesLocation::Url(
            self.sources_url
                .clone()
                .unwrap_or_else(|| DEFAULT_SOURCES_URL.to_string()),
        )
    }

    /// Session tunables derived from this config
    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            dim_after: Duration::from_millis(self.controls.dim_after_ms),
            dimmed_opacity: self.controls.dimmed_opacity.clamp(0.0, 1.0),
            popup_scan_interval: Duration::from_millis(self.guard.popup_scan_interval_ms.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Run `f` with the catalog env overrides set as given, then clear them
    fn with_env<T>(file: Option<&str>, url: Option<&str>, f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for (name, value) in [(SOURCES_FILE_ENV, file), (SOURCES_URL_ENV, url)] {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
        let result = f();
        std::env::remove_var(SOURCES_FILE_ENV);
        std::env::remove_var(SOURCES_URL_ENV);
        result
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.sources_url.is_none());
        assert!(config.sources_file.is_none());
        assert_eq!(config.controls.dim_after_ms, 5000);
        assert_eq!(config.guard.popup_scan_interval_ms, 100);
    }

    #[test]
    fn test_player_options_from_defaults() {
        let options = Config::default().player_options();
        assert_eq!(options, PlayerOptions::default());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[controls]\ndim_after_ms = 2500\n").unwrap();
        assert_eq!(config.controls.dim_after_ms, 2500);
        assert_eq!(config.controls.dimmed_opacity, DEFAULT_DIMMED_OPACITY);
        assert_eq!(config.guard, GuardConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            sources_file: Some(PathBuf::from("/srv/sources.json")),
            controls: ControlsConfig {
                dim_after_ms: 1500,
                dimmed_opacity: 0.5,
            },
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "controls = [not toml").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(Config::load_from(&dir.path().join("missing.toml")), Config::default());
    }

    #[test]
    fn test_flags_take_precedence() {
        let config = Config {
            sources_url: Some("https://config.example/sources.json".into()),
            ..Config::default()
        };
        assert_eq!(
            config.sources_location(Some(Path::new("/tmp/sources.json")), Some("https://flag.example")),
            SourcesLocation::File(PathBuf::from("/tmp/sources.json"))
        );
        assert_eq!(
            config.sources_location(None, Some("https://flag.example")),
            SourcesLocation::Url("https://flag.example".into())
        );
    }

    #[test]
    fn test_flags_beat_env() {
        let location = with_env(Some("/env/sources.json"), None, || {
            Config::default().sources_location(None, Some("https://flag.example"))
        });
        assert_eq!(location, SourcesLocation::Url("https://flag.example".into()));
    }

    #[test]
    fn test_env_beats_config_file() {
        let config = Config {
            sources_url: Some("https://config.example/sources.json".into()),
            sources_file: Some(PathBuf::from("/config/sources.json")),
            ..Config::default()
        };

        let location = with_env(Some("/env/sources.json"), Some("https://env.example"), || {
            config.sources_location(None, None)
        });
        assert_eq!(location, SourcesLocation::File(PathBuf::from("/env/sources.json")));

        let location = with_env(None, Some("https://env.example"), || {
            config.sources_location(None, None)
        });
        assert_eq!(location, SourcesLocation::Url("https://env.example".into()));
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let config = Config {
            sources_url: Some("https://config.example/sources.json".into()),
            ..Config::default()
        };
        let location = with_env(Some(""), Some(""), || config.sources_location(None, None));
        assert_eq!(
            location,
            SourcesLocation::Url("https://config.example/sources.json".into())
        );
    }

    #[test]
    fn test_config_file_beats_config_url() {
        let config = Config {
            sources_url: Some("https://config.example/sources.json".into()),
            sources_file: Some(PathBuf::from("/config/sources.json")),
            ..Config::default()
        };
        let location = with_env(None, None, || config.sources_location(None, None));
        assert_eq!(location, SourcesLocation::File(PathBuf::from("/config/sources.json")));
    }

    #[test]
    fn test_falls_back_to_default_url() {
        let location = with_env(None, None, || Config::default().sources_location(None, None));
        assert_eq!(location, SourcesLocation::Url(DEFAULT_SOURCES_URL.to_string()));
    }
}
