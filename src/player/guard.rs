//! Embedded surface guard - navigation policy for the web surface
//!
//! The third-party player page runs inside an opaque web surface supplied by
//! the host. This module defines what the player needs from that surface and
//! the policy layered on top of it:
//! - top-level navigation is allowed only to the currently resolved URL
//! - popups are suppressed by an injected script that re-scans iframes
//! - the page and its iframes are stretched to fill the viewport
//! - a load error becomes a source failure, never a retry

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Permissions granted to third-party iframes
pub const IFRAME_ALLOW: &str =
    "autoplay; fullscreen; encrypted-media; picture-in-picture; accelerometer; gyroscope; clipboard-write";

/// Default iframe re-scan period for popup suppression
pub const DEFAULT_POPUP_SCAN_INTERVAL: Duration = Duration::from_millis(100);

const LAYOUT_SCRIPT: &str = r#"(function () {
  var fill = 'margin:0;padding:0;width:100%;height:100%;position:absolute;top:0;left:0;';
  document.documentElement.style.cssText += 'margin:0;padding:0;width:100%;height:100%;';
  if (document.body) {
    document.body.style.cssText += fill + 'overflow:hidden;';
  }
  var frames = document.getElementsByTagName('iframe');
  for (var i = 0; i < frames.length; i++) {
    frames[i].style.cssText += fill + 'border:0;';
    frames[i].setAttribute('allow', '__ALLOW__');
    frames[i].setAttribute('allowfullscreen', 'true');
  }
})();
"#;

const POPUP_SCRIPT: &str = r#"(function () {
  var block = function () { return null; };
  try { window.open = block; } catch (e) {}
  if (window.__embedplaySweep) { clearInterval(window.__embedplaySweep); }
  window.__embedplaySweep = setInterval(function () {
    var frames = document.getElementsByTagName('iframe');
    for (var i = 0; i < frames.length; i++) {
      try { frames[i].contentWindow.open = block; } catch (e) {}
    }
  }, __INTERVAL_MS__);
  window.addEventListener('pagehide', function () {
    clearInterval(window.__embedplaySweep);
  });
})();
"#;

/// Mixed http/https content policy for the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MixedContentMode {
    Never,
    Compatibility,
    Always,
}

/// Configuration the host surface must be created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfaceSettings {
    pub javascript_enabled: bool,
    pub dom_storage_enabled: bool,
    pub allows_fullscreen_video: bool,
    pub media_playback_requires_user_action: bool,
    pub allows_inline_media_playback: bool,
    pub mixed_content: MixedContentMode,
    pub support_multiple_windows: bool,
    pub origin_allowlist: Vec<String>,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            javascript_enabled: true,
            dom_storage_enabled: true,
            allows_fullscreen_video: true,
            media_playback_requires_user_action: false,
            allows_inline_media_playback: true,
            mixed_content: MixedContentMode::Compatibility,
            support_multiple_windows: false,
            origin_allowlist: vec!["*".to_string()],
        }
    }
}

/// Capabilities required from the host's web surface
///
/// Load-complete, load-error and navigation events flow the other way: the
/// host forwards them to `PlayerSession`.
pub trait EmbeddedSurface {
    /// Apply creation-time settings
    fn configure(&mut self, settings: &SurfaceSettings);

    /// Start loading `url` as the top-level document
    fn load(&mut self, url: &str);

    /// Register a script to run in the loaded document at load time
    fn inject_script(&mut self, source: &str);

    /// Tear down the current document (player closing)
    fn unload(&mut self);
}

/// Event reported by the surface, narrowed to the URL it refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEvent {
    pub url: String,
}

impl SurfaceEvent {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Validate a raw host payload
    ///
    /// Payloads without a non-empty string `url` are rejected; callers treat
    /// them as stale.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        payload
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(Self::new)
    }
}

/// The surface failed to load the current target
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Playback source failed to load: {url}")]
pub struct PlaybackSourceFailed {
    pub url: String,
}

/// Whether a load event refers to the current target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadVerdict {
    Current,
    Stale,
}

/// Lifecycle of the popup-suppression sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupSweep {
    /// Nothing loaded yet
    Idle,
    /// Sweeping iframes of `url` every `interval`
    Active { url: String, interval: Duration },
    /// Player closed; no sweep may run
    Stopped,
}

/// Guard tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardOptions {
    pub popup_scan_interval: Duration,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            popup_scan_interval: DEFAULT_POPUP_SCAN_INTERVAL,
        }
    }
}

/// Build the load-time script for a given iframe scan interval
pub fn injected_script(popup_scan_interval: Duration) -> String {
    let layout = LAYOUT_SCRIPT.replace("__ALLOW__", IFRAME_ALLOW);
    let popups = POPUP_SCRIPT.replace(
        "__INTERVAL_MS__",
        &popup_scan_interval.as_millis().max(1).to_string(),
    );
    // The trailing expression keeps hosts that evaluate the script happy
    format!("{layout}{popups}true;")
}

/// Navigation-interception policy for the embedded surface
#[derive(Debug, Clone)]
pub struct EmbeddedSurfaceGuard {
    options: GuardOptions,
    script: String,
    target: Option<String>,
    sweep: PopupSweep,
}

impl EmbeddedSurfaceGuard {
    pub fn new(options: GuardOptions) -> Self {
        Self {
            script: injected_script(options.popup_scan_interval),
            options,
            target: None,
            sweep: PopupSweep::Idle,
        }
    }

    /// Settings the host surface must be created with
    pub fn settings(&self) -> SurfaceSettings {
        SurfaceSettings::default()
    }

    /// Script injected into every loaded page
    pub fn injected_script(&self) -> &str {
        &self.script
    }

    /// Current navigation target, if armed
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn sweep(&self) -> &PopupSweep {
        &self.sweep
    }

    /// Arm the guard for a new target and push it to the surface
    ///
    /// Does nothing once the guard has been disarmed.
    pub fn arm(&mut self, surface: &mut dyn EmbeddedSurface, url: &str) {
        if self.sweep == PopupSweep::Stopped {
            debug!(url, "guard disarmed; not loading");
            return;
        }

        self.target = Some(url.to_string());
        self.sweep = PopupSweep::Active {
            url: url.to_string(),
            interval: self.options.popup_scan_interval,
        };
        surface.load(url);
        surface.inject_script(&self.script);
    }

    /// Stop guarding: clear the target, end the sweep, unload the surface
    pub fn disarm(&mut self, surface: &mut dyn EmbeddedSurface) {
        if self.sweep == PopupSweep::Stopped {
            return;
        }
        self.target = None;
        self.sweep = PopupSweep::Stopped;
        surface.unload();
    }

    /// Interception hook: allow only the exact current target
    pub fn should_allow_navigation(&self, target_url: &str) -> bool {
        let allowed = self.target.as_deref() == Some(target_url);
        if !allowed {
            debug!(target_url, "blocked navigation");
        }
        allowed
    }

    /// Interception hook for raw host payloads; malformed payloads are denied
    pub fn should_allow_payload(&self, payload: &Value) -> bool {
        SurfaceEvent::from_payload(payload)
            .map(|event| self.should_allow_navigation(&event.url))
            .unwrap_or(false)
    }

    /// Correlate a load event with the current target
    pub fn classify(&self, event: &SurfaceEvent) -> LoadVerdict {
        if self.target.as_deref() == Some(event.url.as_str()) {
            LoadVerdict::Current
        } else {
            LoadVerdict::Stale
        }
    }

    /// Turn a load error into a source failure, unless it is stale
    pub fn report_load_error(&self, event: &SurfaceEvent) -> Option<PlaybackSourceFailed> {
        match self.classify(event) {
            LoadVerdict::Current => Some(PlaybackSourceFailed {
                url: event.url.clone(),
            }),
            LoadVerdict::Stale => None,
        }
    }
}

impl Default for EmbeddedSurfaceGuard {
    fn default() -> Self {
        Self::new(GuardOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct NullSurface {
        loads: usize,
        unloads: usize,
    }

    impl EmbeddedSurface for NullSurface {
        fn configure(&mut self, _settings: &SurfaceSettings) {}
        fn load(&mut self, _url: &str) {
            self.loads += 1;
        }
        fn inject_script(&mut self, _source: &str) {}
        fn unload(&mut self) {
            self.unloads += 1;
        }
    }

    #[test]
    fn test_script_carries_interval_and_permissions() {
        let script = injected_script(Duration::from_millis(250));
        assert!(script.contains("}, 250);"));
        assert!(script.contains(IFRAME_ALLOW));
        assert!(script.contains("overflow:hidden"));
        assert!(script.ends_with("true;"));
        assert!(!script.contains("__INTERVAL_MS__"));
        assert!(!script.contains("__ALLOW__"));
    }

    #[test]
    fn test_payload_without_url_is_denied() {
        let mut surface = NullSurface::default();
        let mut guard = EmbeddedSurfaceGuard::default();
        guard.arm(&mut surface, "https://a.example/movie/1");

        assert!(guard.should_allow_payload(&json!({ "url": "https://a.example/movie/1" })));
        assert!(!guard.should_allow_payload(&json!({ "href": "https://a.example/movie/1" })));
        assert!(!guard.should_allow_payload(&json!({ "url": 42 })));
        assert!(!guard.should_allow_payload(&json!({ "url": "" })));
    }

    #[test]
    fn test_unarmed_guard_denies_everything() {
        let guard = EmbeddedSurfaceGuard::default();
        assert!(!guard.should_allow_navigation("https://a.example/"));
        assert_eq!(guard.sweep(), &PopupSweep::Idle);
    }

    #[test]
    fn test_disarm_is_final() {
        let mut surface = NullSurface::default();
        let mut guard = EmbeddedSurfaceGuard::default();
        guard.arm(&mut surface, "https://a.example/1");
        guard.disarm(&mut surface);
        guard.disarm(&mut surface);
        guard.arm(&mut surface, "https://a.example/2");

        assert_eq!(surface.loads, 1);
        assert_eq!(surface.unloads, 1);
        assert_eq!(guard.target(), None);
        assert_eq!(guard.sweep(), &PopupSweep::Stopped);
    }
}
