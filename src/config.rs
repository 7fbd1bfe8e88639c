//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/constel/config.toml` (XDG) or platform config dir
//! 2. Project config: `.constel.toml`
//! 3. Environment variables: `CONSTEL_*`
//!
//! Every field has a default, so constel runs with no config file at all.
//!
//! ```toml
//! [tracking]
//! model = "https://storage.googleapis.com/mediapipe-models/hand_landmarker/hand_landmarker/float16/1/hand_landmarker.task"
//! load_timeout_secs = 30
//! debounce_frames = 5
//!
//! [tracking.capture]
//! width = 320
//! height = 240
//! frame_rate = 30
//!
//! [viewer]
//! window_width = 1280.0
//! window_height = 720.0
//! auto_rotate = 0.09
//! ```

use std::ops::Deref;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

/// Where the hand-landmark detection model comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Bytes bundled with the active vision backend.
    Builtin,
    /// Fetched over HTTP.
    Url(String),
    /// Read from the local filesystem.
    Path(PathBuf),
}

/// Hand-tracking pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Model location: an `http(s)://` URL, a filesystem path, or the
    /// literal `builtin` for backends that bundle their own model.
    #[serde(default = "default_model")]
    pub model: String,
    /// Upper bound on detector construction; past it the accelerated
    /// delegate is abandoned and the CPU delegate is tried.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
    /// Consecutive identical raw classifications required before the
    /// reported gesture changes.
    #[serde(default = "default_debounce")]
    pub debounce_frames: u32,
    /// Camera capture request.
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Fixed target resolution and frame rate requested from the camera.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_capture_width")]
    pub width: u32,
    #[serde(default = "default_capture_height")]
    pub height: u32,
    #[serde(default = "default_capture_rate")]
    pub frame_rate: u32,
}

/// Viewer window and camera defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
    /// Idle azimuthal rotation in radians per second, applied whenever no
    /// hand is active.
    #[serde(default = "default_auto_rotate")]
    pub auto_rotate: f32,
}

fn default_model() -> String {
    "https://storage.googleapis.com/mediapipe-models/hand_landmarker/hand_landmarker/float16/1/hand_landmarker.task".to_string()
}

fn default_load_timeout() -> u64 {
    30
}

fn default_debounce() -> u32 {
    5
}

fn default_capture_width() -> u32 {
    320
}

fn default_capture_height() -> u32 {
    240
}

fn default_capture_rate() -> u32 {
    30
}

fn default_window_width() -> f32 {
    1280.0
}

fn default_window_height() -> f32 {
    720.0
}

fn default_auto_rotate() -> f32 {
    0.09
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            load_timeout_secs: default_load_timeout(),
            debounce_frames: default_debounce(),
            capture: CaptureConfig::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_capture_width(),
            height: default_capture_height(),
            frame_rate: default_capture_rate(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            auto_rotate: default_auto_rotate(),
        }
    }
}

impl TrackingConfig {
    /// Interpret the `model` string as a concrete source.
    pub fn model_source(&self) -> ModelSource {
        if self.model.eq_ignore_ascii_case("builtin") {
            ModelSource::Builtin
        } else if self.model.starts_with("http://") || self.model.starts_with("https://") {
            ModelSource::Url(self.model.clone())
        } else {
            ModelSource::Path(PathBuf::from(&self.model))
        }
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        let user_config = Self::user_config_path();

        Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(".constel.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("CONSTEL_").split("_"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// User config path: ~/.config/constel/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("constel").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("constel").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_need_no_file() {
        let config = Config::default();
        assert_eq!(config.tracking.load_timeout_secs, 30);
        assert_eq!(config.tracking.debounce_frames, 5);
        assert_eq!(config.tracking.capture.width, 320);
        assert_eq!(config.tracking.capture.frame_rate, 30);
        assert!(config.viewer.auto_rotate > 0.0);
    }

    #[test]
    fn test_model_source_parsing() {
        let mut tracking = TrackingConfig::default();
        assert!(matches!(tracking.model_source(), ModelSource::Url(_)));

        tracking.model = "builtin".to_string();
        assert_eq!(tracking.model_source(), ModelSource::Builtin);

        tracking.model = "/var/cache/hand_landmarker.task".to_string();
        assert!(matches!(tracking.model_source(), ModelSource::Path(_)));
    }
}
