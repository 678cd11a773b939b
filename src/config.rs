use crate::error::ConfigError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub game: GameConfig,
}

/// Tuning of the background soundscape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Preferred unmuted volume on first start (0..=1)
    pub default_volume: f32,
    /// Wait after a successful muted start before unmuting
    pub grace_delay_ms: u64,
    /// Crossfade length of the native backend
    pub fade_ms: u64,
    /// Check the source before offering a manual start
    pub probe_sources: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            default_volume: 0.3,
            grace_delay_ms: 1000,
            fade_ms: 1500,
            probe_sources: true,
        }
    }
}

impl AudioConfig {
    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Root of the game backend; relative asset paths resolve against it
    pub base_url: String,
    /// Shown when a turn carries no image
    pub placeholder_image: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            placeholder_image: "/static/placeholder.svg".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load the config file, falling back to defaults.
    /// A missing file is expected on first start and only logged at info level.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
