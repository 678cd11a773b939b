// Asset loader module for downloading and caching remote audio
pub mod asset_loader;

// Audio module: soundscape controller, autoplay recovery, native output
pub mod audio;

pub mod config;
pub mod error;

// Game backend client and turn handling
pub mod game;

// Tauri plugin wiring the above into the webview
#[cfg(feature = "desktop")]
pub mod desktop;

pub use audio::{AudioController, AudioState, PlaybackPhase};
pub use config::Config;
pub use error::{AudioError, ConfigError, GameError};
pub use game::{GameSession, TurnView};

/// Initialise `env_logger` with an `info` default, overridable via `RUST_LOG`.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
