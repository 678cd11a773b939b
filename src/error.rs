use thiserror::Error;

/// Failures of the background soundscape.
///
/// None of these are fatal: playback failures degrade to a manual-start
/// offer, persistence failures to the default unmuted state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// The output refused to start (autoplay policy, device busy).
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),

    /// The source could not be reached or looks like a placeholder.
    #[error("audio resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("preference store unavailable: {0}")]
    PersistenceUnavailable(String),

    /// A manual-start offer that was superseded or already resolved.
    #[error("manual start offer is no longer current")]
    StaleOffer,

    #[error("audio controller was dropped")]
    ControllerGone,

    #[error("audio device error: {0}")]
    Device(String),

    #[error("failed to decode audio: {0}")]
    Decode(String),
}

impl AudioError {
    /// Whether the failure should be presented with the
    /// "verification failed" wording.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AudioError::ResourceUnavailable(_))
    }
}

/// Failures talking to the game backend.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("command is empty")]
    EmptyCommand,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend answered with status {0}")]
    Status(u16),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid audio payload: {0}")]
    InvalidAudio(#[from] base64::DecodeError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type AudioResult<T> = std::result::Result<T, AudioError>;
pub type GameResult<T> = std::result::Result<T, GameError>;
