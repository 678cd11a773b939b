pub mod catalog;
pub mod client;
pub mod hints;

pub use self::catalog::SoundscapeCatalog;
pub use self::client::{CharacterIntro, CommandResponse, GameClient};
pub use self::hints::hint_for_location;

use crate::audio::AudioController;
use crate::config::GameConfig;
use crate::error::GameResult;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;

/// What the page renders for one turn.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TurnView {
    pub description: String,
    pub chat_history: Option<String>,
    pub image_url: String,
    pub hint: Option<String>,
    /// Soundscape key forwarded to the audio controller, if any
    pub soundscape: Option<String>,
}

/// Backend paths come either absolute or relative to the static root.
fn static_path(path: &str) -> String {
    if path.starts_with('/') || path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("/static/{}", path)
    }
}

/// Ties command submission to the background soundscape.
pub struct GameSession {
    client: GameClient,
    audio: AudioController,
    catalog: SoundscapeCatalog,
    placeholder_image: String,
    current_location: Mutex<Option<String>>,
}

impl GameSession {
    pub fn new(
        client: GameClient,
        audio: AudioController,
        catalog: SoundscapeCatalog,
        config: &GameConfig,
    ) -> Self {
        Self {
            client,
            audio,
            catalog,
            placeholder_image: config.placeholder_image.clone(),
            current_location: Mutex::new(None),
        }
    }

    pub fn audio(&self) -> &AudioController {
        &self.audio
    }

    pub fn current_location(&self) -> Option<String> {
        self.current_location.lock().clone()
    }

    pub async fn submit(&self, command: &str) -> GameResult<TurnView> {
        let turn = self.client.submit_command(command).await?;
        Ok(self.apply_response(turn))
    }

    pub async fn character_intro(&self, audio_id: &str) -> GameResult<CharacterIntro> {
        self.client.fetch_character_audio(audio_id).await
    }

    /// Soundscape key and track path for a turn.
    ///
    /// The ambient sound is the key; a bare location falls back to the catalog.
    fn soundscape_for(&self, turn: &CommandResponse) -> Option<(String, String)> {
        if let Some(ambient) = turn.ambient_sound.as_deref().filter(|s| !s.is_empty()) {
            return Some((ambient.to_string(), static_path(ambient)));
        }
        let location = turn.current_location.as_deref().filter(|s| !s.is_empty())?;
        let track = self.catalog.track_for(location);
        Some((track.to_string(), track.to_string()))
    }

    /// Forward a turn's metadata to the audio controller and build the view.
    pub fn apply_response(&self, turn: CommandResponse) -> TurnView {
        if let Some(location) = turn.current_location.as_deref().filter(|s| !s.is_empty()) {
            *self.current_location.lock() = Some(location.to_string());
        }

        let mut soundscape = None;
        if let Some((key, path)) = self.soundscape_for(&turn) {
            match self.client.resolve(&path) {
                Ok(url) => {
                    self.audio.request_soundscape(&key, url.as_str());
                    soundscape = Some(key);
                }
                Err(e) => warn!("Skipping soundscape {}: {}", key, e),
            }
        }

        let image_path = turn
            .image_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.placeholder_image);
        let image_url = self.resolve_image(image_path);
        debug!("Turn image: {}", image_url);

        TurnView {
            description: turn.description,
            chat_history: turn.chat_history,
            image_url,
            hint: turn.hint.filter(|h| !h.is_empty()),
            soundscape,
        }
    }

    /// Absolute image URL; anything unresolvable shows the placeholder.
    pub fn resolve_image(&self, path: &str) -> String {
        self.client
            .resolve(path)
            .or_else(|_| self.client.resolve(&self.placeholder_image))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.placeholder_image.clone())
    }

    /// Hint shown shortly after the page opens: the backend's if it sent
    /// one, else one derived from the current location.
    pub fn initial_hint(&self, server_hint: Option<&str>) -> Option<String> {
        if let Some(hint) = server_hint.filter(|h| !h.is_empty()) {
            return Some(hint.to_string());
        }
        self.current_location()
            .map(|location| hint_for_location(&location).to_string())
    }
}
