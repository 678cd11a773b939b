use crate::error::{GameError, GameResult};
use base64::prelude::*;
use log::{debug, info};
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// One turn as answered by `POST /command`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommandResponse {
    pub description: String,
    #[serde(default)]
    pub chat_history: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub current_location: Option<String>,
    /// Path of the ambient track, relative to the backend root
    #[serde(default)]
    pub ambient_sound: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CharacterAudioPayload {
    audio_data: String,
    audio_text: String,
}

/// A character's spoken introduction.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterIntro {
    pub text: String,
    /// Encoded audio (mpeg), ready for a decoder
    pub audio: Vec<u8>,
}

impl CharacterIntro {
    fn from_payload(payload: CharacterAudioPayload) -> GameResult<Self> {
        let audio = BASE64_STANDARD.decode(payload.audio_data.trim())?;
        Ok(Self {
            text: payload.audio_text,
            audio,
        })
    }
}

/// HTTP client for the game backend.
#[derive(Clone)]
pub struct GameClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GameClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> GameResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| GameError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self { http, base_url })
    }

    /// Resolve a backend path (`/static/audio/cave.mp3`) or keep an absolute URL.
    pub fn resolve(&self, path: &str) -> GameResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| GameError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Send a player command and parse the turn.
    pub async fn submit_command(&self, command: &str) -> GameResult<CommandResponse> {
        let command = command.trim();
        if command.is_empty() {
            return Err(GameError::EmptyCommand);
        }

        let url = self.resolve("/command")?;
        debug!("Submitting command {:?} to {}", command, url);
        let response = self
            .http
            .post(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ACCEPT, "application/json")
            .form(&[("command", command)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GameError::Status(response.status().as_u16()));
        }
        let turn: CommandResponse = response.json().await?;
        info!(
            "Turn received (location: {:?})",
            turn.current_location.as_deref().unwrap_or("-")
        );
        Ok(turn)
    }

    /// Fetch and decode a character's intro line.
    pub async fn fetch_character_audio(&self, audio_id: &str) -> GameResult<CharacterIntro> {
        let url = self.resolve(&format!("/character_audio/{}", audio_id))?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(GameError::Status(response.status().as_u16()));
        }
        let payload: CharacterAudioPayload = response.json().await?;
        CharacterIntro::from_payload(payload)
    }
}
