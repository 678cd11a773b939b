use crate::asset_loader::AssetCache;
use crate::audio::ambience::{open_default_output, AmbienceResource};
use crate::audio::controller::ControllerDeps;
use crate::audio::intro::IntroPlayer;
use crate::audio::notify::FAILURE_MESSAGE;
use crate::audio::{
    AudioController, AudioState, HttpProbe, JsonPreferenceStore, ManualStart, ManualStartOffer,
    NotificationPresenter, OfferId, OfferVariant, SourceProbe,
};
use crate::config::Config;
use crate::error::AudioError;
use crate::game::{GameClient, GameSession, SoundscapeCatalog, TurnView};
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{AppHandle, Emitter, Manager, Runtime, State};

pub const EVENT_MANUAL_START: &str = "soundscape://manual-start";
pub const EVENT_MANUAL_START_RESOLVED: &str = "soundscape://manual-start-resolved";
pub const EVENT_MANUAL_START_WITHDRAWN: &str = "soundscape://manual-start-withdrawn";
pub const EVENT_STATE_CHANGED: &str = "soundscape://state-changed";

// Event payload types for frontend communication
#[derive(Clone, Serialize)]
struct ManualStartPayload {
    offer_id: OfferId,
    source_url: String,
    message: &'static str,
    verification_failed: bool,
}

#[derive(Clone, Serialize)]
struct ManualStartWithdrawnPayload {
    offer_id: OfferId,
}

#[derive(Clone, Serialize)]
struct ManualStartResolvedPayload {
    offer_id: OfferId,
    started: bool,
    message: Option<&'static str>,
}

/// Shows the manual-start toast in the webview. Only the latest offer is
/// kept; the webview's play button resolves it through `accept_manual_start`
/// and a soundscape change takes it down again.
struct WebviewPresenter<R: Runtime> {
    app: AppHandle<R>,
    pending: Arc<Mutex<Option<ManualStart>>>,
}

impl<R: Runtime> NotificationPresenter for WebviewPresenter<R> {
    fn offer_manual_start(&self, offer: ManualStartOffer) {
        let payload = ManualStartPayload {
            offer_id: offer.id,
            source_url: offer.source_url.clone(),
            message: offer.variant.message(),
            verification_failed: offer.variant == OfferVariant::VerificationFailed,
        };
        *self.pending.lock() = Some(offer.handle);
        if let Err(e) = self.app.emit(EVENT_MANUAL_START, payload) {
            warn!("Failed to emit manual start offer: {}", e);
        }
    }

    fn withdraw_manual_start(&self, offer: OfferId) {
        {
            let mut pending = self.pending.lock();
            if pending.as_ref().map(ManualStart::id) == Some(offer) {
                *pending = None;
            }
        }
        let payload = ManualStartWithdrawnPayload { offer_id: offer };
        if let Err(e) = self.app.emit(EVENT_MANUAL_START_WITHDRAWN, payload) {
            warn!("Failed to emit manual start withdrawal: {}", e);
        }
    }

    fn manual_start_resolved(&self, offer: OfferId, outcome: &Result<(), AudioError>) {
        let payload = ManualStartResolvedPayload {
            offer_id: offer,
            started: outcome.is_ok(),
            message: outcome.as_ref().err().map(|_| FAILURE_MESSAGE),
        };
        if let Err(e) = self.app.emit(EVENT_MANUAL_START_RESOLVED, payload) {
            warn!("Failed to emit manual start outcome: {}", e);
        }
    }
}

/// Managed state of the plugin.
pub struct DesktopState {
    session: GameSession,
    pending: Arc<Mutex<Option<ManualStart>>>,
    intro: IntroPlayer,
}

fn build_state<R: Runtime>(
    app: &AppHandle<R>,
    config: &Config,
) -> Result<DesktopState, Box<dyn std::error::Error>> {
    let data_dir = app.path().app_data_dir()?;
    let http = reqwest::Client::new();

    let output = open_default_output()?;
    let resource = AmbienceResource::new(
        output.clone(),
        AssetCache::new(&data_dir, http.clone()),
        config.audio.fade_duration(),
    );

    let pending = Arc::new(Mutex::new(None));
    let presenter = Arc::new(WebviewPresenter {
        app: app.clone(),
        pending: pending.clone(),
    });
    let probe: Option<Arc<dyn SourceProbe>> = if config.audio.probe_sources {
        Some(Arc::new(HttpProbe::new(http.clone())))
    } else {
        None
    };
    // Switch tails run on Tauri's own tokio runtime
    let runtime = tauri::async_runtime::block_on(async { tokio::runtime::Handle::current() });

    let controller = AudioController::new(
        Box::new(resource),
        ControllerDeps {
            presenter,
            preferences: Arc::new(JsonPreferenceStore::new(data_dir.join("preferences.json"))),
            probe,
            runtime,
        },
        &config.audio,
    );

    let client = GameClient::new(http, &config.game.base_url)?;
    let session = GameSession::new(client, controller, SoundscapeCatalog::default(), &config.game);

    Ok(DesktopState {
        session,
        pending,
        intro: IntroPlayer::new(output),
    })
}

fn emit_state<R: Runtime>(app: &AppHandle<R>, state: &AudioState) {
    if let Err(e) = app.emit(EVENT_STATE_CHANGED, state.clone()) {
        warn!("Failed to emit audio state: {}", e);
    }
}

// ===== Audio Commands =====

#[tauri::command]
fn request_soundscape<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, DesktopState>,
    key: String,
    url: String,
) -> AudioState {
    let audio = state.session.audio();
    audio.request_soundscape(&key, &url);
    let snapshot = audio.snapshot();
    emit_state(&app, &snapshot);
    snapshot
}

#[tauri::command]
fn toggle_mute<R: Runtime>(app: AppHandle<R>, state: State<'_, DesktopState>) -> AudioState {
    let audio = state.session.audio();
    audio.toggle_mute();
    let snapshot = audio.snapshot();
    emit_state(&app, &snapshot);
    snapshot
}

#[tauri::command]
fn set_volume<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, DesktopState>,
    level: f32,
) -> AudioState {
    let audio = state.session.audio();
    audio.set_volume(level);
    let snapshot = audio.snapshot();
    emit_state(&app, &snapshot);
    snapshot
}

#[tauri::command]
fn audio_status(state: State<'_, DesktopState>) -> AudioState {
    state.session.audio().snapshot()
}

/// Invoked from the toast's play button, i.e. from a user gesture.
#[tauri::command]
async fn accept_manual_start<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, DesktopState>,
    offer_id: OfferId,
) -> Result<(), String> {
    let handle = {
        let mut pending = state.pending.lock();
        if pending.as_ref().map(ManualStart::id) == Some(offer_id) {
            pending.take()
        } else {
            None
        }
    }
    .ok_or_else(|| AudioError::StaleOffer.to_string())?;
    let outcome = handle.accept().await;
    emit_state(&app, &state.session.audio().snapshot());
    outcome.map_err(|e| e.to_string())
}

// ===== Game Commands =====

#[tauri::command]
async fn submit_command<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, DesktopState>,
    command: String,
) -> Result<TurnView, String> {
    let turn = state
        .session
        .submit(&command)
        .await
        .map_err(|e| e.to_string())?;
    emit_state(&app, &state.session.audio().snapshot());
    Ok(turn)
}

/// Fetch a character's intro line, start it, and return its transcript.
#[tauri::command]
async fn play_character_audio(
    state: State<'_, DesktopState>,
    audio_id: String,
) -> Result<String, String> {
    let intro = state
        .session
        .character_intro(&audio_id)
        .await
        .map_err(|e| e.to_string())?;
    state.intro.play(intro.audio).map_err(|e| e.to_string())?;
    Ok(intro.text)
}

#[tauri::command]
fn initial_hint(state: State<'_, DesktopState>, server_hint: Option<String>) -> Option<String> {
    state.session.initial_hint(server_hint.as_deref())
}

/// The `soundscape` plugin: background audio, manual-start toasts and
/// command submission for the game page.
pub fn init<R: Runtime>(config: Config) -> TauriPlugin<R> {
    crate::init_logging();

    Builder::new("soundscape")
        .invoke_handler(tauri::generate_handler![
            // Audio
            request_soundscape,
            toggle_mute,
            set_volume,
            audio_status,
            accept_manual_start,
            // Game
            submit_command,
            play_character_audio,
            initial_hint,
        ])
        .setup(move |app, _api| {
            let state = build_state(app, &config)?;
            app.manage(state);
            info!("Soundscape plugin initialized");
            Ok(())
        })
        .build()
}

/// Same as [`init`], reading the config from a JSON file.
pub fn init_from_file<R: Runtime>(path: &Path) -> TauriPlugin<R> {
    init(Config::load_or_default(path))
}
