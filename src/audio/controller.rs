use super::notify::{ManualStartOffer, NotificationPresenter, OfferId, OfferVariant};
use super::preferences::PreferenceStore;
use super::probe::SourceProbe;
use super::state::{clamp_volume, AudioState, PlaybackPhase};
use super::{AudioFuture, AudioResource};
use crate::config::AudioConfig;
use crate::error::{AudioError, AudioResult};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Collaborators injected by the composition root.
pub struct ControllerDeps {
    pub presenter: Arc<dyn NotificationPresenter>,
    pub preferences: Arc<dyn PreferenceStore>,
    /// Checked before a manual start is offered; `None` skips the check
    pub probe: Option<Arc<dyn SourceProbe>>,
    /// Runtime the async tail of each switch runs on
    pub runtime: Handle,
}

struct Inner {
    state: AudioState,
    resource: Box<dyn AudioResource>,
    /// Bumped on every real switch; continuations holding an older value are stale
    generation: u64,
    tail: Option<JoinHandle<()>>,
    /// Unresolved manual-start offer of the current generation
    offer: Option<OfferId>,
}

impl Inner {
    /// Re-establish `audible == (muted ? 0 : volume)` on the resource.
    /// The muted-autoplay probe keeps its forced mute until the grace delay ends.
    fn apply_volume(&mut self) {
        if self.state.phase != PlaybackPhase::AttemptingMutedAutoplay {
            self.resource.set_muted(false);
        }
        self.resource.set_volume(self.state.audible_volume());
    }
}

struct Shared {
    inner: Mutex<Inner>,
    presenter: Arc<dyn NotificationPresenter>,
    preferences: Arc<dyn PreferenceStore>,
    probe: Option<Arc<dyn SourceProbe>>,
    grace_delay: Duration,
    runtime: Handle,
}

/// Owns the background track and reconciles it with the game's soundscape.
///
/// Cheap to clone; all clones drive the same resource.
#[derive(Clone)]
pub struct AudioController {
    shared: Arc<Shared>,
}

/// The accept callback of a manual-start offer.
#[derive(Clone)]
pub struct ManualStart {
    controller: Weak<Shared>,
    id: OfferId,
}

impl ManualStart {
    pub fn id(&self) -> OfferId {
        self.id
    }

    /// Start playback from a user gesture. The outcome is also reported
    /// to the presenter.
    pub async fn accept(&self) -> AudioResult<()> {
        let shared = self.controller.upgrade().ok_or(AudioError::ControllerGone)?;
        AudioController { shared }.accept_manual_start(self.id).await
    }
}

impl AudioController {
    pub fn new(resource: Box<dyn AudioResource>, deps: ControllerDeps, config: &AudioConfig) -> Self {
        let is_muted = match deps.preferences.load_muted() {
            Ok(stored) => stored.unwrap_or(false),
            Err(e) => {
                warn!("Mute preference unavailable, starting unmuted: {}", e);
                false
            }
        };

        let mut inner = Inner {
            state: AudioState::new(is_muted, config.default_volume),
            resource,
            generation: 0,
            tail: None,
            offer: None,
        };
        inner.apply_volume();
        info!("Audio controller initialized, is_muted: {}", is_muted);

        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                presenter: deps.presenter,
                preferences: deps.preferences,
                probe: deps.probe,
                grace_delay: config.grace_delay(),
                runtime: deps.runtime,
            }),
        }
    }

    /// Bind the track for a soundscape and try to make it heard.
    ///
    /// Repeating the current key and source only refreshes the volume.
    /// Failures never reach the caller; they end in a manual-start offer.
    pub fn request_soundscape(&self, key: &str, source_url: &str) {
        if let Some(withdrawn) = self.switch_source(key, source_url) {
            debug!("Withdrawing manual start {}", withdrawn);
            self.shared.presenter.withdraw_manual_start(withdrawn);
        }
    }

    /// Reconcile under the lock. Returns the offer the switch made stale.
    fn switch_source(&self, key: &str, source_url: &str) -> Option<OfferId> {
        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;

        if inner.state.is_bound_to(key, source_url) {
            debug!("Soundscape {} unchanged, updating volume only", key);
            inner.apply_volume();
            return None;
        }

        info!(
            "Switching soundscape: {:?} -> {} ({})",
            inner.state.current_key, key, source_url
        );
        inner.generation += 1;
        if let Some(tail) = inner.tail.take() {
            tail.abort();
        }
        let withdrawn = inner.offer.take();
        inner.state.current_key = Some(key.to_string());
        inner.state.source_url = Some(source_url.to_string());
        inner.resource.set_source(source_url);

        if inner.state.is_muted {
            debug!("Audio is muted, {} bound without playback", key);
            inner.state.phase = PlaybackPhase::Idle;
            inner.apply_volume();
            return withdrawn;
        }

        inner.state.phase = PlaybackPhase::AttemptingMutedAutoplay;
        inner.resource.set_muted(true);
        inner.resource.set_volume(inner.state.volume);
        let attempt = inner.resource.play();

        let generation = inner.generation;
        let this = self.clone();
        inner.tail = Some(
            self.shared
                .runtime
                .spawn(async move { this.run_autoplay(generation, attempt).await }),
        );
        withdrawn
    }

    /// Flip the mute preference. Only the gain changes; playback and any
    /// recovery in flight are left alone.
    pub fn toggle_mute(&self) -> bool {
        let muted = {
            let mut inner = self.shared.inner.lock();
            inner.state.is_muted = !inner.state.is_muted;
            inner.apply_volume();
            inner.state.is_muted
        };

        if let Err(e) = self.shared.preferences.save_muted(muted) {
            warn!("Failed to persist mute preference: {}", e);
        }
        info!("Mute toggled, is_muted: {}", muted);
        muted
    }

    /// Store the preferred volume, clamped to `0.0..=1.0`.
    pub fn set_volume(&self, level: f32) -> f32 {
        let level = clamp_volume(level);
        let mut inner = self.shared.inner.lock();
        inner.state.volume = level;
        if !inner.state.is_muted {
            inner.apply_volume();
        }
        debug!("Volume set to {}", level);
        level
    }

    pub fn snapshot(&self) -> AudioState {
        self.shared.inner.lock().state.clone()
    }

    /// Play the current source on behalf of a user gesture.
    ///
    /// Only the outstanding offer of the current soundscape is accepted;
    /// anything else is [`AudioError::StaleOffer`].
    pub async fn accept_manual_start(&self, id: OfferId) -> AudioResult<()> {
        let (generation, attempt) = {
            let mut inner = self.shared.inner.lock();
            if inner.offer != Some(id) || inner.state.phase != PlaybackPhase::AwaitingUserGesture {
                debug!("Ignoring stale manual start {}", id);
                return Err(AudioError::StaleOffer);
            }
            inner.offer = None;
            inner.apply_volume();
            (inner.generation, inner.resource.play())
        };

        let outcome = attempt.await;

        {
            let mut inner = self.shared.inner.lock();
            if inner.generation == generation {
                match &outcome {
                    Ok(()) => {
                        info!("Music playback started from manual start");
                        inner.state.phase = PlaybackPhase::Playing;
                    }
                    Err(e) => {
                        warn!("Manual start failed: {}", e);
                        inner.state.phase = PlaybackPhase::Failed;
                    }
                }
            } else {
                debug!("Manual start {} resolved after the soundscape changed", id);
            }
        }

        self.shared.presenter.manual_start_resolved(id, &outcome);
        outcome
    }

    fn is_current(&self, generation: u64) -> bool {
        self.shared.inner.lock().generation == generation
    }

    async fn run_autoplay(self, generation: u64, attempt: AudioFuture) {
        match attempt.await {
            Ok(()) => {
                if !self.is_current(generation) {
                    return;
                }
                debug!(
                    "Muted autoplay started, unmuting in {:?}",
                    self.shared.grace_delay
                );
                tokio::time::sleep(self.shared.grace_delay).await;

                let mut guard = self.shared.inner.lock();
                let inner = &mut *guard;
                if inner.generation != generation {
                    return;
                }
                inner.state.phase = PlaybackPhase::Playing;
                if inner.state.is_muted {
                    inner.resource.set_volume(0.0);
                    info!("Audio remains muted");
                } else {
                    inner.resource.set_muted(false);
                    inner.resource.set_volume(inner.state.volume);
                    info!("Audio unmuted");
                }
            }
            Err(cause) => {
                let source_url = {
                    let mut inner = self.shared.inner.lock();
                    if inner.generation != generation {
                        return;
                    }
                    warn!("Autoplay blocked: {}", cause);
                    inner.state.phase = PlaybackPhase::AutoplayBlocked;
                    inner.apply_volume();
                    inner.state.source_url.clone().unwrap_or_default()
                };
                self.offer_manual_start(generation, source_url, &cause).await;
            }
        }
    }

    async fn offer_manual_start(&self, generation: u64, source_url: String, cause: &AudioError) {
        let mut variant = if cause.is_unavailable() {
            OfferVariant::VerificationFailed
        } else {
            OfferVariant::Standard
        };
        if variant == OfferVariant::Standard {
            if let Some(probe) = &self.shared.probe {
                if let Err(e) = probe.probe(&source_url).await {
                    warn!("Music file check failed: {}", e);
                    variant = OfferVariant::VerificationFailed;
                }
            }
        }

        let offer = {
            let mut inner = self.shared.inner.lock();
            if inner.generation != generation {
                return;
            }
            if inner.offer.is_some() {
                debug!("Manual start already offered for {}", source_url);
                return;
            }
            let id = OfferId::new();
            inner.offer = Some(id);
            inner.state.phase = PlaybackPhase::AwaitingUserGesture;
            ManualStartOffer {
                id,
                source_url,
                variant,
                handle: ManualStart {
                    controller: Arc::downgrade(&self.shared),
                    id,
                },
            }
        };

        info!("Offering manual start for {}", offer.source_url);
        self.shared.presenter.offer_manual_start(offer);
    }
}
