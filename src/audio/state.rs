use serde::{Deserialize, Serialize};

/// Where the autoplay-recovery protocol currently stands.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Nothing attempted yet, or the source is bound while muted
    Idle,
    /// Resource force-muted while the first play attempt is in flight
    AttemptingMutedAutoplay,
    Playing,
    /// Autoplay failed; the manual-start offer is being prepared
    AutoplayBlocked,
    /// A manual-start affordance is shown and waits for the user
    AwaitingUserGesture,
    /// The manual start failed as well; nothing more is tried
    Failed,
}

/// The controller's view of the single background track.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AudioState {
    pub current_key: Option<String>,
    pub source_url: Option<String>,
    pub volume: f32,
    pub is_muted: bool,
    pub phase: PlaybackPhase,
}

impl AudioState {
    pub fn new(is_muted: bool, volume: f32) -> Self {
        Self {
            current_key: None,
            source_url: None,
            volume: clamp_volume(volume),
            is_muted,
            phase: PlaybackPhase::Idle,
        }
    }

    /// Level the listener should hear once no probe is in progress.
    pub fn audible_volume(&self) -> f32 {
        if self.is_muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn is_bound_to(&self, key: &str, source_url: &str) -> bool {
        self.current_key.as_deref() == Some(key) && self.source_url.as_deref() == Some(source_url)
    }
}

/// Clamp to `0.0..=1.0`; NaN counts as silence.
pub fn clamp_volume(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audible_volume_follows_mute() {
        let mut state = AudioState::new(false, 0.3);
        assert_eq!(state.audible_volume(), 0.3);
        state.is_muted = true;
        assert_eq!(state.audible_volume(), 0.0);
    }

    #[test]
    fn test_clamp_volume() {
        assert_eq!(clamp_volume(-1.0), 0.0);
        assert_eq!(clamp_volume(2.0), 1.0);
        assert_eq!(clamp_volume(0.42), 0.42);
        assert_eq!(clamp_volume(f32::NAN), 0.0);
    }

    #[test]
    fn test_bound_requires_key_and_source() {
        let mut state = AudioState::new(false, 0.3);
        assert!(!state.is_bound_to("village", "/a.mp3"));
        state.current_key = Some("village".into());
        state.source_url = Some("/a.mp3".into());
        assert!(state.is_bound_to("village", "/a.mp3"));
        assert!(!state.is_bound_to("village", "/b.mp3"));
        assert!(!state.is_bound_to("forest", "/a.mp3"));
    }
}
