pub mod controller;
pub mod notify;
pub mod preferences;
pub mod probe;
pub mod state;

#[cfg(feature = "native-audio")]
pub mod ambience;
#[cfg(feature = "native-audio")]
pub mod intro;

use crate::error::AudioResult;
use std::future::Future;
use std::pin::Pin;

pub use self::controller::{AudioController, ControllerDeps, ManualStart};
pub use self::notify::{LogPresenter, ManualStartOffer, NotificationPresenter, OfferId, OfferVariant};
pub use self::preferences::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use self::probe::{HttpProbe, SourceProbe};
pub use self::state::{AudioState, PlaybackPhase};

/// Pending outcome of a play attempt or a probe. Owns everything it needs,
/// so it can be awaited without holding the controller lock.
pub type AudioFuture = Pin<Box<dyn Future<Output = AudioResult<()>> + Send + 'static>>;

/// The one looping audio element the controller drives.
///
/// Mirrors a media element: a bound source, a muted flag independent of
/// the volume, and an asynchronous `play`.
pub trait AudioResource: Send {
    /// Bind a new source. Playback of the previous one stops.
    fn set_source(&mut self, source_url: &str);

    fn set_muted(&mut self, muted: bool);
    fn is_muted(&self) -> bool;

    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;

    /// Start (or resume) the bound source.
    fn play(&mut self) -> AudioFuture;

    /// What the listener hears, ignoring any fade in progress.
    fn audible_level(&self) -> f32 {
        if self.is_muted() {
            0.0
        } else {
            self.volume()
        }
    }
}
