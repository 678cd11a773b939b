use super::controller::ManualStart;
use crate::error::AudioError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const FAILURE_MESSAGE: &str = "Could not start the music. Check your audio settings.";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct OfferId(pub Uuid);

impl OfferId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OfferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Wording of the manual-start affordance.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum OfferVariant {
    /// Autoplay was blocked by policy
    Standard,
    /// The source could not be verified; starting may still work
    VerificationFailed,
}

impl OfferVariant {
    pub fn message(&self) -> &'static str {
        match self {
            OfferVariant::Standard => "Start the theme music?",
            OfferVariant::VerificationFailed => "Start the theme music? (verification failed)",
        }
    }
}

/// Request for an explicit user gesture before playback can start.
#[derive(Clone)]
pub struct ManualStartOffer {
    pub id: OfferId,
    pub source_url: String,
    pub variant: OfferVariant,
    /// Accept only from a real user-input event.
    pub handle: ManualStart,
}

impl fmt::Debug for ManualStartOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualStartOffer")
            .field("id", &self.id)
            .field("source_url", &self.source_url)
            .field("variant", &self.variant)
            .finish()
    }
}

/// UI side of the autoplay fallback.
///
/// A new offer replaces any unresolved one; implementations must never show
/// two affordances at once.
pub trait NotificationPresenter: Send + Sync {
    fn offer_manual_start(&self, offer: ManualStartOffer);

    /// The soundscape changed before the offer was accepted; hide its
    /// affordance.
    fn withdraw_manual_start(&self, offer: OfferId);

    /// Outcome of an accepted offer. On error the affordance shows
    /// [`FAILURE_MESSAGE`] and nothing is retried.
    fn manual_start_resolved(&self, offer: OfferId, outcome: &Result<(), AudioError>);
}

/// Presenter for headless runs: logs offers and never accepts them.
#[derive(Default)]
pub struct LogPresenter;

impl NotificationPresenter for LogPresenter {
    fn offer_manual_start(&self, offer: ManualStartOffer) {
        info!(
            "Manual start offered for {} ({})",
            offer.source_url,
            offer.variant.message()
        );
    }

    fn withdraw_manual_start(&self, offer: OfferId) {
        info!("Manual start {} withdrawn", offer);
    }

    fn manual_start_resolved(&self, offer: OfferId, outcome: &Result<(), AudioError>) {
        match outcome {
            Ok(()) => info!("Manual start {} succeeded", offer),
            Err(e) => warn!("Manual start {} failed: {}", offer, e),
        }
    }
}
