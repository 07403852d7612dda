//! Deferred "install as a standalone app" offer.
//!
//! The host may offer installation at any time. The offer is kept instead of
//! being shown right away, and replayed when the user asks for it. Only the
//! user's answer is logged; nothing else depends on it.

use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOffer {
  /// Cache generation the offer was made for
  pub generation: String,
  pub offered_at: DateTime<Utc>,
}

impl InstallOffer {
  pub fn new(generation: impl Into<String>) -> Self {
    Self {
      generation: generation.into(),
      offered_at: Utc::now(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallChoice {
  Accepted,
  Dismissed,
}

/// Holds at most one deferred offer.
#[derive(Debug, Default)]
pub struct DeferredPrompt {
  offer: Option<InstallOffer>,
}

/// An offer that has been shown and is waiting for the user's answer.
#[derive(Debug)]
pub struct PendingPrompt {
  offer: InstallOffer,
}

impl DeferredPrompt {
  pub fn new() -> Self {
    Self::default()
  }

  /// Keep the offer for later; a newer offer replaces an older one.
  pub fn defer(&mut self, offer: InstallOffer) {
    info!(generation = %offer.generation, "install offer deferred");
    self.offer = Some(offer);
  }

  /// Whether the install trigger should be shown
  pub fn is_available(&self) -> bool {
    self.offer.is_some()
  }

  /// Replay the offer. The stored offer is consumed either way.
  pub fn prompt(&mut self) -> Option<PendingPrompt> {
    self.offer.take().map(|offer| PendingPrompt { offer })
  }
}

impl PendingPrompt {
  pub fn offer(&self) -> &InstallOffer {
    &self.offer
  }

  pub fn resolve(self, choice: InstallChoice) -> InstallChoice {
    match choice {
      InstallChoice::Accepted => {
        info!(generation = %self.offer.generation, "user accepted the install prompt")
      }
      InstallChoice::Dismissed => {
        info!(generation = %self.offer.generation, "user dismissed the install prompt")
      }
    }
    choice
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_prompt_is_single_use() {
    let mut deferred = DeferredPrompt::new();
    assert!(!deferred.is_available());
    assert!(deferred.prompt().is_none());

    deferred.defer(InstallOffer::new("v1"));
    assert!(deferred.is_available());

    let pending = deferred.prompt().unwrap();
    assert!(!deferred.is_available());
    assert_eq!(pending.offer().generation, "v1");
    assert_eq!(
      pending.resolve(InstallChoice::Dismissed),
      InstallChoice::Dismissed
    );
    assert!(deferred.prompt().is_none());
  }

  #[test]
  fn test_newer_offer_replaces_older() {
    let mut deferred = DeferredPrompt::new();
    deferred.defer(InstallOffer::new("v1"));
    deferred.defer(InstallOffer::new("v2"));

    assert_eq!(deferred.prompt().unwrap().offer().generation, "v2");
  }
}
