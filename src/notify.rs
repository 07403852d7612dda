//! Transient toast notifications.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a toast stays on screen unless configured otherwise
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
  Success,
  Error,
  Warning,
}

#[derive(Debug, Clone)]
pub struct Toast {
  pub kind: ToastKind,
  pub message: String,
  shown_at: Instant,
}

/// Queue of toasts, oldest first. Toasts expire on their own.
#[derive(Debug, Clone)]
pub struct ToastQueue {
  toasts: VecDeque<Toast>,
  ttl: Duration,
}

impl Default for ToastQueue {
  fn default() -> Self {
    Self::new(DEFAULT_TOAST_TTL)
  }
}

impl ToastQueue {
  pub fn new(ttl: Duration) -> Self {
    Self {
      toasts: VecDeque::new(),
      ttl,
    }
  }

  pub fn success(&mut self, message: impl Into<String>) {
    self.push(ToastKind::Success, message);
  }

  pub fn error(&mut self, message: impl Into<String>) {
    self.push(ToastKind::Error, message);
  }

  pub fn warning(&mut self, message: impl Into<String>) {
    self.push(ToastKind::Warning, message);
  }

  pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) {
    self.toasts.push_back(Toast {
      kind,
      message: message.into(),
      shown_at: Instant::now(),
    });
  }

  /// Drop every toast older than the ttl at `now`.
  pub fn expire(&mut self, now: Instant) {
    let ttl = self.ttl;
    self
      .toasts
      .retain(|t| now.saturating_duration_since(t.shown_at) < ttl);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Toast> {
    self.toasts.iter()
  }

  #[cfg(test)]
  pub fn latest(&self) -> Option<&Toast> {
    self.toasts.back()
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.toasts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.toasts.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_toasts_keep_order() {
    let mut queue = ToastQueue::default();
    queue.success("saved");
    queue.error("failed");

    let kinds: Vec<_> = queue.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![ToastKind::Success, ToastKind::Error]);
    assert_eq!(queue.latest().map(|t| t.message.as_str()), Some("failed"));
  }

  #[test]
  fn test_toasts_expire_after_ttl() {
    let mut queue = ToastQueue::new(Duration::from_millis(10));
    queue.warning("careful");

    queue.expire(Instant::now());
    assert_eq!(queue.len(), 1);

    queue.expire(Instant::now() + Duration::from_millis(20));
    assert!(queue.is_empty());
  }
}
