use ratatui::prelude::*;

use crate::notify::ToastKind;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

pub fn toast_color(kind: ToastKind) -> Color {
  match kind {
    ToastKind::Success => Color::Green,
    ToastKind::Error => Color::Red,
    ToastKind::Warning => Color::Yellow,
  }
}

/// A rect of the given size centered in `area`, clipped to fit
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}
