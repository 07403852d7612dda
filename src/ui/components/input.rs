use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling a key event in an input component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
  /// Value changed
  Changed,
  /// Key was handled but the value is the same (cursor moves, rejected chars)
  Consumed,
  /// Enter pressed
  Submitted,
  /// Escape pressed
  Cancelled,
  /// Key not handled, pass to next handler
  NotHandled,
}

/// Single-line text input. The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
  buffer: String,
  cursor: usize,
  digits_only: bool,
}

impl TextInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Input that only accepts ASCII digits
  pub fn numeric() -> Self {
    Self {
      digits_only: true,
      ..Self::default()
    }
  }

  pub fn value(&self) -> &str {
    &self.buffer
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn clear(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
  }

  /// Replace the value and put the cursor at the end
  pub fn set_value(&mut self, value: &str) {
    self.buffer = value.to_string();
    self.cursor = self.len();
  }

  pub fn cursor_position(&self) -> usize {
    self.cursor
  }

  fn len(&self) -> usize {
    self.buffer.chars().count()
  }

  /// Byte offset of a character index
  fn offset(&self, index: usize) -> usize {
    self
      .buffer
      .char_indices()
      .nth(index)
      .map(|(i, _)| i)
      .unwrap_or(self.buffer.len())
  }

  /// Handle a key event, returning the result
  pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
      KeyCode::Esc => InputResult::Cancelled,
      KeyCode::Enter => InputResult::Submitted,
      KeyCode::Backspace => {
        if self.cursor == 0 {
          return InputResult::Consumed;
        }
        self.cursor -= 1;
        let at = self.offset(self.cursor);
        self.buffer.remove(at);
        InputResult::Changed
      }
      KeyCode::Delete => {
        if self.cursor >= self.len() {
          return InputResult::Consumed;
        }
        let at = self.offset(self.cursor);
        self.buffer.remove(at);
        InputResult::Changed
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        InputResult::Consumed
      }
      KeyCode::Right => {
        self.cursor = (self.cursor + 1).min(self.len());
        InputResult::Consumed
      }
      KeyCode::Home => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::End => {
        self.cursor = self.len();
        InputResult::Consumed
      }
      KeyCode::Char('a') if ctrl => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('e') if ctrl => {
        self.cursor = self.len();
        InputResult::Consumed
      }
      KeyCode::Char('u') if ctrl => {
        // Clear line before cursor
        if self.cursor == 0 {
          return InputResult::Consumed;
        }
        let at = self.offset(self.cursor);
        self.buffer = self.buffer[at..].to_string();
        self.cursor = 0;
        InputResult::Changed
      }
      KeyCode::Char(_) if ctrl => InputResult::NotHandled,
      KeyCode::Char(c) => {
        if self.digits_only && !c.is_ascii_digit() {
          return InputResult::Consumed;
        }
        let at = self.offset(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
        InputResult::Changed
      }
      _ => InputResult::NotHandled,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl_key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL)
  }

  fn type_str(input: &mut TextInput, text: &str) {
    for c in text.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_basic_input() {
    let mut input = TextInput::new();
    assert!(input.is_empty());

    assert_eq!(input.handle_key(key(KeyCode::Char('h'))), InputResult::Changed);
    input.handle_key(key(KeyCode::Char('i')));
    assert_eq!(input.value(), "hi");
  }

  #[test]
  fn test_submit_and_cancel() {
    let mut input = TextInput::new();
    type_str(&mut input, "Ana");

    assert_eq!(input.handle_key(key(KeyCode::Enter)), InputResult::Submitted);
    assert_eq!(input.handle_key(key(KeyCode::Esc)), InputResult::Cancelled);
    assert_eq!(input.value(), "Ana");
  }

  #[test]
  fn test_backspace_on_multibyte_name() {
    let mut input = TextInput::new();
    type_str(&mut input, "Zoë");
    input.handle_key(key(KeyCode::Backspace));
    assert_eq!(input.value(), "Zo");
    assert_eq!(input.cursor_position(), 2);
  }

  #[test]
  fn test_insert_in_middle() {
    let mut input = TextInput::new();
    type_str(&mut input, "Éac");
    input.handle_key(key(KeyCode::Left));
    input.handle_key(key(KeyCode::Char('b')));
    assert_eq!(input.value(), "Éabc");
  }

  #[test]
  fn test_numeric_input_rejects_letters() {
    let mut input = TextInput::numeric();
    type_str(&mut input, "2a1");
    assert_eq!(input.value(), "21");
    assert_eq!(
      input.handle_key(key(KeyCode::Char('-'))),
      InputResult::Consumed
    );
  }

  #[test]
  fn test_set_value_moves_cursor_to_end() {
    let mut input = TextInput::new();
    input.set_value("Budi");
    input.handle_key(key(KeyCode::Char('!')));
    assert_eq!(input.value(), "Budi!");
  }

  #[test]
  fn test_ctrl_u_clear_before_cursor() {
    let mut input = TextInput::new();
    type_str(&mut input, "hello world");
    for _ in 0..5 {
      input.handle_key(key(KeyCode::Left));
    }
    input.handle_key(ctrl_key(KeyCode::Char('u')));
    assert_eq!(input.value(), "world");
  }
}
