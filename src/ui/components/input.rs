use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling a key event in an input component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
  /// Key was handled, continue input mode
  Consumed,
  /// Enter pressed, here's the submitted value
  Submitted(String),
  /// Escape pressed, input cancelled
  Cancelled,
  /// Key not handled, pass to next handler
  NotHandled,
}

/// Reusable text input component
///
/// The cursor is a character index, so multi-byte input (Korean nicknames,
/// pasted tokens) edits cleanly.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
  buffer: String,
  cursor: usize,
  masked: bool,
}

impl TextInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// An input that renders every character as `*`, for secrets.
  pub fn masked() -> Self {
    Self {
      masked: true,
      ..Self::default()
    }
  }

  /// Text to draw: the value, or one `*` per character when masked.
  pub fn display(&self) -> String {
    if self.masked {
      "*".repeat(self.buffer.chars().count())
    } else {
      self.buffer.clone()
    }
  }

  fn byte_index(&self, cursor: usize) -> usize {
    self
      .buffer
      .char_indices()
      .nth(cursor)
      .map(|(i, _)| i)
      .unwrap_or(self.buffer.len())
  }

  fn char_len(&self) -> usize {
    self.buffer.chars().count()
  }

  /// Get the current input value
  pub fn value(&self) -> &str {
    &self.buffer
  }

  /// Check if the input is empty
  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  /// Clear the input
  pub fn clear(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
  }

  /// Handle a key event, returning the result
  pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
    match key.code {
      KeyCode::Esc => InputResult::Cancelled,
      KeyCode::Enter => InputResult::Submitted(self.buffer.clone()),
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let at = self.byte_index(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Delete => {
        if self.cursor < self.char_len() {
          let at = self.byte_index(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Left => {
        if self.cursor > 0 {
          self.cursor -= 1;
        }
        InputResult::Consumed
      }
      KeyCode::Right => {
        if self.cursor < self.char_len() {
          self.cursor += 1;
        }
        InputResult::Consumed
      }
      KeyCode::Home | KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::End | KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.cursor = self.char_len();
        InputResult::Consumed
      }
      KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        // Clear line before cursor
        let at = self.byte_index(self.cursor);
        self.buffer = self.buffer[at..].to_string();
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        // Delete word before cursor
        if self.cursor > 0 {
          let at = self.byte_index(self.cursor);
          let before = &self.buffer[..at];
          let start = before.trim_end().rfind(' ').map(|i| i + 1).unwrap_or(0);
          self.cursor = self.buffer[..start].chars().count();
          self.buffer = format!("{}{}", &self.buffer[..start], &self.buffer[at..]);
        }
        InputResult::Consumed
      }
      KeyCode::Char(c) => {
        let at = self.byte_index(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
        InputResult::Consumed
      }
      _ => InputResult::NotHandled,
    }
  }

  /// Get cursor position for rendering
  pub fn cursor_position(&self) -> usize {
    self.cursor
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn typed(text: &str) -> TextInput {
    let mut input = TextInput::new();
    for c in text.chars() {
      input.handle_key(press(KeyCode::Char(c)));
    }
    input
  }

  fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
  }

  #[test]
  fn test_enter_and_esc() {
    let mut input = typed("tok");
    assert_eq!(input.handle_key(press(KeyCode::Enter)), InputResult::Submitted("tok".to_string()));
    assert_eq!(input.handle_key(press(KeyCode::Esc)), InputResult::Cancelled);
    assert_eq!(input.handle_key(press(KeyCode::F(2))), InputResult::NotHandled);
  }

  #[test]
  fn test_edit_in_the_middle() {
    let mut input = typed("bearr");
    input.handle_key(press(KeyCode::Left));
    input.handle_key(press(KeyCode::Backspace));
    assert_eq!(input.value(), "bear");
    input.handle_key(press(KeyCode::Delete));
    assert_eq!(input.value(), "bea");
    assert_eq!(input.cursor_position(), 3);
  }

  #[test]
  fn test_line_shortcuts() {
    let mut input = typed("theme dark");
    input.handle_key(ctrl('w'));
    assert_eq!(input.value(), "theme ");

    input.handle_key(ctrl('a'));
    input.handle_key(press(KeyCode::Char('>')));
    assert_eq!(input.value(), ">theme ");

    input.handle_key(ctrl('e'));
    input.handle_key(press(KeyCode::Left));
    input.handle_key(ctrl('u'));
    assert_eq!(input.value(), " ");
    assert!(!input.is_empty());
  }

  #[test]
  fn test_multibyte_editing() {
    let mut input = typed("미라");
    input.handle_key(press(KeyCode::Left));
    input.handle_key(press(KeyCode::Char('x')));
    assert_eq!(input.value(), "미x라");

    input.handle_key(press(KeyCode::Backspace));
    input.handle_key(press(KeyCode::Backspace));
    assert_eq!(input.value(), "라");
    assert_eq!(input.cursor_position(), 0);
  }

  #[test]
  fn test_masked_display() {
    let mut input = TextInput::masked();
    for c in "secret".chars() {
      input.handle_key(press(KeyCode::Char(c)));
    }
    assert_eq!(input.display(), "******");
    assert_eq!(input.value(), "secret");
    assert_eq!(typed("plain").display(), "plain");
  }
}
