use super::bordered;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::UiContext;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Token entry. Submitting hands the token to the App, which stores it and
/// continues to the redirect target.
pub struct LoginView {
  input: TextInput,
  redirect: String,
}

impl LoginView {
  pub fn new(redirect: String) -> Self {
    Self {
      input: TextInput::masked(),
      redirect,
    }
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.input.handle_key(key) {
      InputResult::Submitted(token) if !token.trim().is_empty() => {
        self.input.clear();
        ViewAction::Login(token)
      }
      InputResult::Cancelled => {
        self.input.clear();
        ViewAction::None
      }
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    let block = bordered(format!(" {} ", ui.labels.login), ui);
    let lines = vec![
      Line::styled(ui.labels.login_hint, Style::default().fg(ui.palette.muted)),
      Line::raw(""),
      Line::from(vec![
        Span::styled(
          format!("{}: ", ui.labels.token_prompt),
          Style::default().fg(ui.palette.accent),
        ),
        Span::raw(self.input.display()),
        Span::styled("_", Style::default().fg(ui.palette.warn)),
      ]),
      Line::raw(""),
      Line::styled(format!("→ {}", self.redirect), Style::default().fg(ui.palette.muted)),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("enter", "log in"), Shortcut::new("esc", "clear")]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::{KeyCode, KeyModifiers};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_submit_token() {
    let mut view = LoginView::new("/inventory".to_string());
    assert_eq!(view.handle_key(key(KeyCode::Enter)), ViewAction::None);

    for c in "abc:1".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    assert_eq!(
      view.handle_key(key(KeyCode::Enter)),
      ViewAction::Login("abc:1".to_string())
    );
    assert_eq!(view.input.value(), "");
  }
}
