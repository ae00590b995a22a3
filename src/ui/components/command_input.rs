use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command};
use crate::ui::UiContext;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Suggestions shown at once
const MAX_SUGGESTIONS: usize = 8;

/// What the command line hands back to the App
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// Command submitted, with the text after the command name
  Submitted(&'static str, Option<String>),
  /// Closed without running anything
  Cancelled,
}

/// `:` command line with ranked suggestions
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  selected_suggestion: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn value(&self) -> &str {
    self.input.value()
  }

  /// Open an empty command line
  pub fn activate(&mut self) {
    self.active = true;
    self.reset();
  }

  fn reset(&mut self) {
    self.input.clear();
    self.selected_suggestion = 0;
  }

  /// Commands matching what has been typed so far
  pub fn suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(self.input.value())
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }

  /// Move the highlighted suggestion by one, wrapping at either end.
  fn cycle(&mut self, forward: bool) {
    let len = self.suggestions().len();
    if len == 0 {
      return;
    }
    self.selected_suggestion = if forward {
      (self.selected_suggestion + 1) % len
    } else {
      (self.selected_suggestion + len - 1) % len
    };
  }

  /// Handle a key. While closed only `:` is taken, to open the line.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CommandEvent> {
    if !self.active {
      if key.code != KeyCode::Char(':') {
        return KeyResult::NotHandled;
      }
      self.activate();
      return KeyResult::Handled;
    }

    match key.code {
      KeyCode::Esc => {
        self.active = false;
        self.reset();
        KeyResult::Event(CommandEvent::Cancelled)
      }
      KeyCode::Enter => {
        self.active = false;
        let resolved = commands::resolve(self.input.value(), self.selected_suggestion);
        self.reset();
        match resolved {
          Some((name, argument)) => KeyResult::Event(CommandEvent::Submitted(name, argument)),
          None => KeyResult::Event(CommandEvent::Cancelled),
        }
      }
      KeyCode::Tab | KeyCode::Down => {
        self.cycle(true);
        KeyResult::Handled
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.cycle(false);
        KeyResult::Handled
      }
      _ => match self.input.handle_key(key) {
        InputResult::Consumed => {
          // New text, new ranking
          self.selected_suggestion = 0;
          KeyResult::Handled
        }
        InputResult::Submitted(_) | InputResult::Cancelled => KeyResult::Handled,
        InputResult::NotHandled => KeyResult::NotHandled,
      },
    }
  }

  /// Draw the command line over the top-left corner of `area`
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    if !self.active {
      return;
    }
    let palette = ui.palette;
    let suggestions = self.suggestions();
    let shown = suggestions.len().min(MAX_SUGGESTIONS) as u16;

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let overlay = Rect::new(area.x + 1, area.y + 1, width, 3 + shown).intersection(area);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.warn))
      .title(" : ");
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);
    if inner.height == 0 {
      return;
    }

    let [prompt_area, list_area] =
      Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

    let prompt = Line::from(vec![
      Span::raw(self.input.value().to_string()),
      Span::styled("_", Style::default().fg(palette.warn)),
    ]);
    frame.render_widget(Paragraph::new(prompt), prompt_area);

    if shown == 0 || list_area.height == 0 {
      return;
    }
    let rows: Vec<ListItem> = suggestions
      .iter()
      .take(MAX_SUGGESTIONS)
      .map(|cmd| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<12}", cmd.name), Style::default().fg(palette.accent)),
          Span::styled(cmd.description, Style::default().fg(palette.muted)),
        ]))
      })
      .collect();
    let mut state = ListState::default().with_selected(Some(self.selected_suggestion));
    let list = List::new(rows).highlight_style(Style::default().bg(palette.highlight).fg(palette.text));
    frame.render_stateful_widget(list, list_area, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(input: &mut CommandInput, text: &str) {
    for c in text.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_inactive_ignores_keys_until_colon() {
    let mut input = CommandInput::new();
    assert!(!input.handle_key(key(KeyCode::Char('j'))).consumed());
    assert_eq!(input.handle_key(key(KeyCode::Char(':'))), KeyResult::Handled);
    assert!(input.is_active());
  }

  #[test]
  fn test_submit_with_argument() {
    let mut input = CommandInput::new();
    input.activate();
    type_str(&mut input, "theme dark");
    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CommandEvent::Submitted("theme", Some("dark".to_string())))
    );
    assert!(!input.is_active());
    assert_eq!(input.value(), "");
  }

  #[test]
  fn test_tab_picks_next_suggestion() {
    let mut input = CommandInput::new();
    input.activate();
    type_str(&mut input, "lo");
    input.handle_key(key(KeyCode::Tab));
    assert_eq!(input.selected_suggestion(), 1);
    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CommandEvent::Submitted("logout", None))
    );
  }

  #[test]
  fn test_up_wraps_to_last_suggestion() {
    let mut input = CommandInput::new();
    input.activate();
    input.handle_key(key(KeyCode::Up));
    assert_eq!(input.selected_suggestion(), commands::COMMANDS.len() - 1);
  }

  #[test]
  fn test_unknown_command_cancels() {
    let mut input = CommandInput::new();
    input.activate();
    type_str(&mut input, "zzz");
    assert_eq!(
      input.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(CommandEvent::Cancelled)
    );
  }
}
