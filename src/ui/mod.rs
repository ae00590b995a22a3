pub mod components;
pub mod labels;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::{App, StatusLevel};
use crate::preferences::{Language, Theme};
use labels::Labels;
use ratatui::prelude::*;
use ratatui::widgets::{ListState, Paragraph};

/// Colours for one theme. `System` keeps the terminal's own colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub text: Color,
  pub bar: Color,
  pub accent: Color,
  pub muted: Color,
  pub highlight: Color,
  pub ok: Color,
  pub warn: Color,
  pub error: Color,
}

impl Palette {
  pub fn for_theme(theme: Theme) -> Self {
    match theme {
      Theme::System => Self {
        text: Color::Reset,
        bar: Color::Reset,
        accent: Color::Cyan,
        muted: Color::DarkGray,
        highlight: Color::DarkGray,
        ok: Color::Green,
        warn: Color::Yellow,
        error: Color::Red,
      },
      Theme::Dark => Self {
        text: Color::White,
        bar: Color::Black,
        accent: Color::Cyan,
        muted: Color::DarkGray,
        highlight: Color::DarkGray,
        ok: Color::Green,
        warn: Color::Yellow,
        error: Color::LightRed,
      },
      Theme::Light => Self {
        text: Color::Black,
        bar: Color::Gray,
        accent: Color::Blue,
        muted: Color::DarkGray,
        highlight: Color::Gray,
        ok: Color::Green,
        warn: Color::Magenta,
        error: Color::Red,
      },
    }
  }
}

/// What views need from the current preferences to render.
#[derive(Clone, Copy)]
pub struct UiContext {
  pub labels: &'static Labels,
  pub palette: Palette,
}

impl UiContext {
  pub fn new(language: Language, theme: Theme) -> Self {
    Self {
      labels: Labels::for_language(language),
      palette: Palette::for_theme(theme),
    }
  }
}

/// Keep a list selection inside `len` items.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let ui = app.ui_context();
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let title = ui.labels.route(app.route());
  let who = app.nickname().unwrap_or(ui.labels.anonymous);
  let shortcuts = app.shortcuts();
  renderfns::draw_header(frame, chunks[0], &ui, app.api_url(), who, title, &shortcuts);

  match app.view_mut() {
    Some(view) => view.render(frame, chunks[1], &ui),
    None => {
      let paragraph =
        Paragraph::new(ui.labels.connecting).style(Style::default().fg(ui.palette.muted));
      frame.render_widget(paragraph, chunks[1]);
    }
  }

  draw_status_bar(frame, chunks[2], app, &ui);
  app.command().render_overlay(frame, chunks[1], &ui);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App, ui: &UiContext) {
  let palette = ui.palette;
  let (content, style) = match app.status() {
    Some((level, message)) => {
      let color = match level {
        StatusLevel::Info => palette.ok,
        StatusLevel::Error => palette.error,
      };
      (format!(" {}", message), Style::default().fg(color))
    }
    None => {
      let hint = format!(
        " :command  j/k:nav  r:refresh  Ctrl-C:quit   {} · {}",
        app.language(),
        app.theme()
      );
      (hint, Style::default().fg(palette.muted))
    }
  };

  let paragraph = Paragraph::new(content).style(style.bg(palette.bar));
  frame.render_widget(paragraph, area);
}
