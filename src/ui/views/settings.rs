use super::{bordered, draw_placeholder, panel_title};
use crate::api::{CachedApi, Settings, SettingsPatch};
use crate::query::Query;
use crate::ui::labels::Labels;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::UiContext;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  PublicProfile,
  Notifications,
  AutoSync,
}

const FIELDS: [Field; 3] = [Field::PublicProfile, Field::Notifications, Field::AutoSync];

impl Field {
  fn label(self, labels: &Labels) -> &'static str {
    match self {
      Field::PublicProfile => labels.public_profile,
      Field::Notifications => labels.notifications,
      Field::AutoSync => labels.auto_sync,
    }
  }

  fn value(self, settings: &Settings) -> bool {
    match self {
      Field::PublicProfile => settings.public_profile,
      Field::Notifications => settings.notifications,
      Field::AutoSync => settings.auto_sync,
    }
  }

  /// Patch that flips this field.
  fn toggle(self, settings: &Settings) -> SettingsPatch {
    let flipped = Some(!self.value(settings));
    match self {
      Field::PublicProfile => SettingsPatch {
        public_profile: flipped,
        ..SettingsPatch::default()
      },
      Field::Notifications => SettingsPatch {
        notifications: flipped,
        ..SettingsPatch::default()
      },
      Field::AutoSync => SettingsPatch {
        auto_sync: flipped,
        ..SettingsPatch::default()
      },
    }
  }
}

/// Account settings. Toggling a row asks the App to run the update.
pub struct SettingsView {
  settings: Query<Settings>,
  list_state: ListState,
}

impl SettingsView {
  pub fn new(api: &CachedApi) -> Self {
    let mut settings = api.watch_settings();
    settings.fetch();
    Self {
      settings,
      list_state: ListState::default().with_selected(Some(0)),
    }
  }

  fn toggle_selected(&self) -> ViewAction {
    let field = self.list_state.selected().and_then(|i| FIELDS.get(i));
    match (field, self.settings.data()) {
      (Some(field), Some(settings)) => ViewAction::UpdateSettings(field.toggle(settings)),
      _ => ViewAction::None,
    }
  }
}

impl View for SettingsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Enter | KeyCode::Char(' ') => return self.toggle_selected(),
      KeyCode::Char('r') => self.refresh(),
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    crate::ui::ensure_valid_selection(&mut self.list_state, FIELDS.len());
    let block = bordered(panel_title(ui.labels.settings, &self.settings, ui), ui);
    if draw_placeholder(frame, area, block.clone(), &self.settings, ui) {
      return;
    }
    let Some(settings) = self.settings.data() else {
      return;
    };

    let items: Vec<ListItem> = FIELDS
      .iter()
      .map(|field| {
        let on = field.value(settings);
        let color = if on { ui.palette.ok } else { ui.palette.muted };
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<20}", field.label(ui.labels)),
            Style::default().fg(ui.palette.text),
          ),
          Span::styled(ui.labels.toggle(on), Style::default().fg(color).bold()),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(ui.palette.highlight))
      .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn tick(&mut self) -> bool {
    self.settings.tick()
  }

  fn refresh(&mut self) {
    self.settings.refetch();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command"),
      Shortcut::new("enter", "toggle"),
      Shortcut::new("r", "refresh"),
    ]
  }
}
