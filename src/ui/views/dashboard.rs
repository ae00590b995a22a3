use super::{bordered, draw_placeholder, field_line, panel_title};
use crate::api::{CachedApi, Dashboard, SyncStatus};
use crate::query::Query;
use crate::ui::renderfns::format_time;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::UiContext;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Account summary with the state of the last inventory sync
pub struct DashboardView {
  dashboard: Query<Dashboard>,
  sync: Query<SyncStatus>,
}

impl DashboardView {
  pub fn new(api: &CachedApi) -> Self {
    let mut dashboard = api.watch_dashboard();
    let mut sync = api.watch_sync_status();
    dashboard.fetch();
    sync.fetch();
    Self { dashboard, sync }
  }

  fn render_summary(&self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    let block = bordered(panel_title(ui.labels.dashboard, &self.dashboard, ui), ui);
    if draw_placeholder(frame, area, block.clone(), &self.dashboard, ui) {
      return;
    }
    let Some(dashboard) = self.dashboard.data() else {
      return;
    };

    let labels = ui.labels;
    let lines = vec![
      Line::from(Span::styled(
        dashboard.nickname.clone(),
        Style::default().fg(ui.palette.accent).bold(),
      )),
      Line::raw(""),
      field_line(labels.level, dashboard.level.to_string(), ui),
      field_line(labels.gold, dashboard.gold.to_string(), ui),
      field_line(labels.items, dashboard.item_count.to_string(), ui),
      field_line(labels.clears_this_week, dashboard.clears_this_week.to_string(), ui),
      field_line(
        labels.last_dungeon,
        dashboard
          .last_dungeon
          .clone()
          .unwrap_or_else(|| labels.never.to_string()),
        ui,
      ),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_sync(&self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    let block = bordered(panel_title(ui.labels.last_sync, &self.sync, ui), ui);
    if draw_placeholder(frame, area, block.clone(), &self.sync, ui) {
      return;
    }
    let Some(status) = self.sync.data() else {
      return;
    };
    frame.render_widget(Paragraph::new(sync_lines(status, ui)).block(block), area);
  }
}

/// Lines describing a sync status, shared with the inventory screen.
pub(super) fn sync_lines(status: &SyncStatus, ui: &UiContext) -> Vec<Line<'static>> {
  let labels = ui.labels;
  let when = status
    .last_success_at
    .as_ref()
    .map(format_time)
    .unwrap_or_else(|| labels.never.to_string());
  let mut lines = vec![field_line(labels.last_sync, when, ui)];
  if let Some(error) = &status.last_error {
    lines.push(Line::from(vec![
      Span::styled(
        format!("{:<16}", labels.sync_failed),
        Style::default().fg(ui.palette.error),
      ),
      Span::styled(error.clone(), Style::default().fg(ui.palette.error)),
    ]));
  }
  lines
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('s') => ViewAction::SyncInventory,
      KeyCode::Char('r') => {
        self.refresh();
        ViewAction::None
      }
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(9), Constraint::Length(4)])
      .split(area);
    self.render_summary(frame, chunks[0], ui);
    self.render_sync(frame, chunks[1], ui);
  }

  fn tick(&mut self) -> bool {
    let dashboard = self.dashboard.tick();
    let sync = self.sync.tick();
    dashboard || sync
  }

  fn refresh(&mut self) {
    self.dashboard.refetch();
    self.sync.refetch();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command"),
      Shortcut::new("s", "sync"),
      Shortcut::new("r", "refresh"),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::mock::MockTransport;
  use crate::auth::AccessToken;
  use crate::cache::QueryClient;
  use crossterm::event::KeyModifiers;
  use reqwest::Method;
  use serde_json::json;
  use std::sync::Arc;
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[tokio::test]
  async fn test_loads_and_requests_sync() {
    let mock = MockTransport::new();
    mock.respond(
      Method::GET,
      "dashboard",
      Ok(json!({"nickname": "Mira", "level": 12, "gold": 900, "itemCount": 3, "lastDungeon": null})),
    );
    mock.respond(
      Method::GET,
      "sync/status",
      Ok(json!({"lastAttemptAt": null, "lastSuccessAt": null, "lastError": null})),
    );
    let api = CachedApi::with_transport(
      Arc::new(mock),
      QueryClient::new(),
      AccessToken::new(Some("token".to_string())),
    );

    let mut view = DashboardView::new(&api);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(view.tick());
    assert_eq!(view.dashboard.data().map(|d| d.level), Some(12));
    assert!(view.sync.is_success());

    assert_eq!(view.handle_key(key(KeyCode::Char('s'))), ViewAction::SyncInventory);
  }
}
