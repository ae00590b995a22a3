use super::{bordered, error_text};
use crate::api::{CachedApi, LogType};
use crate::error::QueryError;
use crate::pagination::{log_prefixes, InfiniteLogs, LoadedPage};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_time, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::UiContext;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use tokio::sync::oneshot;

/// Dungeon logs, loaded a page at a time
pub struct LogsView {
  api: CachedApi,
  page_size: u32,
  logs: InfiniteLogs,
  pending: Option<oneshot::Receiver<Result<LoadedPage, QueryError>>>,
  error: Option<QueryError>,
  list_state: ListState,
}

impl LogsView {
  pub fn new(api: &CachedApi, page_size: u32) -> Self {
    let mut view = Self {
      api: api.clone(),
      page_size,
      logs: Self::list(api, page_size, None),
      pending: None,
      error: None,
      list_state: ListState::default(),
    };
    view.request_page();
    view
  }

  fn list(api: &CachedApi, page_size: u32, log_type: Option<LogType>) -> InfiniteLogs {
    InfiniteLogs::new(api.client().clone(), api.api().clone(), Some(page_size), log_type)
  }

  /// Start fetching the next page unless one is already on its way.
  fn request_page(&mut self) -> bool {
    if self.pending.is_some() {
      return false;
    }
    let Some(request) = self.logs.next_request() else {
      return false;
    };
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(request.fetch().await);
    });
    self.pending = Some(rx);
    self.error = None;
    true
  }

  /// All types, then each type in turn.
  fn next_filter(current: Option<LogType>) -> Option<LogType> {
    match current {
      None => LogType::ALL.first().copied(),
      Some(log_type) => {
        let index = LogType::ALL.iter().position(|t| *t == log_type).unwrap_or(0);
        LogType::ALL.get(index + 1).copied()
      }
    }
  }

  fn set_filter(&mut self, log_type: Option<LogType>) {
    self.logs = Self::list(&self.api, self.page_size, log_type);
    self.pending = None;
    self.list_state.select(None);
    self.request_page();
  }

  fn poll_page(&mut self) -> bool {
    let Some(receiver) = &mut self.pending else {
      return false;
    };
    let outcome = match receiver.try_recv() {
      Ok(outcome) => outcome,
      Err(oneshot::error::TryRecvError::Empty) => return false,
      Err(oneshot::error::TryRecvError::Closed) => {
        Err(QueryError::Internal("Log page request was cancelled".to_string()))
      }
    };
    self.pending = None;
    match outcome {
      Ok(loaded) => {
        self.logs.append(loaded);
      }
      Err(error) => self.error = Some(error),
    }
    true
  }

  fn title(&self, ui: &UiContext) -> String {
    let filter = match self.logs.log_type() {
      Some(log_type) => log_type.as_str(),
      None => ui.labels.all_types,
    };
    let count = self.logs.items().count();
    if self.pending.is_some() && count == 0 {
      format!(" {} [{}] ({}) ", ui.labels.logs, filter, ui.labels.loading)
    } else {
      format!(" {} [{}] ({}) ", ui.labels.logs, filter, count)
    }
  }

  fn footer(&self, ui: &UiContext) -> Line<'static> {
    let palette = ui.palette;
    if let Some(error) = &self.error {
      Line::styled(error_text(error, ui), Style::default().fg(palette.error))
    } else if self.pending.is_some() {
      Line::styled(ui.labels.loading, Style::default().fg(palette.muted))
    } else if self.logs.has_more() {
      Line::styled(ui.labels.more_hint, Style::default().fg(palette.muted))
    } else {
      Line::styled(ui.labels.end_of_logs, Style::default().fg(palette.muted))
    }
  }
}

impl View for LogsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        let len = self.logs.items().count();
        let at_end = self.list_state.selected().is_some_and(|i| i + 1 >= len);
        self.list_state.select_next();
        if at_end {
          self.request_page();
        }
      }
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('m') => {
        self.load_more();
      }
      KeyCode::Char('f') => self.set_filter(Self::next_filter(self.logs.log_type())),
      KeyCode::Char('r') => self.refresh(),
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    let len = self.logs.items().count();
    ensure_valid_selection(&mut self.list_state, len);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(1)])
      .split(area);

    let block = bordered(self.title(ui), ui);
    if len == 0 {
      let text = if self.pending.is_some() {
        ui.labels.loading
      } else {
        ui.labels.empty
      };
      let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(ui.palette.muted));
      frame.render_widget(paragraph, chunks[0]);
    } else {
      let palette = ui.palette;
      let dungeon_width = chunks[0].width.saturating_sub(40).max(10) as usize;
      let items: Vec<ListItem> = self
        .logs
        .items()
        .map(|log| {
          let (result, color) = if log.cleared {
            (ui.labels.cleared, palette.ok)
          } else {
            (ui.labels.failed, palette.error)
          };
          ListItem::new(Line::from(vec![
            Span::styled(format_time(&log.occurred_at), Style::default().fg(palette.muted)),
            Span::raw("  "),
            Span::styled(format!("{:<6}", log.log_type.as_str()), Style::default().fg(palette.accent)),
            Span::styled(
              format!("{:<width$}", truncate(&log.dungeon, dungeon_width), width = dungeon_width),
              Style::default().fg(palette.text),
            ),
            Span::styled(format!(" {}", result), Style::default().fg(color)),
          ]))
        })
        .collect();
      let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(palette.highlight))
        .highlight_symbol("> ");
      frame.render_stateful_widget(list, chunks[0], &mut self.list_state);
    }

    frame.render_widget(Paragraph::new(self.footer(ui)), chunks[1]);
  }

  fn tick(&mut self) -> bool {
    self.poll_page()
  }

  /// Refetch from the first page. Loaded pages are dropped and every log
  /// entry in the cache is marked stale, so nothing old is reused.
  fn refresh(&mut self) {
    for prefix in log_prefixes() {
      self.api.client().invalidate_in_background(&prefix);
    }
    self.logs.reset();
    self.pending = None;
    self.list_state.select(None);
    self.request_page();
  }

  fn load_more(&mut self) -> bool {
    self.request_page()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command"),
      Shortcut::new("m", "more"),
      Shortcut::new("f", "filter"),
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
  use serde_json::{json, Value};
  use std::sync::Arc;
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn page(ids: &[&str], next: Option<&str>) -> Value {
    let items: Vec<Value> = ids
      .iter()
      .map(|id| {
        json!({
          "id": id,
          "dungeon": "Frost Cavern",
          "type": "solo",
          "cleared": true,
          "occurredAt": "2026-03-01T12:00:00Z",
          "rewardGold": 10
        })
      })
      .collect();
    json!({"items": items, "nextCursor": next})
  }

  async fn settle(view: &mut LogsView) {
    tokio::time::sleep(Duration::from_millis(10)).await;
    view.tick();
  }

  #[tokio::test]
  async fn test_pages_accumulate_until_the_end() {
    let mock = MockTransport::new();
    mock.respond(Method::GET, "dungeon-logs?limit=2", Ok(page(&["a", "b"], Some("c2"))));
    mock.respond(Method::GET, "dungeon-logs?limit=2&cursor=c2", Ok(page(&["c"], None)));
    let mock = Arc::new(mock);
    let api = CachedApi::with_transport(
      mock.clone(),
      QueryClient::new(),
      AccessToken::new(Some("token".to_string())),
    );

    let mut view = LogsView::new(&api, 2);
    settle(&mut view).await;
    assert_eq!(view.logs.items().count(), 2);

    view.handle_key(key(KeyCode::Char('m')));
    settle(&mut view).await;
    assert_eq!(view.logs.items().count(), 3);
    assert!(!view.logs.has_more());

    // Nothing left to request.
    assert!(!view.load_more());
    assert_eq!(mock.count("GET dungeon-logs?limit=2&cursor=c2"), 1);
  }

  #[tokio::test]
  async fn test_filter_starts_a_new_list() {
    let mock = MockTransport::new();
    mock.respond(Method::GET, "dungeon-logs?limit=5", Ok(page(&["a"], None)));
    mock.respond(Method::GET, "dungeon-logs?limit=5&type=solo", Ok(page(&["s"], None)));
    let api = CachedApi::with_transport(
      Arc::new(mock),
      QueryClient::new(),
      AccessToken::new(Some("token".to_string())),
    );

    let mut view = LogsView::new(&api, 5);
    settle(&mut view).await;
    view.handle_key(key(KeyCode::Char('f')));
    assert_eq!(view.logs.log_type(), Some(LogType::Solo));
    settle(&mut view).await;

    let ids: Vec<&str> = view.logs.items().map(|log| log.id.as_str()).collect();
    assert_eq!(ids, vec!["s"]);
  }

  #[tokio::test]
  async fn test_refresh_refetches_first_page() {
    let mock = MockTransport::new();
    mock.respond(Method::GET, "dungeon-logs?limit=5", Ok(page(&["a"], None)));
    mock.respond(Method::GET, "dungeon-logs?limit=5", Ok(page(&["b"], None)));
    let api = CachedApi::with_transport(
      Arc::new(mock),
      QueryClient::new(),
      AccessToken::new(Some("token".to_string())),
    );

    let mut view = LogsView::new(&api, 5);
    settle(&mut view).await;
    view.refresh();
    settle(&mut view).await;

    let ids: Vec<&str> = view.logs.items().map(|log| log.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
  }

  #[test]
  fn test_filter_cycle() {
    assert_eq!(LogsView::next_filter(None), Some(LogType::Solo));
    assert_eq!(LogsView::next_filter(Some(LogType::Party)), Some(LogType::Raid));
    assert_eq!(LogsView::next_filter(Some(LogType::Raid)), None);
  }
}
