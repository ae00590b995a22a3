mod dashboard;
mod inventory;
mod login;
mod logs;
mod profile;
mod settings;

pub use dashboard::DashboardView;
pub use inventory::InventoryView;
pub use login::LoginView;
pub use logs::LogsView;
pub use profile::ProfileView;
pub use settings::SettingsView;

use crate::api::CachedApi;
use crate::error::QueryError;
use crate::query::Query;
use crate::routes::Route;
use crate::ui::view::View;
use crate::ui::UiContext;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Build the view for a route that has passed its guard.
pub fn open(route: Route, api: &CachedApi, redirect: String, page_size: u32) -> Box<dyn View> {
  match route {
    Route::Dashboard => Box::new(DashboardView::new(api)),
    Route::Inventory => Box::new(InventoryView::new(api)),
    Route::Logs => Box::new(LogsView::new(api, page_size)),
    Route::Profile => Box::new(ProfileView::new(api)),
    Route::Settings => Box::new(SettingsView::new(api)),
    Route::Login => Box::new(LoginView::new(redirect)),
  }
}

fn bordered(title: String, ui: &UiContext) -> Block<'static> {
  Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(ui.palette.accent))
}

/// Title for a panel backed by `query`, with a loading or error suffix.
fn panel_title<T: Send + Sync + 'static>(name: &str, query: &Query<T>, ui: &UiContext) -> String {
  if query.is_loading() {
    format!(" {} ({}) ", name, ui.labels.loading)
  } else if query.is_fetching() {
    format!(" {} … ", name)
  } else {
    format!(" {} ", name)
  }
}

/// Placeholder body for a query without data. Returns false once there is
/// data to draw.
fn draw_placeholder<T: Send + Sync + 'static>(
  frame: &mut Frame,
  area: Rect,
  block: Block<'static>,
  query: &Query<T>,
  ui: &UiContext,
) -> bool {
  if query.data().is_some() {
    return false;
  }
  let (text, color) = match query.error() {
    Some(error) => (error_text(error, ui), ui.palette.error),
    None if query.is_loading() => (ui.labels.loading.to_string(), ui.palette.muted),
    None => (ui.labels.empty.to_string(), ui.palette.muted),
  };
  frame.render_widget(
    Paragraph::new(text).block(block).style(Style::default().fg(color)),
    area,
  );
  true
}

fn error_text(error: &QueryError, ui: &UiContext) -> String {
  format!("{} {}", error.user_message(), ui.labels.retry_hint)
}

/// One `label: value` row for the summary panels.
fn field_line(label: &str, value: String, ui: &UiContext) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("{:<16}", label), Style::default().fg(ui.palette.muted)),
    Span::styled(value, Style::default().fg(ui.palette.text)),
  ])
}
