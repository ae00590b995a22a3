use super::dashboard::sync_lines;
use super::{bordered, draw_placeholder, panel_title};
use crate::api::{CachedApi, Inventory, SyncStatus};
use crate::query::Query;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{rarity_color, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::UiContext;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph};

/// Item list plus sync status
pub struct InventoryView {
  inventory: Query<Inventory>,
  sync: Query<SyncStatus>,
  list_state: ListState,
}

impl InventoryView {
  pub fn new(api: &CachedApi) -> Self {
    let mut inventory = api.watch_inventory();
    let mut sync = api.watch_sync_status();
    inventory.fetch();
    sync.fetch();
    Self {
      inventory,
      sync,
      list_state: ListState::default(),
    }
  }

  fn item_count(&self) -> usize {
    self.inventory.data().map_or(0, |inv| inv.items.len())
  }

  fn render_items(&mut self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    let len = self.item_count();
    ensure_valid_selection(&mut self.list_state, len);

    let name = match self.inventory.data() {
      Some(inv) => format!(
        "{} · {} {}/{}",
        ui.labels.inventory,
        ui.labels.capacity,
        inv.items.len(),
        inv.capacity
      ),
      None => ui.labels.inventory.to_string(),
    };
    let block = bordered(panel_title(&name, &self.inventory, ui), ui);
    if draw_placeholder(frame, area, block.clone(), &self.inventory, ui) {
      return;
    }
    let Some(inventory) = self.inventory.data() else {
      return;
    };
    if inventory.items.is_empty() {
      let paragraph = Paragraph::new(ui.labels.empty)
        .block(block)
        .style(Style::default().fg(ui.palette.muted));
      frame.render_widget(paragraph, area);
      return;
    }

    let name_width = area.width.saturating_sub(20).max(8) as usize;
    let items: Vec<ListItem> = inventory
      .items
      .iter()
      .map(|item| {
        let marker = if item.equipped { ui.labels.equipped } else { "" };
        let line = Line::from(vec![
          Span::styled(
            format!("{:<width$}", truncate(&item.name, name_width), width = name_width),
            Style::default().fg(rarity_color(&item.rarity, &ui.palette)),
          ),
          Span::styled(
            format!(" x{:<4}", item.quantity),
            Style::default().fg(ui.palette.text),
          ),
          Span::styled(format!(" {}", marker), Style::default().fg(ui.palette.warn)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(ui.palette.highlight)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_sync(&self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    let block = bordered(panel_title(ui.labels.last_sync, &self.sync, ui), ui);
    if draw_placeholder(frame, area, block.clone(), &self.sync, ui) {
      return;
    }
    if let Some(status) = self.sync.data() {
      frame.render_widget(Paragraph::new(sync_lines(status, ui)).block(block), area);
    }
  }
}

impl View for InventoryView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('s') => return ViewAction::SyncInventory,
      KeyCode::Char('r') => self.refresh(),
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(4)])
      .split(area);
    self.render_items(frame, chunks[0], ui);
    self.render_sync(frame, chunks[1], ui);
  }

  fn tick(&mut self) -> bool {
    let inventory = self.inventory.tick();
    let sync = self.sync.tick();
    inventory || sync
  }

  fn refresh(&mut self) {
    self.inventory.refetch();
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
