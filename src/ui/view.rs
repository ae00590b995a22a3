use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use super::UiContext;
use crate::api::SettingsPatch;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Store an access token and continue past the login screen
  Login(String),
  /// Pull the latest inventory from the game
  SyncInventory,
  /// Change account settings
  UpdateSettings(SettingsPatch),
}

/// Trait for view behavior
///
/// Views own the queries for the resources they show and return actions
/// for the App to execute. Mutations run in the App so every view shares
/// one path for invalidation and error reporting.
///
/// Views that load data asynchronously should use Query<T> internally and
/// poll it in the tick() method.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect, ui: &UiContext);

  /// Called on each tick to allow views to poll async queries.
  /// Returns true when something changed.
  fn tick(&mut self) -> bool {
    false
  }

  /// Refetch everything the view shows
  fn refresh(&mut self) {}

  /// Load the next page, for views that page
  fn load_more(&mut self) -> bool {
    false
  }

  /// True when every key, including `:` and `q`, belongs to the view
  fn captures_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command"),
      Shortcut::new("r", "refresh"),
    ]
  }
}
