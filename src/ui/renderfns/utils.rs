use chrono::{DateTime, Local, Utc};
use ratatui::prelude::Color;

use crate::ui::Palette;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for an item rarity
pub fn rarity_color(rarity: &str, palette: &Palette) -> Color {
  match rarity.to_ascii_lowercase().as_str() {
    "legendary" => Color::LightYellow,
    "epic" => Color::Magenta,
    "rare" => Color::LightBlue,
    "uncommon" => Color::Green,
    _ => palette.text,
  }
}

/// Local wall-clock time for a server timestamp
pub fn format_time(at: &DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
