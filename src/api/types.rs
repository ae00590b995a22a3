//! Typed payloads of the game-account API.
//!
//! Field names follow the API's camelCase JSON. A body that does not fit
//! these shapes is reported as a validation error, never patched up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated identity behind the current token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub user_id: String,
  pub nickname: String,
  pub expires_at: Option<DateTime<Utc>>,
}

/// Cached value of the session resource. `Anonymous` is an answer from the
/// server (or the absence of a token), not a missing cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
  Authenticated(Session),
  Anonymous,
}

impl SessionState {
  pub fn session(&self) -> Option<&Session> {
    match self {
      SessionState::Authenticated(session) => Some(session),
      SessionState::Anonymous => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
  pub nickname: String,
  pub level: u32,
  pub gold: u64,
  pub item_count: u32,
  #[serde(default)]
  pub clears_this_week: u32,
  pub last_dungeon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
  pub id: String,
  pub name: String,
  pub rarity: String,
  pub quantity: u32,
  #[serde(default)]
  pub equipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
  pub items: Vec<InventoryItem>,
  pub capacity: u32,
}

/// Kind of dungeon run recorded in a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
  Solo,
  Party,
  Raid,
}

impl LogType {
  pub const ALL: &'static [LogType] = &[LogType::Solo, LogType::Party, LogType::Raid];

  pub fn as_str(&self) -> &'static str {
    match self {
      LogType::Solo => "solo",
      LogType::Party => "party",
      LogType::Raid => "raid",
    }
  }
}

impl fmt::Display for LogType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonLog {
  pub id: String,
  pub dungeon: String,
  #[serde(rename = "type")]
  pub log_type: LogType,
  pub cleared: bool,
  pub occurred_at: DateTime<Utc>,
  #[serde(default)]
  pub reward_gold: u64,
}

/// One page of the dungeon log stream. `next_cursor` is opaque; `None`
/// ends the stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPage {
  pub items: Vec<DungeonLog>,
  pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub user_id: String,
  pub nickname: String,
  pub level: u32,
  pub guild: Option<String>,
  pub joined_at: DateTime<Utc>,
  #[serde(default)]
  pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
  pub public_profile: bool,
  pub notifications: bool,
  pub auto_sync: bool,
}

/// Partial update for [`Settings`]; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub public_profile: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notifications: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub auto_sync: Option<bool>,
}

/// State of the most recent inventory sync with the game server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
  pub last_attempt_at: Option<DateTime<Utc>>,
  pub last_success_at: Option<DateTime<Utc>>,
  pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReceipt {
  pub synced_items: u32,
}

/// Body of a non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
  pub code: crate::error::ApiErrorCode,
  #[serde(default)]
  pub message: String,
}
