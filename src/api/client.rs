use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::form_urlencoded;

use super::transport::Transport;
use super::types::{
  Dashboard, Inventory, LogPage, LogType, Profile, Session, SessionState, Settings,
  SettingsPatch, SyncReceipt, SyncStatus,
};
use crate::auth::TokenAccessor;
use crate::error::{ApiErrorCode, QueryError};

/// Typed wrapper over the game-account API endpoints. No caching.
#[derive(Clone)]
pub struct DashboardApi {
  transport: Arc<dyn Transport>,
  token: TokenAccessor,
}

impl DashboardApi {
  pub fn new(transport: Arc<dyn Transport>, token: TokenAccessor) -> Self {
    Self { transport, token }
  }

  async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, QueryError> {
    let value = self.transport.send(Method::GET, endpoint, None).await?;
    decode(endpoint, value)
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    endpoint: &str,
    body: Option<Value>,
  ) -> Result<T, QueryError> {
    let value = self.transport.send(method, endpoint, body).await?;
    decode(endpoint, value)
  }

  /// Current session. Without a token, or when the server rejects it, the
  /// answer is `Anonymous` rather than an error.
  pub async fn session(&self) -> Result<SessionState, QueryError> {
    if (self.token)().is_none() {
      return Ok(SessionState::Anonymous);
    }
    match self.get::<Session>("auth/session").await {
      Ok(session) => Ok(SessionState::Authenticated(session)),
      Err(QueryError::Api {
        code: ApiErrorCode::Unauthorized,
        ..
      }) => Ok(SessionState::Anonymous),
      Err(err) => Err(err),
    }
  }

  pub async fn dashboard(&self) -> Result<Dashboard, QueryError> {
    self.get("dashboard").await
  }

  pub async fn inventory(&self) -> Result<Inventory, QueryError> {
    self.get("inventory").await
  }

  /// One page of dungeon logs, newest first.
  pub async fn dungeon_logs(
    &self,
    limit: u32,
    cursor: Option<&str>,
    log_type: Option<LogType>,
  ) -> Result<LogPage, QueryError> {
    self.get(&logs_endpoint(limit, cursor, log_type)).await
  }

  pub async fn profile(&self) -> Result<Profile, QueryError> {
    self.get("profile").await
  }

  pub async fn settings(&self) -> Result<Settings, QueryError> {
    self.get("settings").await
  }

  pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<Settings, QueryError> {
    let body = serde_json::to_value(patch)
      .map_err(|e| QueryError::Internal(format!("Failed to encode settings: {}", e)))?;
    self.send(Method::PATCH, "settings", Some(body)).await
  }

  pub async fn sync_status(&self) -> Result<SyncStatus, QueryError> {
    self.get("sync/status").await
  }

  /// Ask the server to pull the latest inventory from the game.
  pub async fn sync_inventory(&self) -> Result<SyncReceipt, QueryError> {
    self.send(Method::POST, "inventory/sync", None).await
  }

  pub async fn logout(&self) -> Result<(), QueryError> {
    self
      .transport
      .send(Method::POST, "auth/logout", None)
      .await
      .map(|_| ())
  }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, QueryError> {
  serde_json::from_value(value).map_err(|e| QueryError::validation(endpoint, e))
}

pub(crate) fn logs_endpoint(limit: u32, cursor: Option<&str>, log_type: Option<LogType>) -> String {
  let mut query = form_urlencoded::Serializer::new(String::new());
  query.append_pair("limit", &limit.to_string());
  if let Some(cursor) = cursor {
    query.append_pair("cursor", cursor);
  }
  if let Some(log_type) = log_type {
    query.append_pair("type", log_type.as_str());
  }
  format!("dungeon-logs?{}", query.finish())
}
