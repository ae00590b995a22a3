//! Error types shared by the transport, the query cache and the route guard.
//!
//! Every failure produced at the transport boundary is a [`QueryError`], so
//! downstream code classifies failures with an exhaustive match instead of
//! inspecting messages.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Failure of a fetch or mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
  /// The network call itself failed (connectivity, timeout, aborted request).
  #[error("Request to {endpoint} failed: {message}")]
  Transport { endpoint: String, message: String },

  /// The server answered, but the body did not match the expected shape.
  #[error("Unexpected response from {endpoint}: {message}")]
  Validation { endpoint: String, message: String },

  /// The server returned a structured error payload.
  #[error("{code}: {message}")]
  Api { code: ApiErrorCode, message: String },

  /// Client-side defect, e.g. a key cached under two different types.
  #[error("Internal error: {0}")]
  Internal(String),
}

impl QueryError {
  pub fn transport(endpoint: impl Into<String>, message: impl fmt::Display) -> Self {
    Self::Transport {
      endpoint: endpoint.into(),
      message: message.to_string(),
    }
  }

  pub fn validation(endpoint: impl Into<String>, message: impl fmt::Display) -> Self {
    Self::Validation {
      endpoint: endpoint.into(),
      message: message.to_string(),
    }
  }

  pub fn api(code: ApiErrorCode, message: impl Into<String>) -> Self {
    Self::Api {
      code,
      message: message.into(),
    }
  }

  /// Failures caused by the network or the server rather than by this client.
  ///
  /// These are recoverable at a prefetch boundary; everything else points at
  /// a defect and must stay visible.
  pub fn is_transport_kind(&self) -> bool {
    match self {
      Self::Transport { .. } | Self::Api { .. } => true,
      Self::Validation { .. } | Self::Internal(_) => false,
    }
  }

  /// The machine-readable code, if the server sent one.
  pub fn code(&self) -> Option<&ApiErrorCode> {
    match self {
      Self::Api { code, .. } => Some(code),
      _ => None,
    }
  }

  /// Text for the status bar.
  pub fn user_message(&self) -> String {
    match self {
      Self::Api { code, .. } => code.user_message().to_string(),
      other => other.to_string(),
    }
  }
}

/// Domain error codes the API reports in `{ "code": ..., "message": ... }` bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ApiErrorCode {
  VersionMismatch,
  RateLimited,
  Unauthorized,
  Forbidden,
  NotFound,
  SyncInProgress,
  Internal,
  Unknown(String),
}

impl ApiErrorCode {
  pub fn as_str(&self) -> &str {
    match self {
      Self::VersionMismatch => "VERSION_MISMATCH",
      Self::RateLimited => "RATE_LIMITED",
      Self::Unauthorized => "UNAUTHORIZED",
      Self::Forbidden => "FORBIDDEN",
      Self::NotFound => "NOT_FOUND",
      Self::SyncInProgress => "SYNC_IN_PROGRESS",
      Self::Internal => "INTERNAL",
      Self::Unknown(code) => code,
    }
  }

  /// Fallback code for responses without a parseable error body.
  pub fn from_status(status: u16) -> Self {
    match status {
      401 => Self::Unauthorized,
      403 => Self::Forbidden,
      404 => Self::NotFound,
      409 => Self::SyncInProgress,
      426 => Self::VersionMismatch,
      429 => Self::RateLimited,
      500..=599 => Self::Internal,
      other => Self::Unknown(format!("HTTP_{}", other)),
    }
  }

  /// Short explanation shown in the status bar.
  pub fn user_message(&self) -> &'static str {
    match self {
      Self::VersionMismatch => "Client is out of date. Please update hoardview.",
      Self::RateLimited => "Too many requests. Try again in a moment.",
      Self::Unauthorized => "Your session has expired. Please log in again.",
      Self::Forbidden => "You do not have access to this resource.",
      Self::NotFound => "The requested data was not found.",
      Self::SyncInProgress => "A sync is already running.",
      Self::Internal => "The server ran into a problem.",
      Self::Unknown(_) => "Something went wrong.",
    }
  }
}

impl From<String> for ApiErrorCode {
  fn from(code: String) -> Self {
    match code.as_str() {
      "VERSION_MISMATCH" => Self::VersionMismatch,
      "RATE_LIMITED" => Self::RateLimited,
      "UNAUTHORIZED" => Self::Unauthorized,
      "FORBIDDEN" => Self::Forbidden,
      "NOT_FOUND" => Self::NotFound,
      "SYNC_IN_PROGRESS" => Self::SyncInProgress,
      "INTERNAL" => Self::Internal,
      _ => Self::Unknown(code),
    }
  }
}

impl fmt::Display for ApiErrorCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
