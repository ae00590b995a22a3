//! Transport boundary between the API client and the network.
//!
//! Every failure leaves this module as a [`QueryError`]:
//! - connectivity, timeouts and aborted requests become `Transport`
//! - non-2xx responses become `Api`, with the code from the error body when present
//! - bodies that are not JSON become `Validation`

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::types::ApiErrorBody;
use crate::auth::TokenAccessor;
use crate::error::{ApiErrorCode, QueryError};

/// Sends one request and returns the JSON body (`Null` when the body is empty).
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(
    &self,
    method: Method,
    endpoint: &str,
    body: Option<Value>,
  ) -> Result<Value, QueryError>;
}

/// reqwest-backed transport with bearer authentication.
pub struct HttpTransport {
  http: reqwest::Client,
  base_url: Url,
  token: TokenAccessor,
}

impl HttpTransport {
  pub fn new(base_url: &str, timeout: Duration, token: TokenAccessor) -> Result<Self> {
    let mut url =
      Url::parse(base_url).map_err(|e| eyre!("Invalid API url '{}': {}", base_url, e))?;

    // Url::join replaces the last segment unless the base ends with a slash
    if !url.path().ends_with('/') {
      let path = format!("{}/", url.path());
      url.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("hoardview/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: url,
      token,
    })
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn send(
    &self,
    method: Method,
    endpoint: &str,
    body: Option<Value>,
  ) -> Result<Value, QueryError> {
    let url = self
      .base_url
      .join(endpoint.trim_start_matches('/'))
      .map_err(|e| QueryError::Internal(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

    debug!(%method, endpoint, "sending request");
    let mut request = self.http.request(method, url);
    if let Some(token) = (self.token)() {
      request = request.bearer_auth(token);
    }
    if let Some(body) = &body {
      request = request.json(body);
    }

    let response = request.send().await.map_err(|e| classify(endpoint, e))?;
    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| classify(endpoint, e))?;

    if !status.is_success() {
      return Err(api_error(status, &bytes));
    }
    if bytes.is_empty() {
      return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| QueryError::validation(endpoint, e))
  }
}

fn classify(endpoint: &str, err: reqwest::Error) -> QueryError {
  if err.is_decode() {
    QueryError::validation(endpoint, err)
  } else if err.is_builder() {
    QueryError::Internal(format!("Failed to build request for {}: {}", endpoint, err))
  } else {
    QueryError::transport(endpoint, err)
  }
}

fn api_error(status: StatusCode, body: &[u8]) -> QueryError {
  match serde_json::from_slice::<ApiErrorBody>(body) {
    Ok(body) => QueryError::api(body.code, body.message),
    Err(_) => QueryError::api(
      ApiErrorCode::from_status(status.as_u16()),
      status.canonical_reason().unwrap_or("Request failed"),
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  #[test]
  fn test_api_error_prefers_body_code() {
    let err = api_error(
      StatusCode::TOO_MANY_REQUESTS,
      br#"{"code":"VERSION_MISMATCH","message":"update required"}"#,
    );
    assert_eq!(
      err,
      QueryError::api(ApiErrorCode::VersionMismatch, "update required")
    );
  }

  #[test]
  fn test_api_error_falls_back_to_status() {
    let err = api_error(StatusCode::TOO_MANY_REQUESTS, b"<html>slow down</html>");
    assert_eq!(err.code(), Some(&ApiErrorCode::RateLimited));
  }

  #[test]
  fn test_base_url_keeps_its_path() {
    let transport = HttpTransport::new(
      "https://api.example.com/v1",
      Duration::from_secs(5),
      Arc::new(|| None),
    )
    .unwrap();
    assert_eq!(
      transport.base_url.join("inventory").unwrap().as_str(),
      "https://api.example.com/v1/inventory"
    );
  }

  #[tokio::test]
  async fn test_unreachable_host_is_transport_error() {
    let transport = HttpTransport::new(
      "http://127.0.0.1:9/",
      Duration::from_millis(500),
      Arc::new(|| None),
    )
    .unwrap();
    let err = transport.send(Method::GET, "dashboard", None).await.unwrap_err();
    assert!(matches!(err, QueryError::Transport { .. }));
  }
}
