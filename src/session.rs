//! Session gate for protected routes.
//!
//! Before a protected view loads, [`require_session`] makes sure the session
//! resource is cached. Without a session the navigation is aborted with a
//! [`RedirectSignal`] that points at the login route and carries the
//! sanitized location to return to.

use thiserror::Error;
use tracing::info;
use url::form_urlencoded;

use crate::api::{CachedApi, Session};
use crate::error::QueryError;
use crate::redirect::{sanitize, ROOT_PATH};

pub const LOGIN_PATH: &str = "/login";
pub const REDIRECT_PARAM: &str = "redirect";

/// An in-app location: path, optional query and fragment, as in a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
  pub path: String,
  pub query: Option<String>,
  pub fragment: Option<String>,
}

impl Location {
  pub fn parse(href: &str) -> Self {
    let (rest, fragment) = match href.split_once('#') {
      Some((rest, fragment)) => (rest, Some(fragment.to_string())),
      None => (href, None),
    };
    let (path, query) = match rest.split_once('?') {
      Some((path, query)) => (path, Some(query.to_string())),
      None => (rest, None),
    };
    let path = if path.is_empty() { ROOT_PATH } else { path };
    Self {
      path: path.to_string(),
      query,
      fragment,
    }
  }

  /// Path, query and fragment joined back into one string.
  pub fn href(&self) -> String {
    let mut href = self.path.clone();
    if let Some(query) = &self.query {
      href.push('?');
      href.push_str(query);
    }
    if let Some(fragment) = &self.fragment {
      href.push('#');
      href.push_str(fragment);
    }
    href
  }

  /// First value of the query parameter `name`, decoded.
  pub fn query_param(&self, name: &str) -> Option<String> {
    let query = self.query.as_deref()?;
    form_urlencoded::parse(query.as_bytes())
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.into_owned())
  }
}

/// Aborts a navigation and sends the app to `to` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectSignal {
  pub to: String,
}

impl RedirectSignal {
  /// Redirect to the login route, coming back to `return_to` afterwards.
  pub fn to_login(return_to: &str) -> Self {
    let target = sanitize(Some(return_to), ROOT_PATH);
    let query = form_urlencoded::Serializer::new(String::new())
      .append_pair(REDIRECT_PARAM, &target)
      .finish();
    Self {
      to: format!("{}?{}", LOGIN_PATH, query),
    }
  }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
  #[error("redirecting to {}", .0.to)]
  Redirect(RedirectSignal),
  #[error(transparent)]
  Query(#[from] QueryError),
}

/// Resolve the session for a protected route at `location`.
///
/// Waits for the session resource when it is not cached. A failed session
/// fetch is returned as `GuardError::Query`; it does not redirect.
pub async fn require_session(api: &CachedApi, location: &Location) -> Result<Session, GuardError> {
  let state = api.session().await?;
  match state.session() {
    Some(session) => Ok(session.clone()),
    None => {
      let signal = RedirectSignal::to_login(&location.href());
      info!(from = %location.path, to = %signal.to, "no session, redirecting to login");
      Err(GuardError::Redirect(signal))
    }
  }
}

/// Where to go after a successful login from the login route at `location`.
pub fn login_target(location: &Location) -> String {
  sanitize(location.query_param(REDIRECT_PARAM).as_deref(), ROOT_PATH)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::mock::MockTransport;
  use crate::auth::AccessToken;
  use crate::cache::QueryClient;
  use reqwest::Method;
  use serde_json::json;
  use std::sync::Arc;

  fn api(mock: MockTransport, token: Option<&str>) -> (Arc<MockTransport>, CachedApi) {
    let mock = Arc::new(mock);
    let api = CachedApi::with_transport(
      mock.clone(),
      QueryClient::new(),
      AccessToken::new(token.map(String::from)),
    );
    (mock, api)
  }

  fn session_fixture() -> MockTransport {
    let mock = MockTransport::new();
    mock.respond(
      Method::GET,
      "auth/session",
      Ok(json!({"userId": "u1", "nickname": "Mira", "expiresAt": null})),
    );
    mock
  }

  #[test]
  fn test_location_round_trip() {
    let location = Location::parse("/inventory?x=1#top");
    assert_eq!(location.path, "/inventory");
    assert_eq!(location.query.as_deref(), Some("x=1"));
    assert_eq!(location.fragment.as_deref(), Some("top"));
    assert_eq!(location.href(), "/inventory?x=1#top");
    assert_eq!(Location::parse("").path, "/");
  }

  #[test]
  fn test_redirect_carries_encoded_return_path() {
    let signal = RedirectSignal::to_login("/inventory?x=1#top");
    assert_eq!(signal.to, "/login?redirect=%2Finventory%3Fx%3D1%23top");
  }

  #[test]
  fn test_unsafe_return_path_falls_back_to_root() {
    let signal = RedirectSignal::to_login("//evil.example/steal");
    assert_eq!(signal.to, "/login?redirect=%2F");
  }

  #[test]
  fn test_login_target() {
    let login = Location::parse("/login?redirect=%2Finventory%3Fx%3D1");
    assert_eq!(login_target(&login), "/inventory?x=1");

    let hostile = Location::parse("/login?redirect=https%3A%2F%2Fevil.example");
    assert_eq!(login_target(&hostile), "/");

    assert_eq!(login_target(&Location::parse("/login")), "/");
  }

  #[tokio::test]
  async fn test_anonymous_visitor_is_redirected() {
    let (mock, api) = api(session_fixture(), None);
    let location = Location::parse("/logs?type=raid");

    let err = require_session(&api, &location).await.unwrap_err();

    assert_eq!(
      err,
      GuardError::Redirect(RedirectSignal {
        to: "/login?redirect=%2Flogs%3Ftype%3Draid".to_string()
      })
    );
    assert!(mock.calls().is_empty());
  }

  #[tokio::test]
  async fn test_session_is_returned_and_cached() {
    let (mock, api) = api(session_fixture(), Some("token"));
    let location = Location::parse("/profile");

    let session = require_session(&api, &location).await.unwrap();
    require_session(&api, &location).await.unwrap();

    assert_eq!(session.nickname, "Mira");
    assert_eq!(mock.count("GET auth/session"), 1);
  }

  #[tokio::test]
  async fn test_session_fetch_failure_is_not_a_redirect() {
    let mock = MockTransport::new();
    mock.respond(
      Method::GET,
      "auth/session",
      Err(QueryError::transport("auth/session", "connection refused")),
    );
    let (_, api) = api(mock, Some("token"));

    let err = require_session(&api, &Location::parse("/")).await.unwrap_err();
    assert!(matches!(err, GuardError::Query(QueryError::Transport { .. })));
  }

  #[tokio::test]
  async fn test_login_then_guard_passes() {
    let (_, api) = api(session_fixture(), None);
    let location = Location::parse("/settings");
    assert!(require_session(&api, &location).await.is_err());

    api.login("token").await;

    assert!(require_session(&api, &location).await.is_ok());
  }
}
