//! Scripted transport for tests.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::transport::Transport;
use crate::error::QueryError;

/// Answers requests from a script keyed by `"METHOD endpoint"`.
///
/// Queued responses are consumed in order; the last one repeats. Unscripted
/// requests fail with a transport error.
#[derive(Default)]
pub struct MockTransport {
  routes: Mutex<HashMap<String, VecDeque<Result<Value, QueryError>>>>,
  calls: Mutex<Vec<String>>,
  delay: Option<Duration>,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// Delay every response, so concurrent callers overlap.
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn respond(&self, method: Method, endpoint: &str, response: Result<Value, QueryError>) {
    self
      .routes
      .lock()
      .unwrap()
      .entry(format!("{} {}", method, endpoint))
      .or_default()
      .push_back(response);
  }

  /// Every request seen so far, as `"METHOD endpoint"`.
  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  pub fn count(&self, call: &str) -> usize {
    self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
  }
}

#[async_trait]
impl Transport for MockTransport {
  async fn send(
    &self,
    method: Method,
    endpoint: &str,
    _body: Option<Value>,
  ) -> Result<Value, QueryError> {
    let route = format!("{} {}", method, endpoint);
    self.calls.lock().unwrap().push(route.clone());

    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    let mut routes = self.routes.lock().unwrap();
    match routes.get_mut(&route) {
      Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
      Some(queue) => queue
        .front()
        .cloned()
        .unwrap_or_else(|| Err(QueryError::transport(endpoint, "no response scripted"))),
      None => Err(QueryError::transport(endpoint, "no route scripted")),
    }
  }
}
