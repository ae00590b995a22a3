//! Cursor pagination over the dungeon log stream.
//!
//! Two ways to read the same endpoint:
//! - single page, keyed by the full `(limit, cursor, type)` tuple
//! - accumulating, where each page is fetched with the previous page's
//!   `next_cursor` and appended to an ordered list
//!
//! The two modes use different key roots so their entries never collide.

use futures::future::{BoxFuture, FutureExt};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::debug;

use crate::api::{DashboardApi, DungeonLog, LogPage, LogType};
use crate::cache::{QueryClient, QueryKey};
use crate::error::QueryError;

pub const DEFAULT_LOG_LIMIT: u32 = 10;
pub const LOGS_STALE: Duration = Duration::from_secs(15);

const LOGS_ROOT: &str = "dungeon-logs";
const INFINITE_LOGS_ROOT: &str = "dungeon-logs-infinite";

/// Prefixes covering every cached log entry, in both modes.
pub fn log_prefixes() -> [QueryKey; 2] {
  [QueryKey::new(LOGS_ROOT), QueryKey::new(INFINITE_LOGS_ROOT)]
}

/// Parameters of a single-page read. An absent cursor means the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
  pub limit: Option<u32>,
  pub cursor: Option<String>,
  pub log_type: Option<LogType>,
}

impl LogQuery {
  pub fn limit(&self) -> u32 {
    self.limit.unwrap_or(DEFAULT_LOG_LIMIT)
  }

  pub fn key(&self) -> QueryKey {
    QueryKey::new(LOGS_ROOT).with(json!({
      "limit": self.limit(),
      "cursor": self.cursor,
      "type": self.log_type.map(|t| t.as_str()),
    }))
  }
}

fn page_fetcher(
  api: &DashboardApi,
  limit: u32,
  cursor: Option<String>,
  log_type: Option<LogType>,
) -> impl Fn() -> BoxFuture<'static, Result<LogPage, QueryError>> + Send + Sync + 'static {
  let api = api.clone();
  move || {
    let api = api.clone();
    let cursor = cursor.clone();
    async move { api.dungeon_logs(limit, cursor.as_deref(), log_type).await }.boxed()
  }
}

/// Read one page through the cache.
pub async fn log_page(
  client: &QueryClient,
  api: &DashboardApi,
  query: &LogQuery,
) -> Result<Arc<LogPage>, QueryError> {
  let fetcher = page_fetcher(api, query.limit(), query.cursor.clone(), query.log_type);
  client.get(&query.key(), LOGS_STALE, fetcher).await
}

/// A page fetched for an [`InfiniteLogs`] list, waiting to be appended.
#[derive(Debug, Clone)]
pub struct LoadedPage {
  family: QueryKey,
  cursor: Option<String>,
  page: Arc<LogPage>,
}

impl LoadedPage {
  pub fn page(&self) -> &LogPage {
    &self.page
  }
}

/// The next page an [`InfiniteLogs`] list wants. Detached from the list so
/// the fetch can run on another task while the list keeps rendering.
pub struct PageRequest {
  client: QueryClient,
  api: DashboardApi,
  family: QueryKey,
  limit: u32,
  log_type: Option<LogType>,
  cursor: Option<String>,
}

impl PageRequest {
  /// Fetch the page. A cached page is reused whatever its age, since loaded
  /// pages are never refetched; an invalidated one is fetched again.
  pub async fn fetch(self) -> Result<LoadedPage, QueryError> {
    let key = self.family.clone().with(json!(self.cursor));
    let fetcher = page_fetcher(&self.api, self.limit, self.cursor.clone(), self.log_type);
    let page = self.client.ensure(&key, LOGS_STALE, fetcher).await?;
    Ok(LoadedPage {
      family: self.family,
      cursor: self.cursor,
      page,
    })
  }
}

/// Accumulating log list. Pages are only ever appended, in cursor order.
pub struct InfiniteLogs {
  client: QueryClient,
  api: DashboardApi,
  limit: u32,
  log_type: Option<LogType>,
  pages: Vec<LoadedPage>,
}

impl InfiniteLogs {
  pub fn new(
    client: QueryClient,
    api: DashboardApi,
    limit: Option<u32>,
    log_type: Option<LogType>,
  ) -> Self {
    Self {
      client,
      api,
      limit: limit.unwrap_or(DEFAULT_LOG_LIMIT),
      log_type,
      pages: Vec::new(),
    }
  }

  pub fn log_type(&self) -> Option<LogType> {
    self.log_type
  }

  fn family(&self) -> QueryKey {
    QueryKey::new(INFINITE_LOGS_ROOT).with(json!({
      "limit": self.limit,
      "type": self.log_type.map(|t| t.as_str()),
    }))
  }

  /// Cache key of the page fetched with `cursor`.
  pub fn page_key(&self, cursor: Option<&str>) -> QueryKey {
    self.family().with(json!(cursor))
  }

  /// False once the last loaded page had no `next_cursor`.
  pub fn has_more(&self) -> bool {
    self
      .pages
      .last()
      .map_or(true, |loaded| loaded.page.next_cursor.is_some())
  }

  fn expected_cursor(&self) -> Option<String> {
    self
      .pages
      .last()
      .and_then(|loaded| loaded.page.next_cursor.clone())
  }

  /// The request for the next page, or `None` when the stream has ended.
  pub fn next_request(&self) -> Option<PageRequest> {
    if !self.has_more() {
      return None;
    }
    Some(PageRequest {
      client: self.client.clone(),
      api: self.api.clone(),
      family: self.family(),
      limit: self.limit,
      log_type: self.log_type,
      cursor: self.expected_cursor(),
    })
  }

  /// Append a fetched page. Pages for another parameter set, or for a
  /// cursor other than the one the list is waiting on, are dropped.
  pub fn append(&mut self, loaded: LoadedPage) -> bool {
    if loaded.family != self.family() || !self.has_more() || loaded.cursor != self.expected_cursor()
    {
      debug!(cursor = ?loaded.cursor, "dropping out-of-order log page");
      return false;
    }
    self.pages.push(loaded);
    true
  }

  /// Fetch and append the next page. Returns false when nothing was appended.
  pub async fn load_more(&mut self) -> Result<bool, QueryError> {
    let Some(request) = self.next_request() else {
      return Ok(false);
    };
    let loaded = request.fetch().await?;
    Ok(self.append(loaded))
  }

  /// Forget every loaded page; the next request starts from the first page.
  pub fn reset(&mut self) {
    self.pages.clear();
  }

  pub fn page_count(&self) -> usize {
    self.pages.len()
  }

  /// Items across all loaded pages, in fetch order.
  pub fn items(&self) -> impl Iterator<Item = &DungeonLog> {
    self.pages.iter().flat_map(|loaded| loaded.page.items.iter())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::mock::MockTransport;
  use reqwest::Method;
  use serde_json::Value;

  fn log(id: &str) -> Value {
    json!({
      "id": id,
      "dungeon": "Frost Hollow",
      "type": "party",
      "cleared": true,
      "occurredAt": "2026-10-01T12:00:00Z",
      "rewardGold": 120,
    })
  }

  fn setup(mock: MockTransport) -> (Arc<MockTransport>, QueryClient, DashboardApi) {
    let mock = Arc::new(mock);
    let api = DashboardApi::new(mock.clone(), Arc::new(|| Some("token".to_string())));
    (mock, QueryClient::new(), api)
  }

  fn two_page_fixture() -> MockTransport {
    let mock = MockTransport::new();
    mock.respond(
      Method::GET,
      "dungeon-logs?limit=2",
      Ok(json!({"items": [log("1"), log("2")], "nextCursor": "c2"})),
    );
    mock.respond(
      Method::GET,
      "dungeon-logs?limit=2&cursor=c2",
      Ok(json!({"items": [log("3")], "nextCursor": null})),
    );
    mock
  }

  #[test]
  fn test_default_limit() {
    let query = LogQuery::default();
    assert_eq!(query.limit(), 10);
    assert_eq!(
      query.key().canonical(),
      r#"["dungeon-logs",{"cursor":null,"limit":10,"type":null}]"#
    );
  }

  #[tokio::test]
  async fn test_accumulation_stops_at_last_page() {
    let (mock, client, api) = setup(two_page_fixture());
    let mut logs = InfiniteLogs::new(client, api, Some(2), None);

    assert!(logs.load_more().await.unwrap());
    assert!(logs.load_more().await.unwrap());
    assert!(!logs.has_more());
    assert!(logs.next_request().is_none());
    assert!(!logs.load_more().await.unwrap());

    let ids: Vec<&str> = logs.items().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(mock.calls().len(), 2);
  }

  #[tokio::test]
  async fn test_duplicate_page_is_not_appended_twice() {
    let (_, client, api) = setup(two_page_fixture());
    let mut logs = InfiniteLogs::new(client, api, Some(2), None);

    let first = logs.next_request().unwrap().fetch().await.unwrap();
    let again = logs.next_request().unwrap().fetch().await.unwrap();

    assert!(logs.append(first));
    assert!(!logs.append(again));
    assert_eq!(logs.page_count(), 1);
  }

  #[tokio::test]
  async fn test_page_for_other_filter_is_dropped() {
    let (_, client, api) = setup(two_page_fixture());
    let unfiltered = InfiniteLogs::new(client.clone(), api.clone(), Some(2), None);
    let mut raids = InfiniteLogs::new(client, api, Some(2), Some(LogType::Raid));

    let page = unfiltered.next_request().unwrap().fetch().await.unwrap();
    assert!(!raids.append(page));
    assert_eq!(raids.page_count(), 0);
  }

  #[tokio::test]
  async fn test_modes_use_separate_cache_entries() {
    let (mock, client, api) = setup(two_page_fixture());
    let query = LogQuery {
      limit: Some(2),
      ..LogQuery::default()
    };

    log_page(&client, &api, &query).await.unwrap();
    let mut logs = InfiniteLogs::new(client.clone(), api, Some(2), None);
    logs.load_more().await.unwrap();

    assert_eq!(mock.count("GET dungeon-logs?limit=2"), 2);
    assert_ne!(query.key(), logs.page_key(None));
    assert!(client.peek::<LogPage>(&logs.page_key(None)).is_some());
  }

  #[tokio::test]
  async fn test_reload_after_invalidation_fetches_again() {
    let mock = two_page_fixture();
    mock.respond(
      Method::GET,
      "dungeon-logs?limit=2",
      Ok(json!({"items": [log("0"), log("1")], "nextCursor": "c2"})),
    );
    let (mock, client, api) = setup(mock);
    let mut logs = InfiniteLogs::new(client.clone(), api, Some(2), None);
    logs.load_more().await.unwrap();

    for prefix in log_prefixes() {
      client.invalidate(&prefix).await;
    }
    logs.reset();
    logs.load_more().await.unwrap();

    let ids: Vec<&str> = logs.items().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1"]);
    assert_eq!(mock.count("GET dungeon-logs?limit=2"), 2);
  }

  #[tokio::test]
  async fn test_single_page_is_cached() {
    let (mock, client, api) = setup(two_page_fixture());
    let query = LogQuery {
      limit: Some(2),
      cursor: Some("c2".to_string()),
      log_type: None,
    };

    let first = log_page(&client, &api, &query).await.unwrap();
    let second = log_page(&client, &api, &query).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(mock.calls().len(), 1);
  }
}
