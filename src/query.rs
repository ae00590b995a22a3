//! View-side handle on one cached resource.
//!
//! A `Query<T>` pairs a cache key with its fetcher and keeps a render-ready
//! state that the event loop refreshes on every tick. While it lives, the key
//! is observed, so invalidating it refetches in the background.
//!
//! A view builds its queries once, calls [`Query::fetch`] when it opens and
//! [`Query::tick`] from its own `tick`, then renders whatever
//! [`Query::state`] holds. `tick` returning true means a redraw is due.

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use crate::cache::{Observer, QueryClient, QueryKey, QueryStatus};
use crate::error::QueryError;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Waiting for the first data
  Loading,
  /// Data is available; a refetch may be running behind it
  Success(Arc<T>),
  /// Fetch failed and there is no data to show
  Error(QueryError),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&QueryError> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type FetcherFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, QueryError>> + Send + Sync>;
type Outcome<T> = Result<Arc<T>, QueryError>;

/// Render-side view of one cache key.
pub struct Query<T> {
  client: QueryClient,
  key: QueryKey,
  stale_after: Duration,
  fetcher: FetcherFn<T>,
  state: QueryState<T>,
  /// Failure of the latest refetch while older data is still shown.
  last_error: Option<QueryError>,
  receiver: Option<mpsc::UnboundedReceiver<Outcome<T>>>,
  /// `fetched_at` of the entry behind the data in `state`.
  seen_at: Option<Instant>,
  _observer: Observer,
}

impl<T: Send + Sync + 'static> Query<T> {
  /// Create a query for `key`. Nothing is fetched until [`Query::fetch`].
  pub fn new<F, Fut>(client: QueryClient, key: QueryKey, stale_after: Duration, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
  {
    let observer = client.observe(&key);
    Self {
      client,
      key,
      stale_after,
      fetcher: Arc::new(move || fetcher().boxed()),
      state: QueryState::Idle,
      last_error: None,
      receiver: None,
      seen_at: None,
      _observer: observer,
    }
  }

  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// True while a fetch started by this query is running.
  pub fn is_fetching(&self) -> bool {
    self.receiver.is_some()
  }

  /// The error to show: the failed fetch, or the failed refetch behind
  /// data that is still displayed.
  pub fn error(&self) -> Option<&QueryError> {
    self.state.error().or(self.last_error.as_ref())
  }

  /// Check if the cached data is past its stale time or invalidated.
  pub fn is_stale(&self) -> bool {
    self.state.is_success() && self.client.entry_state(&self.key).is_stale
  }

  /// Read through the cache unless a fetch is already running.
  pub fn fetch(&mut self) {
    if self.receiver.is_some() {
      return;
    }
    self.start_fetch(false);
  }

  /// Invalidate the key and read it again, replacing any pending fetch.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.start_fetch(true);
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        // The cache may already hold a newer value than the one this fetch
        // returned (stale-while-revalidate); show whichever is current.
        let entry = self.client.entry_state(&self.key);
        let data = self.client.peek::<T>(&self.key).unwrap_or(data);
        self.seen_at = entry.fetched_at;
        self.state = QueryState::Success(data);
        self.last_error = None;
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.fail(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.fail(QueryError::Internal("Query was cancelled".to_string()));
        self.receiver = None;
        true
      }
    }
  }

  /// Per-tick upkeep: poll the pending fetch, pick up data another caller
  /// wrote into the cache, and revalidate in the background once stale.
  ///
  /// Returns `true` if the state changed.
  pub fn tick(&mut self) -> bool {
    let mut changed = self.poll();
    if self.receiver.is_some() || matches!(self.state, QueryState::Idle) {
      return changed;
    }

    let entry = self.client.entry_state(&self.key);
    if entry.has_data && entry.fetched_at != self.seen_at {
      if let Some(data) = self.client.peek::<T>(&self.key) {
        self.seen_at = entry.fetched_at;
        self.state = QueryState::Success(data);
        self.last_error = None;
        changed = true;
      }
    } else if entry.status == QueryStatus::Error && entry.error.as_ref() != self.error() {
      if let Some(error) = entry.error {
        self.fail(error);
        changed = true;
      }
    }

    // Failed entries wait for an explicit refetch instead of retrying every tick.
    if self.state.is_success() && entry.status == QueryStatus::Success && entry.is_stale {
      self.start_fetch(false);
    }
    changed
  }

  fn fail(&mut self, error: QueryError) {
    if self.state.is_success() {
      self.last_error = Some(error);
    } else {
      self.state = QueryState::Error(error);
    }
  }

  fn start_fetch(&mut self, invalidate: bool) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    if !self.state.is_success() {
      self.state = QueryState::Loading;
    }

    let client = self.client.clone();
    let key = self.key.clone();
    let stale_after = self.stale_after;
    let fetcher = Arc::clone(&self.fetcher);
    tokio::spawn(async move {
      if invalidate {
        client.invalidate(&key).await;
      }
      let result = client.get(&key, stale_after, move || fetcher()).await;
      // The query may be gone by now.
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("state", &self.state)
      .field("stale_after", &self.stale_after)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  const STALE: Duration = Duration::from_secs(30);

  fn counting(
    counter: &Arc<AtomicU32>,
  ) -> impl Fn() -> BoxFuture<'static, Result<u32, QueryError>> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move || {
      let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
      async move { Ok(n) }.boxed()
    }
  }

  #[tokio::test]
  async fn test_fetch_resolves_to_data() {
    let client = QueryClient::new();
    let mut query = Query::new(client, QueryKey::new("numbers"), STALE, || async {
      Ok::<_, QueryError>(vec![1, 2, 3])
    });

    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_success());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_fetch_failure_is_reported() {
    let client = QueryClient::new();
    let mut query: Query<i32> = Query::new(client, QueryKey::new("broken"), STALE, || async {
      Err(QueryError::transport("broken", "Something went wrong"))
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_error());
    assert!(matches!(query.error(), Some(QueryError::Transport { .. })));
  }

  #[tokio::test]
  async fn test_second_fetch_joins_the_first() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = Query::new(client, QueryKey::new("slow"), STALE, counting(&counter));

    query.fetch();
    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refetch_reads_fresh_data() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = Query::new(client, QueryKey::new("count"), STALE, counting(&counter));

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&1));

    query.refetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test]
  async fn test_tick_picks_up_invalidation_refetch() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let key = QueryKey::new("count");
    let mut query = Query::new(client.clone(), key.clone(), STALE, counting(&counter));

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.tick();
    assert_eq!(query.data(), Some(&1));

    // Observed, so invalidation refetches without the query asking.
    client.invalidate(&key).await;
    assert!(query.tick());
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_tick_revalidates_stale_data_in_background() {
    let client = QueryClient::new();
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = Query::new(client, QueryKey::new("count"), STALE, counting(&counter));

    query.fetch();
    tokio::time::sleep(Duration::from_millis(1)).await;
    query.tick();

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(query.is_stale());
    query.tick();
    // Stale data stays on screen while the refetch runs.
    assert_eq!(query.data(), Some(&1));

    tokio::time::sleep(Duration::from_millis(1)).await;
    query.tick();
    query.tick();
    assert_eq!(query.data(), Some(&2));
    assert!(!query.is_stale());
  }

  #[tokio::test]
  async fn test_failed_refetch_keeps_data() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let fetcher = {
      let calls = Arc::clone(&calls);
      move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
          if n == 0 {
            Ok(7u32)
          } else {
            Err(QueryError::transport("flaky", "connection reset"))
          }
        }
      }
    };
    let mut query = Query::new(client, QueryKey::new("flaky"), STALE, fetcher);

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    // The refetch fails; the read behind it still answers with the old data
    // and the failure surfaces from the cache entry.
    query.refetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.tick();

    assert_eq!(query.data(), Some(&7));
    assert!(matches!(query.error(), Some(QueryError::Transport { .. })));
  }
}
