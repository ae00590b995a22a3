//! Query client that owns every cache entry and the fetches feeding them.

use futures::future::{join_all, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use super::entry::{AnyData, CacheEntry, EntryState, ErasedFetcher, Inflight, SharedFetch};
use super::key::QueryKey;
use super::QueryStatus;
use crate::error::QueryError;

#[derive(Default)]
struct CacheState {
  entries: HashMap<String, CacheEntry>,
  /// Number of live observers per key hash; survives `clear`.
  observers: HashMap<String, usize>,
  /// Bumped by `clear` so fetches that outlive it never write back.
  generation: u64,
}

impl CacheState {
  fn entry_mut(&mut self, key: &QueryKey, hash: &str, stale_after: Duration) -> &mut CacheEntry {
    let entry = self
      .entries
      .entry(hash.to_string())
      .or_insert_with(|| CacheEntry::new(key.clone(), stale_after));
    entry.stale_after = stale_after;
    entry
  }

  /// Start a fetch for `hash`, or return the one already in flight.
  ///
  /// A fetch issued before the entry's latest invalidation is not reused:
  /// its response may predate the change, so a new fetch replaces it.
  /// The fetch runs as its own task, so it completes and caches its result
  /// even when every caller waiting on it has gone away.
  fn start_fetch(&mut self, cache: &Arc<Mutex<CacheState>>, hash: &str) -> Option<SharedFetch> {
    let generation = self.generation;
    let entry = self.entries.get_mut(hash)?;
    match &entry.inflight {
      Some(running) if running.epoch == entry.epoch => {
        debug!(key = %entry.key, "attaching to in-flight fetch");
        return Some(running.fetch.clone());
      }
      Some(_) => debug!(key = %entry.key, "in-flight fetch predates invalidation, replacing it"),
      None => {}
    }

    let fetcher = entry.fetcher.clone()?;
    let epoch = entry.epoch;
    entry.status = QueryStatus::Pending;
    debug!(key = %entry.key, "fetching");

    let future = fetcher();
    let writer = Arc::clone(cache);
    let owned = hash.to_string();
    let task = tokio::spawn(async move {
      let result = future.await;
      complete(&writer, &owned, generation, epoch, &result);
      result
    });

    let writer = Arc::clone(cache);
    let owned = hash.to_string();
    let shared = async move {
      match task.await {
        Ok(result) => result,
        Err(err) => {
          let result = Err(QueryError::Internal(format!("Fetch task failed: {}", err)));
          complete(&writer, &owned, generation, epoch, &result);
          result
        }
      }
    }
    .boxed()
    .shared();

    entry.inflight = Some(Inflight {
      epoch,
      fetch: shared.clone(),
    });
    Some(shared)
  }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Write a finished fetch into its entry. Runs under the lock, so readers
/// never see a half-updated entry.
fn complete(
  cache: &Mutex<CacheState>,
  hash: &str,
  generation: u64,
  epoch: u64,
  result: &Result<AnyData, QueryError>,
) {
  let mut state = lock(cache);
  if state.generation != generation {
    debug!("dropping result of a fetch that outlived a cache clear");
    return;
  }
  let Some(entry) = state.entries.get_mut(hash) else {
    return;
  };
  if entry.supersedes(epoch) {
    debug!(key = %entry.key, "dropping result of a superseded fetch");
    return;
  }

  entry.inflight = None;
  match result {
    Ok(data) => {
      entry.data = Some(Arc::clone(data));
      entry.data_epoch = Some(epoch);
      entry.error = None;
      entry.status = QueryStatus::Success;
      entry.fetched_at = Some(Instant::now());
      // An invalidation that landed mid-flight may predate this response.
      entry.invalidated = entry.epoch != epoch;
    }
    Err(err) => {
      warn!(key = %entry.key, error = %err, "fetch failed");
      entry.error = Some(err.clone());
      entry.status = QueryStatus::Error;
    }
  }
}

fn erase<T, F, Fut>(fetcher: F) -> ErasedFetcher
where
  T: Send + Sync + 'static,
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
{
  Arc::new(move || {
    fetcher()
      .map(|result| result.map(|data| Arc::new(data) as AnyData))
      .boxed()
  })
}

fn downcast<T: Send + Sync + 'static>(data: AnyData, key: &QueryKey) -> Result<Arc<T>, QueryError> {
  data
    .downcast::<T>()
    .map_err(|_| QueryError::Internal(format!("Cached value for {} has an unexpected type", key)))
}

enum Plan {
  Ready(AnyData),
  Wait(SharedFetch),
}

impl Plan {
  async fn resolve(self) -> Result<AnyData, QueryError> {
    match self {
      Plan::Ready(data) => Ok(data),
      Plan::Wait(fetch) => fetch.await,
    }
  }
}

/// Shared handle to the query cache.
///
/// Cloning is cheap; every clone sees the same entries. The entry map sits
/// behind a mutex that is never held across an await.
#[derive(Clone, Default)]
pub struct QueryClient {
  state: Arc<Mutex<CacheState>>,
}

impl QueryClient {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, CacheState> {
    lock(&self.state)
  }

  /// Read `key`, fetching through `fetcher` when needed.
  ///
  /// 1. Fresh data is returned without touching the network
  /// 2. Stale data is returned immediately while a refetch runs in the background
  /// 3. Without data, waits for the fetch (joining one already in flight)
  pub async fn get<T, F, Fut>(
    &self,
    key: &QueryKey,
    stale_after: Duration,
    fetcher: F,
  ) -> Result<Arc<T>, QueryError>
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
  {
    let plan = {
      let mut state = self.lock();
      let hash = key.hash();
      let entry = state.entry_mut(key, &hash, stale_after);
      entry.fetcher = Some(erase(fetcher));

      let fresh = entry
        .is_fresh(Instant::now())
        .then(|| entry.data.clone())
        .flatten();
      let previous = entry.data.clone();

      match fresh {
        Some(data) => {
          debug!(key = %key, "cache hit");
          Plan::Ready(data)
        }
        None => {
          let fetch = state
            .start_fetch(&self.state, &hash)
            .ok_or_else(|| QueryError::Internal(format!("No fetcher registered for {}", key)))?;
          match previous {
            Some(data) => {
              debug!(key = %key, "serving stale data while revalidating");
              Plan::Ready(data)
            }
            None => Plan::Wait(fetch),
          }
        }
      }
    };

    downcast(plan.resolve().await?, key)
  }

  /// Make sure `key` has data, fetching only when nothing usable is cached.
  ///
  /// Unlike [`QueryClient::get`], cached data is returned regardless of its
  /// age. Invalidated entries count as missing.
  pub async fn ensure<T, F, Fut>(
    &self,
    key: &QueryKey,
    stale_after: Duration,
    fetcher: F,
  ) -> Result<Arc<T>, QueryError>
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
  {
    let plan = {
      let mut state = self.lock();
      let hash = key.hash();
      let entry = state.entry_mut(key, &hash, stale_after);
      entry.fetcher = Some(erase(fetcher));

      match entry.data.clone().filter(|_| !entry.invalidated) {
        Some(data) => Plan::Ready(data),
        None => Plan::Wait(
          state
            .start_fetch(&self.state, &hash)
            .ok_or_else(|| QueryError::Internal(format!("No fetcher registered for {}", key)))?,
        ),
      }
    };

    downcast(plan.resolve().await?, key)
  }

  /// Cached data for `key`, without fetching.
  pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
    let data = self.lock().entries.get(&key.hash())?.data.clone()?;
    downcast(data, key).ok()
  }

  /// Status snapshot for `key`.
  pub fn entry_state(&self, key: &QueryKey) -> EntryState {
    self
      .lock()
      .entries
      .get(&key.hash())
      .map(|entry| entry.snapshot(Instant::now()))
      .unwrap_or_else(EntryState::missing)
  }

  /// Register interest in `key`. Observed keys are refetched when invalidated.
  pub fn observe(&self, key: &QueryKey) -> Observer {
    let hash = key.hash();
    *self.lock().observers.entry(hash.clone()).or_insert(0) += 1;
    Observer {
      state: Arc::clone(&self.state),
      hash,
    }
  }

  /// Mark every entry under `prefix` stale and wait for observed ones to refetch.
  ///
  /// Returns the number of entries marked. Refetch failures are recorded on
  /// their entries, not returned.
  pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
    let (matched, refetches) = self.mark_invalidated(prefix);
    join_all(refetches).await;
    matched
  }

  /// Like [`QueryClient::invalidate`], but returns as soon as entries are
  /// marked. Refetches of observed keys still run to completion.
  pub fn invalidate_in_background(&self, prefix: &QueryKey) -> usize {
    let (matched, _refetches) = self.mark_invalidated(prefix);
    matched
  }

  fn mark_invalidated(&self, prefix: &QueryKey) -> (usize, Vec<SharedFetch>) {
    let mut guard = self.lock();
    let state = &mut *guard;

    let mut matched = Vec::new();
    for (hash, entry) in state.entries.iter_mut() {
      if entry.key.starts_with(prefix) {
        entry.invalidated = true;
        entry.epoch += 1;
        matched.push(hash.clone());
      }
    }

    let observed: Vec<&String> = matched
      .iter()
      .filter(|hash| state.observers.get(*hash).is_some_and(|count| *count > 0))
      .collect();
    let refetches: Vec<SharedFetch> = observed
      .into_iter()
      .filter_map(|hash| state.start_fetch(&self.state, hash))
      .collect();

    debug!(
      prefix = %prefix,
      matched = matched.len(),
      refetching = refetches.len(),
      "invalidated"
    );
    (matched.len(), refetches)
  }

  /// Drop every entry. Fetches still in flight finish for their callers but
  /// never write into the cleared cache.
  pub fn clear(&self) {
    let mut state = self.lock();
    state.generation += 1;
    let dropped = state.entries.len();
    state.entries.clear();
    debug!(entries = dropped, "cache cleared");
  }
}

/// Keeps a key observed until dropped.
pub struct Observer {
  state: Arc<Mutex<CacheState>>,
  hash: String,
}

impl Drop for Observer {
  fn drop(&mut self) {
    let mut state = lock(&self.state);
    if let Some(count) = state.observers.get_mut(&self.hash) {
      *count = count.saturating_sub(1);
      if *count == 0 {
        state.observers.remove(&self.hash);
      }
    }
  }
}
