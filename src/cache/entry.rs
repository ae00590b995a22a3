//! Cache entries and the snapshots handed out to views.

use futures::future::{BoxFuture, Shared};
use std::any::Any;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use super::key::QueryKey;
use crate::error::QueryError;

/// Type-erased cached value. Each key always stores the same concrete type.
pub(crate) type AnyData = Arc<dyn Any + Send + Sync>;

/// One network fetch, shared by every caller that asked while it was running.
pub(crate) type SharedFetch = Shared<BoxFuture<'static, Result<AnyData, QueryError>>>;

/// Factory for fetches of one key, kept so invalidation can refetch observed keys.
pub(crate) type ErasedFetcher =
  Arc<dyn Fn() -> BoxFuture<'static, Result<AnyData, QueryError>> + Send + Sync>;

/// A running fetch and the invalidation epoch it was issued under.
#[derive(Clone)]
pub(crate) struct Inflight {
  pub epoch: u64,
  pub fetch: SharedFetch,
}

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Known to the cache (observed) but never fetched
  Idle,
  /// A fetch is in flight; previous data may still be present
  Pending,
  /// Last fetch succeeded
  Success,
  /// Last fetch failed; previous data, if any, is kept
  Error,
}

pub(crate) struct CacheEntry {
  pub key: QueryKey,
  pub data: Option<AnyData>,
  pub error: Option<QueryError>,
  pub status: QueryStatus,
  pub fetched_at: Option<Instant>,
  pub stale_after: Duration,
  /// Set by invalidation, cleared by a fetch that started after it.
  pub invalidated: bool,
  /// Bumped on every invalidation so a fetch can tell it raced one.
  pub epoch: u64,
  /// Epoch of the fetch that produced `data`.
  pub data_epoch: Option<u64>,
  pub inflight: Option<Inflight>,
  pub fetcher: Option<ErasedFetcher>,
}

impl CacheEntry {
  pub fn new(key: QueryKey, stale_after: Duration) -> Self {
    Self {
      key,
      data: None,
      error: None,
      status: QueryStatus::Idle,
      fetched_at: None,
      stale_after,
      invalidated: false,
      epoch: 0,
      data_epoch: None,
      inflight: None,
      fetcher: None,
    }
  }

  pub fn is_fresh(&self, now: Instant) -> bool {
    if self.invalidated || self.data.is_none() {
      return false;
    }
    self
      .fetched_at
      .is_some_and(|at| now.saturating_duration_since(at) < self.stale_after)
  }

  /// True when a fetch issued at `epoch` has been overtaken by a later one,
  /// either still running or already written.
  pub fn supersedes(&self, epoch: u64) -> bool {
    self.inflight.as_ref().is_some_and(|running| running.epoch > epoch)
      || self.data_epoch.is_some_and(|written| written > epoch)
  }

  pub fn snapshot(&self, now: Instant) -> EntryState {
    EntryState {
      status: self.status,
      error: self.error.clone(),
      has_data: self.data.is_some(),
      is_stale: !self.is_fresh(now),
      fetched_at: self.fetched_at,
    }
  }
}

/// Read-only view of an entry's state.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryState {
  pub status: QueryStatus,
  pub error: Option<QueryError>,
  pub has_data: bool,
  pub is_stale: bool,
  pub fetched_at: Option<Instant>,
}

impl EntryState {
  /// State reported for keys the cache has never seen.
  pub fn missing() -> Self {
    Self {
      status: QueryStatus::Idle,
      error: None,
      has_data: false,
      is_stale: true,
      fetched_at: None,
    }
  }
}
