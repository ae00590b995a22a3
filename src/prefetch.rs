//! Best-effort cache warm-up during navigation.

use std::future::Future;
use tokio::time::Duration;
use tracing::warn;

use crate::cache::{QueryClient, QueryKey};
use crate::error::QueryError;

/// Populate `key` ahead of a render without letting a flaky network block
/// navigation.
///
/// Transport and server failures are logged and swallowed; the key stays
/// without data and the view renders its empty state. Validation and
/// internal errors are returned, since hiding them would hide defects.
///
/// Only for warm-up. Reads an invariant depends on (like the session check)
/// must use [`QueryClient::ensure`] directly.
pub async fn ensure_safe<T, F, Fut>(
  client: &QueryClient,
  key: &QueryKey,
  stale_after: Duration,
  fetcher: F,
) -> Result<(), QueryError>
where
  T: Send + Sync + 'static,
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
{
  match client.ensure(key, stale_after, fetcher).await {
    Ok(_) => Ok(()),
    Err(err) if err.is_transport_kind() => {
      warn!(key = %key, error = %err, "prefetch failed, continuing without data");
      Ok(())
    }
    Err(err) => Err(err),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ApiErrorCode;

  const STALE: Duration = Duration::from_secs(30);

  #[tokio::test]
  async fn test_transport_error_is_swallowed() {
    let client = QueryClient::new();
    let key = QueryKey::new("inventory");

    let result = ensure_safe(&client, &key, STALE, || async {
      Err::<u32, _>(QueryError::transport("inventory", "Failed to fetch"))
    })
    .await;

    assert_eq!(result, Ok(()));
    assert!(client.peek::<u32>(&key).is_none());
  }

  #[tokio::test]
  async fn test_api_error_is_swallowed() {
    let client = QueryClient::new();
    let key = QueryKey::new("inventory");

    let result = ensure_safe(&client, &key, STALE, || async {
      Err::<u32, _>(QueryError::api(ApiErrorCode::Unauthorized, "expired"))
    })
    .await;

    assert_eq!(result, Ok(()));
  }

  #[tokio::test]
  async fn test_validation_error_is_returned() {
    let client = QueryClient::new();
    let key = QueryKey::new("inventory");

    let result = ensure_safe(&client, &key, STALE, || async {
      Err::<u32, _>(QueryError::validation("inventory", "missing field `items`"))
    })
    .await;

    assert!(matches!(result, Err(QueryError::Validation { .. })));
  }

  #[tokio::test]
  async fn test_success_populates_cache() {
    let client = QueryClient::new();
    let key = QueryKey::new("inventory");

    ensure_safe(&client, &key, STALE, || async { Ok::<_, QueryError>(3u32) })
      .await
      .unwrap();

    assert_eq!(client.peek::<u32>(&key).as_deref(), Some(&3));
  }
}
