//! Mutations with cascading invalidation.
//!
//! A mutation declares which cached resources it affects, split in two
//! phases:
//! - `on_success` keys are invalidated (and observed ones refetched) before
//!   the caller sees the result, so reads right after a successful mutation
//!   see fresh data
//! - `on_settle` keys are invalidated after every attempt, successful or not,
//!   for resources that record the attempt itself

use std::fmt::Display;
use std::future::Future;
use tracing::{info, warn};

use crate::cache::{QueryClient, QueryKey};

/// Resources a mutation invalidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationEffects {
  pub invalidate_on_success: Vec<QueryKey>,
  pub invalidate_on_settle: Vec<QueryKey>,
}

impl MutationEffects {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn on_success(mut self, key: QueryKey) -> Self {
    self.invalidate_on_success.push(key);
    self
  }

  pub fn on_settle(mut self, key: QueryKey) -> Self {
    self.invalidate_on_settle.push(key);
    self
  }
}

/// Run `mutation`, then apply `effects`.
///
/// The mutation's own result is returned unchanged, including its error.
/// Success-phase invalidations finish before settle-phase ones start.
/// Settle-phase keys are marked stale before this returns; refetching the
/// observed ones continues in the background.
pub async fn run_mutation<T, E, Fut>(
  client: &QueryClient,
  name: &str,
  mutation: Fut,
  effects: &MutationEffects,
) -> Result<T, E>
where
  E: Display,
  Fut: Future<Output = Result<T, E>>,
{
  let result = mutation.await;

  match &result {
    Ok(_) => {
      info!(mutation = name, "mutation succeeded");
      let invalidations = effects
        .invalidate_on_success
        .iter()
        .map(|key| client.invalidate(key));
      futures::future::join_all(invalidations).await;
    }
    Err(err) => warn!(mutation = name, error = %err, "mutation failed"),
  }

  for key in &effects.invalidate_on_settle {
    client.invalidate_in_background(key);
  }

  result
}
