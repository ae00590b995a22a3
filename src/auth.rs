//! Access token slot.
//!
//! The auth flow owns the token and is the only writer. The transport reads
//! it through a [`TokenAccessor`] registered at construction, so it never
//! keeps its own copy and always sends whatever token is current.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Read-only view of the current access token.
pub type TokenAccessor = Arc<dyn Fn() -> Option<String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct AccessToken {
  slot: Arc<RwLock<Option<String>>>,
}

impl AccessToken {
  pub fn new(initial: Option<String>) -> Self {
    Self {
      slot: Arc::new(RwLock::new(initial.filter(|t| !t.trim().is_empty()))),
    }
  }

  /// Store a token after login or refresh. Surrounding whitespace is dropped,
  /// and a blank token empties the slot.
  pub fn set(&self, token: impl Into<String>) {
    let token = token.into();
    let token = token.trim();
    if token.is_empty() {
      self.clear();
      return;
    }
    *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    info!("access token updated");
  }

  /// Forget the token on logout.
  pub fn clear(&self) {
    *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    info!("access token cleared");
  }

  pub fn is_present(&self) -> bool {
    self
      .slot
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .is_some()
  }

  /// Accessor handed to the transport.
  pub fn accessor(&self) -> TokenAccessor {
    let slot = Arc::clone(&self.slot);
    Arc::new(move || slot.read().unwrap_or_else(PoisonError::into_inner).clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_accessor_sees_later_writes() {
    let token = AccessToken::default();
    let read = token.accessor();
    assert_eq!(read(), None);

    token.set("abc");
    assert_eq!(read().as_deref(), Some("abc"));

    token.set("def");
    assert_eq!(read().as_deref(), Some("def"));

    token.clear();
    assert_eq!(read(), None);
    assert!(!token.is_present());
  }

  #[test]
  fn test_blank_initial_token_is_ignored() {
    assert!(!AccessToken::new(Some("  ".to_string())).is_present());
    assert!(AccessToken::new(Some("abc".to_string())).is_present());
  }

  #[test]
  fn test_set_trims_and_rejects_blank() {
    let token = AccessToken::new(Some("old".to_string()));
    let read = token.accessor();

    token.set(" abc\n");
    assert_eq!(read().as_deref(), Some("abc"));

    token.set("   ");
    assert_eq!(read(), None);
    assert!(!token.is_present());
  }
}
