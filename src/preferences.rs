//! Display preferences (language, colour theme) with change notification.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {preference} '{value}'. Expected one of: {expected}")]
pub struct PreferenceError {
  pub preference: &'static str,
  pub value: String,
  pub expected: String,
}

/// A closed set of values a preference can take.
pub trait PreferenceValue:
  Copy + Eq + fmt::Debug + fmt::Display + FromStr + Send + Sync + 'static
{
  /// Name used in messages, e.g. "theme"
  const NAME: &'static str;
  /// Every allowed value, in display order
  const ALL: &'static [Self];

  /// The value after this one, wrapping around.
  fn next(self) -> Self {
    let index = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
    Self::ALL[(index + 1) % Self::ALL.len()]
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  #[default]
  Ko,
  En,
}

impl PreferenceValue for Language {
  const NAME: &'static str = "language";
  const ALL: &'static [Self] = &[Language::Ko, Language::En];
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Language::Ko => "ko",
      Language::En => "en",
    })
  }
}

impl FromStr for Language {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ko" => Ok(Language::Ko),
      "en" => Ok(Language::En),
      _ => Err(()),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  System,
  Light,
  Dark,
}

impl PreferenceValue for Theme {
  const NAME: &'static str = "theme";
  const ALL: &'static [Self] = &[Theme::System, Theme::Light, Theme::Dark];
}

impl fmt::Display for Theme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Theme::System => "system",
      Theme::Light => "light",
      Theme::Dark => "dark",
    })
  }
}

impl FromStr for Theme {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "system" => Ok(Theme::System),
      "light" => Ok(Theme::Light),
      "dark" => Ok(Theme::Dark),
      _ => Err(()),
    }
  }
}

type Listener<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Subscriber<T> {
  id: u64,
  active: Arc<AtomicBool>,
  listener: Listener<T>,
}

struct Inner<T> {
  value: T,
  next_id: u64,
  subscribers: Vec<Subscriber<T>>,
}

/// One preference value plus its subscribers.
///
/// Clones share the same value. Listeners run synchronously on the thread
/// that called `set`, in subscription order, without the internal lock held.
pub struct Preference<T: PreferenceValue> {
  inner: Arc<Mutex<Inner<T>>>,
}

impl<T: PreferenceValue> Clone for Preference<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

fn lock<T>(inner: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
  inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: PreferenceValue> Preference<T> {
  pub fn new(initial: T) -> Self {
    Self {
      inner: Arc::new(Mutex::new(Inner {
        value: initial,
        next_id: 0,
        subscribers: Vec::new(),
      })),
    }
  }

  pub fn get(&self) -> T {
    lock(&self.inner).value
  }

  /// Store `value` and notify subscribers.
  ///
  /// Returns `false` without notifying anyone if the value is unchanged.
  pub fn set(&self, value: T) -> bool {
    let listeners: Vec<(Arc<AtomicBool>, Listener<T>)> = {
      let mut inner = lock(&self.inner);
      if inner.value == value {
        return false;
      }
      inner.value = value;
      inner
        .subscribers
        .iter()
        .map(|s| (Arc::clone(&s.active), Arc::clone(&s.listener)))
        .collect()
    };

    debug!(preference = T::NAME, %value, "preference changed");
    for (active, listener) in listeners {
      // Skip listeners unsubscribed by an earlier listener in this round.
      if active.load(Ordering::Acquire) {
        listener(value);
      }
    }
    true
  }

  /// Parse and store a raw value. Values outside the enumeration are
  /// rejected before any subscriber sees them.
  pub fn set_str(&self, raw: &str) -> Result<bool, PreferenceError> {
    let value = raw.trim().to_lowercase().parse::<T>().map_err(|_| PreferenceError {
      preference: T::NAME,
      value: raw.to_string(),
      expected: T::ALL
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", "),
    })?;
    Ok(self.set(value))
  }

  /// Register `listener` for future changes.
  ///
  /// The listener stays registered until the returned [`Subscription`] is
  /// unsubscribed or dropped.
  pub fn subscribe(&self, listener: impl Fn(T) + Send + Sync + 'static) -> Subscription {
    let active = Arc::new(AtomicBool::new(true));
    let id = {
      let mut inner = lock(&self.inner);
      let id = inner.next_id;
      inner.next_id += 1;
      inner.subscribers.push(Subscriber {
        id,
        active: Arc::clone(&active),
        listener: Arc::new(listener),
      });
      id
    };

    let weak: Weak<Mutex<Inner<T>>> = Arc::downgrade(&self.inner);
    Subscription {
      active,
      remove: Some(Box::new(move || {
        if let Some(inner) = weak.upgrade() {
          lock(&inner).subscribers.retain(|s| s.id != id);
        }
      })),
    }
  }
}

/// Handle returned by [`Preference::subscribe`].
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
  active: Arc<AtomicBool>,
  remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
  pub fn unsubscribe(mut self) {
    self.detach();
  }

  fn detach(&mut self) {
    self.active.store(false, Ordering::Release);
    if let Some(remove) = self.remove.take() {
      remove();
    }
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.detach();
  }
}

/// All user preferences, created once at startup.
#[derive(Clone)]
pub struct Preferences {
  pub language: Preference<Language>,
  pub theme: Preference<Theme>,
}

impl Preferences {
  pub fn new(language: Language, theme: Theme) -> Self {
    Self {
      language: Preference::new(language),
      theme: Preference::new(theme),
    }
  }
}

impl Default for Preferences {
  fn default() -> Self {
    Self::new(Language::default(), Theme::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn recorder<T: PreferenceValue>() -> (Arc<Mutex<Vec<T>>>, impl Fn(T) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |value| sink.lock().unwrap().push(value))
  }

  #[test]
  fn test_defaults() {
    let prefs = Preferences::default();
    assert_eq!(prefs.language.get(), Language::Ko);
    assert_eq!(prefs.theme.get(), Theme::System);
  }

  #[test]
  fn test_repeated_set_notifies_once() {
    let theme = Preference::new(Theme::System);
    let (seen, listener) = recorder::<Theme>();
    let _sub = theme.subscribe(listener);

    assert!(theme.set(Theme::Dark));
    assert!(!theme.set(Theme::Dark));

    assert_eq!(*seen.lock().unwrap(), vec![Theme::Dark]);
  }

  #[test]
  fn test_invalid_value_never_reaches_subscribers() {
    let theme = Preference::new(Theme::System);
    let (seen, listener) = recorder::<Theme>();
    let _sub = theme.subscribe(listener);

    let err = theme.set_str("purple").unwrap_err();
    assert_eq!(err.preference, "theme");
    assert_eq!(err.expected, "system, light, dark");
    assert_eq!(theme.get(), Theme::System);
    assert!(seen.lock().unwrap().is_empty());

    assert_eq!(theme.set_str(" Light "), Ok(true));
    assert_eq!(*seen.lock().unwrap(), vec![Theme::Light]);
  }

  #[test]
  fn test_subscribers_notified_in_order() {
    let language = Preference::new(Language::Ko);
    let order = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&order);
    let _a = language.subscribe(move |_| first.lock().unwrap().push("a"));
    let second = Arc::clone(&order);
    let _b = language.subscribe(move |_| second.lock().unwrap().push("b"));

    language.set(Language::En);
    assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
  }

  #[test]
  fn test_unsubscribe_stops_notifications() {
    let theme = Preference::new(Theme::System);
    let (seen, listener) = recorder::<Theme>();
    let sub = theme.subscribe(listener);

    theme.set(Theme::Light);
    sub.unsubscribe();
    theme.set(Theme::Dark);

    assert_eq!(*seen.lock().unwrap(), vec![Theme::Light]);
  }

  #[test]
  fn test_unsubscribe_during_dispatch_skips_listener() {
    let theme = Preference::new(Theme::System);
    let (seen, listener) = recorder::<Theme>();

    // The first listener drops the second one's subscription mid-dispatch.
    let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&victim);
    let _killer = theme.subscribe(move |_| {
      slot.lock().unwrap().take();
    });
    *victim.lock().unwrap() = Some(theme.subscribe(listener));

    theme.set(Theme::Dark);
    assert!(seen.lock().unwrap().is_empty());
  }

  #[test]
  fn test_next_cycles_through_values() {
    assert_eq!(Theme::System.next(), Theme::Light);
    assert_eq!(Theme::Dark.next(), Theme::System);
    assert_eq!(Language::En.next(), Language::Ko);
  }
}
