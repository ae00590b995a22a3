//! Structured resource keys.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Identifies one cacheable resource instance, e.g.
/// `["dungeon-logs", {"cursor": null, "limit": 10, "type": "raid"}]`.
///
/// Keys compare structurally. The cache indexes entries by [`QueryKey::hash`],
/// which is derived from the canonical serialization, so two keys built from
/// equal values always land on the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryKey {
  parts: Vec<Value>,
}

impl QueryKey {
  /// A key with a single root segment.
  pub fn new(root: &str) -> Self {
    Self {
      parts: vec![Value::String(root.to_string())],
    }
  }

  /// The empty key. As an invalidation prefix it matches every entry.
  pub fn all() -> Self {
    Self::default()
  }

  /// Append a segment.
  pub fn with(mut self, part: impl Into<Value>) -> Self {
    self.parts.push(part.into());
    self
  }

  pub fn parts(&self) -> &[Value] {
    &self.parts
  }

  /// Stable textual form: object members sorted by name, no whitespace.
  pub fn canonical(&self) -> String {
    let mut out = String::new();
    write_canonical(&Value::Array(self.parts.clone()), &mut out);
    out
  }

  /// SHA256 of the canonical form, used as the cache index.
  pub fn hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.canonical().as_bytes());
    hex::encode(hasher.finalize())
  }

  /// Whether `prefix` matches the leading segments of this key.
  ///
  /// Scalars and arrays must be equal. An object segment in the prefix
  /// matches when every member it names matches, so `["dungeon-logs",
  /// {"type": "raid"}]` selects raid logs for every limit and cursor.
  pub fn starts_with(&self, prefix: &QueryKey) -> bool {
    prefix.parts.len() <= self.parts.len()
      && prefix
        .parts
        .iter()
        .zip(&self.parts)
        .all(|(want, have)| partial_match(want, have))
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.canonical())
  }
}

fn partial_match(want: &Value, have: &Value) -> bool {
  match (want, have) {
    (Value::Object(want), Value::Object(have)) => want
      .iter()
      .all(|(name, value)| have.get(name).is_some_and(|h| partial_match(value, h))),
    _ => want == have,
  }
}

fn write_canonical(value: &Value, out: &mut String) {
  match value {
    Value::Array(items) => {
      out.push('[');
      for (i, item) in items.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        write_canonical(item, out);
      }
      out.push(']');
    }
    Value::Object(members) => {
      let mut names: Vec<&String> = members.keys().collect();
      names.sort();
      out.push('{');
      for (i, name) in names.into_iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        out.push_str(&Value::String(name.clone()).to_string());
        out.push(':');
        write_canonical(&members[name], out);
      }
      out.push('}');
    }
    scalar => out.push_str(&scalar.to_string()),
  }
}
