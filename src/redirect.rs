//! Validation of post-login redirect targets.
//!
//! A redirect target comes from the `redirect` query parameter of the login
//! route, which anyone can craft. Only internal absolute paths are accepted;
//! everything else falls back to a known-safe path.

use percent_encoding::percent_decode_str;

/// Path used when neither the candidate nor the fallback is safe.
pub const ROOT_PATH: &str = "/";

/// Return `candidate` if it is a safe internal path, else a safe fallback.
///
/// The candidate is percent-decoded (keeping the raw text if it does not
/// decode to UTF-8) and trimmed before checking. It must start with a single
/// `/`, must not contain `://` and must not contain whitespace. The fallback
/// goes through the same check and degrades to `/`. Never fails.
pub fn sanitize(candidate: Option<&str>, fallback: &str) -> String {
  match candidate.filter(|c| !c.is_empty()) {
    Some(candidate) => accept(candidate).unwrap_or_else(|| safe_fallback(fallback)),
    None => safe_fallback(fallback),
  }
}

fn safe_fallback(fallback: &str) -> String {
  accept(fallback).unwrap_or_else(|| ROOT_PATH.to_string())
}

fn accept(raw: &str) -> Option<String> {
  let decoded = percent_decode_str(raw)
    .decode_utf8()
    .map(|s| s.into_owned())
    .unwrap_or_else(|_| raw.to_string());
  let path = decoded.trim();

  let safe = path.starts_with('/')
    && !path.starts_with("//")
    && !path.contains("://")
    && !path.chars().any(char::is_whitespace);

  safe.then(|| path.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_internal_path_with_query_is_kept() {
    assert_eq!(sanitize(Some("/inventory?x=1"), "/"), "/inventory?x=1");
  }

  #[test]
  fn test_absolute_url_is_rejected() {
    assert_eq!(sanitize(Some("http://evil.example"), "/"), "/");
    assert_eq!(sanitize(Some("/redirect?to=https://evil.example"), "/"), "/");
  }

  #[test]
  fn test_protocol_relative_url_is_rejected() {
    assert_eq!(sanitize(Some("//evil.example"), "/"), "/");
  }

  #[test]
  fn test_whitespace_is_rejected() {
    assert_eq!(sanitize(Some("/a b"), "/"), "/");
    assert_eq!(sanitize(Some("/a\tb"), "/"), "/");
  }

  #[test]
  fn test_missing_candidate_uses_fallback() {
    assert_eq!(sanitize(None, "/settings"), "/settings");
    assert_eq!(sanitize(Some(""), "/settings"), "/settings");
  }

  #[test]
  fn test_encoded_attacks_are_decoded_first() {
    assert_eq!(sanitize(Some("%2F%2Fevil.example"), "/"), "/");
    assert_eq!(sanitize(Some("/a%20b"), "/"), "/");
    assert_eq!(sanitize(Some("%2Flogs%3Ftype%3Draid"), "/"), "/logs?type=raid");
  }

  #[test]
  fn test_surrounding_whitespace_is_trimmed() {
    assert_eq!(sanitize(Some("  /profile  "), "/"), "/profile");
  }

  #[test]
  fn test_undecodable_input_is_checked_raw() {
    assert_eq!(sanitize(Some("/logs%FF"), "/"), "/logs%FF");
  }

  #[test]
  fn test_unsafe_fallback_degrades_to_root() {
    assert_eq!(sanitize(Some("https://evil.example"), "//also-evil"), "/");
    assert_eq!(sanitize(None, "javascript:alert(1)"), "/");
  }
}
