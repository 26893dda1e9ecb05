//! Level normalization: explicit level tokens, free-text content, HTTP status.

use crate::types::Level;

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
  needles.iter().any(|n| haystack.contains(n))
}

/// Canonicalize an explicit level token (case-insensitive substring match).
///
/// Checked in priority order, so `"WARN_ERROR"` is an error.
pub fn normalize_level(token: &str) -> Level {
  let upper = token.to_uppercase();
  if contains_any(&upper, &["ERROR", "ERR", "FATAL"]) {
    Level::Error
  } else if contains_any(&upper, &["WARN", "WARNING"]) {
    Level::Warn
  } else if upper.contains("DEBUG") {
    Level::Debug
  } else if upper.contains("TRACE") {
    Level::Trace
  } else {
    Level::Info
  }
}

/// Infer a level from message text when the line carries no level field.
///
/// Never yields TRACE.
pub fn detect_level(content: &str) -> Level {
  let upper = content.to_uppercase();
  if contains_any(&upper, &["ERROR", "EXCEPTION", "FAIL"]) {
    Level::Error
  } else if contains_any(&upper, &["WARN", "WARNING"]) {
    Level::Warn
  } else if upper.contains("DEBUG") {
    Level::Debug
  } else {
    Level::Info
  }
}

/// Access-log level: 5xx errors, 4xx warnings, everything else info.
pub fn level_for_status(status: u32) -> Level {
  match status {
    500.. => Level::Error,
    400..=499 => Level::Warn,
    _ => Level::Info,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn explicit_tokens() {
    assert_eq!(normalize_level("error"), Level::Error);
    assert_eq!(normalize_level("ERR"), Level::Error);
    assert_eq!(normalize_level("Fatal"), Level::Error);
    assert_eq!(normalize_level("warning"), Level::Warn);
    assert_eq!(normalize_level("debug"), Level::Debug);
    assert_eq!(normalize_level("trace"), Level::Trace);
    assert_eq!(normalize_level("notice"), Level::Info);
    assert_eq!(normalize_level(""), Level::Info);
  }

  #[test]
  fn explicit_priority_prefers_error() {
    assert_eq!(normalize_level("warn-err"), Level::Error);
    assert_eq!(normalize_level("debug_trace"), Level::Debug);
  }

  #[test]
  fn content_detection() {
    assert_eq!(detect_level("NullPointerException at App.java:42"), Level::Error);
    assert_eq!(detect_level("login failed for bob"), Level::Error);
    assert_eq!(detect_level("disk WARNING 92%"), Level::Warn);
    assert_eq!(detect_level("debug: cache miss"), Level::Debug);
    assert_eq!(detect_level("server started"), Level::Info);
  }

  #[test]
  fn content_detection_never_infers_trace() {
    assert_eq!(detect_level("TRACE enter fn"), Level::Info);
  }

  #[test]
  fn status_codes() {
    assert_eq!(level_for_status(200), Level::Info);
    assert_eq!(level_for_status(304), Level::Info);
    assert_eq!(level_for_status(404), Level::Warn);
    assert_eq!(level_for_status(503), Level::Error);
    assert_eq!(level_for_status(70000), Level::Error);
  }
}
