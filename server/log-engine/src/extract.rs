//! Per-format extractors: one raw line in, one [`LogEntry`] (or nothing) out.
//!
//! Every extractor has the [`Extractor`](crate::formats::Extractor) shape and
//! reads its capture groups from the format's pattern, so a replacement pattern
//! only needs to keep the same group numbering.

use regex::Captures;
use serde_json::{Map, Value};

use crate::error::LineError;
use crate::formats::FormatSpec;
use crate::level::{detect_level, level_for_status, normalize_level};
use crate::timestamp::{Stamp, TimestampNormalizer};
use crate::types::{Level, LogEntry};

/// Result of applying an extractor to a line that did not error.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
  Entry(LogEntry),
  /// The line does not fit the grammar and the format has no fallback.
  NoMatch,
}

const TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "@timestamp"];
const LEVEL_KEYS: &[&str] = &["level", "severity"];
const MESSAGE_KEYS: &[&str] = &["message", "msg"];
const SOURCE_KEYS: &[&str] = &["source", "logger", "service"];
const IP_KEYS: &[&str] = &["ip", "remote_addr", "client_ip"];
const METHOD_KEYS: &[&str] = &["method"];
const PATH_KEYS: &[&str] = &["path", "url"];
const STATUS_KEYS: &[&str] = &["statusCode", "status_code", "status"];
const RESPONSE_TIME_KEYS: &[&str] = &["responseTime", "response_time", "duration_ms"];

fn entry(index: usize, stamp: Stamp, level: Level, message: String) -> LogEntry {
  let mut entry = LogEntry::new(index, stamp.instant, level, message);
  entry.timestamp_inferred = stamp.inferred;
  entry
}

/// Trimmed message, or the trimmed line when the message is blank.
fn message_or_line(message: &str, line: &str) -> String {
  let trimmed = message.trim();
  if trimmed.is_empty() {
    line.trim().to_string()
  } else {
    trimmed.to_string()
  }
}

fn group<'h>(caps: &Captures<'h>, i: usize) -> Option<&'h str> {
  caps.get(i).map(|m| m.as_str())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Null, `false` and blank strings count as absent.
fn is_present(value: &Value) -> bool {
  match value {
    Value::Null | Value::Bool(false) => false,
    Value::String(s) => !s.trim().is_empty(),
    _ => true,
  }
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
  keys
    .iter()
    .filter_map(|k| obj.get(*k))
    .find(|v| is_present(v))
}

fn text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn number(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

pub fn json(
  _spec: &FormatSpec,
  stamps: &TimestampNormalizer,
  line: &str,
  index: usize,
) -> Result<Extraction, LineError> {
  let value: Value = serde_json::from_str(line.trim())?;
  let Value::Object(obj) = value else {
    return Err(LineError::NotAnObject);
  };

  let stamp = match first_present(&obj, TIMESTAMP_KEYS) {
    Some(Value::String(s)) => stamps.normalize(s)?,
    Some(Value::Number(n)) => match n.as_f64() {
      Some(v) => stamps.normalize_epoch(v)?,
      None => stamps.normalize(&n.to_string())?,
    },
    Some(other) => stamps.normalize(&other.to_string())?,
    None => stamps.missing()?,
  };

  let level = first_present(&obj, LEVEL_KEYS)
    .map(|v| normalize_level(&text(v)))
    .unwrap_or(Level::Info);

  let message = match first_present(&obj, MESSAGE_KEYS) {
    Some(v) => message_or_line(&text(v), line),
    None => line.trim().to_string(),
  };

  let mut out = entry(index, stamp, level, message);
  out.source = first_present(&obj, SOURCE_KEYS).map(text);
  out.ip = first_present(&obj, IP_KEYS).map(text);
  out.method = first_present(&obj, METHOD_KEYS).map(text);
  out.path = first_present(&obj, PATH_KEYS).map(text);
  out.status_code = first_present(&obj, STATUS_KEYS)
    .and_then(number)
    .filter(|n| n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(n))
    .map(|n| n as u32);
  out.response_time = first_present(&obj, RESPONSE_TIME_KEYS).and_then(number);
  Ok(Extraction::Entry(out))
}

// ---------------------------------------------------------------------------
// Apache / Nginx access logs
// ---------------------------------------------------------------------------

/// Groups: 1 client ip, 2 bracketed time, 3 method, 4 request target, 5 status.
pub fn access(
  spec: &FormatSpec,
  stamps: &TimestampNormalizer,
  line: &str,
  index: usize,
) -> Result<Extraction, LineError> {
  let Some(caps) = spec.pattern.captures(line) else {
    return Ok(Extraction::NoMatch);
  };
  let (Some(ip), Some(time), Some(method), Some(path), Some(status_raw)) = (
    group(&caps, 1),
    group(&caps, 2),
    group(&caps, 3),
    group(&caps, 4),
    group(&caps, 5),
  ) else {
    return Ok(Extraction::NoMatch);
  };

  // The pattern only admits digits, so overflow is the only parse failure.
  let status: u32 = status_raw.parse().unwrap_or(u32::MAX);
  let stamp = stamps.normalize_bracketed(time)?;
  let message = format!("{} {} - {}", method, path, status_raw);

  let mut out = entry(index, stamp, level_for_status(status), message);
  out.source = Some(spec.format.as_str().to_string());
  out.ip = Some(ip.to_string());
  out.method = Some(method.to_string());
  out.path = Some(path.to_string());
  out.status_code = Some(status);
  Ok(Extraction::Entry(out))
}

// ---------------------------------------------------------------------------
// Timestamped application logs
// ---------------------------------------------------------------------------

/// Groups: 1 timestamp, 2 level token, 3 message. Never drops a line: text
/// that does not match becomes an [`unstructured`] entry.
pub fn generic(
  spec: &FormatSpec,
  stamps: &TimestampNormalizer,
  line: &str,
  index: usize,
) -> Result<Extraction, LineError> {
  let parts = spec
    .pattern
    .captures(line)
    .and_then(|caps| Some((group(&caps, 1)?, group(&caps, 2)?, group(&caps, 3)?)));
  let Some((time, token, message)) = parts else {
    return unstructured(stamps, line, index);
  };

  let stamp = stamps.normalize(time)?;
  let mut out = entry(index, stamp, normalize_level(token), message_or_line(message, line));
  out.source = Some("application".to_string());
  Ok(Extraction::Entry(out))
}

/// Groups: 1 timestamp, 2 message. Level comes from the message text.
pub fn simple(
  spec: &FormatSpec,
  stamps: &TimestampNormalizer,
  line: &str,
  index: usize,
) -> Result<Extraction, LineError> {
  let Some(caps) = spec.pattern.captures(line) else {
    return Ok(Extraction::NoMatch);
  };
  let (Some(time), Some(message)) = (group(&caps, 1), group(&caps, 2)) else {
    return Ok(Extraction::NoMatch);
  };

  let stamp = stamps.normalize(time)?;
  let mut out = entry(index, stamp, detect_level(message), message_or_line(message, line));
  out.source = Some("application".to_string());
  Ok(Extraction::Entry(out))
}

/// Python `logging` default layout. Groups: 1 timestamp, 2 level, 3 message.
pub fn python(
  spec: &FormatSpec,
  stamps: &TimestampNormalizer,
  line: &str,
  index: usize,
) -> Result<Extraction, LineError> {
  let Some(caps) = spec.pattern.captures(line) else {
    return Ok(Extraction::NoMatch);
  };
  let (Some(time), Some(token), Some(message)) = (group(&caps, 1), group(&caps, 2), group(&caps, 3))
  else {
    return Ok(Extraction::NoMatch);
  };

  let stamp = stamps.normalize(time)?;
  let mut out = entry(index, stamp, normalize_level(token), message_or_line(message, line));
  out.source = Some("python".to_string());
  Ok(Extraction::Entry(out))
}

/// Fallback for free text: processing-time timestamp, level from content.
pub fn unstructured(
  stamps: &TimestampNormalizer,
  line: &str,
  index: usize,
) -> Result<Extraction, LineError> {
  let stamp = stamps.missing()?;
  let mut out = entry(index, stamp, detect_level(line), line.trim().to_string());
  out.source = Some("unknown".to_string());
  Ok(Extraction::Entry(out))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TimestampFallback;
  use crate::formats::{FormatTable, LogFormat};
  use crate::timestamp::to_canonical;
  use chrono::{DateTime, TimeZone, Utc};

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
  }

  fn run(format: LogFormat, line: &str) -> Result<Extraction, LineError> {
    let table = FormatTable::standard();
    let stamps = TimestampNormalizer::new(now(), TimestampFallback::Now);
    table.get(format).unwrap().extract(&stamps, line, 7)
  }

  fn entry_of(format: LogFormat, line: &str) -> LogEntry {
    match run(format, line).unwrap() {
      Extraction::Entry(e) => e,
      Extraction::NoMatch => panic!("expected an entry for {:?}", line),
    }
  }

  #[test]
  fn json_canonical_fields() {
    let e = entry_of(
      LogFormat::Json,
      r#"{"level":"error","message":"db timeout","timestamp":"2024-01-01T00:00:00Z"}"#,
    );
    assert_eq!(e.id, "entry-7");
    assert_eq!(e.level, Level::Error);
    assert_eq!(e.message, "db timeout");
    assert_eq!(to_canonical(&e.timestamp), "2024-01-01T00:00:00.000Z");
    assert!(!e.timestamp_inferred);
  }

  #[test]
  fn json_aliases_and_defaults() {
    let line = r#"{"time":"2024-01-15T10:00:01Z","severity":"WARNING","msg":"slow","logger":"db"}"#;
    let e = entry_of(LogFormat::Json, line);
    assert_eq!(e.level, Level::Warn);
    assert_eq!(e.message, "slow");
    assert_eq!(e.source.as_deref(), Some("db"));

    let bare = r#"{"port":8080}"#;
    let e = entry_of(LogFormat::Json, bare);
    assert_eq!(e.level, Level::Info);
    assert_eq!(e.message, bare);
    assert_eq!(e.timestamp, now());
    assert!(e.timestamp_inferred);
  }

  #[test]
  fn json_at_timestamp_and_epoch() {
    let e = entry_of(LogFormat::Json, r#"{"@timestamp":"2024-01-15T10:00:03Z","message":"x"}"#);
    assert_eq!(to_canonical(&e.timestamp), "2024-01-15T10:00:03.000Z");

    let e = entry_of(LogFormat::Json, r#"{"timestamp":1700000000000,"message":"x"}"#);
    assert_eq!(to_canonical(&e.timestamp), "2023-11-14T22:13:20.000Z");
  }

  #[test]
  fn json_blank_message_uses_line() {
    let line = r#"{"message":"  ","msg":""}"#;
    assert_eq!(entry_of(LogFormat::Json, line).message, line);
  }

  #[test]
  fn json_http_fields_lifted() {
    let line = r#"{"message":"req","ip":"10.0.0.2","method":"POST","path":"/pay","status":502,"duration_ms":47.5}"#;
    let e = entry_of(LogFormat::Json, line);
    assert_eq!(e.ip.as_deref(), Some("10.0.0.2"));
    assert_eq!(e.method.as_deref(), Some("POST"));
    assert_eq!(e.path.as_deref(), Some("/pay"));
    assert_eq!(e.status_code, Some(502));
    assert_eq!(e.response_time, Some(47.5));
  }

  #[test]
  fn json_malformed_is_error() {
    let err = run(LogFormat::Json, r#"{"level":"info",}"#).unwrap_err();
    assert!(err.is_malformed());
    assert!(matches!(run(LogFormat::Json, "[1,2]"), Err(LineError::NotAnObject)));
  }

  #[test]
  fn apache_line() {
    let line = r#"127.0.0.1 - - [10/Oct/2000:13:55:36 -0700] "GET /index.html HTTP/1.0" 404 1024"#;
    let e = entry_of(LogFormat::Apache, line);
    assert_eq!(e.level, Level::Warn);
    assert_eq!(e.status_code, Some(404));
    assert_eq!(e.message, "GET /index.html HTTP/1.0 - 404");
    assert_eq!(e.source.as_deref(), Some("apache"));
    assert_eq!(e.ip.as_deref(), Some("127.0.0.1"));
    assert_eq!(e.method.as_deref(), Some("GET"));
    assert_eq!(to_canonical(&e.timestamp), "2000-10-10T20:55:36.000Z");
  }

  #[test]
  fn nginx_line_is_error_on_5xx() {
    let line = r#"10.1.1.1 - - [29/Jan/2026:10:59:12 +0000] "POST /api HTTP/1.1" 503 12 "-" "curl/8.0""#;
    let e = entry_of(LogFormat::Nginx, line);
    assert_eq!(e.level, Level::Error);
    assert_eq!(e.source.as_deref(), Some("nginx"));
    assert_eq!(e.message, "POST /api HTTP/1.1 - 503");
  }

  #[test]
  fn access_non_matching_is_no_match() {
    assert_eq!(run(LogFormat::Apache, "plain text").unwrap(), Extraction::NoMatch);
  }

  #[test]
  fn access_out_of_range_status_is_kept_as_error() {
    let line = r#"1.1.1.1 - - [10/Oct/2000:13:55:36 -0700] "GET / HTTP/1.0" 70000 1"#;
    let e = entry_of(LogFormat::Apache, line);
    assert_eq!(e.level, Level::Error);
    assert_eq!(e.status_code, Some(70000));
    assert_eq!(e.message, "GET / HTTP/1.0 - 70000");

    let huge = r#"1.1.1.1 - - [10/Oct/2000:13:55:36 -0700] "GET / HTTP/1.0" 99999999999 1"#;
    let e = entry_of(LogFormat::Apache, huge);
    assert_eq!(e.level, Level::Error);
    assert_eq!(e.status_code, Some(u32::MAX));
  }

  #[test]
  fn generic_with_bracketed_level() {
    let e = entry_of(LogFormat::Generic, "2024-01-15T10:00:03Z [WARN] Disk usage at 92%");
    assert_eq!(e.level, Level::Warn);
    assert_eq!(e.message, "Disk usage at 92%");
    assert_eq!(e.source.as_deref(), Some("application"));
    assert_eq!(to_canonical(&e.timestamp), "2024-01-15T10:00:03.000Z");
  }

  #[test]
  fn generic_fallback_for_free_text() {
    let e = entry_of(LogFormat::Generic, "ERROR: NullPointerException at App.java:42");
    assert_eq!(e.level, Level::Error);
    assert_eq!(e.message, "ERROR: NullPointerException at App.java:42");
    assert_eq!(e.source.as_deref(), Some("unknown"));
    assert_eq!(e.timestamp, now());
    assert!(e.timestamp_inferred);
  }

  #[test]
  fn simple_level_from_content() {
    let e = entry_of(LogFormat::Simple, "2024-01-15 10:00:01 Failed to connect to database");
    assert_eq!(e.level, Level::Error);
    assert_eq!(e.message, "Failed to connect to database");
    assert_eq!(run(LogFormat::Simple, "no timestamp here").unwrap(), Extraction::NoMatch);
  }

  #[test]
  fn python_layout() {
    let e = entry_of(LogFormat::Python, "2024-01-15 10:00:00,123 - CRITICAL - worker died");
    assert_eq!(e.level, Level::Info);
    let e = entry_of(LogFormat::Python, "2024-01-15 10:00:00,123 - ERROR - worker died");
    assert_eq!(e.level, Level::Error);
    assert_eq!(e.source.as_deref(), Some("python"));
    assert_eq!(to_canonical(&e.timestamp), "2024-01-15T10:00:00.123Z");
  }

  #[test]
  fn drop_policy_rejects_free_text() {
    let table = FormatTable::standard();
    let stamps = TimestampNormalizer::new(now(), TimestampFallback::Drop);
    let result = table.get(LogFormat::Generic).unwrap().extract(&stamps, "no stamp", 0);
    assert!(matches!(result, Err(LineError::UnparseableTimestamp(_))));
  }
}
