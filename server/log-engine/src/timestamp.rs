//! Timestamp normalization to a canonical UTC instant.
//!
//! Offset-less date-times are read as UTC. When nothing parses, the
//! configured [`TimestampFallback`] decides between the processing instant
//! (entry flagged `timestampInferred`) and rejecting the line.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::config::TimestampFallback;
use crate::error::LineError;

const OFFSET_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f%z",
  "%Y-%m-%d %H:%M:%S%.f%z",
  "%Y-%m-%dT%H:%M:%S%.f %z",
  "%Y-%m-%d %H:%M:%S%.f %z",
];

const NAIVE_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M",
  "%Y/%m/%d %H:%M:%S",
];

/// Parse a generic date-time representation.
pub fn parse_generic(raw: &str) -> Option<DateTime<Utc>> {
  let s = raw.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
    return Some(dt.with_timezone(&Utc));
  }

  // Python logging separates milliseconds with a comma.
  let s: Cow<'_, str> = if s.contains(',') {
    Cow::Owned(s.replacen(',', ".", 1))
  } else {
    Cow::Borrowed(s)
  };

  for fmt in OFFSET_FORMATS {
    if let Ok(dt) = DateTime::parse_from_str(&s, fmt) {
      return Some(dt.with_timezone(&Utc));
    }
  }

  let naive = s
    .strip_suffix('Z')
    .or_else(|| s.strip_suffix('z'))
    .unwrap_or(&s);
  for fmt in NAIVE_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
      return Some(dt.and_utc());
    }
  }

  NaiveDate::parse_from_str(naive, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
}

/// Parse the bracketed access-log layout `10/Oct/2000:13:55:36 -0700`,
/// falling through to [`parse_generic`].
pub fn parse_bracketed(raw: &str) -> Option<DateTime<Utc>> {
  let s = raw.trim();
  DateTime::parse_from_str(s, "%d/%b/%Y:%H:%M:%S %z")
    .map(|dt| dt.with_timezone(&Utc))
    .ok()
    .or_else(|| {
      NaiveDateTime::parse_from_str(s, "%d/%b/%Y:%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
    })
    .or_else(|| parse_generic(s))
}

/// Interpret a numeric timestamp: epoch milliseconds when `>= 1e12`,
/// epoch seconds otherwise.
pub fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
  if !value.is_finite() {
    return None;
  }
  let millis = if value.abs() >= 1e12 { value } else { value * 1000.0 };
  DateTime::from_timestamp_millis(millis.round() as i64)
}

/// Canonical text form: RFC 3339, milliseconds, `Z` suffix.
pub fn to_canonical(ts: &DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A resolved instant and whether the fallback produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
  pub instant: DateTime<Utc>,
  pub inferred: bool,
}

impl Stamp {
  fn parsed(instant: DateTime<Utc>) -> Self {
    Self {
      instant,
      inferred: false,
    }
  }
}

/// Resolves raw timestamp text against a fixed processing instant.
#[derive(Debug, Clone, Copy)]
pub struct TimestampNormalizer {
  now: DateTime<Utc>,
  policy: TimestampFallback,
}

impl TimestampNormalizer {
  pub fn new(now: DateTime<Utc>, policy: TimestampFallback) -> Self {
    Self { now, policy }
  }

  pub fn normalize(&self, raw: &str) -> Result<Stamp, LineError> {
    match parse_generic(raw) {
      Some(instant) => Ok(Stamp::parsed(instant)),
      None => self.fallback(raw),
    }
  }

  pub fn normalize_bracketed(&self, raw: &str) -> Result<Stamp, LineError> {
    match parse_bracketed(raw) {
      Some(instant) => Ok(Stamp::parsed(instant)),
      None => self.fallback(raw),
    }
  }

  pub fn normalize_epoch(&self, value: f64) -> Result<Stamp, LineError> {
    match from_epoch(value) {
      Some(instant) => Ok(Stamp::parsed(instant)),
      None => self.fallback(&value.to_string()),
    }
  }

  /// The line has no timestamp at all.
  pub fn missing(&self) -> Result<Stamp, LineError> {
    self.fallback("<missing>")
  }

  fn fallback(&self, raw: &str) -> Result<Stamp, LineError> {
    match self.policy {
      TimestampFallback::Now => Ok(Stamp {
        instant: self.now,
        inferred: true,
      }),
      TimestampFallback::Drop => Err(LineError::UnparseableTimestamp(raw.to_string())),
    }
  }
}

/// Serde adapter writing instants in [`to_canonical`] form.
pub mod canonical {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&super::to_canonical(ts))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    DateTime::parse_from_rfc3339(&raw)
      .map(|dt| dt.with_timezone(&Utc))
      .map_err(serde::de::Error::custom)
  }
}
