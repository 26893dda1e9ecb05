//! Core types for the log engine (JSON contracts + internal models).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::formats::LogFormat;
use crate::query::EntryPage;
use crate::timestamp::canonical;

// ---------------------------------------------------------------------------
// Level enum (canonical)
// ---------------------------------------------------------------------------

/// The only level values ever stored on an entry. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
  Error,
  Warn,
  Info,
  Debug,
  Trace,
}

impl Level {
  pub const ALL: [Level; 5] = [Self::Error, Self::Warn, Self::Info, Self::Debug, Self::Trace];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Error => "ERROR",
      Self::Warn => "WARN",
      Self::Info => "INFO",
      Self::Debug => "DEBUG",
      Self::Trace => "TRACE",
    }
  }

  /// Display color used by `logLevelData`. TRACE is not charted.
  pub fn color(self) -> &'static str {
    match self {
      Self::Error => "#ef4444",
      Self::Warn => "#f59e0b",
      Self::Info => "#3b82f6",
      Self::Debug | Self::Trace => "#6b7280",
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Exact (case-insensitive) canonical names only; lenient mapping of raw
/// tokens lives in [`crate::level::normalize_level`].
impl FromStr for Level {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown level '{}'", s))
  }
}

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// One structured entry, created once per successfully parsed line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
  /// `entry-{index}`, index counted over non-blank input lines.
  pub id: String,
  #[serde(with = "canonical")]
  pub timestamp: DateTime<Utc>,
  pub level: Level,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ip: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub response_time: Option<f64>,
  /// Set when the timestamp came from the fallback policy, not the line.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub timestamp_inferred: bool,
}

impl LogEntry {
  pub fn new(index: usize, timestamp: DateTime<Utc>, level: Level, message: String) -> Self {
    Self {
      id: format!("entry-{}", index),
      timestamp,
      level,
      message,
      source: None,
      ip: None,
      method: None,
      path: None,
      status_code: None,
      response_time: None,
      timestamp_inferred: false,
    }
  }
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// A stable hex string identifying an error signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

// ---------------------------------------------------------------------------
// Parse diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
  pub format: LogFormat,
  /// Non-blank lines seen.
  pub total_lines: usize,
  pub parsed: usize,
  pub dropped: usize,
  /// Subset of `dropped`: lines that were not valid JSON objects.
  pub malformed: usize,
  /// Subset of `dropped`: lines rejected by the `drop` timestamp policy.
  pub rejected_timestamps: usize,
  /// Parsed entries whose timestamp is the processing instant.
  pub inferred_timestamps: usize,
}

impl ParseStats {
  pub fn new(format: LogFormat, total_lines: usize) -> Self {
    Self {
      format,
      total_lines,
      parsed: 0,
      dropped: 0,
      malformed: 0,
      rejected_timestamps: 0,
      inferred_timestamps: 0,
    }
  }
}

/// Ordered entries plus diagnostics from one parse.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
  pub entries: Vec<LogEntry>,
  pub stats: ParseStats,
}

// ---------------------------------------------------------------------------
// Analysis output (JSON contract)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
  /// `"HH:00"`.
  pub time: String,
  pub errors: u64,
  pub warnings: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourBucket {
  /// `"0"`..`"23"`.
  pub hour: String,
  pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSlice {
  pub name: Level,
  pub value: u64,
  pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSlice {
  pub name: String,
  pub value: u64,
}

/// A group of ERROR messages sharing a signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPattern {
  pub fingerprint: Fingerprint,
  pub signature: String,
  /// First message seen with this signature, in input order.
  pub sample: String,
  pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
  High,
  Medium,
  Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
  Error,
  Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
  pub id: u32,
  #[serde(rename = "type")]
  pub kind: InsightKind,
  pub title: String,
  pub description: String,
  pub severity: InsightSeverity,
  /// The analysis instant that produced this insight.
  #[serde(with = "canonical")]
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAnalysis {
  pub total_entries: u64,
  pub error_count: u64,
  pub warning_count: u64,
  pub info_count: u64,
  pub debug_count: u64,
  pub trace_count: u64,
  pub error_rate: f64,
  pub timeline_data: Vec<TimelinePoint>,
  pub hourly_distribution: Vec<HourBucket>,
  pub log_level_data: Vec<LevelSlice>,
  pub insights: Vec<Insight>,
  pub top_errors: Vec<ErrorPattern>,
  pub source_distribution: Vec<SourceSlice>,
}

// ---------------------------------------------------------------------------
// CLI report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Report {
  pub stats: ParseStats,
  pub analysis: LogAnalysis,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub entries: Option<EntryPage>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn level_from_str_is_strict() {
    assert_eq!("warn".parse::<Level>(), Ok(Level::Warn));
    assert_eq!(" ERROR ".parse::<Level>(), Ok(Level::Error));
    assert!("warning".parse::<Level>().is_err());
  }

  #[test]
  fn entry_serializes_camel_case_and_skips_absent_fields() {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut entry = LogEntry::new(3, ts, Level::Warn, "slow".to_string());
    entry.status_code = Some(404);
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "id": "entry-3",
        "timestamp": "2024-01-01T00:00:00.000Z",
        "level": "WARN",
        "message": "slow",
        "statusCode": 404
      })
    );
  }

  #[test]
  fn inferred_flag_is_serialized_when_set() {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut entry = LogEntry::new(0, ts, Level::Info, "x".to_string());
    entry.timestamp_inferred = true;
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["timestampInferred"], serde_json::json!(true));
  }

  #[test]
  fn insight_kind_serializes_as_type() {
    let insight = Insight {
      id: 3,
      kind: InsightKind::Pattern,
      title: "t".into(),
      description: "d".into(),
      severity: InsightSeverity::Medium,
      timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    };
    let json = serde_json::to_value(&insight).unwrap();
    assert_eq!(json["type"], "pattern");
    assert_eq!(json["severity"], "medium");
    assert_eq!(json["timestamp"], "2024-01-01T00:00:00.000Z");
  }
}
