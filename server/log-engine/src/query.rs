//! Stateless filter, sort and paginate over a parsed entry sequence.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Level, LogEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
  #[default]
  Timestamp,
  /// Severity order: ERROR first when ascending.
  Level,
  Message,
  Source,
}

impl FromStr for SortField {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "timestamp" => Ok(Self::Timestamp),
      "level" => Ok(Self::Level),
      "message" => Ok(Self::Message),
      "source" => Ok(Self::Source),
      other => Err(format!("unknown sort field '{}'", other)),
    }
  }
}

impl fmt::Display for SortField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Timestamp => "timestamp",
      Self::Level => "level",
      Self::Message => "message",
      Self::Source => "source",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

/// Filters are ANDed; an absent filter matches everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntryQuery {
  pub level: Option<Level>,
  /// Case-insensitive substring of the message.
  pub keyword: Option<String>,
  pub source: Option<String>,
  /// Inclusive lower bound.
  pub start: Option<DateTime<Utc>>,
  /// Inclusive upper bound.
  pub end: Option<DateTime<Utc>>,
  pub sort_by: SortField,
  pub sort_dir: SortDirection,
  /// 1-based.
  pub page: usize,
  pub per_page: usize,
}

impl Default for EntryQuery {
  fn default() -> Self {
    Self {
      level: None,
      keyword: None,
      source: None,
      start: None,
      end: None,
      sort_by: SortField::Timestamp,
      sort_dir: SortDirection::Desc,
      page: 1,
      per_page: 20,
    }
  }
}

impl EntryQuery {
  fn matches(&self, entry: &LogEntry, keyword: Option<&str>) -> bool {
    if self.level.is_some_and(|l| l != entry.level) {
      return false;
    }
    if let Some(source) = &self.source {
      if entry.source.as_deref() != Some(source.as_str()) {
        return false;
      }
    }
    if self.start.is_some_and(|s| entry.timestamp < s) {
      return false;
    }
    if self.end.is_some_and(|e| entry.timestamp > e) {
      return false;
    }
    match keyword {
      Some(k) => entry.message.to_lowercase().contains(k),
      None => true,
    }
  }

  fn compare(&self, a: &LogEntry, b: &LogEntry) -> Ordering {
    let ord = match self.sort_by {
      SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
      SortField::Level => a.level.cmp(&b.level),
      SortField::Message => a.message.cmp(&b.message),
      SortField::Source => a.source.as_deref().unwrap_or("").cmp(b.source.as_deref().unwrap_or("")),
    };
    match self.sort_dir {
      SortDirection::Asc => ord,
      SortDirection::Desc => ord.reverse(),
    }
  }
}

/// One page of matching entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPage {
  pub entries: Vec<LogEntry>,
  /// Matches before pagination.
  pub total: usize,
  pub page: usize,
  pub per_page: usize,
}

/// Filter, sort (stable) and slice `entries`. A page past the end is empty.
pub fn query(entries: &[LogEntry], q: &EntryQuery) -> EntryPage {
  let keyword = q
    .keyword
    .as_deref()
    .map(str::trim)
    .filter(|k| !k.is_empty())
    .map(str::to_lowercase);

  let mut matched: Vec<&LogEntry> = entries
    .iter()
    .filter(|e| q.matches(e, keyword.as_deref()))
    .collect();
  matched.sort_by(|a, b| q.compare(a, b));

  let page = q.page.max(1);
  let per_page = q.per_page.max(1);
  let total = matched.len();
  let entries = matched
    .into_iter()
    .skip((page - 1).saturating_mul(per_page))
    .take(per_page)
    .cloned()
    .collect();

  EntryPage {
    entries,
    total,
    page,
    per_page,
  }
}
