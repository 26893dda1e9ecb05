//! Core engine: holds config and the format table, runs parse and analysis.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::analysis;
use crate::config::Config;
use crate::formats::FormatTable;
use crate::parser;
use crate::query::{self, EntryPage, EntryQuery};
use crate::types::*;

/// The log ingestion engine. Stateless between calls; every call recomputes
/// from its input.
#[derive(Debug, Clone)]
pub struct Engine {
  config: Config,
  table: FormatTable,
}

impl Engine {
  /// Takes `config` as given; run [`Config::validate`] first on configs not
  /// loaded from TOML.
  pub fn new(config: Config) -> Self {
    Self {
      config,
      table: FormatTable::standard(),
    }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  /// Use a custom pattern table (e.g. a tightened Nginx pattern).
  pub fn with_table(config: Config, table: FormatTable) -> Self {
    Self { config, table }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn table(&self) -> &FormatTable {
    &self.table
  }

  /// Parse `content` into entries, using the current instant for fallbacks.
  pub fn parse(&self, content: &str) -> Vec<LogEntry> {
    self.parse_with_stats(content, Utc::now()).entries
  }

  /// Parse with a pinned processing instant and return diagnostics too.
  pub fn parse_with_stats(&self, content: &str, now: DateTime<Utc>) -> ParseOutcome {
    parser::parse(&self.table, &self.config, content, now)
  }

  /// Analyze as of the current instant.
  pub fn analyze(&self, entries: &[LogEntry]) -> LogAnalysis {
    self.analyze_at(entries, Utc::now())
  }

  /// Analyze as of `now`. Same entries and instant give identical output.
  pub fn analyze_at(&self, entries: &[LogEntry], now: DateTime<Utc>) -> LogAnalysis {
    analysis::analyze(entries, &self.config, now)
  }

  pub fn query(&self, entries: &[LogEntry], q: &EntryQuery) -> EntryPage {
    query::query(entries, q)
  }

  /// Parse and analyze in one step, with a single instant for both stages.
  /// `entries` selects which parsed entries (if any) ride along in the report.
  pub fn report(&self, content: &str, entries: Option<&EntryQuery>, now: DateTime<Utc>) -> Report {
    let outcome = self.parse_with_stats(content, now);
    let analysis = self.analyze_at(&outcome.entries, now);
    info!(
      format = %outcome.stats.format,
      entries = analysis.total_entries,
      errors = analysis.error_count,
      insights = analysis.insights.len(),
      "analysis complete"
    );
    let page = entries.map(|q| self.query(&outcome.entries, q));
    Report {
      stats: outcome.stats,
      analysis,
      entries: page,
    }
  }
}

impl Default for Engine {
  fn default() -> Self {
    Self::with_defaults()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::formats::LogFormat;
  use chrono::TimeZone;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
  }

  #[test]
  fn report_uses_one_instant_for_both_stages() {
    let engine = Engine::with_defaults();
    let report = engine.report("something failed\n", None, now());
    assert_eq!(report.stats.inferred_timestamps, 1);
    assert_eq!(report.analysis.hourly_distribution[10].count, 1);
    assert!(report.entries.is_none());
  }

  #[test]
  fn report_with_entry_page() {
    let engine = Engine::with_defaults();
    let content = "{\"level\":\"error\",\"message\":\"a\"}\n{\"level\":\"info\",\"message\":\"b\"}";
    let q = EntryQuery {
      level: Some(Level::Error),
      ..EntryQuery::default()
    };
    let report = engine.report(content, Some(&q), now());
    let page = report.entries.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.entries[0].message, "a");
  }

  #[test]
  fn custom_table_changes_detection() {
    let table = FormatTable::standard()
      .with_pattern(LogFormat::Json, r"^\{never\}$")
      .unwrap();
    let engine = Engine::with_table(Config::default(), table);
    assert_eq!(engine.table().get(LogFormat::Json).unwrap().pattern.as_str(), r"^\{never\}$");
    let out = engine.parse_with_stats("{\"level\":\"error\"}", now());
    assert_eq!(out.stats.format, LogFormat::Generic);
    assert_eq!(out.entries[0].source.as_deref(), Some("unknown"));
  }

  #[test]
  fn zero_signature_tokens_do_not_merge_every_error() {
    let engine = Engine::new(Config {
      signature_tokens: 0,
      ..Config::default()
    });
    assert_eq!(engine.config().signature_tokens, 0);
    let content = "2024-01-15T10:00:00Z ERROR disk full\n2024-01-15T10:00:01Z ERROR auth failed\n";
    let entries = engine.parse_with_stats(content, now()).entries;
    let a = engine.analyze_at(&entries, now());
    let signatures: Vec<&str> = a.top_errors.iter().map(|p| p.signature.as_str()).collect();
    assert_eq!(signatures, vec!["auth", "disk"]);
  }

  #[test]
  fn query_pages_parsed_entries() {
    let engine = Engine::with_defaults();
    let entries = engine
      .parse_with_stats("2024-01-15T10:00:00Z INFO a\n2024-01-15T10:00:01Z ERROR b\n", now())
      .entries;
    let page = engine.query(&entries, &EntryQuery::default());
    assert_eq!(page.total, 2);
    assert_eq!(page.entries[0].message, "b");
  }

  #[test]
  fn analyze_at_is_deterministic() {
    let engine = Engine::with_defaults();
    let entries = engine.parse_with_stats("2024-01-15T10:00:00Z ERROR boom\n", now()).entries;
    let a = serde_json::to_string(&engine.analyze_at(&entries, now())).unwrap();
    let b = serde_json::to_string(&engine.analyze_at(&entries, now())).unwrap();
    assert_eq!(a, b);
  }
}
