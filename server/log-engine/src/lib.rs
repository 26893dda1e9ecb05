//! Log ingestion engine: deterministic, rule-based.
//!
//! Takes an arbitrary block of server-log text, detects its format from a
//! leading sample, extracts one structured entry per line, and derives an
//! analytics summary (level counts, hour buckets, threshold insights).
//!
//! No DB, no network; pure computation over the input text.

pub mod analysis;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod formats;
mod insights;
pub mod level;
pub mod parser;
pub mod query;
pub mod timestamp;
pub mod types;

pub use config::{Config, TimestampFallback};
pub use engine::Engine;
pub use error::{EngineError, LineError};
pub use formats::{FormatTable, LogFormat};
pub use query::{EntryPage, EntryQuery, SortDirection, SortField};
pub use types::{Insight, Level, LogAnalysis, LogEntry, ParseOutcome, ParseStats, Report};

/// Parse `content` with the default configuration. Never fails; bad lines
/// are skipped.
pub fn parse(content: &str) -> Vec<LogEntry> {
  Engine::with_defaults().parse(content)
}

/// Analyze `entries` with the default configuration as of the current instant.
pub fn analyze(entries: &[LogEntry]) -> LogAnalysis {
  Engine::with_defaults().analyze(entries)
}
