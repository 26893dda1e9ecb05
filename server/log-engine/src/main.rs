//! Binary entrypoint: read a log file (or stdin), write one JSON report to stdout.
//!
//! The report is `{stats, analysis, entries?}`. Entries are only included
//! when `--entries` or one of the filter flags is given, and are paginated.
//! Diagnostics go to stderr, filtered by `LOG_ENGINE_LOG` (default `warn`).

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Parser;
use log_engine::{Config, Engine, EngineError, EntryQuery, Level, SortDirection, SortField};
use tracing::debug;

#[derive(Parser)]
#[command(name = "log-engine", about = "Parse and analyze server logs")]
struct Cli {
  /// Log file to read. Reads stdin when omitted.
  path: Option<PathBuf>,

  /// TOML config layered over the defaults.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Include a page of parsed entries in the report.
  #[arg(long)]
  entries: bool,

  /// Only entries at this level (ERROR, WARN, INFO, DEBUG, TRACE).
  #[arg(long)]
  level: Option<Level>,

  /// Only entries whose message contains this text (case-insensitive).
  #[arg(long)]
  search: Option<String>,

  /// Only entries from this source.
  #[arg(long)]
  source: Option<String>,

  /// Only entries at or after this RFC 3339 instant.
  #[arg(long)]
  since: Option<DateTime<Utc>>,

  /// Only entries at or before this RFC 3339 instant.
  #[arg(long)]
  until: Option<DateTime<Utc>>,

  /// Sort field: timestamp, level, message or source.
  #[arg(long, default_value_t = SortField::Timestamp)]
  sort: SortField,

  /// Sort ascending instead of newest first.
  #[arg(long)]
  asc: bool,

  #[arg(long, default_value_t = 1)]
  page: usize,

  #[arg(long, default_value_t = 20)]
  per_page: usize,

  /// Pretty-print the JSON report.
  #[arg(long)]
  pretty: bool,
}

impl Cli {
  fn entry_query(&self) -> Option<EntryQuery> {
    let filtered = self.level.is_some()
      || self.search.is_some()
      || self.source.is_some()
      || self.since.is_some()
      || self.until.is_some();
    if !self.entries && !filtered {
      return None;
    }
    Some(EntryQuery {
      level: self.level,
      keyword: self.search.clone(),
      source: self.source.clone(),
      start: self.since,
      end: self.until,
      sort_by: self.sort,
      sort_dir: if self.asc { SortDirection::Asc } else { SortDirection::Desc },
      page: self.page,
      per_page: self.per_page,
    })
  }
}

fn main() {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_ansi(false)
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_env("LOG_ENGINE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    )
    .init();

  if let Err(e) = run(&cli) {
    let _ = writeln!(io::stderr(), "log-engine: {}", e);
    std::process::exit(1);
  }
}

fn run(cli: &Cli) -> Result<(), EngineError> {
  let config = match &cli.config {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };
  let limit = config.max_input_bytes;

  let content = match &cli.path {
    Some(path) => read_file(path, limit)?,
    None => read_capped(io::stdin().lock(), limit)?,
  };
  debug!(bytes = content.len(), "input read");

  let engine = Engine::new(config);
  let report = engine.report(&content, cli.entry_query().as_ref(), Utc::now());

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  if cli.pretty {
    serde_json::to_writer_pretty(&mut out, &report)?;
  } else {
    serde_json::to_writer(&mut out, &report)?;
  }
  writeln!(out)?;
  out.flush()?;
  Ok(())
}

fn read_file(path: &Path, limit: u64) -> Result<String, EngineError> {
  let size = std::fs::metadata(path)?.len();
  if size > limit {
    return Err(EngineError::InputTooLarge { size, limit });
  }
  read_capped(File::open(path)?, limit)
}

/// Read at most `limit` bytes; one byte more means the input is too large.
/// Invalid UTF-8 is replaced rather than rejected.
fn read_capped<R: Read>(reader: R, limit: u64) -> Result<String, EngineError> {
  let mut buf = Vec::new();
  reader.take(limit.saturating_add(1)).read_to_end(&mut buf)?;
  let size = buf.len() as u64;
  if size > limit {
    return Err(EngineError::InputTooLarge { size, limit });
  }
  Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn input_at_the_limit_is_accepted() {
    let content = read_capped(&b"0123456789"[..], 10).unwrap();
    assert_eq!(content, "0123456789");
  }

  #[test]
  fn one_byte_over_the_limit_is_rejected() {
    let err = read_capped(&b"0123456789A"[..], 10).unwrap_err();
    assert!(matches!(err, EngineError::InputTooLarge { size: 11, limit: 10 }));
  }

  #[test]
  fn invalid_utf8_is_replaced() {
    let content = read_capped(&b"ok \xff\xfe line"[..], 64).unwrap();
    assert_eq!(content, "ok \u{fffd}\u{fffd} line");
  }

  #[test]
  fn oversized_file_rejected_from_metadata() {
    let path = std::env::temp_dir().join(format!("log-engine-cap-{}.log", std::process::id()));
    std::fs::write(&path, "x".repeat(32)).unwrap();
    let result = read_file(&path, 16);
    let fits = read_file(&path, 32);
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(EngineError::InputTooLarge { size: 32, limit: 16 })));
    assert_eq!(fits.unwrap().len(), 32);
  }

  #[test]
  fn filter_flags_imply_an_entry_page() {
    let cli = Cli::parse_from(["log-engine", "--level", "error"]);
    let q = cli.entry_query().unwrap();
    assert_eq!(q.level, Some(Level::Error));
    assert_eq!(q.sort_dir, SortDirection::Desc);
    assert!(Cli::parse_from(["log-engine"]).entry_query().is_none());
  }
}
