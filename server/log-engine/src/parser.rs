//! Line parser: detect once, extract every non-blank line, fold the results.
//!
//! - Detection runs on the first `sample_lines` non-blank lines.
//! - The detected format's extractor is applied to every line, in order.
//! - Per-line failures are counted and skipped; parsing never aborts.
//! - Large inputs are extracted on the rayon pool; `collect` keeps line order,
//!   so the output is identical to the sequential path.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::Config;
use crate::detect::detect_format;
use crate::error::LineError;
use crate::extract::{self, Extraction};
use crate::formats::{FormatSpec, FormatTable};
use crate::timestamp::TimestampNormalizer;
use crate::types::{ParseOutcome, ParseStats};

/// Parse `content` into ordered entries plus diagnostics.
pub fn parse(
  table: &FormatTable,
  config: &Config,
  content: &str,
  now: DateTime<Utc>,
) -> ParseOutcome {
  let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
  let format = detect_format(table, &lines, config.sample_lines);
  debug!(format = %format, lines = lines.len(), "detected log format");

  let spec = table.get(format);
  let stamps = TimestampNormalizer::new(now, config.timestamp_fallback);
  let extract_line = |(index, line): (usize, &&str)| extract_one(spec, &stamps, line, index);

  let results: Vec<Result<Extraction, LineError>> = if lines.len() >= config.parallel_threshold {
    lines.par_iter().enumerate().map(extract_line).collect()
  } else {
    lines.iter().enumerate().map(extract_line).collect()
  };

  let mut stats = ParseStats::new(format, lines.len());
  let mut entries = Vec::with_capacity(results.len());
  for (index, result) in results.into_iter().enumerate() {
    match result {
      Ok(Extraction::Entry(entry)) => {
        if entry.timestamp_inferred {
          stats.inferred_timestamps += 1;
        }
        entries.push(entry);
      }
      Ok(Extraction::NoMatch) => {
        trace!(line = index, "dropped: no match");
        stats.dropped += 1;
      }
      Err(err) => {
        trace!(line = index, error = %err, "dropped");
        stats.dropped += 1;
        if err.is_malformed() {
          stats.malformed += 1;
        }
        if matches!(err, LineError::UnparseableTimestamp(_)) {
          stats.rejected_timestamps += 1;
        }
      }
    }
  }
  stats.parsed = entries.len();

  debug!(
    parsed = stats.parsed,
    dropped = stats.dropped,
    inferred = stats.inferred_timestamps,
    "parse complete"
  );
  ParseOutcome { entries, stats }
}

/// A table without a spec for the detected format treats every line as free text.
fn extract_one(
  spec: Option<&FormatSpec>,
  stamps: &TimestampNormalizer,
  line: &str,
  index: usize,
) -> Result<Extraction, LineError> {
  match spec {
    Some(spec) => spec.extract(stamps, line, index),
    None => extract::unstructured(stamps, line, index),
  }
}
