//! Aggregation over a parsed entry sequence.
//!
//! One pass tallies levels, hours, sources and error signatures; the rest of
//! [`LogAnalysis`] is derived from those tallies. Every map is ordered, so the
//! output depends only on the entries, the config and the analysis instant.

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike, Utc};

use crate::config::Config;
use crate::fingerprint;
use crate::insights;
use crate::types::*;

/// ERROR messages that share a signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureGroup {
  pub count: u64,
  /// First message seen with this signature.
  pub sample: String,
}

/// Raw counters gathered in the single pass over the entries.
#[derive(Debug, Default)]
pub(crate) struct Tally {
  pub total: u64,
  pub by_level: [u64; 5],
  pub timeline: BTreeMap<String, (u64, u64)>,
  pub hourly: [u64; 24],
  pub sources: BTreeMap<String, u64>,
  pub signatures: BTreeMap<String, SignatureGroup>,
}

impl Tally {
  fn collect(entries: &[LogEntry], config: &Config) -> Self {
    let mut tally = Self::default();
    for entry in entries {
      tally.total += 1;
      tally.by_level[level_slot(entry.level)] += 1;

      let hour = entry.timestamp.hour() as usize;
      tally.hourly[hour] += 1;

      let point = tally.timeline.entry(format!("{:02}:00", hour)).or_default();
      match entry.level {
        Level::Error => point.0 += 1,
        Level::Warn => point.1 += 1,
        _ => {}
      }

      let source = entry.source.as_deref().unwrap_or("unknown");
      *tally.sources.entry(source.to_string()).or_default() += 1;

      if entry.level == Level::Error {
        let signature = fingerprint::signature(&entry.message, config.signature_tokens);
        tally
          .signatures
          .entry(signature)
          .and_modify(|g| g.count += 1)
          .or_insert_with(|| SignatureGroup {
            count: 1,
            sample: entry.message.clone(),
          });
      }
    }
    tally
  }

  pub fn count(&self, level: Level) -> u64 {
    self.by_level[level_slot(level)]
  }

  pub fn error_rate(&self) -> f64 {
    if self.total == 0 {
      0.0
    } else {
      self.count(Level::Error) as f64 / self.total as f64 * 100.0
    }
  }
}

fn level_slot(level: Level) -> usize {
  match level {
    Level::Error => 0,
    Level::Warn => 1,
    Level::Info => 2,
    Level::Debug => 3,
    Level::Trace => 4,
  }
}

/// Compute the full summary for `entries` as of `now`.
pub fn analyze(entries: &[LogEntry], config: &Config, now: DateTime<Utc>) -> LogAnalysis {
  let tally = Tally::collect(entries, config);

  let timeline_data = tally
    .timeline
    .iter()
    .map(|(label, &(errors, warnings))| TimelinePoint {
      time: label.clone(),
      errors,
      warnings,
    })
    .collect();

  let hourly_distribution = tally
    .hourly
    .iter()
    .enumerate()
    .map(|(hour, &count)| HourBucket {
      hour: hour.to_string(),
      count,
    })
    .collect();

  let log_level_data = [Level::Error, Level::Warn, Level::Info, Level::Debug]
    .into_iter()
    .map(|level| LevelSlice {
      name: level,
      value: tally.count(level),
      color: level.color().to_string(),
    })
    .collect();

  LogAnalysis {
    total_entries: tally.total,
    error_count: tally.count(Level::Error),
    warning_count: tally.count(Level::Warn),
    info_count: tally.count(Level::Info),
    debug_count: tally.count(Level::Debug),
    trace_count: tally.count(Level::Trace),
    error_rate: tally.error_rate(),
    timeline_data,
    hourly_distribution,
    log_level_data,
    insights: insights::generate(entries, &tally, config, now),
    top_errors: top_errors(&tally.signatures, config.top_errors),
    source_distribution: source_distribution(&tally.sources),
  }
}

/// Most frequent signatures, count descending then signature ascending.
fn top_errors(signatures: &BTreeMap<String, SignatureGroup>, limit: usize) -> Vec<ErrorPattern> {
  let mut ranked: Vec<(&String, &SignatureGroup)> = signatures.iter().collect();
  // BTreeMap iteration is already signature-ascending; a stable sort keeps it.
  ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count));
  ranked
    .into_iter()
    .take(limit)
    .map(|(signature, group)| ErrorPattern {
      fingerprint: fingerprint::compute(signature),
      signature: signature.clone(),
      sample: group.sample.clone(),
      count: group.count,
    })
    .collect()
}

fn source_distribution(sources: &BTreeMap<String, u64>) -> Vec<SourceSlice> {
  let mut slices: Vec<SourceSlice> = sources
    .iter()
    .map(|(name, &value)| SourceSlice {
      name: name.clone(),
      value,
    })
    .collect();
  slices.sort_by(|a, b| b.value.cmp(&a.value));
  slices
}
