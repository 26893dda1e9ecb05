//! Threshold rules that turn aggregate tallies into findings.
//!
//! Rules are evaluated independently and every rule that fires contributes
//! one insight, in rule order:
//! 1. error rate above `error_rate_threshold` (high)
//! 2. more than `spike_min_errors` ERROR entries in the trailing window (medium)
//! 3. signatures repeating more than `recurring_min_count` times (medium)

use chrono::{DateTime, Duration, Utc};

use crate::analysis::Tally;
use crate::config::Config;
use crate::types::{Insight, InsightKind, InsightSeverity, Level, LogEntry};

pub(crate) fn generate(
  entries: &[LogEntry],
  tally: &Tally,
  config: &Config,
  now: DateTime<Utc>,
) -> Vec<Insight> {
  let mut insights = Vec::new();

  let error_rate = tally.error_rate();
  if error_rate > config.error_rate_threshold {
    insights.push(Insight {
      id: 1,
      kind: InsightKind::Error,
      title: "High Error Rate Detected".to_string(),
      description: format!(
        "Error rate is {:.1}%, which is above the recommended {}% threshold.",
        error_rate, config.error_rate_threshold
      ),
      severity: InsightSeverity::High,
      timestamp: now,
    });
  }

  let recent = recent_errors(entries, now, config.spike_window_minutes);
  if recent > config.spike_min_errors {
    insights.push(Insight {
      id: 2,
      kind: InsightKind::Pattern,
      title: "Error Spike Detected".to_string(),
      description: format!(
        "{} errors detected in the {}, indicating a potential issue.",
        recent,
        window_phrase(config.spike_window_minutes)
      ),
      severity: InsightSeverity::Medium,
      timestamp: now,
    });
  }

  let recurring = tally
    .signatures
    .values()
    .filter(|g| g.count > config.recurring_min_count as u64)
    .count();
  if recurring > 0 {
    insights.push(Insight {
      id: 3,
      kind: InsightKind::Pattern,
      title: "Recurring Error Pattern".to_string(),
      description: format!(
        "Found {} error patterns that repeat multiple times. Consider investigating root causes.",
        recurring
      ),
      severity: InsightSeverity::Medium,
      timestamp: now,
    });
  }

  insights
}

/// ERROR entries strictly after `now - window`. Future-dated entries count.
/// A window that does not fit the calendar counts nothing.
fn recent_errors(entries: &[LogEntry], now: DateTime<Utc>, window_minutes: i64) -> usize {
  let Some(cutoff) = Duration::try_minutes(window_minutes).and_then(|w| now.checked_sub_signed(w))
  else {
    return 0;
  };
  entries
    .iter()
    .filter(|e| e.level == Level::Error && e.timestamp > cutoff)
    .count()
}

fn window_phrase(minutes: i64) -> String {
  match minutes {
    60 => "last hour".to_string(),
    m if m > 0 && m % 60 == 0 => format!("last {} hours", m / 60),
    m => format!("last {} minutes", m),
  }
}
