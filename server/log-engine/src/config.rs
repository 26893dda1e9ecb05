//! Engine configuration with sane defaults.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! sample_lines = 20
//! timestamp_fallback = "drop"
//! error_rate_threshold = 2.5
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;

/// Upper bound for `spike_window_minutes`: one year.
pub const MAX_SPIKE_WINDOW_MINUTES: i64 = 365 * 24 * 60;

/// What to do when a line carries no usable timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampFallback {
  /// Use the processing instant and flag the entry as inferred.
  #[default]
  Now,
  /// Reject the line.
  Drop,
}

/// Tunable thresholds for parsing and analysis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Non-blank leading lines inspected by format detection.
  pub sample_lines: usize,
  /// Policy for missing or unparseable timestamps.
  pub timestamp_fallback: TimestampFallback,
  /// Line count at which extraction switches to the rayon pool.
  pub parallel_threshold: usize,
  /// Error rate (percent) above which the high-error-rate insight fires.
  pub error_rate_threshold: f64,
  /// Trailing window, measured back from the analysis instant, for spike detection.
  pub spike_window_minutes: i64,
  /// Errors inside the window above which the spike insight fires.
  pub spike_min_errors: usize,
  /// Leading message tokens that form an error signature.
  pub signature_tokens: usize,
  /// Occurrences above which a signature counts as recurring.
  pub recurring_min_count: usize,
  /// Number of signatures reported in `topErrors`.
  pub top_errors: usize,
  /// Input cap enforced by the CLI before parsing.
  pub max_input_bytes: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      sample_lines: 10,
      timestamp_fallback: TimestampFallback::Now,
      parallel_threshold: 2048,
      error_rate_threshold: 5.0,
      spike_window_minutes: 60,
      spike_min_errors: 10,
      signature_tokens: 5,
      recurring_min_count: 3,
      top_errors: 5,
      max_input_bytes: 50 * 1024 * 1024,
    }
  }
}

impl Config {
  /// Parse a TOML document layered over the defaults.
  pub fn from_toml_str(raw: &str) -> Result<Self, EngineError> {
    let config: Config = toml::from_str(raw)?;
    config.validate()
  }

  /// Read and parse a TOML config file.
  pub fn load(path: &Path) -> Result<Self, EngineError> {
    let raw = std::fs::read_to_string(path)?;
    Self::from_toml_str(&raw)
  }

  /// Check ranges. TOML loading always runs this; configs built in code
  /// should too. Zero counts are clamped to 1 where they are used.
  pub fn validate(self) -> Result<Self, EngineError> {
    if self.sample_lines == 0 {
      return Err(EngineError::config("sample_lines", "must be at least 1"));
    }
    if self.signature_tokens == 0 {
      return Err(EngineError::config("signature_tokens", "must be at least 1"));
    }
    if !self.error_rate_threshold.is_finite() || self.error_rate_threshold < 0.0 {
      return Err(EngineError::config(
        "error_rate_threshold",
        "must be a non-negative percentage",
      ));
    }
    if self.spike_window_minutes <= 0 || self.spike_window_minutes > MAX_SPIKE_WINDOW_MINUTES {
      return Err(EngineError::config(
        "spike_window_minutes",
        "must be between 1 and 525600 (one year)",
      ));
    }
    Ok(self)
  }
}
