//! Structured error types for the log engine.
//!
//! `EngineError` is surfaced at the boundary (CLI, config loading, custom
//! pattern tables). `LineError` describes why one line produced no entry; it
//! never escapes `parse`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("input too large: {size} bytes (limit {limit})")]
  InputTooLarge { size: u64, limit: u64 },

  #[error("config: {field}: {reason}")]
  Config { field: String, reason: String },

  #[error("pattern: {0}")]
  Pattern(#[from] regex::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("toml: {0}")]
  Toml(#[from] toml::de::Error),
}

impl EngineError {
  pub fn config(field: &str, reason: &str) -> Self {
    Self::Config {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }
}

/// Recoverable per-line failure. The line is dropped and counted.
#[derive(Debug, Error)]
pub enum LineError {
  #[error("malformed json: {0}")]
  MalformedJson(#[from] serde_json::Error),

  #[error("json line is not an object")]
  NotAnObject,

  #[error("unparseable timestamp: {0}")]
  UnparseableTimestamp(String),
}

impl LineError {
  /// True for failures of the JSON grammar itself.
  pub fn is_malformed(&self) -> bool {
    matches!(self, Self::MalformedJson(_) | Self::NotAnObject)
  }
}
