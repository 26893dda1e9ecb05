//! The closed set of log formats and the pattern table that drives detection
//! and extraction.
//!
//! A [`FormatTable`] is an ordered list of `{format, pattern, extractor}`
//! specs. Order is detection priority. The standard table is compiled once;
//! callers may build their own (e.g. to tighten a pattern) and hand it to
//! [`crate::Engine::with_table`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, LineError};
use crate::extract::{self, Extraction};
use crate::timestamp::TimestampNormalizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
  Json,
  Apache,
  Nginx,
  Generic,
  Simple,
  Python,
}

impl LogFormat {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Json => "json",
      Self::Apache => "apache",
      Self::Nginx => "nginx",
      Self::Generic => "generic",
      Self::Simple => "simple",
      Self::Python => "python",
    }
  }

  /// The extractor that handles this format.
  pub fn extractor(self) -> Extractor {
    match self {
      Self::Json => extract::json,
      Self::Apache | Self::Nginx => extract::access,
      Self::Generic => extract::generic,
      Self::Simple => extract::simple,
      Self::Python => extract::python,
    }
  }
}

impl fmt::Display for LogFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Turns one line (with its ordinal) into an entry, a no-match, or a line error.
pub type Extractor =
  fn(&FormatSpec, &TimestampNormalizer, &str, usize) -> Result<Extraction, LineError>;

/// Built-in patterns, in detection priority order.
pub const STANDARD_PATTERNS: &[(LogFormat, &str)] = &[
  (LogFormat::Json, r"^\{.*\}$"),
  (
    LogFormat::Apache,
    r#"^(\S+) \S+ \S+ \[([^\]]+)\] "(\S+) ([^"]*)" (\d+) (\d+|-)"#,
  ),
  (
    LogFormat::Nginx,
    r#"^(\S+) - \S+ \[([^\]]+)\] "(\S+) ([^"]*)" (\d+) (\d+) "([^"]*)" "([^"]*)""#,
  ),
  (
    LogFormat::Generic,
    r"^(\d{4}-\d{2}-\d{2}[T\s]\d{2}:\d{2}:\d{2}[^\s]*)\s+\[?(\w+)\]?\s+(.+)$",
  ),
  (
    LogFormat::Simple,
    r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\s+(.+)$",
  ),
  (
    LogFormat::Python,
    r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}) - ([A-Za-z]+) - (.*)$",
  ),
];

static STANDARD: LazyLock<FormatTable> = LazyLock::new(|| {
  FormatTable::from_patterns(STANDARD_PATTERNS).expect("built-in log patterns must compile")
});

#[derive(Clone)]
pub struct FormatSpec {
  pub format: LogFormat,
  pub pattern: Regex,
  pub extractor: Extractor,
}

impl fmt::Debug for FormatSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FormatSpec")
      .field("format", &self.format)
      .field("pattern", &self.pattern.as_str())
      .finish_non_exhaustive()
  }
}

impl FormatSpec {
  pub fn new(format: LogFormat, pattern: &str) -> Result<Self, EngineError> {
    Ok(Self {
      format,
      pattern: Regex::new(pattern)?,
      extractor: format.extractor(),
    })
  }

  pub fn extract(
    &self,
    stamps: &TimestampNormalizer,
    line: &str,
    index: usize,
  ) -> Result<Extraction, LineError> {
    (self.extractor)(self, stamps, line, index)
  }
}

#[derive(Debug, Clone)]
pub struct FormatTable {
  specs: Vec<FormatSpec>,
}

impl FormatTable {
  /// Build a table from specs already in priority order. Later duplicates of
  /// a format are ignored.
  pub fn new(specs: Vec<FormatSpec>) -> Self {
    let mut unique: Vec<FormatSpec> = Vec::with_capacity(specs.len());
    for spec in specs {
      if !unique.iter().any(|s| s.format == spec.format) {
        unique.push(spec);
      }
    }
    Self { specs: unique }
  }

  pub fn from_patterns(patterns: &[(LogFormat, &str)]) -> Result<Self, EngineError> {
    let specs = patterns
      .iter()
      .map(|(format, pattern)| FormatSpec::new(*format, pattern))
      .collect::<Result<Vec<_>, EngineError>>()?;
    Ok(Self::new(specs))
  }

  /// The built-in table (compiled once, cloned cheaply).
  pub fn standard() -> Self {
    STANDARD.clone()
  }

  /// Replace one format's pattern, keeping its priority slot.
  pub fn with_pattern(mut self, format: LogFormat, pattern: &str) -> Result<Self, EngineError> {
    let spec = FormatSpec::new(format, pattern)?;
    match self.specs.iter_mut().find(|s| s.format == format) {
      Some(slot) => *slot = spec,
      None => self.specs.push(spec),
    }
    Ok(self)
  }

  pub fn get(&self, format: LogFormat) -> Option<&FormatSpec> {
    self.specs.iter().find(|s| s.format == format)
  }

  /// Specs in priority order.
  pub fn iter(&self) -> impl Iterator<Item = &FormatSpec> {
    self.specs.iter()
  }

  pub fn len(&self) -> usize {
    self.specs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.specs.is_empty()
  }
}

impl Default for FormatTable {
  fn default() -> Self {
    Self::standard()
  }
}
