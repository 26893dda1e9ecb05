//! Format detection over a leading sample of lines.

use crate::formats::{FormatTable, LogFormat};

/// Classify the dominant format of `lines` (already stripped of blanks).
///
/// Lines outer, formats inner: the first sampled line that matches any
/// pattern decides, using the table's priority order for that line. Falls
/// back to [`LogFormat::Generic`] when nothing in the sample matches. The
/// sample always includes at least the first line.
pub fn detect_format(table: &FormatTable, lines: &[&str], sample: usize) -> LogFormat {
  lines
    .iter()
    .take(sample.max(1))
    .find_map(|line| {
      table
        .iter()
        .find(|spec| spec.pattern.is_match(line))
        .map(|spec| spec.format)
    })
    .unwrap_or(LogFormat::Generic)
}
