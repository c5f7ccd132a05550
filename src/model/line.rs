//! Logical lines of the input body.

use serde::{Deserialize, Serialize};

/// Default character used to mark header lines (`# Title`, `## Section`).
pub const DEFAULT_HEADER_MARKER: char = '#';

/// One line of body text, classified once at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalLine {
    /// Raw text as it appeared in the body
    pub raw: String,

    /// Header depth (0 = paragraph or blank, 1.. = header level)
    pub depth: usize,

    /// Whether the line contains only whitespace
    pub blank: bool,
}

impl LogicalLine {
    /// Classify a single raw line.
    pub fn parse(raw: &str, marker: char) -> Self {
        let blank = raw.trim().is_empty();
        let depth = if blank { 0 } else { header_depth(raw, marker) };
        Self {
            raw: raw.to_string(),
            depth,
            blank,
        }
    }

    /// Check if this line is a header.
    pub fn is_header(&self) -> bool {
        self.depth > 0
    }

    /// Check if this line is a plain paragraph.
    pub fn is_paragraph(&self) -> bool {
        !self.blank && self.depth == 0
    }

    /// Text to display for this line.
    ///
    /// For headers the marker run and surrounding whitespace are removed;
    /// paragraphs are returned trimmed.
    pub fn display_text(&self, marker: char) -> &str {
        if self.depth > 0 {
            strip_header(&self.raw, marker)
        } else {
            self.raw.trim()
        }
    }
}

/// Split a body into logical lines.
///
/// Accepts `\n` and `\r\n` line endings. The body is split exactly once;
/// every line (including blank ones) yields one [`LogicalLine`].
pub fn parse_body(body: &str, marker: char) -> Vec<LogicalLine> {
    if body.is_empty() {
        return Vec::new();
    }
    body.lines()
        .map(|line| LogicalLine::parse(line, marker))
        .collect()
}

/// Count the contiguous run of `marker` at the start of `line`.
///
/// Only a run starting at the first character counts: an indented marker
/// or one appearing later in the line yields 0.
pub fn header_depth(line: &str, marker: char) -> usize {
    line.chars().take_while(|&c| c == marker).count()
}

/// Remove the leading marker run and surrounding whitespace.
///
/// Any further markers directly following the stripped whitespace are
/// removed as well, so `header_depth(strip_header(x)) == 0` always holds.
pub fn strip_header(line: &str, marker: char) -> &str {
    line.trim_start_matches(|c: char| c == marker || c.is_whitespace())
        .trim_end()
}

/// Count top-level (depth 1) headers in a body.
pub fn count_chapters(body: &str, marker: char) -> usize {
    parse_body(body, marker)
        .iter()
        .filter(|line| line.depth == 1 && !line.display_text(marker).is_empty())
        .count()
}
