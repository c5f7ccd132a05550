//! Greedy word wrapping against a measured width.

use std::str::SplitWhitespace;

use super::metrics::TextMetrics;
use crate::model::FontId;

/// Wrap `text` into lines narrower than `max_width`.
///
/// Words are accumulated greedily: a word joins the current line while the
/// joined line measures strictly less than `max_width`. A single word that is
/// wider than `max_width` on its own becomes its own overflowing line.
///
/// The returned iterator is lazy and finite; call `wrap` again to restart.
///
/// # Example
///
/// ```
/// use bookbind::layout::{wrap, MonospaceMetrics};
/// use bookbind::FontId;
///
/// let metrics = MonospaceMetrics::new(1.0, 1.0);
/// let lines: Vec<String> = wrap("one two three", FontId::Regular, 1.0, 8.0, &metrics).collect();
/// assert_eq!(lines, vec!["one two", "three"]);
/// ```
pub fn wrap<'a, M: TextMetrics + ?Sized>(
    text: &'a str,
    font: FontId,
    size: f32,
    max_width: f32,
    metrics: &'a M,
) -> WrappedLines<'a, M> {
    WrappedLines {
        words: text.split_whitespace(),
        pending: None,
        font,
        size,
        max_width,
        metrics,
    }
}

/// Iterator over wrapped lines, produced by [`wrap`].
pub struct WrappedLines<'a, M: TextMetrics + ?Sized> {
    words: SplitWhitespace<'a>,
    /// Word that did not fit on the previous line.
    pending: Option<&'a str>,
    font: FontId,
    size: f32,
    max_width: f32,
    metrics: &'a M,
}

impl<'a, M: TextMetrics + ?Sized> Iterator for WrappedLines<'a, M> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let metrics = self.metrics;
        let (font, size, max_width) = (self.font, self.size, self.max_width);
        let mut line = String::new();

        if let Some(word) = self.pending.take() {
            line.push_str(word);
        }

        for word in self.words.by_ref() {
            if line.is_empty() {
                // First word always lands, even when it overflows.
                line.push_str(word);
                continue;
            }

            let mut candidate = String::with_capacity(line.len() + 1 + word.len());
            candidate.push_str(&line);
            candidate.push(' ');
            candidate.push_str(word);

            if metrics.text_width(&candidate, font, size) < max_width {
                line = candidate;
            } else {
                self.pending = Some(word);
                return Some(line);
            }
        }

        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}
