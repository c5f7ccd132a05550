//! Page layout for book text.
//!
//! The engine turns a title and a body into a frozen [`Document`]:
//!
//! 1. The title is placed in the bold face at the title size, followed by a gap.
//! 2. Each body line is classified as header, blank or paragraph.
//! 3. Headers are placed in the bold face at a depth-dependent size, blank
//!    lines consume vertical space, paragraphs are word-wrapped.
//! 4. Every placed line goes through the page-break check first.
//!
//! # Example
//!
//! ```
//! use bookbind::layout::{LayoutEngine, LayoutOptions};
//!
//! let engine = LayoutEngine::new(LayoutOptions::default());
//! let doc = engine.layout("Roman History", "# Intro\nRome was not built in a day.")?;
//! assert_eq!(doc.page_count(), 1);
//! # Ok::<(), bookbind::Error>(())
//! ```

mod cursor;
mod metrics;
mod options;
mod wrap;

pub use cursor::PageCursor;
pub use metrics::{MonospaceMetrics, StandardMetrics, TextMetrics};
pub use options::{LayoutOptions, StyleTable};
pub use wrap::{wrap, WrappedLines};

use crate::error::Result;
use crate::model::{
    parse_body, Color, Document, FontId, LogicalLine, Page, PageGeometry, RunKind, StyledRun,
};

/// Lays out books onto fixed-size pages.
///
/// Holds no state between calls; a single engine can serve concurrent
/// layouts.
#[derive(Debug, Clone)]
pub struct LayoutEngine<M = StandardMetrics> {
    metrics: M,
    options: LayoutOptions,
}

impl LayoutEngine<StandardMetrics> {
    /// Create an engine measuring with the standard Times metrics.
    pub fn new(options: LayoutOptions) -> Self {
        Self::with_metrics(StandardMetrics, options)
    }
}

impl Default for LayoutEngine<StandardMetrics> {
    fn default() -> Self {
        Self::new(LayoutOptions::default())
    }
}

impl<M: TextMetrics> LayoutEngine<M> {
    /// Create an engine with custom metrics.
    pub fn with_metrics(metrics: M, options: LayoutOptions) -> Self {
        Self { metrics, options }
    }

    /// Layout options in use.
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Metrics provider in use.
    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Lay out `title` and `body` into pages.
    ///
    /// Fails only when the options cannot fit a single line on a page.
    pub fn layout(&self, title: &str, body: &str) -> Result<Document> {
        self.options.validate(&self.metrics)?;

        let style = &self.options.style;
        let marker = style.header_marker;
        let lines = parse_body(body, marker);

        let mut sink = PageSink::new(self.options.geometry, style.line_gap, style.color);

        let title = resolve_title(title, &lines, marker);
        if !title.is_empty() {
            self.place(&mut sink, &title, FontId::Bold, style.title_size, RunKind::Title);
        }
        sink.cursor.skip(style.title_gap);

        for line in &lines {
            if line.blank {
                sink.cursor.skip(style.base_size);
                continue;
            }

            let text = line.display_text(marker);
            let placed = if line.is_header() {
                let size = style.header_size(line.depth);
                self.place(&mut sink, text, FontId::Bold, size, RunKind::Header(line.depth))
            } else {
                self.place(&mut sink, text, FontId::Regular, style.base_size, RunKind::Paragraph)
            };

            if placed == 0 {
                sink.cursor.skip(style.base_size);
            }
        }

        let doc = sink.finish(title, self.options.geometry);
        log::debug!(
            "laid out {} logical lines onto {} pages",
            lines.len(),
            doc.page_count()
        );
        Ok(doc)
    }

    /// Place `text` as one or more runs. Returns the number of runs placed.
    ///
    /// Text that fits the usable width is a single run. Titles and headers
    /// wider than the page are wrapped at their own size rather than left to
    /// overflow, so every multi-word run stays within the usable width.
    fn place(
        &self,
        sink: &mut PageSink,
        text: &str,
        font: FontId,
        size: f32,
        kind: RunKind,
    ) -> usize {
        let geometry = self.options.geometry;
        let max_width = geometry.usable_width();
        let height = self.metrics.line_height(font, size);

        let text = text.trim();
        if text.is_empty() {
            return 0;
        }

        if kind != RunKind::Paragraph && self.metrics.text_width(text, font, size) <= max_width {
            sink.push(text.to_string(), font, size, kind, height);
            return 1;
        }

        let mut count = 0;
        for line in wrap(text, font, size, max_width, &self.metrics) {
            sink.push(line, font, size, kind, height);
            count += 1;
        }
        count
    }
}

/// Pick the title to place: the given one, or the first non-blank body line.
fn resolve_title(title: &str, lines: &[LogicalLine], marker: char) -> String {
    let title = title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    lines
        .iter()
        .filter(|line| !line.blank)
        .map(|line| line.display_text(marker))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Append-only page list driven by a [`PageCursor`].
struct PageSink {
    cursor: PageCursor,
    pages: Vec<Page>,
    margin: f32,
    line_gap: f32,
    color: Color,
}

impl PageSink {
    fn new(geometry: PageGeometry, line_gap: f32, color: Color) -> Self {
        Self {
            cursor: PageCursor::new(geometry),
            pages: Vec::new(),
            margin: geometry.margin,
            line_gap,
            color,
        }
    }

    fn push(&mut self, text: String, font: FontId, size: f32, kind: RunKind, height: f32) {
        let (index, y) = self.cursor.advance(height, self.line_gap);
        while self.pages.len() <= index {
            let number = self.pages.len() as u32 + 1;
            self.pages.push(Page::new(number));
        }
        self.pages[index].push(StyledRun {
            text,
            x: self.margin,
            y,
            font,
            size,
            color: self.color,
            kind,
        });
    }

    fn finish(mut self, title: String, geometry: PageGeometry) -> Document {
        if self.pages.is_empty() {
            // A document always has at least one page, even if blank.
            self.pages.push(Page::new(1));
        }
        Document::new(title, geometry, self.pages)
    }
}
