//! Document-level types.

use super::{Page, RunKind};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed page size and margin, in points (1 point = 1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    /// Page width
    pub width: f32,

    /// Page height
    pub height: f32,

    /// Margin applied to all four edges
    pub margin: f32,
}

impl PageGeometry {
    /// Create a geometry with the given dimensions.
    pub fn new(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    /// A4 (210 x 297 mm) with a 50pt margin.
    pub fn a4() -> Self {
        Self::new(595.28, 841.89, 50.0)
    }

    /// US Letter (8.5 x 11 inches) with a 50pt margin.
    pub fn letter() -> Self {
        Self::new(612.0, 792.0, 50.0) // 8.5 * 72, 11 * 72
    }

    /// Replace the margin.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Width available to text.
    pub fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Height available to text.
    pub fn usable_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    /// Baseline of the first line on a fresh page.
    pub fn top(&self) -> f32 {
        self.height - self.margin
    }

    /// Check that the geometry describes a non-degenerate content box.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.width, self.height, self.margin]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "page size must be positive, got {} x {}",
                self.width, self.height
            )));
        }
        if self.margin < 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "margin must not be negative, got {}",
                self.margin
            )));
        }
        if self.usable_width() <= 0.0 || self.usable_height() <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "margin {} leaves no content area on a {} x {} page",
                self.margin, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// A laid-out document: frozen pages plus the geometry they were built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Title as placed on the first page (after fallback)
    pub title: String,

    /// Page geometry shared by every page
    pub geometry: PageGeometry,

    /// Pages in order
    pages: Vec<Page>,
}

impl Document {
    /// Freeze a list of pages into a document.
    pub fn new(title: impl Into<String>, geometry: PageGeometry, pages: Vec<Page>) -> Self {
        Self {
            title: title.into(),
            geometry,
            pages,
        }
    }

    /// Pages in order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        if page_num == 0 {
            return None;
        }
        self.pages.get((page_num - 1) as usize)
    }

    /// Check if the document has no runs at all.
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(Page::is_empty)
    }

    /// Iterate over every run with its page number.
    pub fn runs(&self) -> impl Iterator<Item = (u32, &super::StyledRun)> {
        self.pages
            .iter()
            .flat_map(|page| page.runs.iter().map(move |run| (page.number, run)))
    }

    /// Text of the whole document, pages separated by blank lines.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Collect layout statistics.
    pub fn stats(&self) -> LayoutStats {
        let mut stats = LayoutStats {
            page_count: self.page_count(),
            ..Default::default()
        };
        for (_, run) in self.runs() {
            stats.run_count += 1;
            match run.kind {
                RunKind::Title => stats.title_lines += 1,
                RunKind::Header(_) => stats.header_runs += 1,
                RunKind::Paragraph => stats.paragraph_lines += 1,
            }
        }
        stats
    }
}

/// Counts gathered from a laid-out document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutStats {
    /// Total number of pages
    pub page_count: u32,

    /// Total number of placed runs
    pub run_count: u32,

    /// Runs produced by the title
    pub title_lines: u32,

    /// Runs produced by headers
    pub header_runs: u32,

    /// Runs produced by wrapped paragraphs
    pub paragraph_lines: u32,
}

/// Subscription tier the book was generated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Creator,
}

impl Plan {
    /// Display name of the plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Pro => "Pro",
            Plan::Creator => "Creator",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "creator" => Ok(Plan::Creator),
            other => Err(Error::Other(format!("Unknown plan: {}", other))),
        }
    }
}

/// Flat metadata record shipped alongside the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Book title
    pub title: String,

    /// Author name
    pub author: Option<String>,

    /// Content language (e.g., "English")
    pub language: String,

    /// Plan the book was generated under
    pub plan: Plan,

    /// Number of chapters
    pub chapter_count: u32,

    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
}

impl BookMetadata {
    /// Create metadata with the current time and default fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            language: "English".to_string(),
            plan: Plan::default(),
            chapter_count: 0,
            generated_at: Utc::now(),
        }
    }

    /// Set the author. Blank names are treated as absent.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        self.author = if author.trim().is_empty() {
            None
        } else {
            Some(author)
        };
        self
    }

    /// Set the language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the plan.
    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = plan;
        self
    }

    /// Set the chapter count.
    pub fn with_chapter_count(mut self, count: u32) -> Self {
        self.chapter_count = count;
        self
    }

    /// Set the generation timestamp.
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    /// Render as `key: value` lines.
    ///
    /// Values are kept on a single line; embedded line breaks are escaped.
    pub fn to_key_value_text(&self) -> String {
        let mut lines = vec![format!("title: {}", escape_value(&self.title))];

        if let Some(ref author) = self.author {
            lines.push(format!("author: {}", escape_value(author)));
        }
        lines.push(format!("language: {}", escape_value(&self.language)));
        lines.push(format!("plan: {}", self.plan));
        lines.push(format!("chapter_count: {}", self.chapter_count));
        lines.push(format!("generated_at: {}", self.generated_at.to_rfc3339()));
        lines.push(String::new());

        lines.join("\n")
    }

    /// Render as a flat JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Escape line breaks so each value stays on one line.
fn escape_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}
