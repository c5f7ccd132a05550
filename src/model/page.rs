//! Page-level types.

use serde::{Deserialize, Serialize};

/// Font identity used by a run.
///
/// The layout engine only distinguishes the two faces it needs; the
/// serializer maps each to a concrete font resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontId {
    /// Body text face
    #[default]
    Regular,
    /// Title and header face
    Bold,
}

impl FontId {
    /// Resource name used inside page content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontId::Regular => "F1",
            FontId::Bold => "F2",
        }
    }

    /// All font identities, in resource order.
    pub fn all() -> [FontId; 2] {
        [FontId::Regular, FontId::Bold]
    }
}

/// RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a color, clamping each component into range.
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Plain black.
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Dark slate used for book text.
    pub const SLATE: Color = Color {
        r: 0.18,
        g: 0.23,
        b: 0.35,
    };
}

impl Default for Color {
    fn default() -> Self {
        Color::SLATE
    }
}

/// A placed, styled piece of text.
///
/// Coordinates are in points with the origin at the bottom-left corner of
/// the page; `y` is the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledRun {
    /// Text content
    pub text: String,

    /// Horizontal origin
    pub x: f32,

    /// Vertical origin (baseline)
    pub y: f32,

    /// Font face
    pub font: FontId,

    /// Font size in points
    pub size: f32,

    /// Fill color
    pub color: Color,

    /// What produced this run
    pub kind: RunKind,
}

/// The logical role of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// Document title
    Title,
    /// Header of the given depth
    Header(usize),
    /// One wrapped line of a paragraph
    Paragraph,
}

impl StyledRun {
    /// Check if the run is a header.
    pub fn is_header(&self) -> bool {
        matches!(self.kind, RunKind::Header(_))
    }

    /// Check if the run is a paragraph line.
    pub fn is_paragraph(&self) -> bool {
        self.kind == RunKind::Paragraph
    }
}

/// A single page of laid-out runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Runs in placement order
    pub runs: Vec<StyledRun>,
}

impl Page {
    /// Create an empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            runs: Vec::new(),
        }
    }

    /// Append a run.
    pub fn push(&mut self, run: StyledRun) {
        self.runs.push(run);
    }

    /// Check if the page holds no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of runs on the page.
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Text of the page, one run per line.
    pub fn plain_text(&self) -> String {
        self.runs
            .iter()
            .map(|run| run.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, kind: RunKind) -> StyledRun {
        StyledRun {
            text: text.to_string(),
            x: 50.0,
            y: 700.0,
            font: FontId::Regular,
            size: 12.0,
            color: Color::default(),
            kind,
        }
    }

    #[test]
    fn test_page_new() {
        let page = Page::new(1);
        assert_eq!(page.number, 1);
        assert!(page.is_empty());
    }

    #[test]
    fn test_page_plain_text() {
        let mut page = Page::new(1);
        page.push(run("Intro", RunKind::Header(1)));
        page.push(run("Hello world", RunKind::Paragraph));
        assert_eq!(page.plain_text(), "Intro\nHello world");
        assert_eq!(page.run_count(), 2);
    }

    #[test]
    fn test_run_kinds() {
        assert!(run("x", RunKind::Header(2)).is_header());
        assert!(run("x", RunKind::Paragraph).is_paragraph());
        assert!(!run("x", RunKind::Title).is_header());
    }

    #[test]
    fn test_color_clamped() {
        let c = Color::rgb(1.5, -0.2, 0.5);
        assert_eq!(c, Color { r: 1.0, g: 0.0, b: 0.5 });
    }

    #[test]
    fn test_font_resource_names() {
        assert_eq!(FontId::Regular.resource_name(), "F1");
        assert_eq!(FontId::Bold.resource_name(), "F2");
    }
}
