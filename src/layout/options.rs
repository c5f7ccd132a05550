//! Layout options and configuration.

use serde::{Deserialize, Serialize};

use super::metrics::TextMetrics;
use crate::error::{Error, Result};
use crate::model::{Color, FontId, PageGeometry, DEFAULT_HEADER_MARKER};

/// Font sizes, spacing and colors used by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleTable {
    /// Title font size
    pub title_size: f32,

    /// Paragraph font size
    pub base_size: f32,

    /// Header size before depth is applied: `header_base - depth * header_step`
    pub header_base: f32,

    /// Size reduction per header level
    pub header_step: f32,

    /// Smallest header size
    pub min_header_size: f32,

    /// Extra space after every placed line
    pub line_gap: f32,

    /// Extra space after the title
    pub title_gap: f32,

    /// Character marking header lines
    pub header_marker: char,

    /// Text color
    pub color: Color,
}

impl StyleTable {
    /// Create the default style table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Font size for a header of the given depth.
    ///
    /// Strictly decreasing with depth until it reaches `min_header_size`.
    pub fn header_size(&self, depth: usize) -> f32 {
        let size = self.header_base - depth as f32 * self.header_step;
        size.max(self.min_header_size)
    }

    /// Set the paragraph font size.
    pub fn with_base_size(mut self, size: f32) -> Self {
        self.base_size = size;
        self
    }

    /// Set the title font size.
    pub fn with_title_size(mut self, size: f32) -> Self {
        self.title_size = size;
        self
    }

    /// Set the gap added after each line.
    pub fn with_line_gap(mut self, gap: f32) -> Self {
        self.line_gap = gap;
        self
    }

    /// Set the header marker character.
    pub fn with_header_marker(mut self, marker: char) -> Self {
        self.header_marker = marker;
        self
    }

    /// Set the text color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Largest font size any run can use.
    pub fn largest_size(&self) -> f32 {
        self.title_size
            .max(self.base_size)
            .max(self.header_size(1))
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            title_size: 24.0,
            base_size: 12.0,
            header_base: 26.0,
            header_step: 4.0,
            min_header_size: 12.0,
            line_gap: 5.0,
            title_gap: 20.0,
            header_marker: DEFAULT_HEADER_MARKER,
            color: Color::SLATE,
        }
    }
}

/// Options for laying out a book.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Page size and margin
    pub geometry: PageGeometry,

    /// Font sizes and spacing
    pub style: StyleTable,
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page geometry.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Use A4 pages.
    pub fn a4(mut self) -> Self {
        self.geometry = PageGeometry::a4().with_margin(self.geometry.margin);
        self
    }

    /// Use US Letter pages.
    pub fn letter(mut self) -> Self {
        self.geometry = PageGeometry::letter().with_margin(self.geometry.margin);
        self
    }

    /// Set the page margin.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.geometry.margin = margin;
        self
    }

    /// Set the style table.
    pub fn with_style(mut self, style: StyleTable) -> Self {
        self.style = style;
        self
    }

    /// Load options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Other(format!("Invalid layout options: {}", e)))
    }

    /// Check that the configuration can lay out at least one line per page.
    pub fn validate(&self, metrics: &dyn TextMetrics) -> Result<()> {
        self.geometry.validate()?;

        let style = &self.style;
        let sizes = [
            ("title_size", style.title_size),
            ("base_size", style.base_size),
            ("min_header_size", style.min_header_size),
        ];
        for (name, size) in sizes {
            if !size.is_finite() || size <= 0.0 {
                return Err(Error::InvalidGeometry(format!(
                    "{} must be positive, got {}",
                    name, size
                )));
            }
        }
        if !style.header_step.is_finite() || style.header_step < 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "header_step must not be negative, got {}",
                style.header_step
            )));
        }
        if style.line_gap < 0.0 || style.title_gap < 0.0 {
            return Err(Error::InvalidGeometry("gaps must not be negative".to_string()));
        }
        if style.header_marker.is_whitespace() {
            return Err(Error::InvalidGeometry(
                "header marker must not be whitespace".to_string(),
            ));
        }

        let tallest = FontId::all()
            .iter()
            .map(|&font| metrics.line_height(font, style.largest_size()))
            .fold(0.0f32, f32::max)
            + style.line_gap;
        if tallest > self.geometry.usable_height() {
            return Err(Error::InvalidGeometry(format!(
                "content height {} cannot fit a line {} tall",
                self.geometry.usable_height(),
                tallest
            )));
        }

        Ok(())
    }
}
