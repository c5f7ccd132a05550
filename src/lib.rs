//! # bookbind
//!
//! Page layout and archive bundling for generated books.
//!
//! This library lays out a title and a `#`-structured body onto fixed-size
//! pages, serializes the pages as PDF, and bundles the plain text, the PDF
//! and a metadata record into a single zip archive.
//!
//! ## Quick Start
//!
//! ```
//! use bookbind::{pack, paginate};
//!
//! fn main() -> bookbind::Result<()> {
//!     let body = "# Intro\nRome was not built in a day.";
//!
//!     // Lay out pages
//!     let doc = paginate("Roman History", body)?;
//!     println!("Pages: {}", doc.page_count());
//!
//!     // Build the download archive
//!     let bundle = pack("Roman History", body)?;
//!     println!("{}: {} bytes", bundle.archive_name, bundle.bytes.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Deterministic layout**: text measurement is a pure function, no renderer needed
//! - **Greedy word wrap**: long words overflow instead of looping
//! - **Standard PDF fonts**: Times faces with WinAnsi encoding, no embedding
//! - **Graceful bundling**: a failed PDF becomes an `ERROR.txt` note, the archive still ships
//! - **Parallel entries**: archive entries are produced on the rayon pool

pub mod archive;
pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod serialize;

// Re-export commonly used types
pub use archive::{sanitize, Archive, ArchiveBuilder, ArchiveEntry, EntryOutcome, FileNamer};
pub use error::{Error, Result};
pub use export::{
    export, export_as, export_pdf, export_text, export_with, ExportBundle, ExportOptions,
    ExportRequest, MetadataFormat, NamedArtifact,
};
pub use layout::{LayoutEngine, LayoutOptions, StandardMetrics, StyleTable, TextMetrics};
pub use model::{
    BookMetadata, Color, Document, FontId, LayoutStats, Page, PageGeometry, Plan, RunKind,
    StyledRun,
};
pub use serialize::{DocumentSerializer, FontSet, PdfOptions, PdfSerializer, SerializerRegistry};

use chrono::NaiveDate;

/// Lay out a book with default options.
///
/// # Example
///
/// ```
/// use bookbind::paginate;
///
/// let doc = paginate("Notes", "First line.\n\nSecond paragraph.").unwrap();
/// assert_eq!(doc.page_count(), 1);
/// ```
pub fn paginate(title: &str, body: &str) -> Result<Document> {
    LayoutEngine::default().layout(title, body)
}

/// Lay out a book with custom options.
///
/// # Example
///
/// ```
/// use bookbind::{paginate_with, LayoutOptions};
///
/// let options = LayoutOptions::new().letter().with_margin(72.0);
/// let doc = paginate_with("Notes", "First line.", options).unwrap();
/// assert_eq!(doc.geometry.width, 612.0);
/// ```
pub fn paginate_with(title: &str, body: &str, options: LayoutOptions) -> Result<Document> {
    LayoutEngine::new(options).layout(title, body)
}

/// Lay out a book and serialize it as PDF with default options.
///
/// # Example
///
/// ```
/// use bookbind::to_pdf;
///
/// let bytes = to_pdf("Notes", "First line.").unwrap();
/// assert!(bytes.starts_with(b"%PDF"));
/// ```
pub fn to_pdf(title: &str, body: &str) -> Result<Vec<u8>> {
    let doc = paginate(title, body)?;
    PdfSerializer::new().serialize(&doc)
}

/// Build the full download archive with default options.
pub fn pack(title: &str, body: &str) -> Result<ExportBundle> {
    export(&ExportRequest::new(title, body), &ExportOptions::default())
}

/// Builder-style API for configuring exports.
///
/// # Example
///
/// ```
/// use bookbind::Bookbind;
///
/// let bundle = Bookbind::new()
///     .letter()
///     .with_margin(72.0)
///     .with_product_tag("Press")
///     .pack("Roman History", "# Intro\nRome was not built in a day.")?;
/// assert!(bundle.archive_name.starts_with("Press_roman_history_"));
/// # Ok::<(), bookbind::Error>(())
/// ```
pub struct Bookbind {
    options: ExportOptions,
}

impl Bookbind {
    /// Create a new Bookbind builder.
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    /// Use A4 pages.
    pub fn a4(mut self) -> Self {
        self.options.layout = self.options.layout.a4();
        self
    }

    /// Use US Letter pages.
    pub fn letter(mut self) -> Self {
        self.options.layout = self.options.layout.letter();
        self
    }

    /// Set the page margin in points.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.options.layout = self.options.layout.with_margin(margin);
        self
    }

    /// Set the style table.
    pub fn with_style(mut self, style: StyleTable) -> Self {
        self.options.layout = self.options.layout.with_style(style);
        self
    }

    /// Replace all layout options.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.options.layout = layout;
        self
    }

    /// Set the PDF base fonts.
    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.options.pdf = self.options.pdf.with_fonts(fonts);
        self
    }

    /// Leave PDF content streams uncompressed.
    pub fn uncompressed(mut self) -> Self {
        self.options.pdf = self.options.pdf.with_compression(false);
        self
    }

    /// Set the archive product tag.
    pub fn with_product_tag(mut self, tag: impl Into<String>) -> Self {
        self.options = self.options.with_product_tag(tag);
        self
    }

    /// Stamp file names with a fixed date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.options = self.options.with_date(date);
        self
    }

    /// Write the metadata record as JSON.
    pub fn json_metadata(mut self) -> Self {
        self.options = self.options.with_metadata_format(MetadataFormat::Json);
        self
    }

    /// Disable parallel entry production.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Export options in use.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Lay out a book.
    pub fn paginate(&self, title: &str, body: &str) -> Result<Document> {
        paginate_with(title, body, self.options.layout.clone())
    }

    /// Build the full download archive.
    pub fn pack(&self, title: &str, body: &str) -> Result<ExportBundle> {
        self.pack_request(&ExportRequest::new(title, body))
    }

    /// Build the full download archive from a prepared request.
    pub fn pack_request(&self, request: &ExportRequest) -> Result<ExportBundle> {
        export(request, &self.options)
    }

    /// Produce the PDF artifact alone.
    pub fn pdf(&self, request: &ExportRequest) -> Result<NamedArtifact> {
        export_pdf(request, &self.options)
    }

    /// Produce the plain-text artifact alone.
    pub fn text(&self, request: &ExportRequest) -> Result<NamedArtifact> {
        export_text(request, &self.options)
    }
}

impl Default for Bookbind {
    fn default() -> Self {
        Self::new()
    }
}
