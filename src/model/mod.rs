//! Document model types for laid-out book content.
//!
//! This module defines the intermediate representation that bridges the
//! layout engine and the document serializers. Input flows strictly one
//! way: [`LogicalLine`] → [`StyledRun`] → [`Page`] → [`Document`].

mod document;
mod line;
mod page;

pub use document::{BookMetadata, Document, LayoutStats, PageGeometry, Plan};
pub use line::{
    count_chapters, header_depth, parse_body, strip_header, LogicalLine, DEFAULT_HEADER_MARKER,
};
pub use page::{Color, FontId, Page, RunKind, StyledRun};
