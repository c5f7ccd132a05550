//! Document serializers: turning a laid-out [`Document`] into file bytes.
//!
//! Serializers make no layout decisions of their own. Every backend gets the
//! same frozen pages and only chooses how to encode them. PDF is the default
//! backend; other backends plug in through [`DocumentSerializer`].
//!
//! # Example
//!
//! ```
//! use bookbind::layout::LayoutEngine;
//! use bookbind::serialize::{DocumentSerializer, PdfSerializer};
//!
//! let doc = LayoutEngine::default().layout("Notes", "First line.")?;
//! let bytes = PdfSerializer::new().serialize(&doc)?;
//! assert!(bytes.starts_with(b"%PDF"));
//! # Ok::<(), bookbind::Error>(())
//! ```

mod fonts;
mod pdf;

pub use fonts::{encode_win_ansi, is_win_ansi, FontSet, STANDARD_FONTS};
pub use pdf::{PdfOptions, PdfSerializer};

use crate::error::Result;
use crate::model::Document;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for document serializers.
///
/// Implement this trait to add another paginated output format.
pub trait DocumentSerializer: Send + Sync {
    /// Name of this serializer.
    fn name(&self) -> &str;

    /// File extension of the output, lowercase without the dot.
    fn extension(&self) -> &str;

    /// MIME type of the output.
    fn mime_type(&self) -> &'static str;

    /// Encode the document. Must be deterministic for a given input.
    fn serialize(&self, doc: &Document) -> Result<Vec<u8>>;
}

impl<S: DocumentSerializer + ?Sized> DocumentSerializer for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }

    fn mime_type(&self) -> &'static str {
        (**self).mime_type()
    }

    fn serialize(&self, doc: &Document) -> Result<Vec<u8>> {
        (**self).serialize(doc)
    }
}

/// Registry of serializers keyed by output extension.
pub struct SerializerRegistry {
    by_extension: HashMap<String, Arc<dyn DocumentSerializer>>,
}

impl SerializerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Create a registry with the PDF serializer registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfSerializer::new()));
        registry
    }

    /// Register a serializer under its extension, replacing any previous one.
    pub fn register(&mut self, serializer: Arc<dyn DocumentSerializer>) {
        self.by_extension
            .insert(serializer.extension().to_lowercase(), serializer);
    }

    /// Get a serializer by extension.
    pub fn get(&self, ext: &str) -> Option<Arc<dyn DocumentSerializer>> {
        self.by_extension.get(&ext.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.by_extension.contains_key(&ext.to_lowercase())
    }

    /// All registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_defaults() {
        let registry = SerializerRegistry::with_defaults();
        assert!(registry.supports("pdf"));
        assert!(registry.supports("PDF"));
        assert!(!registry.supports("epub"));
        assert_eq!(registry.extensions(), vec!["pdf"]);
    }

    #[test]
    fn test_registry_get() {
        let registry = SerializerRegistry::with_defaults();
        let serializer = registry.get("pdf").unwrap();
        assert_eq!(serializer.name(), "pdf");
        assert_eq!(serializer.mime_type(), "application/pdf");
    }

    #[test]
    fn test_empty_registry() {
        let registry = SerializerRegistry::new();
        assert!(registry.get("pdf").is_none());
    }
}
