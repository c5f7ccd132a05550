//! The export pipeline: one book in, named artifacts out.
//!
//! [`export`] produces the full archive. The plain-text copy and the metadata
//! record are required entries; the paginated document and the cover image
//! are optional and degrade to a diagnostic note when they fail.
//! [`export_pdf`] and [`export_text`] produce single artifacts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::archive::{Archive, ArchiveBuilder, EntryFailure, FileNamer, DEFAULT_PRODUCT_TAG};
use crate::error::{Error, Result};
use crate::layout::{LayoutEngine, LayoutOptions, StandardMetrics};
use crate::model::{count_chapters, BookMetadata, Document, DEFAULT_HEADER_MARKER};
use crate::serialize::{DocumentSerializer, PdfOptions, PdfSerializer, SerializerRegistry};

/// MIME type of the plain-text artifact.
pub const TEXT_MIME: &str = "text/plain; charset=utf-8";

/// MIME type of the archive.
pub const ZIP_MIME: &str = "application/zip";

/// Everything needed to export one book.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Book title
    pub title: String,

    /// Book body, newline-delimited with `#` headers
    pub body: String,

    /// Metadata record
    pub metadata: BookMetadata,

    /// Optional cover image (PNG or JPEG)
    pub cover: Option<Vec<u8>>,
}

impl ExportRequest {
    /// Create a request with metadata derived from the title and body.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let title = title.into();
        let body = body.into();
        let chapters = count_chapters(&body, DEFAULT_HEADER_MARKER);
        let metadata = BookMetadata::new(title.clone())
            .with_chapter_count(u32::try_from(chapters).unwrap_or(u32::MAX));
        Self {
            title,
            body,
            metadata,
            cover: None,
        }
    }

    /// Replace the metadata record.
    pub fn with_metadata(mut self, metadata: BookMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach a cover image.
    pub fn with_cover(mut self, cover: Vec<u8>) -> Self {
        self.cover = Some(cover);
        self
    }
}

/// The body as UTF-8 bytes; an empty body has no plain-text copy.
fn plain_text(body: &str) -> Result<Vec<u8>> {
    if body.trim().is_empty() {
        return Err(Error::EmptyBody);
    }
    Ok(body.as_bytes().to_vec())
}

/// How the metadata record is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFormat {
    /// `key: value` lines
    #[default]
    KeyValue,
    /// Flat JSON object
    Json,
}

impl MetadataFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            MetadataFormat::KeyValue => "txt",
            MetadataFormat::Json => "json",
        }
    }

    /// Render `metadata` in this format.
    pub fn render(&self, metadata: &BookMetadata) -> Result<String> {
        match self {
            MetadataFormat::KeyValue => Ok(metadata.to_key_value_text()),
            MetadataFormat::Json => metadata.to_json(),
        }
    }
}

/// Options for the export pipeline.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Page geometry and styles
    pub layout: LayoutOptions,

    /// PDF backend options
    pub pdf: PdfOptions,

    /// Prefix of the archive name
    pub product_tag: String,

    /// Date stamp for file names (today when unset)
    pub date: Option<NaiveDate>,

    /// Metadata rendering
    pub metadata_format: MetadataFormat,

    /// Produce archive entries in parallel
    pub parallel: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            pdf: PdfOptions::default(),
            product_tag: DEFAULT_PRODUCT_TAG.to_string(),
            date: None,
            metadata_format: MetadataFormat::default(),
            parallel: true,
        }
    }
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set layout options.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Set PDF options.
    pub fn with_pdf(mut self, pdf: PdfOptions) -> Self {
        self.pdf = pdf;
        self
    }

    /// Set the archive product tag.
    pub fn with_product_tag(mut self, tag: impl Into<String>) -> Self {
        self.product_tag = tag.into();
        self
    }

    /// Stamp file names with a fixed date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the metadata format.
    pub fn with_metadata_format(mut self, format: MetadataFormat) -> Self {
        self.metadata_format = format;
        self
    }

    /// Produce entries sequentially.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// File namer for `title`.
    pub fn namer(&self, title: &str) -> FileNamer {
        let namer = match self.date {
            Some(date) => FileNamer::new(title, date),
            None => FileNamer::today(title),
        };
        namer.with_product_tag(self.product_tag.clone())
    }

    /// Serializers available to `metadata`'s export, with the PDF backend
    /// configured from these options.
    pub fn serializers(&self, metadata: &BookMetadata) -> SerializerRegistry {
        let mut registry = SerializerRegistry::new();
        registry.register(Arc::new(PdfSerializer::with_options(self.pdf_for(metadata))));
        registry
    }

    /// PDF options completed from the request metadata.
    fn pdf_for(&self, metadata: &BookMetadata) -> PdfOptions {
        let mut pdf = self.pdf.clone();
        if pdf.author.is_none() {
            pdf.author = metadata.author.clone();
        }
        if pdf.created.is_none() {
            pdf.created = Some(metadata.generated_at);
        }
        pdf
    }
}

/// A single file ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArtifact {
    /// Suggested file name
    pub file_name: String,

    /// MIME type
    pub mime_type: &'static str,

    /// File contents
    pub bytes: Vec<u8>,
}

impl NamedArtifact {
    /// Write the artifact into `dir` under its file name.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Result of a full export.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    /// File name of the archive
    pub archive_name: String,

    /// Entries as bundled
    pub archive: Archive,

    /// Encoded zip container
    pub bytes: Vec<u8>,
}

impl ExportBundle {
    /// Check whether any optional entry was replaced by the diagnostic note.
    pub fn is_degraded(&self) -> bool {
        self.archive.is_degraded()
    }

    /// Optional entries that failed.
    pub fn failures(&self) -> &[EntryFailure] {
        self.archive.failures()
    }

    /// The archive as a named artifact.
    pub fn into_artifact(self) -> NamedArtifact {
        NamedArtifact {
            file_name: self.archive_name,
            mime_type: ZIP_MIME,
            bytes: self.bytes,
        }
    }
}

/// Export the full archive with the PDF backend.
pub fn export(request: &ExportRequest, options: &ExportOptions) -> Result<ExportBundle> {
    export_as(request, options, &options.serializers(&request.metadata), "pdf")
}

/// Export the full archive with the serializer registered for `ext`.
///
/// An extension with no registered serializer fails before any entry is
/// produced.
pub fn export_as(
    request: &ExportRequest,
    options: &ExportOptions,
    registry: &SerializerRegistry,
    ext: &str,
) -> Result<ExportBundle> {
    let serializer = registry.get(ext).ok_or_else(|| {
        Error::Serialize(format!(
            "no serializer for '{}' (available: {})",
            ext,
            registry.extensions().join(", ")
        ))
    })?;
    export_with(request, options, serializer)
}

/// Export the full archive with a custom document serializer.
///
/// Invalid layout options fail the export before any entry is produced.
pub fn export_with<S>(
    request: &ExportRequest,
    options: &ExportOptions,
    serializer: S,
) -> Result<ExportBundle>
where
    S: DocumentSerializer + 'static,
{
    options.layout.validate(&StandardMetrics)?;

    let namer = options.namer(&request.title);
    let serializer = Arc::new(serializer);

    let text_name = namer.file_name("txt");
    let document_name = namer.file_name(serializer.extension());
    let metadata_name = namer.role_file_name("metadata", options.metadata_format.extension());

    let mut builder = ArchiveBuilder::new();
    if !options.parallel {
        builder = builder.sequential();
    }

    let text_body = request.body.clone();
    builder = builder.required(text_name, move || plain_text(&text_body));

    let engine = LayoutEngine::new(options.layout.clone());
    let title = request.title.clone();
    let body = request.body.clone();
    builder = builder.optional(document_name, move || {
        let doc = engine.layout(&title, &body)?;
        serializer.serialize(&doc)
    });

    let metadata = request.metadata.clone();
    let format = options.metadata_format;
    builder = builder.required(metadata_name, move || {
        format.render(&metadata).map(String::into_bytes)
    });

    if let Some(cover) = request.cover.clone() {
        match sniff_image(&cover) {
            Some(ext) => {
                builder = builder.optional(format!("cover.{}", ext), move || Ok(cover));
            }
            None => {
                builder = builder.optional("cover", || {
                    Err(Error::Other(
                        "cover image is neither PNG nor JPEG".to_string(),
                    ))
                });
            }
        }
    }

    let archive = builder.build()?;
    let bytes = archive.to_zip()?;
    let archive_name = namer.archive_name();

    log::info!(
        "exported '{}' as {} ({} entries, {} bytes)",
        request.title,
        archive_name,
        archive.len(),
        bytes.len()
    );

    Ok(ExportBundle {
        archive_name,
        archive,
        bytes,
    })
}

/// Lay out the request with the configured options.
pub fn paginate(request: &ExportRequest, options: &ExportOptions) -> Result<Document> {
    LayoutEngine::new(options.layout.clone()).layout(&request.title, &request.body)
}

/// Export only the paginated PDF. Failures are returned, not degraded.
pub fn export_pdf(request: &ExportRequest, options: &ExportOptions) -> Result<NamedArtifact> {
    let doc = paginate(request, options)?;
    let serializer = PdfSerializer::with_options(options.pdf_for(&request.metadata));
    let bytes = serializer.serialize(&doc)?;

    Ok(NamedArtifact {
        file_name: options.namer(&request.title).file_name(serializer.extension()),
        mime_type: serializer.mime_type(),
        bytes,
    })
}

/// Export only the plain-text copy.
pub fn export_text(request: &ExportRequest, options: &ExportOptions) -> Result<NamedArtifact> {
    Ok(NamedArtifact {
        file_name: options.namer(&request.title).file_name("txt"),
        mime_type: TEXT_MIME,
        bytes: plain_text(&request.body)?,
    })
}

/// File extension for a PNG or JPEG image, from its magic bytes.
pub fn sniff_image(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageGeometry;
    use chrono::{TimeZone, Utc};

    fn options() -> ExportOptions {
        ExportOptions::new().with_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    fn request() -> ExportRequest {
        let metadata = BookMetadata::new("Roman History")
            .with_author("Livy")
            .with_chapter_count(1)
            .with_generated_at(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        ExportRequest::new("Roman History", "# Intro\nRome was not built in a day.")
            .with_metadata(metadata)
    }

    #[test]
    fn test_request_derives_chapter_count() {
        let request = ExportRequest::new("T", "# One\ntext\n## Sub\n# Two");
        assert_eq!(request.metadata.chapter_count, 2);
        assert_eq!(request.metadata.title, "T");
    }

    #[test]
    fn test_export_entries() {
        let bundle = export(&request(), &options()).unwrap();
        assert_eq!(bundle.archive_name, "BookMind.ai_roman_history_2024-05-01.zip");
        assert_eq!(
            bundle.archive.names(),
            vec![
                "roman_history_2024-05-01.txt",
                "roman_history_2024-05-01.pdf",
                "roman_history_metadata_2024-05-01.txt",
            ]
        );
        assert!(!bundle.is_degraded());
        assert!(bundle.bytes.starts_with(b"PK"));
    }

    struct OutlineSerializer;

    impl DocumentSerializer for OutlineSerializer {
        fn name(&self) -> &str {
            "outline"
        }

        fn extension(&self) -> &str {
            "outline"
        }

        fn mime_type(&self) -> &'static str {
            "text/plain"
        }

        fn serialize(&self, doc: &Document) -> Result<Vec<u8>> {
            Ok(doc.plain_text().into_bytes())
        }
    }

    #[test]
    fn test_export_picks_serializer_by_extension() {
        let request = request();
        let mut registry = options().serializers(&request.metadata);
        registry.register(Arc::new(OutlineSerializer));

        let bundle = export_as(&request, &options(), &registry, "outline").unwrap();
        assert!(bundle.archive.contains("roman_history_2024-05-01.outline"));
        assert!(!bundle.archive.contains("roman_history_2024-05-01.pdf"));

        let by_name = export_as(&request, &options(), &registry, "PDF").unwrap();
        let default = export(&request, &options()).unwrap();
        let name = "roman_history_2024-05-01.pdf";
        assert!(by_name.archive.contains(name));
        assert_eq!(by_name.archive.get(name), default.archive.get(name));
    }

    #[test]
    fn test_export_unknown_extension_fails() {
        let request = request();
        let registry = options().serializers(&request.metadata);
        let err = export_as(&request, &options(), &registry, "epub").unwrap_err();
        assert!(matches!(err, Error::Serialize(_)));
        assert!(err.to_string().contains("available: pdf"));
    }

    #[test]
    fn test_plain_text_is_exact_body() {
        let request = request();
        let bundle = export(&request, &options()).unwrap();
        let text = bundle.archive.get("roman_history_2024-05-01.txt").unwrap();
        assert_eq!(text, request.body.as_bytes());
    }

    #[test]
    fn test_metadata_json_format() {
        let options = options().with_metadata_format(MetadataFormat::Json);
        let bundle = export(&request(), &options).unwrap();
        let json = bundle
            .archive
            .get("roman_history_metadata_2024-05-01.json")
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(json).unwrap();
        assert_eq!(value["author"], "Livy");
        assert_eq!(value["chapter_count"], 1);
    }

    #[test]
    fn test_empty_body_is_fatal() {
        let err = export(&ExportRequest::new("T", "  \n "), &options()).unwrap_err();
        assert!(err.is_input_error());
        assert!(export_text(&ExportRequest::new("T", ""), &options()).is_err());
    }

    #[test]
    fn test_unencodable_text_degrades() {
        let request = ExportRequest::new("Война и мир", "Всё смешалось в доме Облонских.");
        let bundle = export(&request, &options()).unwrap();
        assert!(bundle.is_degraded());
        assert_eq!(
            bundle.archive.names(),
            vec!["book_2024-05-01.txt", "book_metadata_2024-05-01.txt", "ERROR.txt"]
        );
        let note = String::from_utf8(bundle.archive.get("ERROR.txt").unwrap().to_vec()).unwrap();
        assert!(note.contains("book_2024-05-01.pdf"));
        assert!(note.contains("cannot be encoded"));
    }

    #[test]
    fn test_invalid_layout_is_fatal() {
        let layout = LayoutOptions::new().with_geometry(PageGeometry::new(100.0, 100.0, 50.0));
        let result = export(&request(), &options().with_layout(layout));
        assert!(matches!(result, Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn test_cover_entries() {
        let png = b"\x89PNG\r\n\x1a\nrest".to_vec();
        let bundle = export(&request().with_cover(png.clone()), &options()).unwrap();
        assert_eq!(bundle.archive.get("cover.png"), Some(png.as_slice()));

        let bad = export(&request().with_cover(b"GIF89a".to_vec()), &options()).unwrap();
        assert!(bad.is_degraded());
        assert!(!bad.archive.contains("cover"));
        assert!(bad.archive.contains("ERROR.txt"));
    }

    #[test]
    fn test_sniff_image() {
        assert_eq!(sniff_image(b"\x89PNG\r\n\x1a\n"), Some("png"));
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("jpg"));
        assert_eq!(sniff_image(b"BM"), None);
        assert_eq!(sniff_image(b""), None);
    }

    #[test]
    fn test_export_pdf_artifact() {
        let artifact = export_pdf(&request(), &options()).unwrap();
        assert_eq!(artifact.file_name, "roman_history_2024-05-01.pdf");
        assert_eq!(artifact.mime_type, "application/pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_text_artifact() {
        let artifact = export_text(&request(), &options()).unwrap();
        assert_eq!(artifact.file_name, "roman_history_2024-05-01.txt");
        assert_eq!(artifact.mime_type, TEXT_MIME);
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = export_text(&request(), &options()).unwrap();
        let path = artifact.write_to_dir(dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), artifact.bytes);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let parallel = export(&request(), &options()).unwrap();
        let sequential = export(&request(), &options().sequential()).unwrap();
        assert_eq!(parallel.archive, sequential.archive);
    }
}
