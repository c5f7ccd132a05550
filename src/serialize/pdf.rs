//! PDF document serializer built on lopdf.

use std::io::Write;

use chrono::{DateTime, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};

use super::fonts::{encode_win_ansi, FontSet};
use super::DocumentSerializer;
use crate::error::{Error, Result};
use crate::model::{Document, FontId, Page, StyledRun};

/// Options for PDF output.
#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// Base fonts for the regular and bold faces
    pub fonts: FontSet,

    /// Flate-compress page content streams
    pub compress: bool,

    /// Author recorded in the document info
    pub author: Option<String>,

    /// Producer recorded in the document info
    pub producer: String,

    /// Creation date recorded in the document info (omitted when unset)
    pub created: Option<DateTime<Utc>>,
}

impl PdfOptions {
    /// Create new PDF options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font set.
    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.fonts = fonts;
        self
    }

    /// Enable or disable content stream compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the creation date.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            fonts: FontSet::default(),
            compress: cfg!(feature = "compress"),
            author: None,
            producer: format!("bookbind {}", env!("CARGO_PKG_VERSION")),
            created: None,
        }
    }
}

/// Writes a laid-out [`Document`] as PDF.
///
/// Emits exactly the pages and runs the layout decided; the two fonts are
/// declared once and shared by every page.
#[derive(Debug, Clone, Default)]
pub struct PdfSerializer {
    options: PdfOptions,
}

impl PdfSerializer {
    /// Create a serializer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a serializer with custom options.
    pub fn with_options(options: PdfOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    pub fn options(&self) -> &PdfOptions {
        &self.options
    }

    fn build(&self, doc: &Document) -> Result<lopdf::Document> {
        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();

        let mut font_dict = Dictionary::new();
        for font in FontId::all() {
            let base = self.options.fonts.resolve(font)?;
            let font_id = pdf.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base,
                "Encoding" => "WinAnsiEncoding",
            });
            font_dict.set(font.resource_name(), font_id);
        }
        let resources_id = pdf.add_object(dictionary! {
            "Font" => font_dict,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(doc.pages().len());
        for page in doc.pages() {
            let content_id = self.write_page_content(&mut pdf, page)?;
            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let geometry = doc.geometry;
        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(geometry.width),
                Object::Real(geometry.height),
            ],
        };
        pdf.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);

        let info_id = pdf.add_object(self.info_dictionary(doc));
        pdf.trailer.set("Info", info_id);

        Ok(pdf)
    }

    fn write_page_content(&self, pdf: &mut lopdf::Document, page: &Page) -> Result<ObjectId> {
        let mut operations = Vec::with_capacity(page.runs.len() * 6);
        for run in &page.runs {
            operations.extend(self.run_operations(run)?);
        }

        let encoded = Content { operations }.encode()?;
        let stream = if self.options.compress {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&encoded)?;
            let compressed = encoder.finish()?;
            Stream::new(dictionary! { "Filter" => "FlateDecode" }, compressed)
        } else {
            Stream::new(Dictionary::new(), encoded)
        };

        Ok(pdf.add_object(stream))
    }

    fn run_operations(&self, run: &StyledRun) -> Result<Vec<Operation>> {
        let base = self.options.fonts.resolve(run.font)?;
        let bytes = encode_win_ansi(&run.text, base)?;

        Ok(vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(run.font.resource_name().as_bytes().to_vec()),
                    Object::Real(run.size),
                ],
            ),
            Operation::new(
                "rg",
                vec![
                    Object::Real(run.color.r),
                    Object::Real(run.color.g),
                    Object::Real(run.color.b),
                ],
            ),
            Operation::new("Td", vec![Object::Real(run.x), Object::Real(run.y)]),
            Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ])
    }

    fn info_dictionary(&self, doc: &Document) -> Dictionary {
        let mut info = Dictionary::new();
        if !doc.title.is_empty() {
            info.set("Title", text_string(&doc.title));
        }
        if let Some(ref author) = self.options.author {
            info.set("Author", text_string(author));
        }
        info.set("Producer", text_string(&self.options.producer));
        if let Some(created) = self.options.created {
            info.set("CreationDate", text_string(&pdf_date(&created)));
        }
        info
    }
}

impl DocumentSerializer for PdfSerializer {
    fn name(&self) -> &str {
        "pdf"
    }

    fn extension(&self) -> &str {
        "pdf"
    }

    fn mime_type(&self) -> &'static str {
        "application/pdf"
    }

    fn serialize(&self, doc: &Document) -> Result<Vec<u8>> {
        let mut pdf = self.build(doc)?;
        let mut out = Vec::new();
        pdf.save_to(&mut out)
            .map_err(|e| Error::Serialize(e.to_string()))?;
        log::debug!(
            "serialized {} pages into {} PDF bytes",
            doc.page_count(),
            out.len()
        );
        Ok(out)
    }
}

/// Encode a PDF text string: plain bytes for ASCII, UTF-16BE otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::String(s.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Format a timestamp as a PDF date string (`D:YYYYMMDDHHmmSS+00'00'`).
fn pdf_date(at: &DateTime<Utc>) -> String {
    at.format("D:%Y%m%d%H%M%S+00'00'").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutEngine, LayoutOptions};
    use chrono::TimeZone;

    fn layout(title: &str, body: &str) -> Document {
        LayoutEngine::new(LayoutOptions::default())
            .layout(title, body)
            .unwrap()
    }

    fn uncompressed() -> PdfSerializer {
        PdfSerializer::with_options(PdfOptions::new().with_compression(false))
    }

    #[test]
    fn test_serialize_header() {
        let bytes = PdfSerializer::new()
            .serialize(&layout("Roman History", "# Intro\nHello world."))
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_round_trip_page_count() {
        let body = "A fairly ordinary sentence that fills space.\n".repeat(400);
        let doc = layout("Long", &body);
        assert!(doc.page_count() > 1);

        let bytes = PdfSerializer::new().serialize(&doc).unwrap();
        let loaded = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len() as u32, doc.page_count());
    }

    #[test]
    fn test_content_stream_operations() {
        let doc = layout("Title", "Body text");
        let bytes = uncompressed().serialize(&doc).unwrap();
        let loaded = lopdf::Document::load_mem(&bytes).unwrap();
        let (_, page_id) = loaded.get_pages().into_iter().next().unwrap();
        let content = loaded.get_page_content(page_id).unwrap();
        let ops = Content::decode(&content).unwrap().operations;

        let shown: Vec<Vec<u8>> = ops
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![b"Title".to_vec(), b"Body text".to_vec()]);
        assert_eq!(ops.iter().filter(|op| op.operator == "BT").count(), 2);
    }

    #[test]
    fn test_fonts_declared_once() {
        let body = "word ".repeat(4000);
        let bytes = uncompressed().serialize(&layout("T", &body)).unwrap();
        let loaded = lopdf::Document::load_mem(&bytes).unwrap();
        let font_objects = loaded
            .objects
            .values()
            .filter_map(|obj| obj.as_dict().ok())
            .filter(|dict| {
                dict.get(b"Type")
                    .and_then(|t| t.as_name())
                    .map(|n| n == b"Font")
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(font_objects, 2);
    }

    #[test]
    fn test_unknown_font_is_error() {
        let serializer = PdfSerializer::with_options(
            PdfOptions::new().with_fonts(FontSet::new("Papyrus", "Times-Bold")),
        );
        let err = serializer.serialize(&layout("T", "x")).unwrap_err();
        assert!(matches!(err, Error::FontUnavailable(_)));
    }

    #[test]
    fn test_unencodable_text_is_error() {
        let err = PdfSerializer::new()
            .serialize(&layout("T", "Съешь же ещё этих"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCharacter { .. }));
    }

    #[test]
    fn test_deterministic_output() {
        let doc = layout("Same", "# A\nSame input, same bytes.");
        let serializer = PdfSerializer::new();
        assert_eq!(
            serializer.serialize(&doc).unwrap(),
            serializer.serialize(&doc).unwrap()
        );
    }

    #[test]
    fn test_info_dictionary() {
        let created = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let serializer = PdfSerializer::with_options(
            PdfOptions::new().with_author("Ana").with_created(created),
        );
        let info = serializer.info_dictionary(&layout("Título", "x"));

        assert!(matches!(info.get(b"Author"), Ok(Object::String(b, _)) if b == b"Ana"));
        match info.get(b"Title") {
            Ok(Object::String(bytes, _)) => assert_eq!(&bytes[..2], &[0xFE, 0xFF]),
            other => panic!("unexpected title: {other:?}"),
        }
        assert!(
            matches!(info.get(b"CreationDate"), Ok(Object::String(b, _)) if b == b"D:20240506070809+00'00'")
        );
    }

    #[test]
    fn test_pdf_date() {
        let at = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 1).unwrap();
        assert_eq!(pdf_date(&at), "D:20231231235901+00'00'");
    }
}
