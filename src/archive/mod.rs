//! Bundling named artifacts into a single zip archive.
//!
//! Each entry is produced by its own closure. Producers have no dependency
//! on each other, so they run on the rayon pool and the builder waits for
//! all of them before assembling the archive.
//!
//! Entries are either *required* or *optional*. A failed required entry
//! fails the whole build. A failed optional entry is left out, and one
//! diagnostic note (`ERROR.txt` by default) lists every such failure with
//! its original error text.
//!
//! # Example
//!
//! ```
//! use bookbind::archive::ArchiveBuilder;
//! use bookbind::Error;
//!
//! let archive = ArchiveBuilder::new()
//!     .required("book.txt", || Ok(b"Hello".to_vec()))
//!     .optional("book.pdf", || Err(Error::Serialize("no fonts".into())))
//!     .build()?;
//!
//! assert_eq!(archive.names(), vec!["book.txt", "ERROR.txt"]);
//! assert!(archive.is_degraded());
//! # Ok::<(), bookbind::Error>(())
//! ```

mod naming;

pub use naming::{sanitize, FileNamer, DEFAULT_PRODUCT_TAG, FALLBACK_STEM, FILLER};

use std::io::{Cursor, Read, Write};

use rayon::prelude::*;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Default name of the diagnostic note.
pub const ERROR_NOTE_NAME: &str = "ERROR.txt";

/// A closure producing the bytes of one entry.
pub type Producer = Box<dyn FnOnce() -> Result<Vec<u8>> + Send>;

/// Result of running one producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The entry was produced.
    Ready(Vec<u8>),
    /// The entry failed; carries the error text.
    Failed(String),
}

impl EntryOutcome {
    /// Check whether the entry was produced.
    pub fn is_ready(&self) -> bool {
        matches!(self, EntryOutcome::Ready(_))
    }
}

impl From<Result<Vec<u8>>> for EntryOutcome {
    fn from(result: Result<Vec<u8>>) -> Self {
        match result {
            Ok(bytes) => EntryOutcome::Ready(bytes),
            Err(e) => EntryOutcome::Failed(e.to_string()),
        }
    }
}

/// Whether a failed entry may be replaced by the diagnostic note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Failure fails the build.
    Required,
    /// Failure is recorded in the diagnostic note.
    Optional,
}

/// One named file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name
    pub name: String,
    /// Entry contents
    pub data: Vec<u8>,
}

/// An optional entry that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    /// Name the entry would have had
    pub name: String,
    /// Error text
    pub message: String,
}

struct PendingEntry {
    name: String,
    requirement: Requirement,
    producer: Producer,
}

/// Collects entry producers and assembles an [`Archive`].
pub struct ArchiveBuilder {
    pending: Vec<PendingEntry>,
    error_note_name: String,
    parallel: bool,
}

impl ArchiveBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            error_note_name: ERROR_NOTE_NAME.to_string(),
            parallel: true,
        }
    }

    /// Use a different name for the diagnostic note.
    pub fn with_error_note_name(mut self, name: impl Into<String>) -> Self {
        self.error_note_name = name.into();
        self
    }

    /// Run producers one after another on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Add an entry whose failure fails the build.
    pub fn required<F>(self, name: impl Into<String>, producer: F) -> Self
    where
        F: FnOnce() -> Result<Vec<u8>> + Send + 'static,
    {
        self.entry(name, Requirement::Required, Box::new(producer))
    }

    /// Add an entry whose failure degrades to the diagnostic note.
    pub fn optional<F>(self, name: impl Into<String>, producer: F) -> Self
    where
        F: FnOnce() -> Result<Vec<u8>> + Send + 'static,
    {
        self.entry(name, Requirement::Optional, Box::new(producer))
    }

    /// Add an entry with an explicit requirement.
    pub fn entry(
        mut self,
        name: impl Into<String>,
        requirement: Requirement,
        producer: Producer,
    ) -> Self {
        self.pending.push(PendingEntry {
            name: name.into(),
            requirement,
            producer,
        });
        self
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check whether no entries were added.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run every producer and assemble the archive.
    ///
    /// Entries keep the order in which they were added; the diagnostic note,
    /// if any, comes last.
    pub fn build(self) -> Result<Archive> {
        let error_note_name = self.error_note_name;
        let run = |entry: PendingEntry| {
            let result = (entry.producer)();
            (entry.name, entry.requirement, result)
        };

        let results: Vec<(String, Requirement, Result<Vec<u8>>)> = if self.parallel {
            self.pending.into_par_iter().map(run).collect()
        } else {
            self.pending.into_iter().map(run).collect()
        };

        let mut archive = Archive::new();
        for (name, requirement, result) in results {
            let outcome = match (requirement, result) {
                (Requirement::Required, Err(e)) => {
                    log::error!("required entry '{}' failed: {}", name, e);
                    return Err(Error::entry_failed(name, e));
                }
                (_, result) => EntryOutcome::from(result),
            };

            match outcome {
                EntryOutcome::Ready(bytes) => archive.insert(name, bytes),
                EntryOutcome::Failed(message) => {
                    log::warn!("optional entry '{}' failed: {}", name, message);
                    archive.failures.push(EntryFailure { name, message });
                }
            }
        }

        if !archive.failures.is_empty() {
            let note = error_note(&archive.failures);
            archive.insert(error_note_name, note.into_bytes());
        }

        log::info!(
            "built archive with {} entries ({} failed)",
            archive.len(),
            archive.failures.len()
        );
        Ok(archive)
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn error_note(failures: &[EntryFailure]) -> String {
    let mut note = String::from("Some files could not be generated for this export.\n\n");
    for failure in failures {
        note.push_str(&format!("{}: {}\n", failure.name, failure.message));
    }
    note.push_str("\nThe remaining files in this archive are complete.\n");
    note
}

/// Ordered set of named entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
    failures: Vec<EntryFailure>,
}

impl Archive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. An entry with the same name is replaced in place.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == name) {
            log::warn!("replacing duplicate archive entry '{}'", name);
            existing.data = data;
        } else {
            self.entries.push(ArchiveEntry { name, data });
        }
    }

    /// All entries in order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Entry names in order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Get an entry's contents by name.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Check whether an entry exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Optional entries that failed during the build.
    pub fn failures(&self) -> &[EntryFailure] {
        &self.failures
    }

    /// Check whether any optional entry was replaced by the diagnostic note.
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Encode as a deflate-compressed zip container.
    pub fn to_zip(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            zip.start_file(entry.name.as_str(), deflated)?;
            zip.write_all(&entry.data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Decode a zip container. Failure records are not stored in the
    /// container, so the result is never degraded.
    pub fn from_zip(bytes: &[u8]) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut archive = Archive::new();

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            archive.insert(name, data);
        }

        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_entries_ready() {
        let archive = ArchiveBuilder::new()
            .required("a.txt", || Ok(b"a".to_vec()))
            .optional("b.pdf", || Ok(b"b".to_vec()))
            .build()
            .unwrap();
        assert_eq!(archive.names(), vec!["a.txt", "b.pdf"]);
        assert!(!archive.is_degraded());
        assert_eq!(archive.get("b.pdf"), Some(&b"b"[..]));
    }

    #[test]
    fn test_optional_failure_becomes_note() {
        let archive = ArchiveBuilder::new()
            .required("a.txt", || Ok(b"a".to_vec()))
            .optional("b.pdf", || Err(Error::FontUnavailable("Comic-Sans".into())))
            .required("meta.txt", || Ok(b"m".to_vec()))
            .build()
            .unwrap();

        assert_eq!(archive.names(), vec!["a.txt", "meta.txt", "ERROR.txt"]);
        let note = String::from_utf8(archive.get("ERROR.txt").unwrap().to_vec()).unwrap();
        assert!(note.contains("b.pdf: Font unavailable: Comic-Sans"));
        assert_eq!(archive.failures().len(), 1);
        assert_eq!(archive.failures()[0].name, "b.pdf");
    }

    #[test]
    fn test_multiple_failures_share_one_note() {
        let archive = ArchiveBuilder::new()
            .required("a.txt", || Ok(b"a".to_vec()))
            .optional("b.pdf", || Err(Error::Serialize("one".into())))
            .optional("c.png", || Err(Error::Other("two".into())))
            .build()
            .unwrap();

        assert_eq!(archive.names(), vec!["a.txt", "ERROR.txt"]);
        let note = String::from_utf8(archive.get("ERROR.txt").unwrap().to_vec()).unwrap();
        assert!(note.contains("b.pdf: Serialization error: one"));
        assert!(note.contains("c.png: two"));
    }

    #[test]
    fn test_required_failure_is_fatal() {
        let err = ArchiveBuilder::new()
            .required("a.txt", || Err(Error::EmptyBody))
            .optional("b.pdf", || Ok(b"b".to_vec()))
            .build()
            .unwrap_err();

        match err {
            Error::EntryFailed { name, source } => {
                assert_eq!(name, "a.txt");
                assert!(matches!(*source, Error::EmptyBody));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_custom_note_name_and_sequential() {
        let archive = ArchiveBuilder::new()
            .with_error_note_name("FAILED.txt")
            .sequential()
            .optional("b.pdf", || Err(Error::Other("x".into())))
            .build()
            .unwrap();
        assert_eq!(archive.names(), vec!["FAILED.txt"]);
    }

    #[test]
    fn test_duplicate_names_replaced_in_place() {
        let mut archive = Archive::new();
        archive.insert("a", b"1".to_vec());
        archive.insert("b", b"2".to_vec());
        archive.insert("a", b"3".to_vec());
        assert_eq!(archive.names(), vec!["a", "b"]);
        assert_eq!(archive.get("a"), Some(&b"3"[..]));
    }

    #[test]
    fn test_entry_outcome_from_result() {
        assert!(EntryOutcome::from(Ok(vec![1])).is_ready());
        let failed = EntryOutcome::from(Err(Error::EmptyBody));
        assert_eq!(
            failed,
            EntryOutcome::Failed("Book body is empty: nothing to export".to_string())
        );
    }

    #[test]
    fn test_zip_round_trip() {
        let mut archive = Archive::new();
        archive.insert("x.txt", b"hello".to_vec());
        archive.insert("y.bin", vec![0u8; 1000]);

        let bytes = archive.to_zip().unwrap();
        assert!(bytes.starts_with(b"PK"));

        let back = Archive::from_zip(&bytes).unwrap();
        assert_eq!(back.names(), vec!["x.txt", "y.bin"]);
        assert_eq!(back.get("x.txt"), Some(&b"hello"[..]));
        assert_eq!(back.get("y.bin").map(|d| d.len()), Some(1000));
    }

    #[test]
    fn test_from_zip_rejects_garbage() {
        assert!(Archive::from_zip(b"not a zip").is_err());
    }
}
