//! Error types for bookbind library.

use std::io;
use thiserror::Error;

/// Result type alias for bookbind operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout, serialization and bundling.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The body text is missing, so no plain-text copy can be produced.
    #[error("Book body is empty: nothing to export")]
    EmptyBody,

    /// Page geometry or style configuration cannot hold a single line.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// A font resource is unknown or unusable.
    #[error("Font unavailable: {0}")]
    FontUnavailable(String),

    /// A character cannot be encoded with the document font encoding.
    #[error("Character {ch:?} (U+{code:04X}) cannot be encoded with font {font}")]
    UnsupportedCharacter {
        /// The offending character
        ch: char,
        /// Its code point
        code: u32,
        /// Base font that rejected it
        font: String,
    },

    /// Error writing the document format.
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Error writing the archive container.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Error rendering the metadata record.
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// A required archive entry could not be produced.
    #[error("Required entry '{name}' failed: {source}")]
    EntryFailed {
        /// Entry name
        name: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::UnsupportedCharacter`] for `ch`.
    pub fn unsupported_char(ch: char, font: impl Into<String>) -> Self {
        Error::UnsupportedCharacter {
            ch,
            code: ch as u32,
            font: font.into(),
        }
    }

    /// Wrap `source` as the failure of the required entry `name`.
    pub fn entry_failed(name: impl Into<String>, source: Error) -> Self {
        Error::EntryFailed {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error stems from missing input rather than a backend.
    pub fn is_input_error(&self) -> bool {
        match self {
            Error::EmptyBody => true,
            Error::EntryFailed { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Serialize(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Metadata(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyBody;
        assert_eq!(err.to_string(), "Book body is empty: nothing to export");

        let err = Error::unsupported_char('Ж', "Times-Roman");
        assert_eq!(
            err.to_string(),
            "Character 'Ж' (U+0416) cannot be encoded with font Times-Roman"
        );
    }

    #[test]
    fn test_entry_failed_display() {
        let err = Error::entry_failed("book.txt", Error::EmptyBody);
        assert_eq!(
            err.to_string(),
            "Required entry 'book.txt' failed: Book body is empty: nothing to export"
        );
        assert!(err.is_input_error());
        assert!(!Error::Serialize("x".into()).is_input_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
