//! File naming for exported artifacts.
//!
//! Names follow `{stem}_{date}.{ext}`, where `stem` is the sanitized title
//! (or `book` when nothing usable remains) and `date` is an ISO date. The
//! archive itself is additionally prefixed with a product tag. Names are
//! unique per title and day only; two exports of the same title on the same
//! day get the same names.

use chrono::{Local, NaiveDate};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Product tag prefixed to archive names.
pub const DEFAULT_PRODUCT_TAG: &str = "BookMind.ai";

/// Stem used when a title sanitizes to nothing.
pub const FALLBACK_STEM: &str = "book";

/// Character that replaces runs of unsafe characters.
pub const FILLER: char = '_';

/// Sanitize a title into a file-name stem.
///
/// Accents are folded to their base letters, ASCII letters are lowercased,
/// and every run of other characters collapses to a single `_`. Leading and
/// trailing fillers are dropped. The result is idempotent:
/// `sanitize(&sanitize(x)) == sanitize(x)`.
///
/// # Example
///
/// ```
/// use bookbind::archive::sanitize;
///
/// assert_eq!(sanitize("Roman History"), "roman_history");
/// assert_eq!(sanitize("  Crème brûlée: 101!  "), "creme_brulee_101");
/// assert_eq!(sanitize("???"), "book");
/// ```
pub fn sanitize(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_filler = false;

    for c in title.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            if pending_filler && !out.is_empty() {
                out.push(FILLER);
            }
            pending_filler = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_filler = true;
        }
    }

    if out.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        out
    }
}

/// Builds the names of every artifact of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNamer {
    stem: String,
    date: NaiveDate,
    product_tag: String,
}

impl FileNamer {
    /// Create a namer for `title` stamped with `date`.
    pub fn new(title: &str, date: NaiveDate) -> Self {
        Self {
            stem: sanitize(title),
            date,
            product_tag: DEFAULT_PRODUCT_TAG.to_string(),
        }
    }

    /// Create a namer stamped with today's local date.
    pub fn today(title: &str) -> Self {
        Self::new(title, Local::now().date_naive())
    }

    /// Replace the product tag used for the archive name.
    pub fn with_product_tag(mut self, tag: impl Into<String>) -> Self {
        self.product_tag = tag.into();
        self
    }

    /// Sanitized stem.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Date stamp.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// `{stem}_{date}.{ext}`
    pub fn file_name(&self, ext: &str) -> String {
        format!("{}_{}.{}", self.stem, self.date_stamp(), ext)
    }

    /// `{stem}_{role}_{date}.{ext}`, for secondary artifacts.
    pub fn role_file_name(&self, role: &str, ext: &str) -> String {
        format!("{}_{}_{}.{}", self.stem, role, self.date_stamp(), ext)
    }

    /// `{tag}_{stem}_{date}.zip`
    pub fn archive_name(&self) -> String {
        if self.product_tag.is_empty() {
            self.file_name("zip")
        } else {
            format!("{}_{}", self.product_tag, self.file_name("zip"))
        }
    }

    fn date_stamp(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize("Roman History"), "roman_history");
        assert_eq!(sanitize("A  --  B"), "a_b");
        assert_eq!(sanitize("__x__"), "x");
    }

    #[test]
    fn test_sanitize_folds_accents() {
        assert_eq!(sanitize("Émile Zola"), "emile_zola");
        assert_eq!(sanitize("naïve café"), "naive_cafe");
    }

    #[test]
    fn test_sanitize_fallback() {
        assert_eq!(sanitize(""), "book");
        assert_eq!(sanitize("   "), "book");
        assert_eq!(sanitize("東京"), "book");
    }

    #[test]
    fn test_sanitize_path_characters() {
        assert_eq!(sanitize("../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize("a\\b:c"), "a_b_c");
    }

    #[test]
    fn test_file_names() {
        let namer = FileNamer::new("Roman History", date());
        assert_eq!(namer.file_name("pdf"), "roman_history_2024-03-09.pdf");
        assert_eq!(namer.file_name("txt"), "roman_history_2024-03-09.txt");
        assert_eq!(
            namer.role_file_name("metadata", "txt"),
            "roman_history_metadata_2024-03-09.txt"
        );
        assert_eq!(
            namer.archive_name(),
            "BookMind.ai_roman_history_2024-03-09.zip"
        );
    }

    #[test]
    fn test_custom_product_tag() {
        let namer = FileNamer::new("", date()).with_product_tag("Press");
        assert_eq!(namer.archive_name(), "Press_book_2024-03-09.zip");

        let untagged = FileNamer::new("x", date()).with_product_tag("");
        assert_eq!(untagged.archive_name(), "x_2024-03-09.zip");
    }

    proptest! {
        #[test]
        fn prop_sanitize_idempotent(title in "\\PC{0,40}") {
            let once = sanitize(&title);
            prop_assert_eq!(sanitize(&once), once.clone());
        }

        #[test]
        fn prop_sanitize_charset(title in "\\PC{0,40}") {
            let out = sanitize(&title);
            prop_assert!(!out.is_empty());
            prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert!(!out.starts_with('_') && !out.ends_with('_'));
            prop_assert!(!out.contains("__"));
        }
    }
}
