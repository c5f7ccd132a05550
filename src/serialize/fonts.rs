//! Font resources and text encoding for the PDF backend.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::FontId;

/// Standard Latin faces every PDF viewer provides without embedding.
pub const STANDARD_FONTS: &[&str] = &[
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
];

/// Maps layout font identities to concrete base fonts.
///
/// The default set matches [`StandardMetrics`](crate::layout::StandardMetrics);
/// choosing other faces keeps the document valid but lines may no longer
/// measure exactly as laid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSet {
    /// Base font for body text
    pub regular: String,

    /// Base font for title and headers
    pub bold: String,
}

impl FontSet {
    /// Create a font set from two base font names.
    pub fn new(regular: impl Into<String>, bold: impl Into<String>) -> Self {
        Self {
            regular: regular.into(),
            bold: bold.into(),
        }
    }

    /// Times-Roman / Times-Bold.
    pub fn times() -> Self {
        Self::new("Times-Roman", "Times-Bold")
    }

    /// Helvetica / Helvetica-Bold.
    pub fn helvetica() -> Self {
        Self::new("Helvetica", "Helvetica-Bold")
    }

    /// Resolve the base font for `font`, checking it is available.
    pub fn resolve(&self, font: FontId) -> Result<&str> {
        let name = match font {
            FontId::Regular => self.regular.as_str(),
            FontId::Bold => self.bold.as_str(),
        };
        if STANDARD_FONTS.contains(&name) {
            Ok(name)
        } else {
            Err(Error::FontUnavailable(format!(
                "'{}' is not a standard PDF font",
                name
            )))
        }
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::times()
    }
}

/// Encode `text` as WinAnsiEncoding bytes.
///
/// Fails on the first character the encoding cannot represent; `font` is
/// only used for the error message.
pub fn encode_win_ansi(text: &str, font: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|ch| win_ansi_byte(ch).ok_or_else(|| Error::unsupported_char(ch, font)))
        .collect()
}

/// Check whether every character of `text` is representable.
pub fn is_win_ansi(text: &str) -> bool {
    text.chars().all(|ch| win_ansi_byte(ch).is_some())
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        0x09 => Some(b' '),
        _ => match ch {
            '\u{20AC}' => Some(0x80),
            '\u{201A}' => Some(0x82),
            '\u{0192}' => Some(0x83),
            '\u{201E}' => Some(0x84),
            '\u{2026}' => Some(0x85),
            '\u{2020}' => Some(0x86),
            '\u{2021}' => Some(0x87),
            '\u{02C6}' => Some(0x88),
            '\u{2030}' => Some(0x89),
            '\u{0160}' => Some(0x8A),
            '\u{2039}' => Some(0x8B),
            '\u{0152}' => Some(0x8C),
            '\u{017D}' => Some(0x8E),
            '\u{2018}' => Some(0x91),
            '\u{2019}' => Some(0x92),
            '\u{201C}' => Some(0x93),
            '\u{201D}' => Some(0x94),
            '\u{2022}' => Some(0x95),
            '\u{2013}' => Some(0x96),
            '\u{2014}' => Some(0x97),
            '\u{02DC}' => Some(0x98),
            '\u{2122}' => Some(0x99),
            '\u{0161}' => Some(0x9A),
            '\u{203A}' => Some(0x9B),
            '\u{0153}' => Some(0x9C),
            '\u{017E}' => Some(0x9E),
            '\u{0178}' => Some(0x9F),
            _ => None,
        },
    }
}
