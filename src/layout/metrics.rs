//! Text measurement.
//!
//! Layout never talks to a rendering backend. It asks a [`TextMetrics`]
//! implementation for string widths and line heights, which keeps layout
//! deterministic and testable without fonts loaded anywhere.

use unicode_normalization::UnicodeNormalization;

use crate::model::FontId;

/// Width and height measurement for a font at a given size.
///
/// Implementations must be pure: the same inputs always give the same output.
pub trait TextMetrics: Send + Sync {
    /// Rendered width of `text` in points.
    fn text_width(&self, text: &str, font: FontId, size: f32) -> f32;

    /// Height of one line of text at `size`, in points.
    fn line_height(&self, font: FontId, size: f32) -> f32;
}

impl<M: TextMetrics + ?Sized> TextMetrics for &M {
    fn text_width(&self, text: &str, font: FontId, size: f32) -> f32 {
        (**self).text_width(text, font, size)
    }

    fn line_height(&self, font: FontId, size: f32) -> f32 {
        (**self).line_height(font, size)
    }
}

/// Static character-width table for one face.
///
/// `widths[i]` is the advance of ASCII character `(i + 32)` in 1/1000 em,
/// covering 0x20 (space) through 0x7E (~).
struct WidthTable {
    widths: [u16; 95],
    /// Fallback for characters without a table entry.
    default_width: u16,
    ascender: i16,
    descender: i16,
}

impl WidthTable {
    fn char_width(&self, c: char) -> u16 {
        if let Some(w) = self.ascii_width(c) {
            return w;
        }
        // Accented Latin letters measure like their base letter.
        c.to_string()
            .nfd()
            .next()
            .and_then(|base| self.ascii_width(base))
            .unwrap_or_else(|| self.special_width(c))
    }

    fn ascii_width(&self, c: char) -> Option<u16> {
        let code = c as usize;
        if (32..=126).contains(&code) {
            Some(self.widths[code - 32])
        } else {
            None
        }
    }

    fn special_width(&self, c: char) -> u16 {
        match c {
            '\u{00A0}' => self.widths[0],
            '\u{2018}' | '\u{2019}' | '\u{201A}' => 333,
            '\u{201C}' | '\u{201D}' | '\u{201E}' => 444,
            '\u{2013}' => 500,
            '\u{2014}' => 1000,
            '\u{2026}' => 1000,
            '\u{2022}' => 350,
            _ => self.default_width,
        }
    }

    fn measure(&self, text: &str) -> u32 {
        text.chars().map(|c| self.char_width(c) as u32).sum()
    }

    fn height_units(&self) -> u32 {
        (self.ascender as i32 - self.descender as i32) as u32
    }
}

/// Times-Roman advance widths (Adobe core font metrics).
static TIMES_ROMAN: WidthTable = WidthTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        // 0    1    2    3    4    5    6    7    8    9
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        // :    ;    <    =    >    ?    @
        278, 278, 564, 564, 564, 444, 921,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 469, 500, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        // {    |    }    ~
        480, 200, 480, 541,
    ],
    default_width: 500,
    ascender: 683,
    descender: -217,
};

/// Times-Bold advance widths (Adobe core font metrics).
static TIMES_BOLD: WidthTable = WidthTable {
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %     &    '    (    )    *    +    ,    -    .    /
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
        // 0    1    2    3    4    5    6    7    8    9
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        // :    ;    <    =    >    ?    @
        333, 333, 570, 570, 570, 500, 930,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
        // N    O    P    Q    R    S    T    U    V    W     X    Y    Z
        722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
        // [    \    ]    ^    _    `
        333, 278, 333, 581, 500, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
        // {    |    }    ~
        394, 220, 394, 520,
    ],
    default_width: 500,
    ascender: 683,
    descender: -217,
};

/// Metrics for the standard Times faces used by the PDF serializer.
///
/// Regular text measures as Times-Roman, bold as Times-Bold. Line height is
/// the ascender-to-descender distance scaled to the font size.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMetrics;

impl StandardMetrics {
    /// Create the standard metrics provider.
    pub fn new() -> Self {
        Self
    }

    fn table(font: FontId) -> &'static WidthTable {
        match font {
            FontId::Regular => &TIMES_ROMAN,
            FontId::Bold => &TIMES_BOLD,
        }
    }
}

impl TextMetrics for StandardMetrics {
    fn text_width(&self, text: &str, font: FontId, size: f32) -> f32 {
        Self::table(font).measure(text) as f32 * size / 1000.0
    }

    fn line_height(&self, font: FontId, size: f32) -> f32 {
        Self::table(font).height_units() as f32 * size / 1000.0
    }
}

/// Fixed-pitch metrics: every character is `advance` em wide.
///
/// Handy for predictable layouts and for tests that need exact widths.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
    /// Advance per character, in em
    pub advance: f32,
    /// Line height, in em
    pub leading: f32,
}

impl MonospaceMetrics {
    /// Create fixed-pitch metrics.
    pub fn new(advance: f32, leading: f32) -> Self {
        Self { advance, leading }
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self::new(0.6, 1.0)
    }
}

impl TextMetrics for MonospaceMetrics {
    fn text_width(&self, text: &str, _font: FontId, size: f32) -> f32 {
        text.chars().count() as f32 * self.advance * size
    }

    fn line_height(&self, _font: FontId, size: f32) -> f32 {
        self.leading * size
    }
}
