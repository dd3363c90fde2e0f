//! Character offsets and text normalization
//!
//! Span offsets are counted in characters, while Rust strings are indexed
//! by UTF-8 byte. Japanese text is almost entirely multi-byte, so every
//! slice of the input goes through a [`CharIndex`].

use std::ops::Range;

/// Byte position of every character boundary in a string
#[derive(Debug, Clone)]
pub struct CharIndex {
    /// `boundaries[i]` is the byte offset of character `i`; the last entry
    /// is the byte length of the text
    boundaries: Vec<usize>,
}

impl CharIndex {
    /// Indexes the character boundaries of `text`
    pub fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Byte offset of a character offset; `char_len()` maps to the end of text
    pub fn byte_offset(&self, char_offset: usize) -> Option<usize> {
        self.boundaries.get(char_offset).copied()
    }

    /// Byte range of the character range `[start, end)`
    pub fn byte_range(&self, start: usize, end: usize) -> Option<Range<usize>> {
        if start > end {
            return None;
        }
        Some(self.byte_offset(start)?..self.byte_offset(end)?)
    }

    /// Character offset of a byte offset that sits on a character boundary
    pub fn char_offset(&self, byte_offset: usize) -> Option<usize> {
        self.boundaries.binary_search(&byte_offset).ok()
    }

    /// Slice of `text` covering characters `[start, end)`
    ///
    /// `text` must be the string this index was built from.
    pub fn slice<'t>(&self, text: &'t str, start: usize, end: usize) -> Option<&'t str> {
        text.get(self.byte_range(start, end)?)
    }
}

/// Canonical form of a span's text used for token derivation
///
/// Folds full-width ASCII and the ideographic space to their half-width
/// forms, lowercases, and drops whitespace and punctuation, so that
/// `ＹＡＭＡＤＡ＠example.com` and `yamada@example.com` hash alike.
/// Only the hash input is normalized; the vault stores and returns the
/// exact original.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(fold_width)
        .filter(|c| !c.is_whitespace() && !is_punctuation(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn fold_width(c: char) -> char {
    match c {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        _ => c,
    }
}

fn is_punctuation(c: char) -> bool {
    // '@', '.', '-' carry meaning inside emails, amounts and ids
    if matches!(c, '@' | '.' | '-' | '+' | '_') {
        return false;
    }
    c.is_ascii_punctuation()
        || matches!(
            c,
            '、' | '。' | '・' | '「' | '」' | '『' | '』' | '（' | '）' | '【' | '】' | '〜' | '…'
        )
}
