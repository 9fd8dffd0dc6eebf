//! Source text primitives: byte spans, UTF-16 offset conversion, edits.
//!
//! Everything inside the crate works on UTF-8 byte offsets (that is what the
//! syntax trees hand out). Everything on the wire is a UTF-16 code-unit
//! offset, because that is what browser editors count. [`TextIndex`] is the
//! only place the two meet.

pub mod edit;

use std::fmt;

pub use edit::Edit;

/// A half-open byte range `[start, end)` into a source buffer.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty span at `offset`.
    #[inline]
    pub const fn empty(offset: usize) -> Self {
        Self { start: offset, end: offset }
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// `start <= offset < end`.
    #[inline]
    pub const fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// `start <= offset <= end`. A cursor sitting right after a token touches it.
    #[inline]
    pub const fn touches(self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    #[inline]
    pub const fn contains_span(self, other: TextSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A non-ASCII char: where it starts in both encodings and how wide it is.
#[derive(Copy, Clone, Debug)]
struct WideChar {
    byte: usize,
    utf16: usize,
    len_bytes: usize,
    len_utf16: usize,
}

/// Converts between UTF-8 byte offsets and UTF-16 code-unit offsets.
///
/// ASCII buffers take the fast path: both offsets are the same number.
#[derive(Clone, Debug)]
pub struct TextIndex {
    wide: Vec<WideChar>,
    len_bytes: usize,
    len_utf16: usize,
}

impl TextIndex {
    pub fn new(text: &str) -> Self {
        let mut wide = Vec::new();
        let mut utf16 = 0usize;
        for (byte, c) in text.char_indices() {
            if !c.is_ascii() {
                wide.push(WideChar {
                    byte,
                    utf16,
                    len_bytes: c.len_utf8(),
                    len_utf16: c.len_utf16(),
                });
            }
            utf16 += c.len_utf16();
        }
        Self {
            wide,
            len_bytes: text.len(),
            len_utf16: utf16,
        }
    }

    /// Length of the text in UTF-16 code units.
    pub fn len_utf16(&self) -> usize {
        self.len_utf16
    }

    pub fn len_bytes(&self) -> usize {
        self.len_bytes
    }

    pub fn is_ascii(&self) -> bool {
        self.wide.is_empty()
    }

    /// Byte offset for a UTF-16 offset. Offsets inside a surrogate pair round
    /// down to the start of that char; offsets past the end clamp to the end.
    pub fn to_byte(&self, utf16: usize) -> usize {
        if utf16 >= self.len_utf16 {
            return self.len_bytes;
        }
        // Last wide char starting at or before `utf16`.
        let idx = self.wide.partition_point(|w| w.utf16 <= utf16);
        let Some(w) = idx.checked_sub(1).map(|i| self.wide[i]) else {
            return utf16;
        };
        if utf16 < w.utf16 + w.len_utf16 {
            w.byte
        } else {
            w.byte + w.len_bytes + (utf16 - w.utf16 - w.len_utf16)
        }
    }

    /// UTF-16 offset for a byte offset. Offsets inside a multi-byte char round
    /// down to the start of that char.
    pub fn to_utf16(&self, byte: usize) -> usize {
        if byte >= self.len_bytes {
            return self.len_utf16;
        }
        let idx = self.wide.partition_point(|w| w.byte <= byte);
        let Some(w) = idx.checked_sub(1).map(|i| self.wide[i]) else {
            return byte;
        };
        if byte < w.byte + w.len_bytes {
            w.utf16
        } else {
            w.utf16 + w.len_utf16 + (byte - w.byte - w.len_bytes)
        }
    }

    pub fn span_to_utf16(&self, span: TextSpan) -> (usize, usize) {
        (self.to_utf16(span.start), self.to_utf16(span.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_identity() {
        let index = TextIndex::new("fn main() {}");
        assert!(index.is_ascii());
        assert_eq!(index.to_byte(3), 3);
        assert_eq!(index.to_utf16(7), 7);
        assert_eq!(index.len_utf16(), 12);
    }

    #[test]
    fn two_byte_chars() {
        // 'é' is 2 bytes, 1 unit.
        let text = "aé b";
        let index = TextIndex::new(text);
        assert_eq!(index.len_utf16(), 4);
        assert_eq!(index.to_byte(0), 0);
        assert_eq!(index.to_byte(1), 1);
        assert_eq!(index.to_byte(2), 3);
        assert_eq!(index.to_byte(3), 4);
        assert_eq!(index.to_byte(4), 5);
        assert_eq!(index.to_utf16(3), 2);
        assert_eq!(index.to_utf16(2), 1, "inside 'é' rounds down");
    }

    #[test]
    fn surrogate_pairs() {
        // '😀' is 4 bytes, 2 units.
        let text = "x😀y";
        let index = TextIndex::new(text);
        assert_eq!(index.len_utf16(), 4);
        assert_eq!(index.to_byte(1), 1);
        assert_eq!(index.to_byte(2), 1, "between surrogates rounds down");
        assert_eq!(index.to_byte(3), 5);
        assert_eq!(index.to_utf16(5), 3);
        assert_eq!(index.to_utf16(6), 4);
    }

    #[test]
    fn three_byte_chars_back_to_back() {
        let text = "日本x";
        let index = TextIndex::new(text);
        assert_eq!(index.len_utf16(), 3);
        assert_eq!(index.to_byte(1), 3);
        assert_eq!(index.to_byte(2), 6);
        assert_eq!(index.to_utf16(6), 2);
    }

    #[test]
    fn past_the_end_clamps() {
        let index = TextIndex::new("é");
        assert_eq!(index.to_byte(10), 2);
        assert_eq!(index.to_utf16(10), 1);
    }

    #[test]
    fn span_predicates() {
        let span = TextSpan::new(2, 5);
        assert!(span.contains(2));
        assert!(!span.contains(5));
        assert!(span.touches(5));
        assert!(span.contains_span(TextSpan::new(3, 5)));
        assert!(!span.contains_span(TextSpan::new(1, 3)));
    }
}
