//! Text edits and text diffing.
//!
//! An [`Edit`] replaces a byte span with new text. A list of edits handed out
//! by this crate is always sorted by start offset and non-overlapping, so it
//! can be applied front to back against the original text.

use std::time::Duration;

use similar::{Algorithm, DiffTag, TextDiff};

use super::TextSpan;

/// Replace `span` (byte offsets into the original text) with `new_text`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub span: TextSpan,
    pub new_text: String,
}

impl Edit {
    pub fn new(span: TextSpan, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    pub fn replace(start: usize, end: usize, new_text: impl Into<String>) -> Self {
        Self::new(TextSpan::new(start, end), new_text)
    }
}

/// Edits that break the ordering contract.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("edit {start}..{end} is outside the document (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("edit {start}..{end} is inverted")]
    Inverted { start: usize, end: usize },

    #[error("edits overlap at offset {0}")]
    Overlap(usize),
}

/// Sort edits by start offset and check bounds and overlap.
///
/// Pure insertions at the same offset keep their relative order.
pub fn normalize(mut edits: Vec<Edit>, len: usize) -> Result<Vec<Edit>, EditError> {
    for edit in &edits {
        let TextSpan { start, end } = edit.span;
        if start > end {
            return Err(EditError::Inverted { start, end });
        }
        if end > len {
            return Err(EditError::OutOfBounds { start, end, len });
        }
    }
    edits.sort_by_key(|e| (e.span.start, e.span.end));
    for pair in edits.windows(2) {
        if pair[1].span.start < pair[0].span.end {
            return Err(EditError::Overlap(pair[1].span.start));
        }
    }
    Ok(edits)
}

/// Apply sorted, non-overlapping edits to `text`.
pub fn apply(text: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&text[cursor..edit.span.start]);
        out.push_str(&edit.new_text);
        cursor = edit.span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Minimal-ish character diff from `old` to `new`, as edits against `old`.
///
/// Adjacent delete/insert hunks are merged into a single replacement.
pub fn diff(old: &str, new: &str) -> Vec<Edit> {
    if old == new {
        return Vec::new();
    }

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(Duration::from_secs(1))
        .diff_chars(old, new);

    // Char index -> byte offset, with a trailing entry for the end of text.
    let old_bytes = char_starts(old);
    let new_bytes = char_starts(new);

    let mut edits: Vec<Edit> = Vec::new();
    let mut pending: Option<(usize, usize, usize, usize)> = None;

    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            if let Some(hunk) = pending.take() {
                edits.push(hunk_to_edit(hunk, &old_bytes, &new_bytes, new));
            }
            continue;
        }
        pending = Some(match pending {
            Some((os, _, ns, _)) => (os, old_range.end, ns, new_range.end),
            None => (old_range.start, old_range.end, new_range.start, new_range.end),
        });
    }
    if let Some(hunk) = pending {
        edits.push(hunk_to_edit(hunk, &old_bytes, &new_bytes, new));
    }
    edits
}

fn char_starts(text: &str) -> Vec<usize> {
    let mut starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    starts.push(text.len());
    starts
}

fn hunk_to_edit(
    (old_start, old_end, new_start, new_end): (usize, usize, usize, usize),
    old_bytes: &[usize],
    new_bytes: &[usize],
    new: &str,
) -> Edit {
    let new_text = &new[new_bytes[new_start]..new_bytes[new_end]];
    Edit::replace(old_bytes[old_start], old_bytes[old_end], new_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_of_identical_text_is_empty() {
        assert!(diff("fn main() {}", "fn main() {}").is_empty());
    }

    #[test]
    fn diff_round_trips() {
        let old = "fn main() {\nlet x = 1;   \n}\n";
        let new = "fn main() {\n    let x = 1;\n}\n";
        let edits = diff(old, new);
        assert!(!edits.is_empty());
        assert_eq!(apply(old, &edits), new);
    }

    #[test]
    fn diff_edits_are_sorted_and_disjoint() {
        let old = "a  b  c  d";
        let new = "a b c d";
        let edits = diff(old, new);
        for pair in edits.windows(2) {
            assert!(pair[0].span.end <= pair[1].span.start);
        }
        assert_eq!(apply(old, &edits), new);
    }

    #[test]
    fn diff_handles_multibyte_text() {
        let old = "let s = \"héllo\";";
        let new = "let s = \"hällo wörld\";";
        let edits = diff(old, new);
        assert_eq!(apply(old, &edits), new);
        for edit in &edits {
            assert!(old.is_char_boundary(edit.span.start));
            assert!(old.is_char_boundary(edit.span.end));
        }
    }

    #[test]
    fn normalize_sorts() {
        let edits = vec![Edit::replace(5, 6, "b"), Edit::replace(0, 1, "a")];
        let sorted = normalize(edits, 10).unwrap();
        assert_eq!(sorted[0].span.start, 0);
        assert_eq!(sorted[1].span.start, 5);
    }

    #[test]
    fn normalize_rejects_overlap_and_bounds() {
        let overlapping = vec![Edit::replace(0, 4, "a"), Edit::replace(2, 6, "b")];
        assert_eq!(normalize(overlapping, 10), Err(EditError::Overlap(2)));

        let outside = vec![Edit::replace(8, 12, "x")];
        assert!(matches!(
            normalize(outside, 10),
            Err(EditError::OutOfBounds { .. })
        ));
    }
}
