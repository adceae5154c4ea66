//! Line-range splicing
//!
//! Text is an immutable line array (`split('\n')`). Edits replace a half-open,
//! 0-based line range with new lines and are applied highest start first, so
//! earlier ranges stay valid. Joining with `\n` reproduces the original
//! terminator layout exactly.

use crate::error::CodegenError;
use std::ops::Range;

/// Replace `range` with `lines`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    /// 0-based half-open line range in the input
    pub range: Range<usize>,
    /// Replacement lines
    pub lines: Vec<String>,
}

impl LineEdit {
    /// Create edit
    #[must_use]
    pub fn new(range: Range<usize>, lines: Vec<String>) -> Self {
        Self { range, lines }
    }

    /// Edit replacing 1-based inclusive lines
    #[must_use]
    pub fn replace_lines(start_line: usize, end_line: usize, lines: Vec<String>) -> Self {
        Self::new(start_line.saturating_sub(1)..end_line, lines)
    }

    /// Insert before 0-based line `at`
    #[must_use]
    pub fn insert(at: usize, lines: Vec<String>) -> Self {
        Self::new(at..at, lines)
    }

    fn intersects(&self, other: &LineEdit) -> bool {
        let (a, b) = (&self.range, &other.range);
        if a.start == b.start {
            return true;
        }
        a.start < b.end && b.start < a.end
    }
}

/// Result of a splice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
    /// Output text
    pub text: String,
    /// Per input edit: where its lines landed in the output, or why it was rejected
    pub placements: Vec<Result<Range<usize>, CodegenError>>,
}

impl Spliced {
    /// Number of edits applied
    #[must_use]
    pub fn applied(&self) -> usize {
        self.placements.iter().filter(|p| p.is_ok()).count()
    }
}

/// Split text into lines the way splicing counts them
#[inline]
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Apply edits to text
///
/// Out-of-bounds and overlapping edits are rejected individually; the others
/// still apply. Among overlapping edits the one listed first wins.
#[must_use]
pub fn splice(text: &str, edits: &[LineEdit]) -> Spliced {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let len = lines.len();

    let mut placements: Vec<Result<Range<usize>, CodegenError>> = Vec::with_capacity(edits.len());
    let mut accepted: Vec<usize> = Vec::new();
    for (idx, edit) in edits.iter().enumerate() {
        let Range { start, end } = edit.range;
        if start > end || end > len {
            placements.push(Err(CodegenError::OutOfBounds { start, end, len }));
        } else if accepted.iter().any(|&a| edits[a].intersects(edit)) {
            placements.push(Err(CodegenError::Overlap { start, end }));
        } else {
            accepted.push(idx);
            placements.push(Ok(0..0));
        }
    }

    accepted.sort_by_key(|&idx| std::cmp::Reverse(edits[idx].range.start));
    for &idx in &accepted {
        let edit = &edits[idx];
        lines.splice(edit.range.clone(), edit.lines.iter().cloned());
    }

    // Output positions follow from the accumulated size change of earlier edits
    let mut shift: isize = 0;
    for &idx in accepted.iter().rev() {
        let edit = &edits[idx];
        let out_start = edit.range.start.saturating_add_signed(shift);
        placements[idx] = Ok(out_start..out_start + edit.lines.len());
        shift += len_isize(edit.lines.len()) - len_isize(edit.range.len());
    }

    Spliced {
        text: lines.join("\n"),
        placements,
    }
}

#[inline]
fn len_isize(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}
