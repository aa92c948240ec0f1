//! Positional structural diff between two versions of a file.
//!
//! The text primitive ([`diff_text`]) uses the `similar` crate's Myers diff
//! and reports each run of non-equal operations as one `(span, replacement)`
//! edit over the old text, in ascending order. [`StructuralDiff`] then
//! re-projects every edit into the changed tree's coordinate space by
//! carrying the cumulative length delta of the edits already seen.

use std::sync::Arc;
use std::vec;

use semconflict_core::DiffGranularity;
use similar::{Algorithm, DiffTag, TextDiff};
use tracing::trace;

use crate::change::ChangeRecord;
use crate::error::{EngineError, Result};
use crate::tree::SourceTree;
use crate::types::SpanInterval;

/// A raw edit: replace `span` of the old text with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: SpanInterval,
    pub replacement: String,
}

/// Diff `old` against `new`, returning edits in ascending `span.start` order.
pub fn diff_text(old: &str, new: &str, granularity: DiffGranularity) -> Vec<TextEdit> {
    let mut config = TextDiff::configure();
    config.algorithm(Algorithm::Myers);
    let diff = match granularity {
        DiffGranularity::Lines => config.diff_lines(old, new),
        DiffGranularity::Words => config.diff_words(old, new),
        DiffGranularity::Chars => config.diff_chars(old, new),
    };

    let old_offsets = byte_offsets(diff.old_slices());
    let new_slices = diff.new_slices();

    let mut edits: Vec<TextEdit> = Vec::new();
    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            continue;
        }
        let start = old_offsets[old_range.start];
        let end = old_offsets[old_range.end];
        let replacement = new_slices[new_range].concat();

        // Equal runs are never empty, so a shared boundary means the two
        // operations were adjacent.
        match edits.last_mut() {
            Some(prev) if prev.span.end() == start => {
                prev.span = SpanInterval::from_bounds(prev.span.start, end);
                prev.replacement.push_str(&replacement);
            }
            _ => edits.push(TextEdit {
                span: SpanInterval::from_bounds(start, end),
                replacement,
            }),
        }
    }
    edits
}

fn byte_offsets(slices: &[&str]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(slices.len() + 1);
    let mut total = 0;
    offsets.push(total);
    for slice in slices {
        total += slice.len();
        offsets.push(total);
    }
    offsets
}

/// Computes ordered [`ChangeRecord`]s between an ancestor and a changed tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralDiff {
    granularity: DiffGranularity,
}

impl StructuralDiff {
    pub fn new(granularity: DiffGranularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> DiffGranularity {
        self.granularity
    }

    /// Diff `changed` against `ancestor`.
    ///
    /// Both trees must be versions of the same file; a language mismatch is
    /// rejected, any other lineage violation yields meaningless records.
    pub fn compare(
        &self,
        ancestor: &Arc<SourceTree>,
        changed: &Arc<SourceTree>,
    ) -> Result<ChangeRecords> {
        if ancestor.language() != changed.language() {
            return Err(EngineError::LanguageMismatch {
                ancestor: ancestor.language(),
                changed: changed.language(),
            });
        }
        let edits = diff_text(ancestor.source(), changed.source(), self.granularity);
        Ok(ChangeRecords::new(edits, ancestor.clone(), changed.clone()))
    }

    /// Boundary-inclusive overlap of two records' ancestor spans.
    pub fn intersects(d1: &ChangeRecord, d2: &ChangeRecord) -> bool {
        d1.intersects(d2)
    }
}

/// Single-pass iterator over the records of one comparison.
///
/// Assumes the raw edits arrive in ascending ancestor order, which
/// [`diff_text`] guarantees.
#[derive(Debug)]
pub struct ChangeRecords {
    edits: vec::IntoIter<TextEdit>,
    offset: isize,
    ancestor: Arc<SourceTree>,
    changed: Arc<SourceTree>,
}

impl ChangeRecords {
    pub fn new(edits: Vec<TextEdit>, ancestor: Arc<SourceTree>, changed: Arc<SourceTree>) -> Self {
        Self {
            edits: edits.into_iter(),
            offset: 0,
            ancestor,
            changed,
        }
    }
}

impl Iterator for ChangeRecords {
    type Item = ChangeRecord;

    fn next(&mut self) -> Option<ChangeRecord> {
        let edit = self.edits.next()?;
        let ancestor_span = edit.span;
        let changed_start = ancestor_span.start.saturating_add_signed(self.offset);
        let length_delta = edit.replacement.len() as isize - ancestor_span.length as isize;
        let changed_length = ancestor_span.length.saturating_add_signed(length_delta);
        self.offset += length_delta;

        let changed_span = SpanInterval::new(changed_start, changed_length);
        trace!(%ancestor_span, %changed_span, offset = self.offset, "structural edit");
        Some(ChangeRecord::new(
            ancestor_span,
            changed_span,
            self.ancestor.clone(),
            self.changed.clone(),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.edits.size_hint()
    }
}

impl ExactSizeIterator for ChangeRecords {}
