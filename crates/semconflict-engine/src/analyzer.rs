//! Conflict analysis pipeline.
//!
//! Runs the structural comparison for a base/local/remote triple and sorts
//! the outcome into what a reviewer actually needs to look at:
//!
//! 1. **Trivia pre-filter**: edits that only touch whitespace or comments
//!    on both sides are dropped before grouping.
//! 2. **Conflict detection**: the remaining edits are merged and grouped
//!    into overlap conflicts.
//! 3. **Classification**: each conflict is a formatting-only false positive,
//!    a convergent edit where both sides made the same change, or a semantic
//!    conflict.
//! 4. **Shared declarations**: declarations both sides changed without
//!    their edits overlapping. A textual merge silently combines these.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use semconflict_core::AnalysisSettings;
use tracing::{debug, info};

use crate::change::ChangeRecord;
use crate::conflict::{Conflict, ConflictInfo};
use crate::detector::group_conflicts;
use crate::diff::StructuralDiff;
use crate::equivalence::{contexts_differ, is_semantic_change, is_span_in_node_trivia};
use crate::error::Result;
use crate::tree::{Declaration, SourceTree, SyntaxNode};
use crate::types::{Language, OriginTag, SpanInterval};

/// Classification of one detected conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The sides disagree on code.
    Semantic,
    /// Every edit in the region is formatting or comments.
    TriviaOnly,
    /// Both sides made the same change, up to formatting.
    Convergent,
}

impl Verdict {
    pub fn is_false_positive(&self) -> bool {
        !matches!(self, Verdict::Semantic)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Semantic => write!(f, "semantic"),
            Verdict::TriviaOnly => write!(f, "trivia-only"),
            Verdict::Convergent => write!(f, "convergent"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedConflict {
    pub conflict: Conflict,
    pub verdict: Verdict,
}

/// A declaration both sides changed without any textual overlap.
#[derive(Debug, Clone)]
pub struct SharedDeclaration {
    pub declaration: Declaration,
    /// Ancestor spans of the local edits inside the declaration.
    pub local_spans: Vec<SpanInterval>,
    /// Ancestor spans of the remote edits inside the declaration.
    pub remote_spans: Vec<SpanInterval>,
}

/// Result of analysing one three-way comparison.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub conflicts: Vec<ClassifiedConflict>,
    pub shared_declarations: Vec<SharedDeclaration>,
    /// Edits dropped by the trivia pre-filter.
    pub trivia_edits: usize,
    /// False-positive conflicts left out of `conflicts`.
    pub suppressed: usize,
}

impl AnalysisReport {
    pub fn semantic_conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts
            .iter()
            .filter(|c| c.verdict == Verdict::Semantic)
            .map(|c| &c.conflict)
    }

    pub fn false_positives(&self) -> impl Iterator<Item = &ClassifiedConflict> {
        self.conflicts.iter().filter(|c| c.verdict.is_false_positive())
    }

    pub fn has_semantic_conflicts(&self) -> bool {
        self.semantic_conflicts().next().is_some()
    }
}

/// Runs detection and classification with one set of settings.
pub struct ConflictAnalyzer {
    settings: AnalysisSettings,
    diff: StructuralDiff,
}

impl ConflictAnalyzer {
    pub fn new(settings: AnalysisSettings) -> Self {
        let diff = StructuralDiff::new(settings.granularity);
        Self { settings, diff }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Parse one version, honouring the configured extra declaration kinds.
    pub fn parse(&self, source: &str, language: Language) -> Result<Arc<SourceTree>> {
        SourceTree::parse_with(source, language, &self.settings.extra_declaration_kinds)
            .map(Arc::new)
    }

    pub fn analyze_sources(
        &self,
        language: Language,
        base: &str,
        local: &str,
        remote: &str,
    ) -> Result<AnalysisReport> {
        let ancestor = self.parse(base, language)?;
        let local = self.parse(local, language)?;
        let remote = self.parse(remote, language)?;
        self.analyze(&ancestor, &local, &remote)
    }

    pub fn analyze(
        &self,
        ancestor: &Arc<SourceTree>,
        local: &Arc<SourceTree>,
        remote: &Arc<SourceTree>,
    ) -> Result<AnalysisReport> {
        let mut report = AnalysisReport::default();

        let (local_changes, local_trivia): (Vec<_>, Vec<_>) = self
            .diff
            .compare(ancestor, local)?
            .partition(|c| !change_is_trivia(c));
        let (remote_changes, remote_trivia): (Vec<_>, Vec<_>) = self
            .diff
            .compare(ancestor, remote)?
            .partition(|c| !change_is_trivia(c));
        report.trivia_edits = local_trivia.len() + remote_trivia.len();

        let conflicts = group_conflicts(
            OriginTag::Local.tag(local_changes.iter().cloned()),
            OriginTag::Remote.tag(remote_changes.iter().cloned()),
        );
        for conflict in conflicts {
            let verdict = classify(&conflict);
            debug!(%verdict, edits = conflict.changes().len(), "classified conflict");
            if verdict.is_false_positive() && !self.settings.report_trivia_conflicts {
                report.suppressed += 1;
                continue;
            }
            report.conflicts.push(ClassifiedConflict { conflict, verdict });
        }

        if self.settings.detect_shared_declarations {
            report.shared_declarations = shared_declarations(&local_changes, &remote_changes);
        }

        info!(
            conflicts = report.conflicts.len(),
            semantic = report.semantic_conflicts().count(),
            suppressed = report.suppressed,
            trivia_edits = report.trivia_edits,
            shared_declarations = report.shared_declarations.len(),
            "analysis complete"
        );
        Ok(report)
    }
}

impl Default for ConflictAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisSettings::default())
    }
}

/// Classify one conflict produced by the detector.
pub fn classify(conflict: &Conflict) -> Verdict {
    if conflict.changes().iter().all(|c| !change_is_semantic(&c.change)) {
        return Verdict::TriviaOnly;
    }
    if is_convergent(conflict) {
        return Verdict::Convergent;
    }
    Verdict::Semantic
}

/// The edit touches only trivia in both the ancestor and the changed tree.
///
/// For indentation-sensitive languages, whitespace that changes how the
/// next line of code is indented is not trivia.
pub fn change_is_trivia(change: &ChangeRecord) -> bool {
    span_is_trivia(change.ancestor_tree(), change.ancestor_span)
        && span_is_trivia(change.changed_tree(), change.changed_span)
        && !reindents(change)
}

/// The edit alters code, not just its formatting.
pub fn change_is_semantic(change: &ChangeRecord) -> bool {
    if change_is_trivia(change) {
        return false;
    }
    let before = hull_node(change.ancestor_tree(), change.ancestor_span);
    let after = hull_node(change.changed_tree(), change.changed_span);
    nodes_differ(before, after)
}

fn span_is_trivia(tree: &SourceTree, span: SpanInterval) -> bool {
    tree.covers_only_trivia(span) || is_span_in_node_trivia(span, tree.find_node(span))
}

fn reindents(change: &ChangeRecord) -> bool {
    let ancestor = change.ancestor_tree();
    ancestor.language().is_indentation_sensitive()
        && ancestor.indentation_at(change.ancestor_span.start)
            != change.changed_tree().indentation_at(change.changed_span.start)
}

/// Subtrees differ, or equal subtrees moved under a different parent.
fn nodes_differ(a: SyntaxNode<'_>, b: SyntaxNode<'_>) -> bool {
    is_semantic_change(a, b) || contexts_differ(a, b)
}

/// Smallest node around the code an edit touches, ignoring the whitespace
/// at the edges of line- or word-sized edits.
fn hull_node(tree: &SourceTree, span: SpanInterval) -> SyntaxNode<'_> {
    tree.find_node(tree.token_hull(span).unwrap_or(span))
}

fn is_convergent(conflict: &Conflict) -> bool {
    let (Some(local), Some(remote)) = (conflict.local(), conflict.remote()) else {
        return false;
    };
    if base_cover(conflict, OriginTag::Local) != base_cover(conflict, OriginTag::Remote) {
        return false;
    }
    if local.text() == remote.text() {
        return true;
    }
    match (info_hull(local), info_hull(remote)) {
        (Some(l), Some(r)) => !nodes_differ(l, r),
        _ => false,
    }
}

fn base_cover(conflict: &Conflict, origin: OriginTag) -> Option<SpanInterval> {
    conflict
        .changes_from(origin)
        .map(|c| c.change.ancestor_span)
        .reduce(|acc, span| acc.cover(&span))
}

fn info_hull(info: &ConflictInfo) -> Option<SyntaxNode<'_>> {
    let tree = info.tree();
    tree.token_hull(info.span()).map(|hull| tree.find_node(hull))
}

/// Innermost declarations edited by both sides where no local edit
/// intersects a remote edit.
pub fn shared_declarations(local: &[ChangeRecord], remote: &[ChangeRecord]) -> Vec<SharedDeclaration> {
    let mut touched: BTreeMap<SpanInterval, SharedDeclaration> = BTreeMap::new();

    for (origin, changes) in [(OriginTag::Local, local), (OriginTag::Remote, remote)] {
        for change in changes.iter().filter(|c| change_is_semantic(c)) {
            let ancestor = change.ancestor_tree();
            let anchor = ancestor
                .token_hull(change.ancestor_span)
                .unwrap_or(change.ancestor_span);
            let Some(declaration) = ancestor.enclosing_declarations(anchor).into_iter().next() else {
                continue;
            };
            let entry = touched
                .entry(declaration.span)
                .or_insert_with(|| SharedDeclaration {
                    declaration,
                    local_spans: Vec::new(),
                    remote_spans: Vec::new(),
                });
            match origin {
                OriginTag::Local => entry.local_spans.push(change.ancestor_span),
                OriginTag::Remote => entry.remote_spans.push(change.ancestor_span),
            }
        }
    }

    touched
        .into_values()
        .filter(|shared| {
            !shared.local_spans.is_empty()
                && !shared.remote_spans.is_empty()
                && !shared
                    .local_spans
                    .iter()
                    .any(|l| shared.remote_spans.iter().any(|r| l.intersects(r)))
        })
        .collect()
}
