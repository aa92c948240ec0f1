//! Conflict records handed to the reporting layer.

use std::sync::{Arc, OnceLock};

use crate::change::TaggedChange;
use crate::tree::{Declaration, SourceTree, SyntaxNode};
use crate::types::{OriginTag, SpanInterval};

/// One side's view into a conflicting region.
#[derive(Debug, Clone)]
pub struct ConflictInfo {
    span: SpanInterval,
    tree: Arc<SourceTree>,
    declarations: OnceLock<Vec<Declaration>>,
}

impl ConflictInfo {
    pub fn new(span: SpanInterval, tree: Arc<SourceTree>) -> Self {
        Self {
            span,
            tree,
            declarations: OnceLock::new(),
        }
    }

    /// Covering span of `spans` over `tree`; `None` when `spans` is empty.
    pub fn covering<I>(spans: I, tree: &Arc<SourceTree>) -> Option<Self>
    where
        I: IntoIterator<Item = SpanInterval>,
    {
        spans
            .into_iter()
            .reduce(|acc, span| acc.cover(&span))
            .map(|span| Self::new(span, tree.clone()))
    }

    pub fn span(&self) -> SpanInterval {
        self.span
    }

    pub fn tree(&self) -> &Arc<SourceTree> {
        &self.tree
    }

    pub fn text(&self) -> &str {
        self.tree.text(self.span)
    }

    pub fn node(&self) -> SyntaxNode<'_> {
        self.tree.find_node(self.span)
    }

    /// Declarations enclosing this region, innermost first. Computed on
    /// first access.
    pub fn enclosing_declarations(&self) -> &[Declaration] {
        self.declarations
            .get_or_init(|| self.tree.enclosing_declarations(self.span))
    }
}

/// A region where two or more edits of the merged local/remote stream overlap.
#[derive(Debug, Clone)]
pub struct Conflict {
    ancestor: Option<ConflictInfo>,
    local: Option<ConflictInfo>,
    remote: Option<ConflictInfo>,
    changes: Vec<TaggedChange>,
}

impl Conflict {
    /// Build a conflict from one overlap group, in merged-stream order.
    pub fn from_group(changes: Vec<TaggedChange>) -> Self {
        let ancestor = changes.first().and_then(|first| {
            ConflictInfo::covering(
                changes.iter().map(|c| c.change.ancestor_span),
                first.change.ancestor_tree(),
            )
        });
        let local = side_info(&changes, OriginTag::Local);
        let remote = side_info(&changes, OriginTag::Remote);
        Self {
            ancestor,
            local,
            remote,
            changes,
        }
    }

    pub fn ancestor(&self) -> Option<&ConflictInfo> {
        self.ancestor.as_ref()
    }

    pub fn local(&self) -> Option<&ConflictInfo> {
        self.local.as_ref()
    }

    pub fn remote(&self) -> Option<&ConflictInfo> {
        self.remote.as_ref()
    }

    pub fn side(&self, origin: OriginTag) -> Option<&ConflictInfo> {
        match origin {
            OriginTag::Local => self.local(),
            OriginTag::Remote => self.remote(),
        }
    }

    /// The grouped edits, in merged-stream order.
    pub fn changes(&self) -> &[TaggedChange] {
        &self.changes
    }

    pub fn changes_from(&self, origin: OriginTag) -> impl Iterator<Item = &TaggedChange> {
        self.changes.iter().filter(move |c| c.origin == origin)
    }

    /// Both local and remote edits take part in this conflict.
    pub fn is_two_sided(&self) -> bool {
        self.local.is_some() && self.remote.is_some()
    }
}

fn side_info(changes: &[TaggedChange], origin: OriginTag) -> Option<ConflictInfo> {
    let mut members = changes.iter().filter(|c| c.origin == origin).peekable();
    let tree = members.peek()?.change.changed_tree().clone();
    ConflictInfo::covering(members.map(|c| c.change.changed_span), &tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeRecord;
    use crate::types::Language;

    const ANCESTOR: &str = "fn total(n: u32) -> u32 {\n    let mut t = 0;\n    t\n}\n";

    fn trees() -> (Arc<SourceTree>, Arc<SourceTree>, Arc<SourceTree>) {
        let parse = |s: &str| Arc::new(SourceTree::parse(s, Language::Rust).unwrap());
        (
            parse(ANCESTOR),
            parse("fn total(n: u32) -> u32 {\n    let mut t = 1;\n    t\n}\n"),
            parse("fn total(n: u32) -> u32 {\n    let mut t: u32 = 0;\n    t\n}\n"),
        )
    }

    #[test]
    fn test_from_group_builds_each_side() {
        let (a, l, r) = trees();
        let local = ChangeRecord::new(SpanInterval::new(30, 14), SpanInterval::new(30, 14), a.clone(), l);
        let remote = ChangeRecord::new(SpanInterval::new(26, 20), SpanInterval::new(26, 25), a.clone(), r);
        let conflict = Conflict::from_group(vec![
            TaggedChange::new(remote, OriginTag::Remote),
            TaggedChange::new(local, OriginTag::Local),
        ]);

        assert!(conflict.is_two_sided());
        assert_eq!(conflict.ancestor().unwrap().span(), SpanInterval::from_bounds(26, 46));
        assert_eq!(conflict.local().unwrap().span(), SpanInterval::new(30, 14));
        assert_eq!(conflict.remote().unwrap().span(), SpanInterval::new(26, 25));
        assert_eq!(conflict.changes_from(OriginTag::Local).count(), 1);
        assert_eq!(conflict.local().unwrap().text(), "let mut t = 1;");
        assert!(Arc::ptr_eq(conflict.ancestor().unwrap().tree(), &a));
    }

    #[test]
    fn test_one_sided_group_has_no_other_side() {
        let (a, l, _) = trees();
        let first = ChangeRecord::new(SpanInterval::new(30, 3), SpanInterval::new(30, 3), a.clone(), l.clone());
        let second = ChangeRecord::new(SpanInterval::new(33, 2), SpanInterval::new(33, 2), a, l);
        let conflict = Conflict::from_group(vec![
            TaggedChange::new(first, OriginTag::Local),
            TaggedChange::new(second, OriginTag::Local),
        ]);
        assert!(conflict.remote().is_none());
        assert!(!conflict.is_two_sided());
        assert_eq!(conflict.local().unwrap().span(), SpanInterval::from_bounds(30, 35));
    }

    #[test]
    fn test_enclosing_declarations_are_lazy_and_cached() {
        let (a, _, _) = trees();
        let info = ConflictInfo::new(SpanInterval::new(30, 14), a);
        let first = info.enclosing_declarations().as_ptr();
        let decls = info.enclosing_declarations();
        assert_eq!(decls.as_ptr(), first);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name.as_deref(), Some("total"));
    }

    #[test]
    fn test_covering_empty_is_none() {
        let (a, _, _) = trees();
        assert!(ConflictInfo::covering(Vec::<SpanInterval>::new(), &a).is_none());
    }
}
