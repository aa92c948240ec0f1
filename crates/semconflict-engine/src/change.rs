//! Change records produced by a structural diff, and their origin tags.

use std::sync::Arc;

use crate::tree::{SourceTree, SyntaxNode};
use crate::types::{OriginTag, SpanInterval};

/// One edit between an ancestor tree and a changed tree.
///
/// `ancestor_span` is always in ancestor coordinates and `changed_span`
/// always in changed-tree coordinates. Both trees are shared, never copied.
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    pub ancestor_span: SpanInterval,
    pub changed_span: SpanInterval,
    ancestor: Arc<SourceTree>,
    changed: Arc<SourceTree>,
}

impl ChangeRecord {
    pub fn new(
        ancestor_span: SpanInterval,
        changed_span: SpanInterval,
        ancestor: Arc<SourceTree>,
        changed: Arc<SourceTree>,
    ) -> Self {
        Self {
            ancestor_span,
            changed_span,
            ancestor,
            changed,
        }
    }

    pub fn ancestor_tree(&self) -> &Arc<SourceTree> {
        &self.ancestor
    }

    pub fn changed_tree(&self) -> &Arc<SourceTree> {
        &self.changed
    }

    /// Shift of the start boundary from ancestor to changed coordinates.
    pub fn offset_start(&self) -> isize {
        self.changed_span.start as isize - self.ancestor_span.start as isize
    }

    /// Shift of the end boundary from ancestor to changed coordinates.
    pub fn offset_end(&self) -> isize {
        self.changed_span.end() as isize - self.ancestor_span.end() as isize
    }

    pub fn ancestor_text(&self) -> &str {
        self.ancestor.text(self.ancestor_span)
    }

    pub fn changed_text(&self) -> &str {
        self.changed.text(self.changed_span)
    }

    pub fn ancestor_node(&self) -> SyntaxNode<'_> {
        self.ancestor.find_node(self.ancestor_span)
    }

    pub fn changed_node(&self) -> SyntaxNode<'_> {
        self.changed.find_node(self.changed_span)
    }

    /// Boundary-inclusive overlap of the two ancestor spans.
    pub fn intersects(&self, other: &ChangeRecord) -> bool {
        self.ancestor_span.intersects(&other.ancestor_span)
    }
}

/// A change record tagged with the side that produced it.
#[derive(Debug, Clone)]
pub struct TaggedChange {
    pub change: ChangeRecord,
    pub origin: OriginTag,
}

impl TaggedChange {
    pub fn new(change: ChangeRecord, origin: OriginTag) -> Self {
        Self { change, origin }
    }

    pub fn ancestor_start(&self) -> usize {
        self.change.ancestor_span.start
    }

    pub fn intersects(&self, other: &TaggedChange) -> bool {
        self.change.intersects(&other.change)
    }
}

impl OriginTag {
    /// Tag every change produced by `changes` with this origin.
    pub fn tag<I>(self, changes: I) -> Tagged<I::IntoIter>
    where
        I: IntoIterator<Item = ChangeRecord>,
    {
        Tagged {
            inner: changes.into_iter(),
            origin: self,
        }
    }
}

/// Iterator adaptor returned by [`OriginTag::tag`].
#[derive(Debug, Clone)]
pub struct Tagged<I> {
    inner: I,
    origin: OriginTag,
}

impl<I> Iterator for Tagged<I>
where
    I: Iterator<Item = ChangeRecord>,
{
    type Item = TaggedChange;

    fn next(&mut self) -> Option<TaggedChange> {
        self.inner
            .next()
            .map(|change| TaggedChange::new(change, self.origin))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
