//! Three-way conflict detection over structural diffs.
//!
//! Local and remote edits are both expressed against the ancestor, merged
//! into one stream ordered by ancestor position, and scanned greedily into
//! overlap groups. A group becomes a [`Conflict`] once it holds two or more
//! edits.
//!
//! The scan compares each candidate with the most recently grouped edit
//! only, not with every member of the group. A long edit followed by a short
//! one can therefore close the group before a later edit that still
//! overlaps the long one; that edit starts a new group.

use std::iter::Peekable;
use std::sync::Arc;

use semconflict_core::DiffGranularity;
use tracing::{debug, trace};

use crate::change::{Tagged, TaggedChange};
use crate::conflict::Conflict;
use crate::diff::{ChangeRecords, StructuralDiff};
use crate::error::Result;
use crate::merge_queue::MergeQueue;
use crate::tree::SourceTree;
use crate::types::OriginTag;

type ChangeKey = fn(&TaggedChange) -> usize;

fn by_ancestor_start(change: &TaggedChange) -> usize {
    change.ancestor_start()
}

/// Drives two structural diffs and yields the conflicts between them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeWayConflictDetector {
    diff: StructuralDiff,
}

impl ThreeWayConflictDetector {
    pub fn new(granularity: DiffGranularity) -> Self {
        Self {
            diff: StructuralDiff::new(granularity),
        }
    }

    pub fn structural_diff(&self) -> &StructuralDiff {
        &self.diff
    }

    /// Lazily compare `local` and `remote` against their common `ancestor`.
    pub fn compare(
        &self,
        ancestor: &Arc<SourceTree>,
        local: &Arc<SourceTree>,
        remote: &Arc<SourceTree>,
    ) -> Result<Conflicts<Tagged<ChangeRecords>, Tagged<ChangeRecords>>> {
        let local_changes = self.diff.compare(ancestor, local)?;
        let remote_changes = self.diff.compare(ancestor, remote)?;
        debug!(
            language = %ancestor.language(),
            local_edits = local_changes.len(),
            remote_edits = remote_changes.len(),
            "comparing three-way"
        );
        Ok(group_conflicts(
            OriginTag::Local.tag(local_changes),
            OriginTag::Remote.tag(remote_changes),
        ))
    }
}

/// Group two ancestor-ordered tagged streams into conflicts.
pub fn group_conflicts<L, R>(local: L, remote: R) -> Conflicts<L::IntoIter, R::IntoIter>
where
    L: IntoIterator<Item = TaggedChange>,
    R: IntoIterator<Item = TaggedChange>,
{
    Conflicts::new(local.into_iter(), remote.into_iter())
}

/// Lazy stream of conflicts. Stopping early leaves nothing to clean up.
pub struct Conflicts<L, R>
where
    L: Iterator<Item = TaggedChange>,
    R: Iterator<Item = TaggedChange>,
{
    queue: Peekable<MergeQueue<L, R, ChangeKey>>,
}

impl<L, R> Conflicts<L, R>
where
    L: Iterator<Item = TaggedChange>,
    R: Iterator<Item = TaggedChange>,
{
    pub fn new(local: L, remote: R) -> Self {
        Self {
            queue: MergeQueue::new(local, remote, by_ancestor_start as ChangeKey).peekable(),
        }
    }
}

impl<L, R> Iterator for Conflicts<L, R>
where
    L: Iterator<Item = TaggedChange>,
    R: Iterator<Item = TaggedChange>,
{
    type Item = Conflict;

    fn next(&mut self) -> Option<Conflict> {
        loop {
            let first = self.queue.next()?;
            let mut previous = first.change.ancestor_span;
            let mut group = vec![first];

            while let Some(next) = self
                .queue
                .next_if(move |candidate| candidate.change.ancestor_span.intersects(&previous))
            {
                previous = next.change.ancestor_span;
                group.push(next);
            }

            if group.len() >= 2 {
                let conflict = Conflict::from_group(group);
                if let Some(ancestor) = conflict.ancestor() {
                    debug!(
                        span = %ancestor.span(),
                        edits = conflict.changes().len(),
                        two_sided = conflict.is_two_sided(),
                        "conflict"
                    );
                }
                return Some(conflict);
            }
            trace!(span = %previous, origin = %group[0].origin, "isolated edit");
        }
    }
}
