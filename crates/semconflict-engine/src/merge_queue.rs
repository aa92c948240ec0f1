//! Two-way merge of pre-sorted sequences.

use std::iter::Peekable;

/// Lazily interleaves two sequences that are each ascending by `key`.
///
/// On equal keys the left sequence drains first, so the output is stable
/// and deterministic. Unsorted inputs produce an unsorted output; nothing
/// is re-checked.
pub struct MergeQueue<L, R, F>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
{
    left: Peekable<L>,
    right: Peekable<R>,
    key: F,
}

impl<L, R, F, K> MergeQueue<L, R, F>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
    F: Fn(&L::Item) -> K,
    K: Ord,
{
    pub fn new(left: L, right: R, key: F) -> Self {
        Self {
            left: left.peekable(),
            right: right.peekable(),
            key,
        }
    }
}

/// Merge two ascending sequences into one.
pub fn merge<L, R, F, K>(left: L, right: R, key: F) -> MergeQueue<L::IntoIter, R::IntoIter, F>
where
    L: IntoIterator,
    R: IntoIterator<Item = L::Item>,
    F: Fn(&L::Item) -> K,
    K: Ord,
{
    MergeQueue::new(left.into_iter(), right.into_iter(), key)
}

impl<L, R, F, K> Iterator for MergeQueue<L, R, F>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
    F: Fn(&L::Item) -> K,
    K: Ord,
{
    type Item = L::Item;

    fn next(&mut self) -> Option<L::Item> {
        let take_left = match (self.left.peek(), self.right.peek()) {
            (Some(l), Some(r)) => (self.key)(l) <= (self.key)(r),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => return None,
        };
        if take_left {
            self.left.next()
        } else {
            self.right.next()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (l_lo, l_hi) = self.left.size_hint();
        let (r_lo, r_hi) = self.right.size_hint();
        let hi = match (l_hi, r_hi) {
            (Some(a), Some(b)) => a.checked_add(b),
            _ => None,
        };
        (l_lo.saturating_add(r_lo), hi)
    }
}
