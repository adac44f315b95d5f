//! Insertion-order iterators and the persistent `each`/`reset` cursor.

use crate::linked_table::{Entry, Handle};
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SlotMap};

/// Borrowing iterator over `(key, value)` pairs in insertion order.
///
/// Built from the list head each time; it cannot be rewound.
pub struct Iter<'a, V> {
    entries: &'a SlotMap<DefaultKey, Entry<V>>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(
        entries: &'a SlotMap<DefaultKey, Entry<V>>,
        front: Option<Handle>,
        back: Option<Handle>,
        remaining: usize,
    ) -> Self {
        Self {
            entries,
            front,
            back,
            remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entries = self.entries;
        let e = entries.get(self.front?.raw())?;
        self.front = e.next;
        self.remaining -= 1;
        Some((e.key.as_str(), &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entries = self.entries;
        let e = entries.get(self.back?.raw())?;
        self.back = e.prev;
        self.remaining -= 1;
        Some((e.key.as_str(), &e.value))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

/// Owning iterator over `(key, value)` pairs in insertion order.
pub struct IntoIter<V> {
    entries: SlotMap<DefaultKey, Entry<V>>,
    next: Option<Handle>,
}

impl<V> IntoIter<V> {
    pub(crate) fn new(entries: SlotMap<DefaultKey, Entry<V>>, head: Option<Handle>) -> Self {
        Self {
            entries,
            next: head,
        }
    }
}

impl<V> Iterator for IntoIter<V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        let e = self.entries.remove(self.next?.raw())?;
        self.next = e.next;
        Some((e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.entries.len(), Some(self.entries.len()))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}
impl<V> FusedIterator for IntoIter<V> {}

/// State behind `each`/`reset`. One per array, shared by every caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Cursor {
    /// Never used since creation or the last rebuild; binds to the head on
    /// the next step.
    #[default]
    Unbound,
    At(Handle),
    Exhausted,
}

impl Cursor {
    pub(crate) fn rebind(head: Option<Handle>) -> Self {
        head.map_or(Cursor::Exhausted, Cursor::At)
    }

    /// Yields the entry under the cursor and moves past it. A cursor left on
    /// a removed entry reports exhaustion.
    pub(crate) fn step<'a, V>(
        &mut self,
        entries: &'a SlotMap<DefaultKey, Entry<V>>,
        head: Option<Handle>,
    ) -> Option<&'a Entry<V>> {
        let at = match *self {
            Cursor::Unbound => head,
            Cursor::At(h) => Some(h),
            Cursor::Exhausted => None,
        };
        let entry = at.and_then(|h| entries.get(h.raw()));
        *self = Cursor::rebind(entry.and_then(|e| e.next));
        entry
    }
}
