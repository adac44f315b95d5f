//! Debug-only structure guard for `LinkedTable`.
//!
//! The slot array and the insertion-order list index the same arena entries,
//! and several mutations leave them out of step for a while:
//! - `upsert` may rebuild every slot before it probes, then writes the slot
//!   and links the list tail as two separate steps.
//! - `remove` clears a slot and unlinks the entry, then lifts each entry of
//!   the following cluster out of its slot and re-places it. Until the walk
//!   ends, a live key can be missing from its probe path.
//!
//! The only code that can run inside those windows is the table's own
//! `BuildHasher`. If it reaches back into the table, a lookup there could
//! miss live keys or follow a half-linked list. In debug builds the guard
//! turns that into a panic. Release builds compile it away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table busy marker. Entry points start with
/// `let _busy = self.guard.enter();`.
#[derive(Debug)]
pub(crate) struct StructureGuard {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // Single-threaded: keep the owner !Send + !Sync.
    _local: PhantomData<*mut ()>,
}

impl StructureGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _local: PhantomData,
        }
    }

    /// Marks the table busy until the returned token drops. Panics in debug
    /// builds when the table is already busy.
    #[inline]
    pub(crate) fn enter(&self) -> Busy<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "re-entered a table while it was being updated"
            );
            return Busy { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return Busy { _z: PhantomData };
        }
    }
}

impl Default for StructureGuard {
    fn default() -> Self {
        Self::new()
    }
}

// A clone is a new table; it starts idle.
impl Clone for StructureGuard {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Token returned by `StructureGuard::enter`.
pub(crate) struct Busy<'a> {
    #[cfg(debug_assertions)]
    owner: &'a StructureGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.owner.busy.set(false);
        }
    }
}
