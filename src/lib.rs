//! php-array: an insertion-ordered, string-keyed map with the behavior of a
//! scripting-language array. Linear-probing lookup, a stateful `each`/`reset`
//! cursor, and sort/flip/intersect/difference built on top.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep two structures over the same entries consistent through
//!   every mutation: an open-addressing table for O(1) expected lookup and a
//!   doubly-linked list for insertion order.
//! - Layers:
//!   - LinkedTable<V, S>: structural layer. A slot array (linear probing)
//!     and the list both refer to entries in one `SlotMap` arena by handle.
//!     Implements probing, growth, shrinking, and the cluster rehash that
//!     removal requires.
//!   - PhpArray<V, S>: public API. Key coercion (integers become decimal
//!     strings), the persistent cursor, snapshots, and the derived
//!     operations that rebuild from a full traversal.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (the debug guard holds a raw marker).
//! - Load factor stays at or below 1/2: an insert that finds the table half
//!   full doubles it first. A removal that leaves it at or below 1/8 full
//!   halves it once.
//! - Every occupied slot is reachable from its home slot with no empty slot
//!   in between. Removing an entry re-places the rest of its cluster.
//! - The list holds exactly the entries in the slots. Overwrites and
//!   resizes never reorder it.
//!
//! Ownership
//! - The arena owns entries. Slots and `next`/`prev` links are generational
//!   handles, so a stale handle (for example a cursor left on a removed
//!   entry) resolves to nothing rather than to a newer entry.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash. Resize and cluster rehash place
//!   entries from the stored hash and never call `S` again.
//! - `S: BuildHasher` is the only user code that runs while the structures
//!   are in flux. A debug-only guard panics if it re-enters the table.
//!
//! Iteration
//! - `iter`, `keys`, `values` walk the list from the head each time.
//! - `each`/`reset` share a single cursor stored in the array. Mutating the
//!   array mid-walk gives an unspecified (but memory-safe) sequence.
//!
//! Derived operations
//! - `sort` re-keys `"0".."n-1"` by ascending value; `asort` keeps keys.
//!   Both are stable and fail with `ArrayError::NotComparable`, leaving the
//!   array untouched, when some pair of values has no order.
//! - `array_flip` fails with `ArrayError::TypeMismatch` when a value has
//!   no key form (see `FlipKey`).
//! - `intersect`/`difference` return `None` when either side is empty.
//!
//! Notes and non-goals
//! - Keys are strings only. No thread safety, no persistence.
//! - Optional `serde` feature: serializes as a map in insertion order.

mod error;
mod guard;
mod iter;
mod key;
mod linked_table;
mod linked_table_proptest;
mod php_array;
#[cfg(feature = "serde")]
mod serde;
mod value;

// Public surface
pub use error::ArrayError;
pub use iter::{IntoIter, Iter};
pub use key::{ArrayKey, FlipKey};
pub use php_array::{PhpArray, RawSlots, DEFAULT_CAPACITY};
pub use value::Value;
