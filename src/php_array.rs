//! PhpArray: public layer over `LinkedTable`. Adds key coercion, the
//! persistent cursor, and the sorting and set operations.

use crate::error::ArrayError;
use crate::iter::{Cursor, IntoIter, Iter};
use crate::key::{ArrayKey, FlipKey};
use crate::linked_table::LinkedTable;
use core::cmp::Ordering;
use core::fmt;
use core::hash::BuildHasher;
use hashbrown::hash_map::DefaultHashBuilder;

/// Slot count of an array built with `new`.
pub const DEFAULT_CAPACITY: usize = 4;

/// Ordered string-keyed map in the manner of a scripting-language array.
///
/// Lookups go through a linear-probing table of `capacity()` slots that is
/// kept at most half full; iteration follows insertion order. Integer keys
/// are stored as their decimal strings.
///
/// The `each`/`reset` cursor is a single field of the array, not an
/// iterator the caller owns. Mutating the array between `each` calls leaves
/// the remaining sequence unspecified (it stays memory safe; a cursor left on
/// a removed entry simply ends).
#[derive(Clone)]
pub struct PhpArray<V, S = DefaultHashBuilder> {
    table: LinkedTable<V, S>,
    cursor: Cursor,
}

impl<V> PhpArray<V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` is the number of probe slots, clamped to at least one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<V> Default for PhpArray<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn by_value<V: PartialOrd>(a: &V, b: &V) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Stable merge sort that gives up on the first incomparable pair it meets.
/// Never hands an inconsistent comparator to `slice::sort_by`.
fn merge_sorted<V: PartialOrd>(mut run: Vec<&V>) -> Option<Vec<&V>> {
    if run.len() <= 1 {
        return Some(run);
    }
    let right = run.split_off(run.len() / 2);
    let left = merge_sorted(run)?;
    let right = merge_sorted(right)?;

    let mut out = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match right[j].partial_cmp(left[i])? {
            Ordering::Less => {
                out.push(right[j]);
                j += 1;
            }
            _ => {
                out.push(left[i]);
                i += 1;
            }
        }
    }
    out.extend_from_slice(&left[i..]);
    out.extend_from_slice(&right[j..]);
    Some(out)
}

impl<V, S> PhpArray<V, S>
where
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            table: LinkedTable::with_capacity_and_hasher(capacity, hasher),
            cursor: Cursor::Unbound,
        }
    }

    #[doc(alias = "length")]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Current number of probe slots.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    pub fn contains_key<K: ArrayKey>(&self, key: K) -> bool {
        self.table.find(&key.to_key()).is_some()
    }

    pub fn get<K: ArrayKey>(&self, key: K) -> Option<&V> {
        self.table.get(&key.to_key())
    }

    pub fn get_mut<K: ArrayKey>(&mut self, key: K) -> Option<&mut V> {
        self.table.get_mut(&key.to_key())
    }

    /// Inserts at the end of the order, or replaces the value of an existing
    /// key without moving it. Returns the replaced value.
    pub fn put<K: ArrayKey>(&mut self, key: K, value: V) -> Option<V> {
        self.table.upsert(key.to_key().into_owned(), value)
    }

    /// `put` with an absent value: `None` removes the key instead.
    pub fn put_opt<K: ArrayKey>(&mut self, key: K, value: Option<V>) -> Option<V> {
        match value {
            Some(v) => self.put(key, v),
            None => self.unset(key),
        }
    }

    /// Removes `key`, returning its value. Missing keys are a no-op.
    pub fn unset<K: ArrayKey>(&mut self, key: K) -> Option<V> {
        self.table.remove(&key.to_key()).map(|(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.cursor = Cursor::Unbound;
    }

    /// Snapshot of the keys in insertion order.
    pub fn keys(&self) -> Vec<&str> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// Snapshot of the values in insertion order.
    pub fn values(&self) -> Vec<&V> {
        self.iter().map(|(_, v)| v).collect()
    }

    pub fn iter(&self) -> Iter<'_, V> {
        self.table.iter()
    }

    /// Returns the pair under the cursor and advances it; `None` once the
    /// cursor has passed the last entry. The first call after construction
    /// starts at the head.
    pub fn each(&mut self) -> Option<(&str, &V)> {
        let entry = self.cursor.step(self.table.entries(), self.table.head())?;
        Some((entry.key.as_str(), &entry.value))
    }

    /// Rewinds the cursor to the current head.
    pub fn reset(&mut self) {
        self.cursor = Cursor::rebind(self.table.head());
    }

    /// Slot-by-slot dump of the probe table, for diagnostics.
    pub fn raw_slots(&self) -> RawSlots<'_, V, S> {
        RawSlots { array: self }
    }
}

impl<V, S> PhpArray<V, S>
where
    S: BuildHasher + Clone,
{
    fn empty_like<T>(&self) -> PhpArray<T, S> {
        PhpArray::with_capacity_and_hasher(self.capacity(), self.table.hasher().clone())
    }

    /// Takes every pair out in list order, leaving an empty table of the
    /// same capacity and an unbound cursor.
    fn drain_ordered(&mut self) -> IntoIter<V> {
        let fresh = LinkedTable::with_capacity_and_hasher(self.capacity(), self.hasher().clone());
        self.cursor = Cursor::Unbound;
        core::mem::replace(&mut self.table, fresh).into_ordered()
    }

    /// Fails unless every pair of stored values is comparable. Borrowed
    /// values are merge sorted and the sorted run must then form a chain of
    /// `Less`/`Equal` steps, which covers every pair by transitivity.
    fn ensure_ordered(&self) -> Result<(), ArrayError>
    where
        V: PartialOrd,
    {
        let sorted = merge_sorted(self.values());
        let chained = sorted.as_ref().is_some_and(|run| {
            run.windows(2).all(|w| {
                matches!(w[0].partial_cmp(w[1]), Some(Ordering::Less | Ordering::Equal))
            })
        });
        if !chained {
            tracing::debug!(len = self.len(), "refusing to sort incomparable values");
            return Err(ArrayError::NotComparable);
        }
        Ok(())
    }

    /// Sorts by value and re-keys the entries `"0"..`. Stable. On error the
    /// array is left untouched.
    pub fn sort(&mut self) -> Result<(), ArrayError>
    where
        V: PartialOrd,
    {
        if self.is_empty() {
            return Ok(());
        }
        self.ensure_ordered()?;
        let mut values: Vec<V> = self.drain_ordered().map(|(_, v)| v).collect();
        values.sort_by(by_value);
        tracing::trace!(len = values.len(), "re-keyed sorted values");
        for (i, v) in values.into_iter().enumerate() {
            self.table.upsert(i.to_string(), v);
        }
        Ok(())
    }

    /// Sorts by value keeping each key with its value. Stable: equal values
    /// keep their insertion order and none is dropped.
    pub fn asort(&mut self) -> Result<(), ArrayError>
    where
        V: PartialOrd,
    {
        if self.is_empty() {
            return Ok(());
        }
        self.ensure_ordered()?;
        let mut pairs: Vec<(String, V)> = self.drain_ordered().collect();
        pairs.sort_by(|a, b| by_value(&a.1, &b.1));
        tracing::trace!(len = pairs.len(), "rebuilt value-sorted pairs");
        for (k, v) in pairs {
            self.table.upsert(k, v);
        }
        Ok(())
    }

    /// New array mapping each value to its key. When values repeat the
    /// later key wins, at the position of the first.
    pub fn array_flip(&self) -> Result<PhpArray<String, S>, ArrayError>
    where
        V: FlipKey,
    {
        let mut flipped = self.empty_like();
        for (key, value) in self.iter() {
            let Some(new_key) = value.flip_key() else {
                tracing::debug!(key, "value has no key form");
                return Err(ArrayError::TypeMismatch {
                    key: key.to_string(),
                });
            };
            flipped.put(new_key, key.to_string());
        }
        Ok(flipped)
    }

    /// Pairs of `other` whose key is also here with an equal value, in
    /// `other`'s order. `None` when either side is empty.
    pub fn intersect<S2>(&self, other: &PhpArray<V, S2>) -> Option<PhpArray<V, S>>
    where
        V: PartialEq + Clone,
        S2: BuildHasher,
    {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let mut out = self.empty_like();
        for (key, theirs) in other.iter() {
            match self.get(key) {
                Some(ours) if ours == theirs => {
                    out.put(key, ours.clone());
                }
                _ => {}
            }
        }
        Some(out)
    }

    /// Keys present on both sides with different values (keeping this
    /// array's value) and keys present on one side only. `other`'s keys come
    /// first, then this array's leftovers. `None` when either side is empty.
    pub fn difference<S2>(&self, other: &PhpArray<V, S2>) -> Option<PhpArray<V, S>>
    where
        V: PartialEq + Clone,
        S2: BuildHasher,
    {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let mut out = self.empty_like();
        for (key, theirs) in other.iter() {
            match self.get(key) {
                Some(ours) if ours != theirs => {
                    out.put(key, ours.clone());
                }
                Some(_) => {}
                None => {
                    out.put(key, theirs.clone());
                }
            }
        }
        for (key, ours) in self.iter() {
            if !other.contains_key(key) {
                out.put(key, ours.clone());
            }
        }
        Some(out)
    }
}

/// Display adapter from `PhpArray::raw_slots`: one line per slot,
/// `i: null` or `i: Key: k Value: v`.
pub struct RawSlots<'a, V, S> {
    array: &'a PhpArray<V, S>,
}

impl<V, S> fmt::Display for RawSlots<'_, V, S>
where
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, slot) in self.array.table.slots().enumerate() {
            match slot {
                None => writeln!(f, "{}: null", i)?,
                Some(e) => writeln!(f, "{}: Key: {} Value: {:?}", i, e.key, e.value)?,
            }
        }
        Ok(())
    }
}

impl<V, S> fmt::Debug for PhpArray<V, S>
where
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equal when both hold the same pairs in the same order.
impl<V, S, S2> PartialEq<PhpArray<V, S2>> for PhpArray<V, S>
where
    V: PartialEq,
    S: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &PhpArray<V, S2>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<V: Eq, S: BuildHasher> Eq for PhpArray<V, S> {}

impl<K, V, S> Extend<(K, V)> for PhpArray<V, S>
where
    K: ArrayKey,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for PhpArray<V, S>
where
    K: ArrayKey,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut array = Self::with_hasher(S::default());
        array.extend(iter);
        array
    }
}

impl<'a, V, S: BuildHasher> IntoIterator for &'a PhpArray<V, S> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V, S: BuildHasher> IntoIterator for PhpArray<V, S> {
    type Item = (String, V);
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_ordered()
    }
}
