//! LinkedTable: structural layer. A linear-probing slot array and an
//! insertion-order list, both threaded through one entry arena.

use crate::guard::StructureGuard;
use crate::iter::{IntoIter, Iter};
use core::hash::BuildHasher;
use core::mem;
use slotmap::{DefaultKey, SlotMap};

/// Stable arena handle. Generational, so a handle to a removed entry never
/// resolves to a later one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw(&self) -> DefaultKey {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Entry<V> {
    pub(crate) key: String,
    pub(crate) value: V,
    hash: u64,
    pub(crate) prev: Option<Handle>,
    pub(crate) next: Option<Handle>,
}

/// Slot array, arena and list ends. Everything here works on stored hashes,
/// so none of it calls back into the hasher.
#[derive(Debug, Clone)]
struct Store<V> {
    slots: Vec<Option<Handle>>,
    entries: SlotMap<DefaultKey, Entry<V>>,
    head: Option<Handle>,
    tail: Option<Handle>,
}

impl<V> Store<V> {
    fn with_slots(m: usize) -> Self {
        Self {
            slots: vec![None; m.max(1)],
            entries: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    #[inline]
    fn home(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    /// `Ok(slot)` holding `key`, or `Err(slot)` of the first empty slot on
    /// its probe path.
    fn probe(&self, key: &str, hash: u64) -> Result<usize, usize> {
        let m = self.slots.len();
        let mut i = self.home(hash);
        while let Some(h) = self.slots[i] {
            let e = &self.entries[h.raw()];
            if e.hash == hash && e.key == key {
                return Ok(i);
            }
            i = (i + 1) % m;
        }
        Err(i)
    }

    /// Puts `h` in the first empty slot from its home. List links untouched.
    fn place(&mut self, h: Handle) -> usize {
        let m = self.slots.len();
        let mut i = self.home(self.entries[h.raw()].hash);
        while self.slots[i].is_some() {
            i = (i + 1) % m;
        }
        self.slots[i] = Some(h);
        i
    }

    fn link_back(&mut self, h: Handle) {
        {
            let e = &mut self.entries[h.raw()];
            e.prev = self.tail;
            e.next = None;
        }
        match self.tail {
            Some(t) => self.entries[t.raw()].next = Some(h),
            None => self.head = Some(h),
        }
        self.tail = Some(h);
    }

    fn unlink(&mut self, h: Handle) {
        let (prev, next) = {
            let e = &self.entries[h.raw()];
            (e.prev, e.next)
        };
        match prev {
            Some(p) => self.entries[p.raw()].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entries[n.raw()].prev = prev,
            None => self.tail = prev,
        }
    }

    fn insert_at(&mut self, slot: usize, key: String, value: V, hash: u64) -> Handle {
        let h = Handle::new(self.entries.insert(Entry {
            key,
            value,
            hash,
            prev: None,
            next: None,
        }));
        self.slots[slot] = Some(h);
        self.link_back(h);
        h
    }

    fn remove_at(&mut self, slot: usize) -> Option<Entry<V>> {
        let h = self.slots[slot].take()?;
        self.unlink(h);
        let entry = self.entries.remove(h.raw())?;
        self.rehash_cluster(slot);

        let m = self.slots.len();
        if !self.entries.is_empty() && self.entries.len() <= m / 8 {
            self.resize(m / 2);
        }
        Some(entry)
    }

    /// Re-places every entry of the cluster that follows `freed`, since any
    /// of them may have probed across it.
    fn rehash_cluster(&mut self, freed: usize) {
        let m = self.slots.len();
        let mut i = (freed + 1) % m;
        let mut moved = 0usize;
        while let Some(h) = self.slots[i].take() {
            if self.place(h) != i {
                moved += 1;
            }
            i = (i + 1) % m;
        }
        tracing::trace!(start = freed, moved, "rehashed probe cluster");
    }

    /// Rebuilds the slot array at `new_slots`, placing entries in list
    /// order. The list itself is carried over as is.
    fn resize(&mut self, new_slots: usize) {
        let from = self.slots.len();
        self.slots = vec![None; new_slots.max(1)];
        let mut cur = self.head;
        while let Some(h) = cur {
            self.place(h);
            cur = self.entries[h.raw()].next;
        }
        tracing::debug!(
            from,
            to = self.slots.len(),
            len = self.entries.len(),
            "resized probe table"
        );
    }
}

#[derive(Clone)]
pub(crate) struct LinkedTable<V, S> {
    hasher: S,
    store: Store<V>,
    guard: StructureGuard,
}

impl<V, S> LinkedTable<V, S>
where
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(slots: usize, hasher: S) -> Self {
        Self {
            hasher,
            store: Store::with_slots(slots),
            guard: StructureGuard::new(),
        }
    }

    fn make_hash(&self, key: &str) -> u64 {
        self.hasher.hash_one(key)
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn len(&self) -> usize {
        self.store.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.store.slots.len()
    }

    pub(crate) fn head(&self) -> Option<Handle> {
        self.store.head
    }

    pub(crate) fn entries(&self) -> &SlotMap<DefaultKey, Entry<V>> {
        &self.store.entries
    }

    pub(crate) fn find(&self, key: &str) -> Option<Handle> {
        let _busy = self.guard.enter();
        let hash = self.make_hash(key);
        let slot = self.store.probe(key, hash).ok()?;
        self.store.slots[slot]
    }

    pub(crate) fn get(&self, key: &str) -> Option<&V> {
        let h = self.find(key)?;
        self.store.entries.get(h.raw()).map(|e| &e.value)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let h = self.find(key)?;
        self.store.entries.get_mut(h.raw()).map(|e| &mut e.value)
    }

    /// Inserts at the list tail, or overwrites in place when `key` exists.
    /// Grows first whenever the table is at least half full.
    pub(crate) fn upsert(&mut self, key: String, value: V) -> Option<V> {
        let _busy = self.guard.enter();
        let m = self.store.slots.len();
        if self.store.entries.len() >= m / 2 {
            self.store.resize(m * 2);
        }

        let hash = self.hasher.hash_one(key.as_str());
        match self.store.probe(&key, hash) {
            Ok(slot) => {
                let h = self.store.slots[slot]?;
                let e = self.store.entries.get_mut(h.raw())?;
                Some(mem::replace(&mut e.value, value))
            }
            Err(slot) => {
                self.store.insert_at(slot, key, value, hash);
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<(String, V)> {
        let _busy = self.guard.enter();
        let hash = self.hasher.hash_one(key);
        let slot = self.store.probe(key, hash).ok()?;
        self.store.remove_at(slot).map(|e| (e.key, e.value))
    }

    pub(crate) fn clear(&mut self) {
        let _busy = self.guard.enter();
        let m = self.store.slots.len();
        self.store = Store::with_slots(m);
    }

    pub(crate) fn iter(&self) -> Iter<'_, V> {
        Iter::new(
            &self.store.entries,
            self.store.head,
            self.store.tail,
            self.store.entries.len(),
        )
    }

    pub(crate) fn into_ordered(self) -> IntoIter<V> {
        IntoIter::new(self.store.entries, self.store.head)
    }

    /// Raw slot contents, index order.
    pub(crate) fn slots(&self) -> impl Iterator<Item = Option<&Entry<V>>> + '_ {
        self.store
            .slots
            .iter()
            .map(move |s| s.and_then(|h| self.store.entries.get(h.raw())))
    }

    /// Panics unless the slot array and the list describe the same entries
    /// and every entry is reachable by probing from its home slot.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashSet;

        let s = &self.store;
        let m = s.slots.len();
        let n = s.entries.len();
        assert!(n <= m / 2 || n == 0, "load factor above 1/2: n={n} m={m}");

        let mut in_slots = HashSet::new();
        for (i, slot) in s.slots.iter().enumerate() {
            let Some(h) = slot else { continue };
            assert!(in_slots.insert(*h), "entry occupies two slots");
            let e = s.entries.get(h.raw()).expect("slot refers to a live entry");
            assert_eq!(e.hash, self.make_hash(&e.key), "stale stored hash");
            let mut j = s.home(e.hash);
            while j != i {
                assert!(s.slots[j].is_some(), "gap on probe path of {:?}", e.key);
                j = (j + 1) % m;
            }
        }
        assert_eq!(in_slots.len(), n, "slot count differs from entry count");

        let mut seen = 0usize;
        let mut prev = None;
        let mut cur = s.head;
        while let Some(h) = cur {
            assert!(in_slots.contains(&h), "listed entry missing from slots");
            let e = &s.entries[h.raw()];
            assert_eq!(e.prev, prev, "broken prev link");
            seen += 1;
            assert!(seen <= n, "cycle in list");
            prev = Some(h);
            cur = e.next;
        }
        assert_eq!(seen, n, "list length differs from entry count");
        assert_eq!(s.tail, prev, "tail is not the last listed entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::hash_map::DefaultHashBuilder;
    use std::hash::Hasher;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    fn table<V>() -> LinkedTable<V, DefaultHashBuilder> {
        LinkedTable::with_capacity_and_hasher(4, DefaultHashBuilder::default())
    }

    fn order<V, S: BuildHasher>(t: &LinkedTable<V, S>) -> Vec<&str> {
        t.iter().map(|(k, _)| k).collect()
    }

    /// Invariant: Overwriting an existing key keeps its list position and
    /// returns the previous value.
    #[test]
    fn overwrite_keeps_position() {
        let mut t = table();
        assert_eq!(t.upsert("a".into(), 1), None);
        assert_eq!(t.upsert("b".into(), 2), None);
        assert_eq!(t.upsert("a".into(), 10), Some(1));
        assert_eq!(order(&t), ["a", "b"]);
        assert_eq!(t.get("a"), Some(&10));
        t.check_invariants();
    }

    /// Invariant: The table doubles before an insert that finds it half full.
    #[test]
    fn grows_at_half_load() {
        let mut t = table();
        t.upsert("a".into(), 1);
        t.upsert("b".into(), 2);
        assert_eq!(t.capacity(), 4);
        t.upsert("c".into(), 3);
        assert_eq!(t.capacity(), 8);
        assert_eq!(order(&t), ["a", "b", "c"]);
        t.check_invariants();
    }

    /// Invariant: Growth is checked even when the put only overwrites.
    #[test]
    fn overwrite_at_half_load_still_grows() {
        let mut t = table();
        t.upsert("a".into(), 1);
        t.upsert("b".into(), 2);
        t.upsert("b".into(), 3);
        assert_eq!(t.capacity(), 8);
        assert_eq!(t.len(), 2);
    }

    /// Invariant: Dropping to an eighth of capacity halves the table once.
    #[test]
    fn shrinks_at_one_eighth_load() {
        let mut t = table();
        for i in 0..9 {
            t.upsert(i.to_string(), i);
        }
        assert_eq!(t.capacity(), 32);
        for i in 0..5 {
            t.remove(&i.to_string());
        }
        // 4 left of 32 slots.
        assert_eq!(t.capacity(), 16);
        assert_eq!(order(&t), ["5", "6", "7", "8"]);
        t.check_invariants();
    }

    /// Invariant: With every key colliding, removing the middle of the
    /// cluster keeps the tail of the cluster reachable.
    #[test]
    fn cluster_survives_mid_removal() {
        let mut t = LinkedTable::with_capacity_and_hasher(4, ConstBuildHasher);
        for k in ["a", "b", "c", "d"] {
            t.upsert(k.to_string(), k.to_uppercase());
        }
        assert_eq!(t.remove("b"), Some(("b".to_string(), "B".to_string())));
        t.check_invariants();
        for k in ["a", "c", "d"] {
            assert_eq!(t.get(k), Some(&k.to_uppercase()));
        }
        assert_eq!(t.get("b"), None);
        assert_eq!(order(&t), ["a", "c", "d"]);
    }

    /// Invariant: Removing either end of a two-entry list repairs head and
    /// tail.
    #[test]
    fn two_entry_unlink() {
        let mut t = table();
        t.upsert("x".into(), 1);
        t.upsert("y".into(), 2);
        t.remove("x");
        t.check_invariants();
        assert_eq!(order(&t), ["y"]);
        t.upsert("z".into(), 3);
        assert_eq!(order(&t), ["y", "z"]);

        t.remove("z");
        t.remove("y");
        t.check_invariants();
        assert_eq!(t.len(), 0);
        assert!(t.head().is_none());
    }

    /// Invariant: Removing an absent key changes nothing.
    #[test]
    fn remove_missing_is_noop() {
        let mut t = table();
        t.upsert("a".into(), 1);
        assert_eq!(t.remove("zz"), None);
        assert_eq!(t.len(), 1);
        t.check_invariants();
    }

    /// Invariant: `clear` empties the table and keeps the slot count.
    #[test]
    fn clear_keeps_capacity() {
        let mut t = table();
        for i in 0..6 {
            t.upsert(i.to_string(), i);
        }
        let m = t.capacity();
        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), m);
        assert!(t.slots().all(|s| s.is_none()));
        t.check_invariants();
    }

    /// Invariant: The consuming iterator yields owned pairs in list order.
    #[test]
    fn into_ordered_follows_list() {
        let mut t = table();
        for k in ["q", "w", "e", "r"] {
            t.upsert(k.to_string(), k.len());
        }
        t.remove("w");
        let keys: Vec<String> = t.into_ordered().map(|(k, _)| k).collect();
        assert_eq!(keys, ["q", "e", "r"]);
    }

    /// Invariant: A capacity of zero is clamped so probing always has a slot.
    #[test]
    fn zero_capacity_is_clamped() {
        let mut t = LinkedTable::with_capacity_and_hasher(0, DefaultHashBuilder::default());
        assert_eq!(t.capacity(), 1);
        assert_eq!(t.get("a"), None::<&i32>);
        t.upsert("a".into(), 1);
        assert_eq!(t.get("a"), Some(&1));
        t.check_invariants();
    }

    /// Invariant (debug-only): A hasher that calls back into the table it is
    /// hashing for trips the structure guard.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrant_hasher_panics() {
        use std::cell::Cell;
        use std::rc::Rc;

        type Target = LinkedTable<i32, ReenterBuildHasher>;

        #[derive(Clone)]
        struct ReenterBuildHasher(Rc<Cell<*const Target>>);
        struct ReenterHasher(*const Target);
        impl BuildHasher for ReenterBuildHasher {
            type Hasher = ReenterHasher;
            fn build_hasher(&self) -> Self::Hasher {
                ReenterHasher(self.0.get())
            }
        }
        impl Hasher for ReenterHasher {
            fn write(&mut self, _bytes: &[u8]) {}
            fn finish(&self) -> u64 {
                if !self.0.is_null() {
                    // Attempt to re-enter the table mid-lookup.
                    unsafe {
                        let _ = (*self.0).find("other");
                    }
                }
                0
            }
        }

        let target = Rc::new(Cell::new(core::ptr::null()));
        let mut t: Target =
            LinkedTable::with_capacity_and_hasher(4, ReenterBuildHasher(target.clone()));
        t.upsert("a".into(), 1);
        target.set(&t as *const _);

        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.find("a");
        }));
        assert!(res.is_err(), "expected re-entry to panic in debug builds");

        target.set(core::ptr::null());
        assert_eq!(t.get("a"), Some(&1));
    }
}
