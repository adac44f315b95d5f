#![cfg(test)]

// Property tests for LinkedTable kept inside the crate so they can call
// `check_invariants` on the internal layer.

use crate::linked_table::LinkedTable;
use core::hash::BuildHasher;
use hashbrown::hash_map::DefaultHashBuilder;
use proptest::prelude::*;
use std::hash::Hasher;

// Pool-indexed operations: indices shrink toward earlier keys, the pool and
// the op list shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Remove(usize),
    Get(usize),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z0-9]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            3 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Ordered model: a Vec of pairs, overwrites in place, removals close the gap.
fn model_put(model: &mut Vec<(String, i32)>, k: &str, v: i32) -> Option<i32> {
    match model.iter_mut().find(|(mk, _)| mk == k) {
        Some((_, mv)) => Some(std::mem::replace(mv, v)),
        None => {
            model.push((k.to_string(), v));
            None
        }
    }
}

fn model_remove(model: &mut Vec<(String, i32)>, k: &str) -> Option<i32> {
    let pos = model.iter().position(|(mk, _)| mk == k)?;
    Some(model.remove(pos).1)
}

fn run<S: BuildHasher>(
    mut sut: LinkedTable<i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: Vec<(String, i32)> = Vec::new();
    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = &pool[i];
                prop_assert_eq!(sut.upsert(k.clone(), v), model_put(&mut model, k, v));
            }
            Op::Remove(i) => {
                let k = &pool[i];
                let got = sut.remove(k).map(|(rk, rv)| {
                    assert_eq!(&rk, k);
                    rv
                });
                prop_assert_eq!(got, model_remove(&mut model, k));
            }
            Op::Get(i) => {
                let k = &pool[i];
                let want = model.iter().find(|(mk, _)| mk == k).map(|(_, v)| v);
                prop_assert_eq!(sut.get(k), want);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        let order: Vec<(&str, i32)> = sut.iter().map(|(k, v)| (k, *v)).collect();
        let want: Vec<(&str, i32)> = model.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        prop_assert_eq!(order, want);
        // Every live key is reachable by probing.
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k), Some(v));
        }
    }
    Ok(())
}

// Property: LinkedTable matches an ordered model under random put/remove/get/
// clear sequences. After every step the slot array and the list agree, every
// entry is reachable from its home slot, and iteration order equals the
// model's insertion order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_ordered_model((pool, ops) in arb_scenario()) {
        let sut = LinkedTable::with_capacity_and_hasher(4, DefaultHashBuilder::default());
        run(sut, &pool, ops)?;
    }
}

// Hasher that sends every key to slot 0, so the whole table is one cluster
// and every removal rehashes the rest of it.
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

// Hasher with only a handful of distinct outputs, giving several clusters
// that wrap around the end of the slot array.
#[derive(Clone, Default)]
struct FewBucketsBuildHasher;
struct FewBucketsHasher(u64);
impl BuildHasher for FewBucketsBuildHasher {
    type Hasher = FewBucketsHasher;
    fn build_hasher(&self) -> Self::Hasher {
        FewBucketsHasher(0)
    }
}
impl Hasher for FewBucketsHasher {
    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_add(u64::from(*b));
        }
    }
    fn finish(&self) -> u64 {
        // Large offset so small tables see the home slot near the end.
        u64::MAX - (self.0 % 3)
    }
}

// Property: Same model equivalence under full collision (one cluster).
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_ordered_model_with_collisions((pool, ops) in arb_scenario()) {
        let sut = LinkedTable::with_capacity_and_hasher(4, ConstBuildHasher);
        run(sut, &pool, ops)?;
    }
}

// Property: Same model equivalence with wrapping clusters.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_ordered_model_with_wrapping_clusters((pool, ops) in arb_scenario()) {
        let sut = LinkedTable::with_capacity_and_hasher(1, FewBucketsBuildHasher);
        run(sut, &pool, ops)?;
    }
}
