//! Property tests: the layered store against a flat-map oracle.
//!
//! Random operation sequences are applied in lockstep to a [`StrataMap`]
//! and to a plain flat map of the visible state. Derivations hand the
//! sequence down to the child (ancestors are never written afterwards, so
//! the oracle stays exact); sealing flips writes into expected failures
//! until a structural operation opens a fresh layer.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use proptest::prelude::*;
use rustc_hash::FxHashMap;
use strata_map::{ChildPolicy, StrataMap};

#[derive(Clone, Debug)]
enum Op {
    Add(u8),
    Set(u8, i32),
    Remove(u8),
    Child,
    ChildDepthLimited(usize),
    PushLayer,
    Compress,
    Seal,
}

const KEY_SPACE: u8 = 8;

fn key_name(k: u8) -> String {
    format!("k{k}")
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..KEY_SPACE).prop_map(Op::Add),
        6 => ((0..KEY_SPACE), any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
        4 => (0..KEY_SPACE).prop_map(Op::Remove),
        2 => Just(Op::Child),
        1 => (1usize..6).prop_map(Op::ChildDepthLimited),
        1 => Just(Op::PushLayer),
        1 => Just(Op::Compress),
        1 => Just(Op::Seal),
    ]
}

fn apply(map: &mut StrataMap<String, i32>, oracle: &mut FxHashMap<String, Option<i32>>, op: Op) {
    match op {
        Op::Add(k) => {
            let key = key_name(k);
            if map.is_sealed() {
                assert!(map.add(key).is_err());
            } else {
                assert!(map.add(key.clone()).is_ok());
                oracle.insert(key, None);
            }
        }
        Op::Set(k, v) => {
            let key = key_name(k);
            if map.is_sealed() {
                assert!(map.set(key, v).is_err());
            } else {
                assert!(map.set(key.clone(), v).is_ok());
                oracle.insert(key, Some(v));
            }
        }
        Op::Remove(k) => {
            let key = key_name(k);
            if map.is_sealed() {
                assert!(map.remove(&key).is_err());
            } else {
                assert!(map.remove(&key).is_ok());
                oracle.remove(&key);
            }
        }
        Op::Child => *map = map.create_child(),
        Op::ChildDepthLimited(limit) => {
            *map = map.create_child_with(ChildPolicy::DepthLimited(limit));
        }
        Op::PushLayer => map.push_layer(),
        Op::Compress => map.compress(),
        Op::Seal => map.seal(),
    }
}

fn check_visible_state(map: &StrataMap<String, i32>, oracle: &FxHashMap<String, Option<i32>>) {
    for k in 0..KEY_SPACE {
        let key = key_name(k);
        let expected = oracle.get(&key);
        assert_eq!(map.contains(&key), expected.is_some(), "contains({key})");
        assert_eq!(map.get(&key), expected.copied().flatten(), "get({key})");
    }
}

proptest! {
    #[test]
    fn behaves_like_flat_map(ops in proptest::collection::vec(op_strategy(), 0..64)) {
        let mut map: StrataMap<String, i32> = StrataMap::new();
        let mut oracle: FxHashMap<String, Option<i32>> = FxHashMap::default();

        for op in ops {
            apply(&mut map, &mut oracle, op);
            check_visible_state(&map, &oracle);
        }

        prop_assert_eq!(map.to_map(), oracle);
    }

    #[test]
    fn exports_agree_on_keys(ops in proptest::collection::vec(op_strategy(), 0..48)) {
        let mut map: StrataMap<String, i32> = StrataMap::new();
        let mut oracle: FxHashMap<String, Option<i32>> = FxHashMap::default();

        for op in ops {
            apply(&mut map, &mut oracle, op);
        }

        let exported_map = map.to_map();
        let exported_set = map.to_set();
        prop_assert_eq!(exported_set.len(), exported_map.len());
        for key in exported_map.keys() {
            prop_assert!(exported_set.contains(key), "missing key {key}");
        }
    }

    #[test]
    fn compression_preserves_visible_state(ops in proptest::collection::vec(op_strategy(), 0..48)) {
        let mut map: StrataMap<String, i32> = StrataMap::new();
        let mut oracle: FxHashMap<String, Option<i32>> = FxHashMap::default();

        for op in ops {
            apply(&mut map, &mut oracle, op);
        }

        map.compress();
        prop_assert_eq!(map.depth(), 1);
        check_visible_state(&map, &oracle);
    }
}
