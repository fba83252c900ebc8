#![cfg(test)]

// Property tests for RawHybridMap kept inside the crate so they can look at
// both halves and the generation directly.

use crate::key::MapKey;
use crate::raw_map::RawHybridMap;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Mixed key kinds. Integers hash to a tiny range so chains grow; strings
// take the string route and never meet an integer key.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
enum Obj {
    Str(String),
    Int(i32),
    Null,
}

impl MapKey for Obj {
    fn hash_code(&self) -> i32 {
        match self {
            Obj::Str(s) => s.hash_code(),
            Obj::Int(i) => i.rem_euclid(3),
            Obj::Null => 0,
        }
    }

    fn as_str_key(&self) -> Option<&str> {
        match self {
            Obj::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

// Pool-indexed operations shrink toward earlier keys and shorter runs.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i8),
    Remove(usize),
    Get(usize),
    Mutate(usize, i8),
    RemoveValue(i8),
    Clear,
    Iterate,
}

fn arb_key() -> impl Strategy<Value = Obj> {
    prop_oneof![
        "[a-c]{0,2}".prop_map(Obj::Str),
        (-6i32..6).prop_map(Obj::Int),
        Just(Obj::Null),
    ]
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Obj>, Vec<Op>)> {
    proptest::collection::vec(arb_key(), 1..=10).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        // Narrow value range so RemoveValue finds matches.
        let val = -3i8..3;
        let op = prop_oneof![
            4 => (idx.clone(), val.clone()).prop_map(|(i, v)| Op::Put(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => (idx.clone(), val.clone()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => val.prop_map(Op::RemoveValue),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against std::collections::HashMap.
// - `put`/`get`/`remove`/`contains_key` agree with the model for every key
//   kind, colliding integers and the null key included.
// - Each key lives in exactly one half: strings in the string store,
//   everything else in the chain store; `len` is the sum.
// - The generation moves exactly once per insertion, removal and clear.
// - Iteration yields every live entry once, strings first.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: RawHybridMap<Obj, i8> = RawHybridMap::new();
        let mut model: HashMap<Obj, i8> = HashMap::new();
        let mut expected_gen: u64 = 0;

        for op in ops {
            match op {
                Op::Put(i, v) => {
                    let k = pool[i].clone();
                    let prev = model.insert(k.clone(), v);
                    if prev.is_none() {
                        expected_gen += 1;
                    }
                    prop_assert_eq!(sut.put(k, v), prev);
                }
                Op::Remove(i) => {
                    let k = &pool[i];
                    let prev = model.remove(k);
                    if prev.is_some() {
                        expected_gen += 1;
                    }
                    prop_assert_eq!(sut.remove(k), prev);
                    prop_assert!(!sut.contains_key(k));
                }
                Op::Get(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.get(k), model.get(k));
                    prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
                }
                Op::Mutate(i, d) => {
                    let k = &pool[i];
                    if let Some(v) = sut.get_mut(k) {
                        *v = v.wrapping_add(d);
                        let mv = model.get_mut(k).expect("present in model");
                        *mv = mv.wrapping_add(d);
                    } else {
                        prop_assert!(!model.contains_key(k));
                    }
                }
                Op::RemoveValue(v) => {
                    match sut.remove_value(&v) {
                        Some((k, got)) => {
                            prop_assert_eq!(got, v);
                            prop_assert_eq!(model.remove(&k), Some(v));
                            expected_gen += 1;
                        }
                        None => prop_assert!(!model.values().any(|x| *x == v)),
                    }
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    expected_gen += 1;
                }
                Op::Iterate => {
                    let seen: Vec<Obj> = sut.iter().map(|(k, _)| k.clone()).collect();
                    prop_assert_eq!(seen.len(), model.len());
                    let as_set: BTreeSet<Obj> = seen.iter().cloned().collect();
                    prop_assert_eq!(as_set.len(), seen.len());
                    let m_keys: BTreeSet<Obj> = model.keys().cloned().collect();
                    prop_assert_eq!(as_set, m_keys);
                    let first_opaque = seen.iter().position(|k| k.as_str_key().is_none());
                    if let Some(p) = first_opaque {
                        prop_assert!(seen[p..].iter().all(|k| k.as_str_key().is_none()));
                    }
                }
            }

            // Post-conditions after each op
            let strings = model.keys().filter(|k| matches!(k, Obj::Str(_))).count();
            prop_assert_eq!(sut.strings.len(), strings);
            prop_assert_eq!(sut.hashes.len(), model.len() - strings);
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            prop_assert_eq!(sut.generation().get(), expected_gen);
        }
    }
}
