// Live view suite: entry set, key set, values and entries.
//
// The invariants exercised:
// - Views read the map as it is now, not as it was when the view was made.
// - Writes through a view are writes to the map.
// - View iterators share the fail-fast protocol of the entry iterator.
use hybrid_hashmap::{HybridMap, MapError};

fn sample() -> HybridMap<Option<&'static str>, i32> {
    let m = HybridMap::new();
    m.put(Some("one"), 1);
    m.put(Some("two"), 2);
    m.put(None, 0);
    m
}

// Test: views are live.
// Verifies: len and contains follow later map changes.
#[test]
fn views_track_the_map() {
    let m = sample();
    let entries = m.entry_set();
    let keys = m.key_set();
    let values = m.values();
    assert_eq!(entries.len(), 3);

    m.put(Some("three"), 3);
    assert_eq!(entries.len(), 4);
    assert_eq!(keys.len(), 4);
    assert_eq!(values.len(), 4);
    assert!(keys.contains(&Some("three")));
    assert!(values.contains(&3));
    assert!(entries.contains(&Some("three"), &3));
    assert!(!entries.contains(&Some("three"), &4));

    m.clear();
    assert!(entries.is_empty());
    assert!(keys.is_empty());
    assert!(values.is_empty());
}

// Test: entry-set removal.
// Assumes: an entry is removed only when key and value both match.
// Verifies: a mismatched value leaves the map alone.
#[test]
fn entry_set_remove_needs_matching_value() {
    let m = sample();
    let entries = m.entry_set();
    let g = m.generation();
    assert!(!entries.remove(&Some("one"), &9));
    assert_eq!(m.generation(), g);
    assert!(entries.remove(&Some("one"), &1));
    assert!(!m.contains_key(&Some("one")));
    assert!(!entries.remove(&Some("absent"), &1));
    assert_eq!(m.len(), 2);
}

// Test: key-set and values removal.
// Verifies: values removes only the first match in iteration order.
#[test]
fn key_and_value_removal() {
    let m: HybridMap<&str, i32> = HybridMap::new();
    m.put("a", 7);
    m.put("b", 7);
    m.put("c", 8);

    assert!(m.values().remove(&7));
    assert!(!m.contains_key(&"a"));
    assert!(m.contains_key(&"b"));
    assert!(!m.values().remove(&99));

    assert!(m.key_set().remove(&"c"));
    assert!(!m.key_set().remove(&"c"));
    assert_eq!(m.len(), 1);
}

// Test: clear through any view.
// Verifies: each view's clear empties the map.
#[test]
fn clear_through_views() {
    let m = sample();
    m.key_set().clear();
    assert!(m.is_empty());

    let m = sample();
    m.values().clear();
    assert!(m.is_empty());

    let m = sample();
    m.entry_set().clear();
    assert!(m.is_empty());
}

// Test: key and value iterators.
// Verifies: order matches the entry iterator; removal works through them.
#[test]
fn key_and_value_iterators() {
    let m = sample();
    let keys: Vec<_> = m.key_set().iter().collect::<Result<_, _>>().unwrap();
    let values: Vec<_> = m.values().iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(keys, vec![Some("one"), Some("two"), None]);
    assert_eq!(values, vec![1, 2, 0]);

    let mut it = m.key_set().iter();
    assert!(it.has_next());
    while let Some(k) = it.try_next().unwrap() {
        if k.is_some() {
            it.remove().unwrap();
        }
    }
    assert!(!it.has_next());
    assert_eq!(m.len(), 1);
    assert!(m.contains_key(&None));

    let mut vit = m.values().iter();
    assert_eq!(vit.remove(), Err(MapError::IllegalState));
    assert_eq!(vit.try_next().unwrap(), Some(0));
    vit.remove().unwrap();
    assert!(m.is_empty());
}

// Test: for-loops over views.
// Verifies: `&view` iterates like `view.iter()`.
#[test]
fn views_in_for_loops() {
    let m = sample();
    let mut total = 0;
    for v in &m.values() {
        total += v.unwrap();
    }
    assert_eq!(total, 3);

    let mut n = 0;
    for e in &m {
        let e = e.unwrap();
        assert_eq!(m.get(e.key()), Some(e.value()));
        n += 1;
    }
    assert_eq!(n, 3);
}

// Test: entries after their key is removed.
// Verifies: the last seen value survives; writes stay local, even after
// the key is mapped again.
#[test]
fn entry_outlives_mapping() {
    let m = sample();
    let mut e = m.iter().try_next().unwrap().unwrap();
    assert_eq!(e.key(), &Some("one"));
    assert_eq!(e.set_value(11), 1);
    assert_eq!(m.get(&Some("one")), Some(11));

    m.remove(&Some("one"));
    assert_eq!(e.value(), 11);
    assert_eq!(e.set_value(12), 11);
    assert!(!m.contains_key(&Some("one")));

    // Re-mapping the key is a new mapping; the entry stays detached.
    m.put(Some("one"), 100);
    assert_eq!(e.value(), 12);
    assert_eq!(e.set_value(13), 12);
    assert_eq!(m.get(&Some("one")), Some(100));
    assert_eq!(e.into_pair(), (Some("one"), 13));
}

// Test: entries across a remove and re-insert of their key.
// Assumes: value replacement keeps a mapping, removal ends it.
// Verifies: an entry follows replacements but never the re-inserted key.
#[test]
fn entry_follows_one_mapping() {
    let m = sample();
    let mut it = m.iter();
    it.try_next().unwrap();
    let mut two = it.try_next().unwrap().unwrap();
    assert_eq!(two.key(), &Some("two"));

    m.put(Some("two"), 20);
    assert_eq!(two.value(), 20);

    m.remove(&Some("two"));
    m.put(Some("two"), 200);
    assert_eq!(two.value(), 20);
    two.set_value(21);
    assert_eq!(m.get(&Some("two")), Some(200));

    let other = m.iter().find_map(|e| {
        let e = e.unwrap();
        (e.key() == &Some("two")).then_some(e)
    });
    assert_ne!(other.as_ref(), Some(&two));
    assert_eq!(other.map(|e| e.value()), Some(200));
}

// Test: entry equality.
// Verifies: entries compare by key and current value.
#[test]
fn entry_equality() {
    let m = sample();
    let a = m.iter().try_next().unwrap().unwrap();
    let b = m.iter().try_next().unwrap().unwrap();
    assert_eq!(a, b);
    let mut it = m.iter();
    it.try_next().unwrap();
    let c = it.try_next().unwrap().unwrap();
    assert_ne!(a, c);
    assert_eq!(format!("{:?}", a), "Entry { key: Some(\"one\"), value: 1 }");
}
