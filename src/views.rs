//! Live views over a `HybridMap` and the fail-fast iterator behind them.
//!
//! Views and iterators hold a handle to the map they came from, never a copy
//! of its entries. A change made through a view is a change to the map, and
//! a structural change made anywhere else invalidates every iterator except
//! the one that made it.
//!
//! Iterators keep a cursor rather than a borrow, so the map stays writable
//! through other handles while an iterator is alive. The next step then
//! reports the change instead of reading through a stale position.

use crate::error::MapError;
use crate::hybrid_map::Shared;
use crate::key::MapKey;
use crate::raw_map::Phase;
use crate::store::{Linked, StoreFamily};
use crate::tracker::Generation;
use core::fmt;
use std::rc::Rc;

/// One entry returned by an iterator.
///
/// Holds the key and the value seen when the entry was returned. While that
/// mapping lasts, `value` and `set_value` act on the map itself. Once the
/// key is removed the entry is detached for good: putting the same key back
/// creates a new mapping this entry does not follow.
pub struct Entry<K, V, F: StoreFamily = Linked> {
    owner: Shared<K, V, F>,
    key: K,
    value: V,
    born: Generation,
}

impl<K, V, F> Entry<K, V, F>
where
    K: MapKey,
    V: Clone,
    F: StoreFamily,
{
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Current value of the mapping, or the last value seen once the
    /// mapping has been removed.
    pub fn value(&self) -> V {
        match self.owner.borrow().slot(&self.key) {
            Some(slot) if slot.born == self.born => slot.value.clone(),
            _ => self.value.clone(),
        }
    }

    /// Replace the value and return the previous one. Writes through to the
    /// map while the mapping lasts; this is not a structural change.
    pub fn set_value(&mut self, value: V) -> V {
        let mut map = self.owner.borrow_mut();
        match map.slot_mut(&self.key) {
            Some(slot) if slot.born == self.born => {
                let old = core::mem::replace(&mut slot.value, value.clone());
                self.value = value;
                old
            }
            _ => core::mem::replace(&mut self.value, value),
        }
    }

    pub fn into_pair(self) -> (K, V) {
        let value = self.value();
        (self.key, value)
    }
}

impl<K, V, F> PartialEq for Entry<K, V, F>
where
    K: MapKey,
    V: Clone + PartialEq,
    F: StoreFamily,
{
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value() == other.value()
    }
}

impl<K, V, F> fmt::Debug for Entry<K, V, F>
where
    K: MapKey + fmt::Debug,
    V: Clone + fmt::Debug,
    F: StoreFamily,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value())
            .finish()
    }
}

// Entry returned by the last `try_next`, identified by its mapping's stamp.
struct Pending<K, C> {
    at: Phase<C>,
    key: K,
    born: Generation,
}

/// Fail-fast iterator over a map's entries: string-keyed entries first, then
/// hash-chained entries.
///
/// `try_next` fails with `ConcurrentModification` once the map's structure
/// has changed through any other handle since this iterator's creation or
/// its own last `remove`. The `Iterator` impl yields that error once and
/// then ends.
pub struct EntrySetIterator<K, V, F: StoreFamily = Linked> {
    owner: Shared<K, V, F>,
    seen: Generation,
    // position of the next entry to return
    phase: Phase<F::Cursor>,
    pending: Option<Pending<K, F::Cursor>>,
    failed: bool,
}

impl<K, V, F> EntrySetIterator<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    pub(crate) fn new(owner: Shared<K, V, F>) -> Self {
        let (seen, phase) = {
            let map = owner.borrow();
            (map.generation(), map.start())
        };
        Self {
            owner,
            seen,
            phase,
            pending: None,
            failed: false,
        }
    }

    /// Whether another entry is available. Never fails; a pending
    /// modification is reported by the next `try_next`.
    pub fn has_next(&self) -> bool {
        self.owner.borrow().entry_at(self.phase).is_some()
    }

    pub fn try_next(&mut self) -> Result<Option<Entry<K, V, F>>, MapError> {
        let map = self.owner.borrow();
        map.tracker().check(self.seen)?;
        let at = self.phase;
        let Some((key, slot)) = map.slot_at(at) else {
            self.phase = Phase::Exhausted;
            return Ok(None);
        };
        let entry = Entry {
            owner: Rc::clone(&self.owner),
            key: key.clone(),
            value: slot.value.clone(),
            born: slot.born,
        };
        self.phase = map.advance(at);
        self.pending = Some(Pending {
            at,
            key: key.clone(),
            born: slot.born,
        });
        Ok(Some(entry))
    }

    /// Remove the entry returned by the last `try_next`. Fails with
    /// `IllegalState` when nothing is pending. This iterator stays valid
    /// afterwards; other iterators over the map do not.
    ///
    /// Returns whether the entry's mapping was still there to remove. With
    /// fail-fast on it always is. With fail-fast off, other handles may
    /// have moved or removed it: a moved entry is removed by key, a removed
    /// one is left alone and `Ok(false)` is returned. Nothing else is ever
    /// removed.
    pub fn remove(&mut self) -> Result<bool, MapError> {
        if self.pending.is_none() {
            return Err(MapError::IllegalState);
        }
        let mut map = self.owner.borrow_mut();
        map.tracker().check(self.seen)?;
        let Some(Pending { at, key, born }) = self.pending.take() else {
            return Err(MapError::IllegalState);
        };
        let removed = if map.slot_at(at).is_some_and(|(_, s)| s.born == born) {
            map.remove_at(at);
            // Later entries of the removed entry's chain moved down one slot.
            if let (Phase::Hashes(removed), Phase::Hashes(next)) = (at, self.phase) {
                self.phase = Phase::Hashes(next.after_removal_of(removed));
            }
            true
        } else if map.slot(&key).is_some_and(|s| s.born == born) {
            log::trace!("pending entry moved; removing it by key");
            map.remove(&key).is_some()
        } else {
            false
        };
        self.seen = map.generation();
        Ok(removed)
    }
}

impl<K, V, F> Iterator for EntrySetIterator<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    type Item = Result<Entry<K, V, F>, MapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.try_next() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Fail-fast iterator over keys. Same protocol as `EntrySetIterator`.
pub struct KeyIter<K, V, F: StoreFamily = Linked> {
    entries: EntrySetIterator<K, V, F>,
}

impl<K, V, F> KeyIter<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    pub fn has_next(&self) -> bool {
        self.entries.has_next()
    }

    pub fn try_next(&mut self) -> Result<Option<K>, MapError> {
        Ok(self.entries.try_next()?.map(|e| e.key))
    }

    pub fn remove(&mut self) -> Result<bool, MapError> {
        self.entries.remove()
    }
}

impl<K, V, F> Iterator for KeyIter<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    type Item = Result<K, MapError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|r| r.map(|e| e.key))
    }
}

/// Fail-fast iterator over values. Same protocol as `EntrySetIterator`.
pub struct ValueIter<K, V, F: StoreFamily = Linked> {
    entries: EntrySetIterator<K, V, F>,
}

impl<K, V, F> ValueIter<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    pub fn has_next(&self) -> bool {
        self.entries.has_next()
    }

    pub fn try_next(&mut self) -> Result<Option<V>, MapError> {
        Ok(self.entries.try_next()?.map(|e| e.value))
    }

    pub fn remove(&mut self) -> Result<bool, MapError> {
        self.entries.remove()
    }
}

impl<K, V, F> Iterator for ValueIter<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    type Item = Result<V, MapError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|r| r.map(|e| e.value))
    }
}

/// Live view of the map's entries.
pub struct EntrySet<K, V, F: StoreFamily = Linked> {
    owner: Shared<K, V, F>,
}

impl<K, V, F> EntrySet<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    pub(crate) fn new(owner: Shared<K, V, F>) -> Self {
        Self { owner }
    }

    pub fn len(&self) -> usize {
        self.owner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner.borrow().is_empty()
    }

    /// True when `key` is mapped to a value equal to `value`.
    pub fn contains(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.owner.borrow().get(key) == Some(value)
    }

    /// Remove `key` only if it is mapped to a value equal to `value`.
    pub fn remove(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        let mut map = self.owner.borrow_mut();
        if map.get(key) != Some(value) {
            return false;
        }
        map.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.owner.borrow_mut().clear()
    }

    pub fn iter(&self) -> EntrySetIterator<K, V, F>
    where
        K: Clone,
        V: Clone,
    {
        EntrySetIterator::new(Rc::clone(&self.owner))
    }
}

impl<K, V, F> IntoIterator for &EntrySet<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    type Item = Result<Entry<K, V, F>, MapError>;
    type IntoIter = EntrySetIterator<K, V, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Live view of the map's keys.
pub struct KeySet<K, V, F: StoreFamily = Linked> {
    owner: Shared<K, V, F>,
}

impl<K, V, F> KeySet<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    pub(crate) fn new(owner: Shared<K, V, F>) -> Self {
        Self { owner }
    }

    pub fn len(&self) -> usize {
        self.owner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner.borrow().is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.owner.borrow().contains_key(key)
    }

    /// Remove `key` from the map; true if it was mapped.
    pub fn remove(&self, key: &K) -> bool {
        self.owner.borrow_mut().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.owner.borrow_mut().clear()
    }

    pub fn iter(&self) -> KeyIter<K, V, F>
    where
        K: Clone,
        V: Clone,
    {
        KeyIter {
            entries: EntrySetIterator::new(Rc::clone(&self.owner)),
        }
    }
}

impl<K, V, F> IntoIterator for &KeySet<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    type Item = Result<K, MapError>;
    type IntoIter = KeyIter<K, V, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Live view of the map's values.
pub struct Values<K, V, F: StoreFamily = Linked> {
    owner: Shared<K, V, F>,
}

impl<K, V, F> Values<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    pub(crate) fn new(owner: Shared<K, V, F>) -> Self {
        Self { owner }
    }

    pub fn len(&self) -> usize {
        self.owner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner.borrow().is_empty()
    }

    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.owner.borrow().contains_value(value)
    }

    /// Remove the first entry, in iteration order, holding `value`.
    pub fn remove(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.owner.borrow_mut().remove_value(value).is_some()
    }

    pub fn clear(&self) {
        self.owner.borrow_mut().clear()
    }

    pub fn iter(&self) -> ValueIter<K, V, F>
    where
        K: Clone,
        V: Clone,
    {
        ValueIter {
            entries: EntrySetIterator::new(Rc::clone(&self.owner)),
        }
    }
}

impl<K, V, F> IntoIterator for &Values<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    type Item = Result<V, MapError>;
    type IntoIter = ValueIter<K, V, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::{HybridMap, MapError};

    fn sample() -> HybridMap<Option<String>, i32> {
        let m = HybridMap::new();
        m.put(Some("a".to_string()), 1);
        m.put(Some("b".to_string()), 2);
        m.put(None, 3);
        m
    }

    /// Invariant: `set_value` writes through while the key is mapped and
    /// is not a structural change.
    #[test]
    fn entry_set_value_writes_through() {
        let m = sample();
        let mut it = m.iter();
        let mut e = it.try_next().unwrap().unwrap();
        let g = m.generation();
        let old = e.set_value(10);
        assert_eq!(m.get(e.key()), Some(10));
        assert_eq!(e.value(), 10);
        assert_eq!(m.generation(), g);
        assert_eq!(old, 1);
        assert!(it.try_next().is_ok());
    }

    /// Invariant: an entry whose key was removed keeps its last value and
    /// no longer touches the map.
    #[test]
    fn detached_entry_keeps_snapshot() {
        let m = sample();
        let mut e = m.iter().try_next().unwrap().unwrap();
        let key = e.key().clone();
        let seen = e.value();
        m.remove(&key);
        assert_eq!(e.value(), seen);
        assert_eq!(e.set_value(99), seen);
        assert_eq!(e.value(), 99);
        assert!(!m.contains_key(&key));
    }

    /// Invariant: putting a removed key back makes a new mapping; an entry
    /// for the old one stays detached.
    #[test]
    fn reinserted_key_does_not_reattach() {
        let m = sample();
        let mut e = m.iter().try_next().unwrap().unwrap();
        let key = e.key().clone();
        m.remove(&key);
        m.put(key.clone(), 50);
        assert_eq!(e.value(), 1);
        assert_eq!(e.set_value(7), 1);
        assert_eq!(m.get(&key), Some(50));

        // A fresh entry for the new mapping does write through.
        let mut it = m.iter();
        let mut fresh = loop {
            let f = it.try_next().unwrap().unwrap();
            if *f.key() == key {
                break f;
            }
        };
        assert_eq!(fresh.set_value(51), 50);
        assert_eq!(m.get(&key), Some(51));
    }

    /// Invariant: removal through an iterator inside a chain keeps the
    /// rest of the chain reachable.
    #[test]
    fn remove_inside_chain_visits_rest() {
        // None and Some(0) share bucket 0.
        let m: HybridMap<Option<i32>, i32> = HybridMap::new();
        m.put(None, 0);
        m.put(Some(0), 1);
        m.put(Some(5), 2);
        let mut it = m.iter();
        let mut seen = Vec::new();
        while let Some(e) = it.try_next().unwrap() {
            seen.push(*e.key());
            if e.key().is_none() {
                it.remove().unwrap();
            }
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(m.len(), 2);
        assert!(!m.contains_key(&None));
    }

    #[test]
    fn remove_without_pending_is_illegal() {
        let m = sample();
        let mut it = m.iter();
        assert_eq!(it.remove(), Err(MapError::IllegalState));
        it.try_next().unwrap();
        assert!(it.remove().is_ok());
        assert_eq!(it.remove(), Err(MapError::IllegalState));
    }

    /// Invariant: the `Iterator` impl reports a modification once, then
    /// ends.
    #[test]
    fn iterator_fuses_after_error() {
        let m = sample();
        let mut it = m.iter();
        assert!(matches!(it.next(), Some(Ok(_))));
        m.put(Some("z".to_string()), 26);
        assert!(matches!(
            it.next(),
            Some(Err(MapError::ConcurrentModification { .. }))
        ));
        assert!(it.next().is_none());
    }
}
