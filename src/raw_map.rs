//! RawHybridMap: the routing layer with exclusive (`&mut self`) access.
//!
//! Owns one `StringKeyedStore`, one `HashChainStore` and the
//! `ModificationTracker`. Each key is routed once per call: string keys to
//! the string store, everything else to the chain store. Every live key is
//! in exactly one of them, and `len` is the sum of both.

use crate::chain_store::{ChainCursor, HashChainStore};
use crate::config::MapOptions;
use crate::error::MapError;
use crate::key::{MapKey, RoutedKey};
use crate::store::{Linked, StoreFamily};
use crate::string_store::StringKeyedStore;
use crate::tracker::{Generation, ModificationTracker};
use core::fmt;

/// Traversal state over both stores: all string entries, then all chained
/// entries. The payload is the position of the entry to visit next.
#[derive(Debug)]
pub(crate) enum Phase<C> {
    Strings(C),
    Hashes(ChainCursor<C>),
    Exhausted,
}

impl<C: Copy> Clone for Phase<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Copy> Copy for Phase<C> {}

/// A stored value and the generation at which its key was inserted.
/// Replacing the value keeps the stamp, so a stamp names one mapping from
/// insertion to removal.
#[derive(Clone, Debug)]
pub(crate) struct Slot<V> {
    pub(crate) value: V,
    pub(crate) born: Generation,
}

pub struct RawHybridMap<K, V, F: StoreFamily = Linked> {
    pub(crate) strings: StringKeyedStore<K, Slot<V>, F>,
    pub(crate) hashes: HashChainStore<K, Slot<V>, F>,
    tracker: ModificationTracker,
    capacity: usize,
}

impl<K, V> RawHybridMap<K, V>
where
    K: MapKey,
{
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, F> Default for RawHybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    fn default() -> Self {
        Self::build(0, true)
    }
}

impl<K, V, F> RawHybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    fn build(capacity: usize, fail_fast: bool) -> Self {
        Self {
            strings: StringKeyedStore::with_capacity(capacity),
            hashes: HashChainStore::with_capacity(capacity),
            tracker: ModificationTracker::new(fail_fast),
            capacity,
        }
    }

    pub fn with_options(options: MapOptions) -> Result<Self, MapError> {
        options.validate()?;
        Ok(Self::build(options.initial_capacity, options.fail_fast))
    }

    /// Number of mappings, summed over both stores on every call.
    pub fn len(&self) -> usize {
        self.strings.len() + self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty() && self.hashes.is_empty()
    }

    pub fn generation(&self) -> Generation {
        self.tracker.current()
    }

    pub(crate) fn tracker(&self) -> &ModificationTracker {
        &self.tracker
    }

    pub fn contains_key(&self, key: &K) -> bool {
        match key.route() {
            RoutedKey::Str(name) => self.strings.contains_key(name),
            RoutedKey::Opaque(k) => self.hashes.contains_key(k),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.slot(key).map(|s| &s.value)
    }

    /// Mutable access to a present value; not a structural change.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.slot_mut(key).map(|s| &mut s.value)
    }

    pub(crate) fn slot(&self, key: &K) -> Option<&Slot<V>> {
        match key.route() {
            RoutedKey::Str(name) => self.strings.get(name),
            RoutedKey::Opaque(k) => self.hashes.get(k),
        }
    }

    pub(crate) fn slot_mut(&mut self, key: &K) -> Option<&mut Slot<V>> {
        match key.route() {
            RoutedKey::Str(name) => self.strings.get_mut(name),
            RoutedKey::Opaque(k) => self.hashes.get_mut(k),
        }
    }

    /// Map `key` to `value`, returning the previous value. Only a newly
    /// created key counts as a structural change.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.slot_mut(&key) {
            return Some(core::mem::replace(&mut slot.value, value));
        }
        let slot = Slot {
            value,
            born: self.tracker.current(),
        };
        match key.route() {
            RoutedKey::Str(name) => {
                let name: Box<str> = name.into();
                self.strings.put(&name, key, slot);
            }
            RoutedKey::Opaque(_) => {
                self.hashes.put(key, slot);
            }
        }
        self.tracker.structure_changed();
        None
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let old = match key.route() {
            RoutedKey::Str(name) => self.strings.remove(name),
            RoutedKey::Opaque(k) => self.hashes.remove(k),
        };
        if old.is_some() {
            self.tracker.structure_changed();
        }
        old.map(|s| s.value)
    }

    /// Drop both stores wholesale and record one structural change.
    pub fn clear(&mut self) {
        log::trace!(
            "clearing map: {} entries, {} hash buckets",
            self.len(),
            self.hashes.bucket_count()
        );
        self.strings = StringKeyedStore::with_capacity(self.capacity);
        self.hashes = HashChainStore::with_capacity(self.capacity);
        self.tracker.structure_changed();
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|(_, v)| v == value)
    }

    /// Remove the first entry, in iteration order, whose value equals
    /// `value`.
    pub fn remove_value(&mut self, value: &V) -> Option<(K, V)>
    where
        V: PartialEq,
    {
        let mut at = self.start();
        while let Some((_, v)) = self.entry_at(at) {
            if v == value {
                return self.remove_at(at);
            }
            at = self.advance(at);
        }
        None
    }

    pub fn iter(&self) -> Iter<'_, K, V, F> {
        Iter {
            map: self,
            phase: self.start(),
        }
    }

    pub(crate) fn start(&self) -> Phase<F::Cursor> {
        match self.strings.first() {
            Some(c) => Phase::Strings(c),
            None => self.hash_phase(),
        }
    }

    fn hash_phase(&self) -> Phase<F::Cursor> {
        match self.hashes.first() {
            Some(c) => Phase::Hashes(c),
            None => Phase::Exhausted,
        }
    }

    /// The phase following the entry at `at`. Running out of string
    /// entries moves on to the chains.
    pub(crate) fn advance(&self, at: Phase<F::Cursor>) -> Phase<F::Cursor> {
        match at {
            Phase::Strings(c) => match self.strings.next_after(c) {
                Some(n) => Phase::Strings(n),
                None => self.hash_phase(),
            },
            Phase::Hashes(c) => match self.hashes.next_after(c) {
                Some(n) => Phase::Hashes(n),
                None => Phase::Exhausted,
            },
            Phase::Exhausted => Phase::Exhausted,
        }
    }

    pub(crate) fn entry_at(&self, at: Phase<F::Cursor>) -> Option<(&K, &V)> {
        self.slot_at(at).map(|(k, s)| (k, &s.value))
    }

    pub(crate) fn slot_at(&self, at: Phase<F::Cursor>) -> Option<(&K, &Slot<V>)> {
        match at {
            Phase::Strings(c) => self.strings.entry_at(c),
            Phase::Hashes(c) => self.hashes.entry_at(c),
            Phase::Exhausted => None,
        }
    }

    /// Remove the entry at `at` through its owning store.
    pub(crate) fn remove_at(&mut self, at: Phase<F::Cursor>) -> Option<(K, V)> {
        let removed = match at {
            Phase::Strings(c) => self.strings.remove_at(c),
            Phase::Hashes(c) => self.hashes.remove_at(c),
            Phase::Exhausted => None,
        };
        if removed.is_some() {
            self.tracker.structure_changed();
        }
        removed.map(|(k, s)| (k, s.value))
    }
}

/// Borrowing iterator: string entries first, then chained entries.
pub struct Iter<'a, K, V, F: StoreFamily = Linked> {
    map: &'a RawHybridMap<K, V, F>,
    phase: Phase<F::Cursor>,
}

impl<'a, K, V, F> Iterator for Iter<'a, K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.phase;
        let entry = self.map.entry_at(at)?;
        self.phase = self.map.advance(at);
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.phase {
            Phase::Exhausted => (0, Some(0)),
            _ => (1, Some(self.map.len())),
        }
    }
}

impl<'a, K, V, F> IntoIterator for &'a RawHybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, F> Clone for RawHybridMap<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    fn clone(&self) -> Self {
        let mut copy = Self::build(self.capacity, self.tracker.checks_enabled());
        for (k, v) in self.iter() {
            copy.put(k.clone(), v.clone());
        }
        copy
    }
}

/// Maps are equal when they hold the same keys mapped to equal values.
impl<K, V, F, G> PartialEq<RawHybridMap<K, V, G>> for RawHybridMap<K, V, F>
where
    K: MapKey,
    V: PartialEq,
    F: StoreFamily,
    G: StoreFamily,
{
    fn eq(&self, other: &RawHybridMap<K, V, G>) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, F> Eq for RawHybridMap<K, V, F>
where
    K: MapKey,
    V: Eq,
    F: StoreFamily,
{
}

impl<K, V, F> fmt::Debug for RawHybridMap<K, V, F>
where
    K: MapKey + fmt::Debug,
    V: fmt::Debug,
    F: StoreFamily,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, F> Extend<(K, V)> for RawHybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, F> FromIterator<(K, V)> for RawHybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}
