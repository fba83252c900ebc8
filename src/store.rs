//! Primitive string-keyed store capability and the default `LinkedStore`.
//!
//! `AssociativeStore` is the only storage primitive the map layers assume:
//! string-keyed get/put/delete, an explicit membership predicate, and
//! insertion-ordered enumeration through opaque cursors. Cursors let an
//! iterator that does not borrow the store resume where it left off.

use core::fmt;
use core::hash::BuildHasher;
use core::marker::PhantomData;
use hashbrown::hash_table::Entry as TableEntry;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// String-keyed associative storage with insertion-ordered enumeration.
///
/// Implementations must uphold:
/// - `contains_key` answers membership without looking at the value.
/// - `put` on a present key replaces the value and keeps its position.
/// - A cursor stays valid while entries other than the one it points at
///   are deleted; a cursor to a deleted entry resolves to `None` and never
///   aliases an entry inserted later.
pub trait AssociativeStore<V> {
    type Cursor: Copy + Eq + fmt::Debug;

    fn with_capacity(capacity: usize) -> Self
    where
        Self: Sized;

    fn get(&self, key: &str) -> Option<&V>;
    fn get_mut(&mut self, key: &str) -> Option<&mut V>;
    fn contains_key(&self, key: &str) -> bool;

    /// Insert or replace; returns the previous value if the key was present.
    fn put(&mut self, key: &str, value: V) -> Option<V>;

    /// Remove the key; returns its value if it was present.
    fn delete(&mut self, key: &str) -> Option<V>;

    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cursor at the oldest live entry.
    fn first(&self) -> Option<Self::Cursor>;
    /// Cursor at the entry enumerated after `at`.
    fn next_after(&self, at: Self::Cursor) -> Option<Self::Cursor>;
    fn entry_at(&self, at: Self::Cursor) -> Option<(&str, &V)>;
    fn value_at_mut(&mut self, at: Self::Cursor) -> Option<&mut V>;

    fn iter(&self) -> StoreIter<'_, V, Self>
    where
        Self: Sized,
    {
        StoreIter {
            store: self,
            next: self.first(),
            _pd: PhantomData,
        }
    }

    fn keys(&self) -> Keys<'_, V, Self>
    where
        Self: Sized,
    {
        Keys { inner: self.iter() }
    }
}

/// Chooses the backing store for every value type a map needs.
///
/// A map keeps string entries and hash chains in two stores of different
/// value types; the family lets one injected choice build both.
pub trait StoreFamily {
    type Cursor: Copy + Eq + fmt::Debug;
    type Store<T>: AssociativeStore<T, Cursor = Self::Cursor>;
}

/// Lazy, insertion-ordered iterator over a store's `(key, value)` pairs.
pub struct StoreIter<'a, V, B>
where
    B: AssociativeStore<V>,
{
    store: &'a B,
    next: Option<<B as AssociativeStore<V>>::Cursor>,
    _pd: PhantomData<&'a V>,
}

impl<'a, V, B> Iterator for StoreIter<'a, V, B>
where
    B: AssociativeStore<V>,
{
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next?;
        self.next = self.store.next_after(at);
        self.store.entry_at(at)
    }
}

/// Insertion-ordered iterator over a store's keys.
pub struct Keys<'a, V, B>
where
    B: AssociativeStore<V>,
{
    inner: StoreIter<'a, V, B>,
}

impl<'a, V, B> Iterator for Keys<'a, V, B>
where
    B: AssociativeStore<V>,
{
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// Family selecting `LinkedStore` with hasher `S`.
pub struct Linked<S = RandomState>(PhantomData<fn() -> S>);

impl<S> StoreFamily for Linked<S>
where
    S: BuildHasher + Default,
{
    type Cursor = LinkedCursor;
    type Store<T> = LinkedStore<T, S>;
}

/// Generational position inside a `LinkedStore`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LinkedCursor(DefaultKey);

struct Slot<V> {
    key: Box<str>,
    value: V,
    hash: u64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

/// Default backing store: a hash index over generational slots, threaded
/// by a doubly linked list in insertion order.
pub struct LinkedStore<V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Slot<V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<V> LinkedStore<V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<V, S: Default> Default for LinkedStore<V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<V, S> LinkedStore<V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    fn unlink(&mut self, prev: Option<DefaultKey>, next: Option<DefaultKey>) {
        match prev.and_then(|p| self.slots.get_mut(p)) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.slots.get_mut(n)) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
    }
}

impl<V, S> LinkedStore<V, S>
where
    S: BuildHasher,
{
    fn find(&self, key: &str) -> Option<DefaultKey> {
        let hash = self.hasher.hash_one(key);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|s| &*s.key == key)
                    .unwrap_or(false)
            })
            .copied()
    }
}

impl<V, S> AssociativeStore<V> for LinkedStore<V, S>
where
    S: BuildHasher + Default,
{
    type Cursor = LinkedCursor;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            hasher: S::default(),
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
            head: None,
            tail: None,
        }
    }

    fn get(&self, key: &str) -> Option<&V> {
        let k = self.find(key)?;
        self.slots.get(k).map(|s| &s.value)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let k = self.find(key)?;
        self.slots.get_mut(k).map(|s| &mut s.value)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    fn put(&mut self, key: &str, value: V) -> Option<V> {
        let hash = self.hasher.hash_one(key);
        match self.index.entry(
            hash,
            |&k| {
                self.slots
                    .get(k)
                    .map(|s| &*s.key == key)
                    .unwrap_or(false)
            },
            |&k| self.slots.get(k).map(|s| s.hash).unwrap_or(0),
        ) {
            TableEntry::Occupied(o) => self
                .slots
                .get_mut(*o.get())
                .map(|slot| core::mem::replace(&mut slot.value, value)),
            TableEntry::Vacant(v) => {
                let prev = self.tail;
                let k = self.slots.insert(Slot {
                    key: key.into(),
                    value,
                    hash,
                    prev,
                    next: None,
                });
                let _ = v.insert(k);
                match prev.and_then(|p| self.slots.get_mut(p)) {
                    Some(p) => p.next = Some(k),
                    None => self.head = Some(k),
                }
                self.tail = Some(k);
                None
            }
        }
    }

    fn delete(&mut self, key: &str) -> Option<V> {
        let hash = self.hasher.hash_one(key);
        let slots = &self.slots;
        let found = self
            .index
            .find_entry(hash, |&k| {
                slots.get(k).map(|s| &*s.key == key).unwrap_or(false)
            })
            .ok()?;
        let (k, _) = found.remove();
        let slot = self.slots.remove(k)?;
        self.unlink(slot.prev, slot.next);
        Some(slot.value)
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn first(&self) -> Option<LinkedCursor> {
        self.head.map(LinkedCursor)
    }

    fn next_after(&self, at: LinkedCursor) -> Option<LinkedCursor> {
        self.slots.get(at.0)?.next.map(LinkedCursor)
    }

    fn entry_at(&self, at: LinkedCursor) -> Option<(&str, &V)> {
        self.slots.get(at.0).map(|s| (&*s.key, &s.value))
    }

    fn value_at_mut(&mut self, at: LinkedCursor) -> Option<&mut V> {
        self.slots.get_mut(at.0).map(|s| &mut s.value)
    }
}

impl<V: fmt::Debug, S> fmt::Debug for LinkedStore<V, S>
where
    S: BuildHasher + Default,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
