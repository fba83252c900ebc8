//! HashChainStore: entries for every non-string key (the null key
//! included), grouped into chains by hash code.
//!
//! The backing store is keyed by the decimal form of a key's `hash_code`;
//! each value is a chain of the entries sharing that code, in insertion
//! order. Chains are scanned with `Eq`, never identity, and an emptied
//! chain is deleted from the backing store straight away.

use crate::key::MapKey;
use crate::store::{AssociativeStore, StoreFamily};
use core::fmt;

struct Chained<K, V> {
    key: K,
    value: V,
}

/// Entries sharing one hash code.
pub struct Chain<K, V>(Vec<Chained<K, V>>);

/// Position of one entry: its bucket in the backing store and its index
/// inside that bucket's chain.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChainCursor<C> {
    pub(crate) bucket: C,
    pub(crate) index: usize,
}

impl<C: Copy + Eq> ChainCursor<C> {
    /// Where this cursor points once the entry at `removed` is spliced out
    /// of its chain: later entries of the same chain shift down by one.
    pub(crate) fn after_removal_of(self, removed: ChainCursor<C>) -> Self {
        if self.bucket == removed.bucket && self.index > removed.index {
            ChainCursor {
                bucket: self.bucket,
                index: self.index - 1,
            }
        } else {
            self
        }
    }
}

fn bucket_id<K: MapKey>(key: &K) -> String {
    key.hash_code().to_string()
}

pub struct HashChainStore<K, V, F: StoreFamily> {
    backing: F::Store<Chain<K, V>>,
    size: usize,
}

impl<K, V, F> HashChainStore<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            backing: <F::Store<Chain<K, V>> as AssociativeStore<Chain<K, V>>>::with_capacity(
                capacity,
            ),
            size: 0,
        }
    }

    /// Number of entries across all chains.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of non-empty chains.
    pub fn bucket_count(&self) -> usize {
        self.backing.len()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let chain = self.backing.get(&bucket_id(key))?;
        chain.0.iter().find(|e| e.key == *key).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let chain = self.backing.get_mut(&bucket_id(key))?;
        chain
            .0
            .iter_mut()
            .find(|e| e.key == *key)
            .map(|e| &mut e.value)
    }

    /// Insert or replace. A match keeps its chain position and returns
    /// the old value; a new key is appended at the chain's tail.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let id = bucket_id(&key);
        match self.backing.get_mut(&id) {
            Some(chain) => {
                if let Some(e) = chain.0.iter_mut().find(|e| e.key == key) {
                    return Some(core::mem::replace(&mut e.value, value));
                }
                chain.0.push(Chained { key, value });
                log::trace!("hash bucket {} grew to {} entries", id, chain.0.len());
            }
            None => {
                log::trace!("hash bucket {} created", id);
                self.backing.put(&id, Chain(vec![Chained { key, value }]));
            }
        }
        self.size += 1;
        None
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = bucket_id(key);
        let chain = self.backing.get_mut(&id)?;
        let pos = chain.0.iter().position(|e| e.key == *key)?;
        let removed = chain.0.remove(pos);
        if chain.0.is_empty() {
            self.backing.delete(&id);
            log::trace!("hash bucket {} emptied and dropped", id);
        }
        self.size -= 1;
        Some(removed.value)
    }

    pub fn first(&self) -> Option<ChainCursor<F::Cursor>> {
        self.backing
            .first()
            .map(|bucket| ChainCursor { bucket, index: 0 })
    }

    pub fn next_after(&self, at: ChainCursor<F::Cursor>) -> Option<ChainCursor<F::Cursor>> {
        let (_, chain) = self.backing.entry_at(at.bucket)?;
        if at.index + 1 < chain.0.len() {
            return Some(ChainCursor {
                bucket: at.bucket,
                index: at.index + 1,
            });
        }
        self.backing
            .next_after(at.bucket)
            .map(|bucket| ChainCursor { bucket, index: 0 })
    }

    pub fn entry_at(&self, at: ChainCursor<F::Cursor>) -> Option<(&K, &V)> {
        let (_, chain) = self.backing.entry_at(at.bucket)?;
        chain.0.get(at.index).map(|e| (&e.key, &e.value))
    }

    /// Splice out the entry at `at`; drops the bucket if it empties.
    pub fn remove_at(&mut self, at: ChainCursor<F::Cursor>) -> Option<(K, V)> {
        let id: Box<str> = self.backing.entry_at(at.bucket)?.0.into();
        let chain = self.backing.value_at_mut(at.bucket)?;
        if at.index >= chain.0.len() {
            return None;
        }
        let removed = chain.0.remove(at.index);
        if chain.0.is_empty() {
            self.backing.delete(&id);
            log::trace!("hash bucket {} emptied and dropped", id);
        }
        self.size -= 1;
        Some((removed.key, removed.value))
    }

    /// Lazy walk: bucket order, then chain order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.backing
            .iter()
            .flat_map(|(_, chain)| chain.0.iter().map(|e| (&e.key, &e.value)))
    }
}

impl<K, V, F> fmt::Debug for HashChainStore<K, V, F>
where
    K: MapKey + fmt::Debug,
    V: fmt::Debug,
    F: StoreFamily,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
