//! StringKeyedStore: entries whose key is a string, held directly in a
//! backing store under the key's string form.

use crate::store::{AssociativeStore, StoreFamily};
use core::fmt;

/// A string-routed entry: the caller's key alongside its value.
pub struct Keyed<K, V> {
    key: K,
    value: V,
}

pub struct StringKeyedStore<K, V, F: StoreFamily> {
    backing: F::Store<Keyed<K, V>>,
}

impl<K, V, F: StoreFamily> StringKeyedStore<K, V, F> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            backing: <F::Store<Keyed<K, V>> as AssociativeStore<Keyed<K, V>>>::with_capacity(
                capacity,
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.backing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backing.is_empty()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.backing.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.backing.get(name).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.backing.get_mut(name).map(|e| &mut e.value)
    }

    /// Insert or replace. A present entry keeps its key and position and
    /// only its value changes; returns the previous value in that case.
    pub fn put(&mut self, name: &str, key: K, value: V) -> Option<V> {
        if let Some(e) = self.backing.get_mut(name) {
            return Some(core::mem::replace(&mut e.value, value));
        }
        self.backing.put(name, Keyed { key, value });
        None
    }

    pub fn remove(&mut self, name: &str) -> Option<V> {
        self.backing.delete(name).map(|e| e.value)
    }

    pub fn first(&self) -> Option<F::Cursor> {
        self.backing.first()
    }

    pub fn next_after(&self, at: F::Cursor) -> Option<F::Cursor> {
        self.backing.next_after(at)
    }

    pub fn entry_at(&self, at: F::Cursor) -> Option<(&K, &V)> {
        self.backing.entry_at(at).map(|(_, e)| (&e.key, &e.value))
    }

    pub fn remove_at(&mut self, at: F::Cursor) -> Option<(K, V)> {
        let name: Box<str> = self.backing.entry_at(at)?.0.into();
        self.backing.delete(&name).map(|e| (e.key, e.value))
    }

    /// Lazy walk in backing-store order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.backing.iter().map(|(_, e)| (&e.key, &e.value))
    }
}

impl<K: fmt::Debug, V: fmt::Debug, F: StoreFamily> fmt::Debug for StringKeyedStore<K, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
