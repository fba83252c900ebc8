use crate::config::MapOptions;
use crate::error::MapError;
use crate::key::MapKey;
use crate::raw_map::RawHybridMap;
use crate::store::{Linked, StoreFamily};
use crate::tracker::Generation;
use crate::views::{EntrySet, EntrySetIterator, KeySet, Values};
use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

pub(crate) type Shared<K, V, F> = Rc<RefCell<RawHybridMap<K, V, F>>>;

/// Shared handle to a map. Every method takes `&self`; views and iterators
/// hold their own handle to the same map, so a change made through any of
/// them is visible to all the others.
///
/// Use `share()` for a second handle to the same map. `Clone` copies the
/// entries into a new, independent map.
pub struct HybridMap<K, V, F: StoreFamily = Linked> {
    inner: Shared<K, V, F>, // single-threaded interior mutability
}

impl<K, V> HybridMap<K, V>
where
    K: MapKey,
{
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, F> Default for HybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    fn default() -> Self {
        Self::from_raw(RawHybridMap::default())
    }
}

impl<K, V, F> HybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    pub fn with_options(options: MapOptions) -> Result<Self, MapError> {
        Ok(Self::from_raw(RawHybridMap::with_options(options)?))
    }

    pub fn from_raw(raw: RawHybridMap<K, V, F>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(raw)),
        }
    }

    /// New map holding a copy of every entry of `other`.
    pub fn from_map<G: StoreFamily>(other: &HybridMap<K, V, G>) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let map = Self::default();
        map.put_all(other);
        map
    }

    /// A second handle to this same map.
    pub fn share(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }

    /// True when both handles address the same map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn generation(&self) -> Generation {
        self.inner.borrow().generation()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.borrow().contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.borrow().get(key).cloned()
    }

    /// Borrow the value in place. The map cannot be changed through any
    /// handle while the guard is alive.
    pub fn get_ref(&self, key: &K) -> Option<std::cell::Ref<'_, V>> {
        std::cell::Ref::filter_map(self.inner.borrow(), |m| m.get(key)).ok()
    }

    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.inner.borrow_mut().put(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.borrow_mut().remove(key)
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().clear()
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.inner.borrow().contains_value(value)
    }

    /// Copy every entry of `other` into this map. `other` is read in full
    /// before the first write, so `other` may be this map itself.
    pub fn put_all<G: StoreFamily>(&self, other: &HybridMap<K, V, G>)
    where
        K: Clone,
        V: Clone,
    {
        let pairs: Vec<(K, V)> = other
            .inner
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.inner.borrow_mut().extend(pairs);
    }

    pub fn entry_set(&self) -> EntrySet<K, V, F> {
        EntrySet::new(Rc::clone(&self.inner))
    }

    pub fn key_set(&self) -> KeySet<K, V, F> {
        KeySet::new(Rc::clone(&self.inner))
    }

    pub fn values(&self) -> Values<K, V, F> {
        Values::new(Rc::clone(&self.inner))
    }

    /// Fail-fast iterator over the entries; same as `entry_set().iter()`.
    pub fn iter(&self) -> EntrySetIterator<K, V, F>
    where
        K: Clone,
        V: Clone,
    {
        EntrySetIterator::new(Rc::clone(&self.inner))
    }
}

impl<K, V, F> Clone for HybridMap<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    fn clone(&self) -> Self {
        Self::from_raw(self.inner.borrow().clone())
    }
}

impl<K, V, F, G> PartialEq<HybridMap<K, V, G>> for HybridMap<K, V, F>
where
    K: MapKey,
    V: PartialEq,
    F: StoreFamily,
    G: StoreFamily,
{
    fn eq(&self, other: &HybridMap<K, V, G>) -> bool {
        *self.inner.borrow() == *other.inner.borrow()
    }
}

impl<K, V, F> Eq for HybridMap<K, V, F>
where
    K: MapKey,
    V: Eq,
    F: StoreFamily,
{
}

impl<K, V, F> fmt::Debug for HybridMap<K, V, F>
where
    K: MapKey + fmt::Debug,
    V: fmt::Debug,
    F: StoreFamily,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner.borrow(), f)
    }
}

impl<K, V, F> Extend<(K, V)> for HybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        // One put per item; `iter` may itself read this map.
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, F> FromIterator<(K, V)> for HybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_raw(iter.into_iter().collect())
    }
}

impl<K, V, F> From<RawHybridMap<K, V, F>> for HybridMap<K, V, F>
where
    K: MapKey,
    F: StoreFamily,
{
    fn from(raw: RawHybridMap<K, V, F>) -> Self {
        Self::from_raw(raw)
    }
}

impl<K, V, F> IntoIterator for &HybridMap<K, V, F>
where
    K: MapKey + Clone,
    V: Clone,
    F: StoreFamily,
{
    type Item = Result<crate::views::Entry<K, V, F>, MapError>;
    type IntoIter = EntrySetIterator<K, V, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: `share` aliases the map while `clone` detaches a copy.
    #[test]
    fn share_aliases_clone_copies() {
        let m: HybridMap<String, i32> = HybridMap::new();
        m.put("a".into(), 1);
        let alias = m.share();
        let copy = m.clone();
        assert!(alias.ptr_eq(&m));
        assert!(!copy.ptr_eq(&m));

        alias.put("b".into(), 2);
        assert_eq!(m.len(), 2);
        assert_eq!(copy.len(), 1);
        assert_eq!(copy.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn get_ref_borrows_in_place() {
        let m: HybridMap<Option<i32>, Vec<u8>> = HybridMap::new();
        m.put(None, vec![1, 2, 3]);
        assert_eq!(m.get_ref(&None).map(|v| v.len()), Some(3));
        assert!(m.get_ref(&Some(1)).is_none());
        // guard released; writes go through again
        m.put(Some(1), vec![]);
        assert_eq!(m.len(), 2);
    }

    /// Invariant: `put_all` of a map into itself changes nothing.
    #[test]
    fn put_all_into_self() {
        let m: HybridMap<&str, i32> = [("x", 1), ("y", 2)].into_iter().collect();
        let g = m.generation();
        m.put_all(&m.share());
        assert_eq!(m.len(), 2);
        assert_eq!(m.generation(), g);

        let copy = HybridMap::<&str, i32>::from_map(&m);
        assert_eq!(copy, m);
    }

    #[test]
    fn options_flow_through() {
        let bad = MapOptions {
            load_factor: f32::NAN,
            ..MapOptions::default()
        };
        assert!(HybridMap::<i32, i32>::with_options(bad).is_err());
        let m = HybridMap::<i32, i32>::with_options(MapOptions::with_capacity(32)).unwrap();
        assert!(m.is_empty());
    }
}
