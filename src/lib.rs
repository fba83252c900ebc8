//! hybrid-hashmap: a single-threaded map that keeps string keys in a
//! string-keyed store and every other key in hash-code chains, with live
//! views and fail-fast iterators.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a general key -> value map whose common case (string keys) pays
//!   no chain-scan cost, while arbitrary keys, the null key included, still
//!   work through their natural hash code and `Eq`.
//! - Layers:
//!   - AssociativeStore<V>: the primitive string-keyed store both halves
//!     are built on. `LinkedStore` is the default: a hashbrown index over
//!     slotmap slots threaded in insertion order. Injected through a
//!     `StoreFamily`, so a map can run on another backing store.
//!   - StringKeyedStore / HashChainStore: the two halves. The first maps a
//!     key's string form straight to its entry. The second maps the decimal
//!     form of a key's `hash_code` to a chain of entries compared by `Eq`.
//!   - RawHybridMap<K, V, F>: routes each key once (`MapKey::route`), owns
//!     both halves and the modification tracker. Plain `&mut self` API.
//!   - HybridMap<K, V, F>: shared handle over a `RawHybridMap`; hands out
//!     live views (`EntrySet`, `KeySet`, `Values`) and fail-fast iterators.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (`Rc` + `RefCell`, no atomics).
//! - Every live key is in exactly one half; `len` is recomputed as the sum
//!   of both halves.
//! - Structural changes (new key, removal, clear) move the map's
//!   generation exactly once each. Replacing a present key's value does
//!   not.
//! - Iteration order: string entries in store order, then chained entries
//!   in bucket order, then chain order. Stable for an unchanged map.
//!
//! Fail-fast iteration
//! - An iterator snapshots the generation on creation and checks it before
//!   every step. Any structural change made through another handle fails
//!   the next step with `MapError::ConcurrentModification`.
//! - The iterator's own `remove` resynchronizes its snapshot inside the
//!   same borrow that removes the entry, and only ever removes the mapping
//!   the iterator returned.
//! - An `Entry` follows one mapping. Once its key is removed it keeps the
//!   last value seen, even if the key is put back later.
//! - This catches misuse; it is not a synchronization mechanism.
//!   `MapOptions::fail_fast = false` turns the check off.
//!
//! Reentrancy
//! - The map calls user code only through `K: Eq`, `MapKey::hash_code`,
//!   `V: PartialEq` and `Clone`. Touching the same map from inside those
//!   impls panics with a `RefCell` borrow error.
//! - Guards from `HybridMap::get_ref` block every write to the map until
//!   dropped.
//!
//! Overflow semantics
//! - The generation is a wrapping `u64`. An iterator would have to miss
//!   exactly 2^64 changes between two steps to pass a stale check.
//!
//! Notes and non-goals
//! - No thread safety, no ordering guarantees beyond the above, no
//!   persistence.
//! - `put` returns the previous value, if any. Maps that store null values
//!   use `V = Option<T>`.
//! - `HybridMap::clone` copies the entries; `HybridMap::share` is the
//!   second handle to the same map.

mod chain_store;
mod config;
mod error;
mod hybrid_map;
mod key;
mod raw_map;
mod raw_map_proptest;
pub mod store;
mod string_store;
mod tracker;
mod views;

// Public surface
pub use config::MapOptions;
pub use error::MapError;
pub use hybrid_map::HybridMap;
pub use key::{string_hash_code, MapKey, RoutedKey};
pub use raw_map::{Iter, RawHybridMap};
pub use store::{AssociativeStore, Linked, LinkedCursor, LinkedStore, StoreFamily};
pub use tracker::Generation;
pub use views::{Entry, EntrySet, EntrySetIterator, KeyIter, KeySet, ValueIter, Values};
