//! Key kinds and natural hash codes.
//!
//! Every key is classified once at the map boundary: string keys go to the
//! string-keyed store, everything else (the null key included) goes to the
//! hash-chain store.

use std::rc::Rc;

/// A key the hybrid map can route and hash.
///
/// Contract:
/// - `hash_code` is consistent with `Eq`: equal keys have equal codes.
/// - Two keys whose `as_str_key` yield equal strings are `Eq`-equal, and a
///   key with a string form is never equal to a key without one.
pub trait MapKey: Eq {
    /// The key's natural 32-bit hash code.
    fn hash_code(&self) -> i32;

    /// The string form of a string key; `None` for every other kind.
    #[inline]
    fn as_str_key(&self) -> Option<&str> {
        None
    }

    #[inline]
    fn route(&self) -> RoutedKey<'_, Self>
    where
        Self: Sized,
    {
        match self.as_str_key() {
            Some(s) => RoutedKey::Str(s),
            None => RoutedKey::Opaque(self),
        }
    }
}

/// A key after routing.
#[derive(Debug)]
pub enum RoutedKey<'a, K> {
    Str(&'a str),
    Opaque(&'a K),
}

impl<K> Clone for RoutedKey<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for RoutedKey<'_, K> {}

/// Polynomial hash over UTF-16 code units with wrapping 32-bit arithmetic.
pub fn string_hash_code(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

macro_rules! string_key {
    ($($t:ty),*) => {$(
        impl MapKey for $t {
            #[inline]
            fn hash_code(&self) -> i32 {
                string_hash_code(core::ops::Deref::deref(self))
            }
            #[inline]
            fn as_str_key(&self) -> Option<&str> {
                Some(core::ops::Deref::deref(self))
            }
        }
    )*};
}

string_key!(String, Box<str>, Rc<str>);

impl MapKey for &str {
    #[inline]
    fn hash_code(&self) -> i32 {
        string_hash_code(self)
    }
    #[inline]
    fn as_str_key(&self) -> Option<&str> {
        Some(*self)
    }
}

macro_rules! widening_key {
    ($($t:ty),*) => {$(
        impl MapKey for $t {
            #[inline]
            fn hash_code(&self) -> i32 {
                i32::from(*self)
            }
        }
    )*};
}

widening_key!(i8, i16, i32, u8, u16);

impl MapKey for u32 {
    #[inline]
    fn hash_code(&self) -> i32 {
        *self as i32
    }
}

impl MapKey for i64 {
    #[inline]
    fn hash_code(&self) -> i32 {
        (*self ^ ((*self as u64) >> 32) as i64) as i32
    }
}

impl MapKey for u64 {
    #[inline]
    fn hash_code(&self) -> i32 {
        (*self ^ (*self >> 32)) as i32
    }
}

impl MapKey for char {
    #[inline]
    fn hash_code(&self) -> i32 {
        *self as i32
    }
}

impl MapKey for bool {
    #[inline]
    fn hash_code(&self) -> i32 {
        if *self {
            1231
        } else {
            1237
        }
    }
}

impl MapKey for () {
    #[inline]
    fn hash_code(&self) -> i32 {
        0
    }
}

/// `None` is the null key: hash code 0, always routed to the chain store.
impl<K: MapKey> MapKey for Option<K> {
    #[inline]
    fn hash_code(&self) -> i32 {
        self.as_ref().map_or(0, MapKey::hash_code)
    }

    #[inline]
    fn as_str_key(&self) -> Option<&str> {
        self.as_ref().and_then(MapKey::as_str_key)
    }
}
