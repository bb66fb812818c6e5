//! # Hash Set
//!
//! Membership-only counterpart of [`HashTable`](super::HashTable).

use std::fmt;

use bytemuck::Pod;

use super::table::{Headroom, RawIter, RawTable};
use crate::error::{fatal, StrataResult};
use crate::memory::{Arena, Backing};

/// An open-addressing set of `K`.
pub struct HashSet<'a, K: Pod> {
    raw: RawTable<'a, K>,
}

impl<K: Pod> HashSet<'static, K> {
    /// Creates an empty heap-backed set.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_backing(capacity, Backing::Heap)
    }
}

impl<'a, K: Pod> HashSet<'a, K> {
    /// Creates an empty set in `arena`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn new_in(capacity: usize, arena: &'a Arena) -> Self {
        Self::with_backing(capacity, Backing::Arena(arena))
    }

    /// Creates an empty set with an explicit backing.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn with_backing(capacity: usize, backing: Backing<'a>) -> Self {
        Self::try_with_backing(capacity, backing).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`HashSet::with_backing`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`](crate::StrataError::CapacityExceeded)
    /// if the arena is too small.
    pub fn try_with_backing(capacity: usize, backing: Backing<'a>) -> StrataResult<Self> {
        Ok(Self {
            raw: RawTable::with_backing(capacity, backing)?,
        })
    }

    /// Number of keys.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Keys over capacity.
    #[inline]
    #[must_use]
    pub fn load_factor(&self) -> f32 {
        self.raw.load_factor()
    }

    /// Whether `key` is in the set.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.raw.find(key).is_some()
    }

    /// Adds `key`.
    ///
    /// # Returns
    ///
    /// `true` if the key was not present before.
    ///
    /// # Panics
    ///
    /// Panics if growing an arena-backed set exhausts the arena.
    pub fn insert(&mut self, key: K) -> bool {
        self.try_insert(key).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`HashSet::insert`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`](crate::StrataError::CapacityExceeded)
    /// if the arena cannot hold the grown set.
    pub fn try_insert(&mut self, key: K) -> StrataResult<bool> {
        if self.contains(&key) {
            return Ok(false);
        }
        match self.raw.headroom() {
            Headroom::Ready => {}
            Headroom::Purge => self.raw.purge(|_, _| {}),
            Headroom::Grow(capacity) => self.raw.rebuild(capacity, |_, _| {})?,
        }
        let (_, inserted) = self.raw.claim(key);
        Ok(inserted)
    }

    /// Removes `key`.
    ///
    /// # Returns
    ///
    /// `true` if the key was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.raw.remove(key).is_some()
    }

    /// Removes every key. Capacity is kept.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Iterates over the keys in slot order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        SetIter {
            raw: self.raw.iter(),
        }
    }
}

struct SetIter<'s, K> {
    raw: RawIter<'s, K>,
}

impl<K: Copy> Iterator for SetIter<'_, K> {
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<K> {
        self.raw.next().map(|(_, key)| key)
    }
}

impl<K: Pod + fmt::Debug> fmt::Debug for HashSet<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
