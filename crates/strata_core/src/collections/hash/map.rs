//! # Hash Table
//!
//! Key/value table over raw key bytes. See the [module docs](super) for the
//! probing and removal rules.

use std::fmt;

use bytemuck::Pod;

use super::table::{Headroom, RawIter, RawTable};
use crate::collections::sequence::FixedSequence;
use crate::error::{fatal, StrataResult};
use crate::memory::{Arena, Backing, ElemMut, SliceRef};

/// An open-addressing hash table from `K` to `V`.
///
/// # Example
///
/// ```rust,ignore
/// // Deduplicate OBJ face corners while building a vertex buffer.
/// let mut seen: HashTable<'_, [u32; 3], u32> = HashTable::new(1024);
/// let index = *seen.get_or_insert(corner, next_index);
/// ```
pub struct HashTable<'a, K: Pod, V: Pod> {
    raw: RawTable<'a, K>,
    values: FixedSequence<'a, V>,
}

impl<K: Pod, V: Pod> HashTable<'static, K, V> {
    /// Creates an empty heap-backed table.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_backing(capacity, Backing::Heap)
    }
}

impl<'a, K: Pod, V: Pod> HashTable<'a, K, V> {
    /// Creates an empty table in `arena`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn new_in(capacity: usize, arena: &'a Arena) -> Self {
        Self::with_backing(capacity, Backing::Arena(arena))
    }

    /// Fallible form of [`HashTable::new_in`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`](crate::StrataError::CapacityExceeded)
    /// if the arena is too small.
    pub fn try_new_in(capacity: usize, arena: &'a Arena) -> StrataResult<Self> {
        Self::try_with_backing(capacity, Backing::Arena(arena))
    }

    /// Creates an empty table with an explicit backing.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn with_backing(capacity: usize, backing: Backing<'a>) -> Self {
        Self::try_with_backing(capacity, backing).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`HashTable::with_backing`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`](crate::StrataError::CapacityExceeded)
    /// if the arena is too small.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn try_with_backing(capacity: usize, backing: Backing<'a>) -> StrataResult<Self> {
        Ok(Self {
            raw: RawTable::with_backing(capacity, backing)?,
            values: FixedSequence::try_filled_with_backing(capacity, V::zeroed(), backing)?,
        })
    }

    /// Number of live entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the table has no live entries.
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

    /// Live entries over capacity. Never above 0.5.
    #[inline]
    #[must_use]
    pub fn load_factor(&self) -> f32 {
        self.raw.load_factor()
    }

    /// Slots holding a removed key that have not been reclaimed yet.
    #[inline]
    #[must_use]
    pub const fn tombstones(&self) -> usize {
        self.raw.tombstones()
    }

    /// Where the slots live.
    #[inline]
    #[must_use]
    pub fn backing(&self) -> Backing<'a> {
        self.raw.backing()
    }

    /// Copies out the value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.raw.find(key)?;
        self.values.get(slot)
    }

    /// Exclusive access to the value stored for `key`.
    #[must_use]
    pub fn get_mut(&mut self, key: &K) -> Option<ElemMut<'_, V>> {
        let slot = self.raw.find(key)?;
        self.values.get_mut(slot)
    }

    /// Whether `key` is present.
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.find(key).is_some()
    }

    /// Stores `value` under `key`.
    ///
    /// # Returns
    ///
    /// The previous value, if `key` was already present.
    ///
    /// # Panics
    ///
    /// Panics if growing an arena-backed table exhausts the arena.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.try_insert(key, value).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`HashTable::insert`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`](crate::StrataError::CapacityExceeded)
    /// if the arena cannot hold the grown table.
    pub fn try_insert(&mut self, key: K, value: V) -> StrataResult<Option<V>> {
        let (slot, inserted) = self.entry(key, value)?;
        if inserted {
            return Ok(None);
        }
        let previous = self.values.get(slot);
        self.values.set(slot, value);
        Ok(previous)
    }

    /// Value for `key`, inserting `default` first if it is absent.
    ///
    /// # Panics
    ///
    /// Panics if growing an arena-backed table exhausts the arena.
    pub fn get_or_insert(&mut self, key: K, default: V) -> ElemMut<'_, V> {
        self.try_get_or_insert(key, default).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`HashTable::get_or_insert`].
    ///
    /// # Errors
    ///
    /// Same as [`HashTable::try_insert`].
    pub fn try_get_or_insert(&mut self, key: K, default: V) -> StrataResult<ElemMut<'_, V>> {
        let (slot, _) = self.entry(key, default)?;
        Ok(self.values.as_mut_slice().into_elem(slot))
    }

    /// Removes `key`.
    ///
    /// # Returns
    ///
    /// The removed value, or `None` if `key` was absent.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.raw.remove(key)?;
        self.values.get(slot)
    }

    /// Removes every entry. Capacity is kept.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Iterates over `(key, value)` pairs in slot order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            raw: self.raw.iter(),
            values: self.values.as_slice(),
        }
    }

    /// Iterates over keys in slot order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.raw.iter().map(|(_, key)| key)
    }

    /// Iterates over values in slot order.
    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Finds or claims the slot for `key`, making room first if claiming
    /// would break the load factor. A freshly claimed slot is seeded with
    /// `seed`.
    fn entry(&mut self, key: K, seed: V) -> StrataResult<(usize, bool)> {
        if let Some(slot) = self.raw.find(&key) {
            return Ok((slot, false));
        }
        match self.raw.headroom() {
            Headroom::Ready => {}
            Headroom::Purge => {
                let values = &mut self.values;
                self.raw.purge(|old, new| {
                    if let Some(value) = values.get(old) {
                        values.set(new, value);
                    }
                });
            }
            Headroom::Grow(capacity) => self.grow(capacity)?,
        }
        let (slot, inserted) = self.raw.claim(key);
        self.values.set(slot, seed);
        Ok((slot, inserted))
    }

    fn grow(&mut self, capacity: usize) -> StrataResult<()> {
        let mut values: FixedSequence<'a, V> =
            FixedSequence::try_filled_with_backing(capacity, V::zeroed(), self.values.backing())?;

        let old_values = &self.values;
        self.raw.rebuild(capacity, |old, new| {
            if let Some(value) = old_values.get(old) {
                values.set(new, value);
            }
        })?;

        self.values = values;
        Ok(())
    }
}

impl<K: Pod + fmt::Debug, V: Pod + fmt::Debug> fmt::Debug for HashTable<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(key, value)` pairs of a [`HashTable`].
pub struct Iter<'s, K, V> {
    raw: RawIter<'s, K>,
    values: SliceRef<'s, V>,
}

impl<K: Copy, V: Copy> Iterator for Iter<'_, K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        let (slot, key) = self.raw.next()?;
        Some((key, self.values[slot]))
    }
}

impl<'s, K: Pod, V: Pod> IntoIterator for &'s HashTable<'_, K, V> {
    type Item = (K, V);
    type IntoIter = Iter<'s, K, V>;

    fn into_iter(self) -> Iter<'s, K, V> {
        self.iter()
    }
}
