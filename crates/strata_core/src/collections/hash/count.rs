//! # Count Table
//!
//! Frequency counting on top of [`HashTable`].

use bytemuck::Pod;

use super::map::HashTable;
use crate::error::{fatal, StrataResult};
use crate::memory::{Arena, Backing};

/// Counts occurrences of `K`.
///
/// Absent keys count as zero. Reading a count never inserts.
pub struct CountTable<'a, K: Pod> {
    entries: HashTable<'a, K, u32>,
}

impl<K: Pod> CountTable<'static, K> {
    /// Creates an empty heap-backed count table.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashTable::new(capacity),
        }
    }
}

impl<'a, K: Pod> CountTable<'a, K> {
    /// Creates an empty count table in `arena`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn new_in(capacity: usize, arena: &'a Arena) -> Self {
        Self::with_backing(capacity, Backing::Arena(arena))
    }

    /// Creates an empty count table with an explicit backing.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn with_backing(capacity: usize, backing: Backing<'a>) -> Self {
        Self {
            entries: HashTable::with_backing(capacity, backing),
        }
    }

    /// Count for `key`, zero if never seen.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &K) -> u32 {
        self.entries.get(key).unwrap_or(0)
    }

    /// Bumps the count for `key`.
    ///
    /// # Returns
    ///
    /// The new count.
    ///
    /// # Panics
    ///
    /// Panics if growing an arena-backed table exhausts the arena.
    pub fn increment(&mut self, key: K) -> u32 {
        self.try_increment(key).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`CountTable::increment`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`](crate::StrataError::CapacityExceeded)
    /// if the arena cannot hold the grown table.
    pub fn try_increment(&mut self, key: K) -> StrataResult<u32> {
        let mut count = self.entries.try_get_or_insert(key, 0)?;
        *count = count.saturating_add(1);
        Ok(*count)
    }

    /// Number of distinct keys seen.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been counted.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Distinct keys over capacity.
    #[inline]
    #[must_use]
    pub fn load_factor(&self) -> f32 {
        self.entries.load_factor()
    }

    /// Forgets every count.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over `(key, count)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (K, u32)> + '_ {
        self.entries.iter()
    }
}
