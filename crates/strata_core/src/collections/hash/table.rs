//! Slot states, keys and the probing shared by every hash container.

use bytemuck::Pod;

use crate::collections::sequence::FixedSequence;
use crate::error::StrataResult;
use crate::hashing::{hash_key, keys_equal};
use crate::memory::{Backing, SliceRef};

pub(crate) const EMPTY: u8 = 0;
pub(crate) const OCCUPIED: u8 = 1;
pub(crate) const TOMBSTONE: u8 = 2;

/// Answer of [`RawTable::headroom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Headroom {
    /// A slot can be claimed as is.
    Ready,
    /// Tombstones must be cleared first; capacity stays.
    Purge,
    /// The table must be rebuilt at this capacity.
    Grow(usize),
}

/// Outcome of walking a probe chain.
enum Probe {
    /// The key lives at this slot.
    Found(usize),
    /// The key is absent. Holds the slot an insert should claim: the first
    /// tombstone on the chain, else the empty slot that ended it.
    Missing(Option<usize>),
}

/// Open-addressing key table with linear probing.
///
/// Owns the slot states and keys. Containers that carry values keep them in a
/// parallel sequence indexed by the same slot.
pub(crate) struct RawTable<'a, K: Pod> {
    states: FixedSequence<'a, u8>,
    keys: FixedSequence<'a, K>,
    len: usize,
    tombstones: usize,
}

impl<'a, K: Pod> RawTable<'a, K> {
    pub(crate) fn with_backing(capacity: usize, backing: Backing<'a>) -> StrataResult<Self> {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Ok(Self {
            states: FixedSequence::try_filled_with_backing(capacity, EMPTY, backing)?,
            keys: FixedSequence::try_filled_with_backing(capacity, K::zeroed(), backing)?,
            len: 0,
            tombstones: 0,
        })
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn capacity(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub(crate) const fn tombstones(&self) -> usize {
        self.tombstones
    }

    #[inline]
    pub(crate) fn backing(&self) -> Backing<'a> {
        self.states.backing()
    }

    /// Live entries over capacity.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn load_factor(&self) -> f32 {
        self.len as f32 / self.capacity() as f32
    }

    /// What has to happen before one more key can claim a slot.
    ///
    /// Live keys decide growth. Tombstones alone never grow the table; once
    /// they push the probe load past half the capacity they are purged in
    /// place instead.
    pub(crate) fn headroom(&self) -> Headroom {
        let capacity = self.capacity();
        if (self.len + 1) * 2 > capacity {
            Headroom::Grow(capacity.saturating_mul(2))
        } else if (self.len + self.tombstones + 1) * 2 > capacity {
            Headroom::Purge
        } else {
            Headroom::Ready
        }
    }

    fn probe(&self, key: &K) -> Probe {
        let capacity = self.capacity();
        let home = home_slot(key, capacity);
        let states = self.states.as_slice();
        let keys = self.keys.as_slice();

        let mut first_tombstone = None;
        for step in 0..capacity {
            let slot = (home + step) % capacity;
            match states[slot] {
                EMPTY => return Probe::Missing(Some(first_tombstone.unwrap_or(slot))),
                OCCUPIED if keys_equal(&keys[slot], key) => return Probe::Found(slot),
                TOMBSTONE if first_tombstone.is_none() => first_tombstone = Some(slot),
                _ => {}
            }
        }
        Probe::Missing(first_tombstone)
    }

    /// Slot holding `key`.
    pub(crate) fn find(&self, key: &K) -> Option<usize> {
        match self.probe(key) {
            Probe::Found(slot) => Some(slot),
            Probe::Missing(_) => None,
        }
    }

    /// Claims a slot for `key`, or returns the slot it already occupies.
    ///
    /// # Returns
    ///
    /// `(slot, inserted)`.
    ///
    /// # Panics
    ///
    /// Panics if there is no free slot; callers act on
    /// [`RawTable::headroom`] first.
    pub(crate) fn claim(&mut self, key: K) -> (usize, bool) {
        let slot = match self.probe(&key) {
            Probe::Found(slot) => return (slot, false),
            Probe::Missing(Some(slot)) => slot,
            Probe::Missing(None) => panic!("Hash table has no free slot; growth was skipped"),
        };

        if self.states.get(slot) == Some(TOMBSTONE) {
            self.tombstones -= 1;
        }
        self.states.set(slot, OCCUPIED);
        self.keys.set(slot, key);
        self.len += 1;
        (slot, true)
    }

    /// Tombstones the slot holding `key`.
    pub(crate) fn remove(&mut self, key: &K) -> Option<usize> {
        let slot = self.find(key)?;
        self.states.set(slot, TOMBSTONE);
        self.len -= 1;
        self.tombstones += 1;
        Some(slot)
    }

    /// Marks every slot empty.
    pub(crate) fn clear(&mut self) {
        self.states.fill(EMPTY);
        self.len = 0;
        self.tombstones = 0;
    }

    /// Reinserts every live key into fresh storage of `capacity` slots.
    ///
    /// Tombstones are dropped. `moved(old_slot, new_slot)` is called for each
    /// live key so the caller can carry its parallel values along.
    pub(crate) fn rebuild<F>(&mut self, capacity: usize, mut moved: F) -> StrataResult<()>
    where
        F: FnMut(usize, usize),
    {
        let backing = self.backing();
        let mut states: FixedSequence<'a, u8> = FixedSequence::try_filled_with_backing(capacity, EMPTY, backing)?;
        let mut keys: FixedSequence<'a, K> = FixedSequence::try_filled_with_backing(capacity, K::zeroed(), backing)?;

        for old in 0..self.capacity() {
            if self.states.get(old) != Some(OCCUPIED) {
                continue;
            }
            let Some(key) = self.keys.get(old) else {
                continue;
            };

            let mut slot = home_slot(&key, capacity);
            while states.get(slot) != Some(EMPTY) {
                slot = (slot + 1) % capacity;
            }
            states.set(slot, OCCUPIED);
            keys.set(slot, key);
            moved(old, slot);
        }

        tracing::debug!(
            from = self.capacity(),
            to = capacity,
            live = self.len,
            dropped_tombstones = self.tombstones,
            "hash table rehashed"
        );

        self.states = states;
        self.keys = keys;
        self.tombstones = 0;
        Ok(())
    }

    /// Turns every tombstone back into an empty slot without reallocating.
    ///
    /// Live keys are re-homed in chain order, each moving to the first empty
    /// slot from its home. `moved(old_slot, new_slot)` is called for every key
    /// that changes slot; the new slot never holds a live value.
    pub(crate) fn purge<F>(&mut self, mut moved: F)
    where
        F: FnMut(usize, usize),
    {
        let capacity = self.capacity();
        // Live keys plus tombstones never exceed half the slots, so an empty
        // slot exists and no chain runs across it.
        let start = (0..capacity)
            .find(|&slot| self.states.get(slot) == Some(EMPTY))
            .unwrap_or(0);

        for slot in 0..capacity {
            if self.states.get(slot) == Some(TOMBSTONE) {
                self.states.set(slot, EMPTY);
            }
        }

        for step in 1..=capacity {
            let old = (start + step) % capacity;
            if self.states.get(old) != Some(OCCUPIED) {
                continue;
            }
            let Some(key) = self.keys.get(old) else {
                continue;
            };

            self.states.set(old, EMPTY);
            let mut slot = home_slot(&key, capacity);
            while self.states.get(slot) != Some(EMPTY) {
                slot = (slot + 1) % capacity;
            }
            self.states.set(slot, OCCUPIED);
            if slot != old {
                self.keys.set(slot, key);
                moved(old, slot);
            }
        }

        tracing::debug!(
            capacity,
            live = self.len,
            dropped_tombstones = self.tombstones,
            "hash table purged tombstones"
        );
        self.tombstones = 0;
    }

    /// Walks the occupied slots in slot order.
    pub(crate) fn iter(&self) -> RawIter<'_, K> {
        RawIter {
            states: self.states.as_slice(),
            keys: self.keys.as_slice(),
            next: 0,
        }
    }
}

#[inline]
fn home_slot<K: Pod>(key: &K, capacity: usize) -> usize {
    hash_key(key) as usize % capacity
}

/// Occupied `(slot, key)` pairs of a [`RawTable`].
pub(crate) struct RawIter<'s, K> {
    states: SliceRef<'s, u8>,
    keys: SliceRef<'s, K>,
    next: usize,
}

impl<K: Copy> Iterator for RawIter<'_, K> {
    type Item = (usize, K);

    fn next(&mut self) -> Option<(usize, K)> {
        while self.next < self.states.len() {
            let slot = self.next;
            self.next += 1;
            if self.states[slot] == OCCUPIED {
                return Some((slot, self.keys[slot]));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_then_find() {
        let mut table: RawTable<'_, u32> = RawTable::with_backing(8, Backing::Heap).unwrap();
        let (slot, inserted) = table.claim(42);
        assert!(inserted);
        assert_eq!(table.find(&42), Some(slot));
        assert_eq!(table.claim(42), (slot, false));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_leaves_tombstone_that_is_reused() {
        let mut table: RawTable<'_, u32> = RawTable::with_backing(16, Backing::Heap).unwrap();
        // 5 and 7 share a home slot at capacity 16.
        let (first, _) = table.claim(5);
        let (second, _) = table.claim(7);
        assert_eq!(second, (first + 1) % 16);

        assert_eq!(table.remove(&5), Some(first));
        assert_eq!(table.tombstones(), 1);
        assert_eq!(table.find(&7), Some(second));

        // The tombstone on 5's chain is claimed before any empty slot.
        let (reused, inserted) = table.claim(5);
        assert!(inserted);
        assert_eq!(reused, first);
        assert_eq!(table.tombstones(), 0);
    }

    #[test]
    fn test_rebuild_drops_tombstones_and_reports_moves() {
        let mut table: RawTable<'_, u64> = RawTable::with_backing(4, Backing::Heap).unwrap();
        let _ = table.claim(1);
        let _ = table.claim(2);
        let _ = table.remove(&1);

        let mut moves = Vec::new();
        table.rebuild(8, |old, new| moves.push((old, new))).unwrap();

        assert_eq!(table.capacity(), 8);
        assert_eq!(table.tombstones(), 0);
        assert_eq!(moves.len(), 1);
        assert_eq!(table.find(&2), Some(moves[0].1));
        assert_eq!(table.find(&1), None);
    }

    #[test]
    fn test_headroom_grows_on_live_keys_only() {
        let mut table: RawTable<'_, u32> = RawTable::with_backing(4, Backing::Heap).unwrap();
        let _ = table.claim(1);
        assert_eq!(table.headroom(), Headroom::Ready);
        let _ = table.remove(&1);
        let _ = table.claim(2);
        // One live key plus one tombstone: purge, not grow.
        assert_eq!(table.headroom(), Headroom::Purge);
        let _ = table.claim(3);
        assert_eq!(table.headroom(), Headroom::Grow(8));
    }

    #[test]
    fn test_purge_keeps_chains_reachable() {
        let mut table: RawTable<'_, u32> = RawTable::with_backing(16, Backing::Heap).unwrap();
        // 5 and 7 share a home slot at capacity 16, so 7 sits behind 5.
        let (first, _) = table.claim(5);
        let (second, _) = table.claim(7);
        let _ = table.claim(3);
        let _ = table.remove(&5);
        let _ = table.remove(&3);

        let mut moves = Vec::new();
        table.purge(|old, new| moves.push((old, new)));

        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.len(), 1);
        assert_eq!(moves, vec![(second, first)]);
        assert_eq!(table.find(&7), Some(first));
        assert_eq!(table.find(&5), None);
        assert_eq!(table.find(&3), None);
    }

    #[test]
    fn test_purge_with_no_tombstones_moves_nothing() {
        let mut table: RawTable<'_, u64> = RawTable::with_backing(8, Backing::Heap).unwrap();
        for key in 0..4u64 {
            let _ = table.claim(key);
        }
        let before: Vec<(usize, u64)> = table.iter().collect();
        let mut moved = 0;
        table.purge(|_, _| moved += 1);
        assert_eq!(moved, 0);
        assert_eq!(table.iter().collect::<Vec<_>>(), before);
    }
}
