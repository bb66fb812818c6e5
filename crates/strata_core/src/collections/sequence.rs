//! # Sequences
//!
//! Contiguous, type-homogeneous storage on the heap or in an [`Arena`].
//!
//! Whether a sequence may grow is part of its type:
//! - [`Sequence<T>`] doubles its capacity when a write would overflow it
//! - [`FixedSequence<T>`] refuses with [`StrataError::GrowthForbidden`]
//!
//! Element views ([`SliceRef`], [`SliceMut`], [`ElemMut`]) borrow the
//! sequence. For arena-backed sequences they also borrow the arena buffer, so
//! holding one while mutating another container in the same arena panics.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;
use rand::Rng;

use crate::error::{fatal, StrataError, StrataResult};
use crate::memory::{Arena, Backing, ElemMut, SliceMut, SliceRef, Storage};
use crate::ordering::{Direction, Ranked};

mod sealed {
    pub trait Sealed {}
}

/// Type-level growth capability of a sequence.
pub trait GrowthPolicy: sealed::Sealed {
    /// Whether writes past capacity double the storage.
    const GROWABLE: bool;
}

/// Marker: capacity doubles on demand.
#[derive(Clone, Copy, Debug, Default)]
pub struct Growable;

/// Marker: capacity is fixed at construction.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fixed;

impl sealed::Sealed for Growable {}
impl sealed::Sealed for Fixed {}

impl GrowthPolicy for Growable {
    const GROWABLE: bool = true;
}

impl GrowthPolicy for Fixed {
    const GROWABLE: bool = false;
}

/// A contiguous sequence of plain-old-data elements.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backing arena (`'static` for heap storage)
/// * `T` - Element type; any [`Pod`] type with alignment up to 16
/// * `G` - [`Growable`] (default) or [`Fixed`]
///
/// # Example
///
/// ```rust,ignore
/// let mut frame = arena.frame();
/// let mut visible: Sequence<'_, u32> = Sequence::new_in(256, &frame);
/// visible.push(entity_index);
/// ```
pub struct Sequence<'a, T: Pod, G: GrowthPolicy = Growable> {
    storage: Storage<'a, T>,
    len: usize,
    capacity: usize,
    _policy: PhantomData<G>,
}

/// A sequence that never grows past its initial capacity.
pub type FixedSequence<'a, T> = Sequence<'a, T, Fixed>;

impl<T: Pod> Sequence<'static, T> {
    /// Creates an empty growable sequence on the heap.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_backing(capacity, Backing::Heap)
    }

    /// Creates a growable heap sequence holding `capacity` copies of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn filled(capacity: usize, value: T) -> Self {
        Self::try_filled_with_backing(capacity, value, Backing::Heap).unwrap_or_else(|err| fatal(&err))
    }
}

impl Sequence<'static, u32> {
    /// Creates the heap sequence `0, 1, .., n - 1`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero or does not fit in `u32`.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let last = u32::try_from(n).unwrap_or_else(|_| panic!("Identity length {n} exceeds u32"));
        let mut sequence = Self::new(n);
        for i in 0..last {
            sequence.push(i);
        }
        sequence
    }
}

impl<'a, T: Pod> Sequence<'a, T> {
    /// Creates an empty growable sequence in `arena`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn new_in(capacity: usize, arena: &'a Arena) -> Self {
        Self::with_backing(capacity, Backing::Arena(arena))
    }

    /// Fallible form of [`Sequence::new_in`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`] if the arena is too small.
    pub fn try_new_in(capacity: usize, arena: &'a Arena) -> StrataResult<Self> {
        Self::try_with_backing(capacity, Backing::Arena(arena))
    }

    /// Creates a growable arena sequence holding `capacity` copies of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn filled_in(capacity: usize, value: T, arena: &'a Arena) -> Self {
        Self::try_filled_with_backing(capacity, value, Backing::Arena(arena))
            .unwrap_or_else(|err| fatal(&err))
    }
}

impl<T: Pod> FixedSequence<'static, T> {
    /// Creates an empty fixed-capacity sequence on the heap.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn fixed(capacity: usize) -> Self {
        Self::with_backing(capacity, Backing::Heap)
    }
}

impl<'a, T: Pod> FixedSequence<'a, T> {
    /// Creates an empty fixed-capacity sequence in `arena`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn fixed_in(capacity: usize, arena: &'a Arena) -> Self {
        Self::with_backing(capacity, Backing::Arena(arena))
    }

    /// Fallible form of [`FixedSequence::fixed_in`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`] if the arena is too small.
    pub fn try_fixed_in(capacity: usize, arena: &'a Arena) -> StrataResult<Self> {
        Self::try_with_backing(capacity, Backing::Arena(arena))
    }
}

impl<'a, T: Pod, G: GrowthPolicy> Sequence<'a, T, G> {
    /// Creates an empty sequence with an explicit backing.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Initial number of slots
    /// * `backing` - Heap or arena storage
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or the arena cannot hold it.
    #[must_use]
    pub fn with_backing(capacity: usize, backing: Backing<'a>) -> Self {
        Self::try_with_backing(capacity, backing).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`Sequence::with_backing`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`] if the arena is too small.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn try_with_backing(capacity: usize, backing: Backing<'a>) -> StrataResult<Self> {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Ok(Self {
            storage: Storage::allocate(capacity, backing)?,
            len: 0,
            capacity,
            _policy: PhantomData,
        })
    }

    /// Creates a full sequence of `capacity` copies of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`] if the arena is too small.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn try_filled_with_backing(capacity: usize, value: T, backing: Backing<'a>) -> StrataResult<Self> {
        let mut sequence = Self::try_with_backing(capacity, backing)?;
        sequence.len = capacity;
        sequence.fill(value);
        Ok(sequence)
    }

    /// Number of valid elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence holds no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots currently allocated.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Where the elements live.
    #[inline]
    #[must_use]
    pub fn backing(&self) -> Backing<'a> {
        self.storage.backing()
    }

    /// Whether this sequence type may grow.
    #[inline]
    #[must_use]
    pub const fn is_growable(&self) -> bool {
        G::GROWABLE
    }

    /// Shared view of the valid elements.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> SliceRef<'_, T> {
        self.storage.view(self.len)
    }

    /// Exclusive view of the valid elements.
    #[inline]
    #[must_use]
    pub fn as_mut_slice(&mut self) -> SliceMut<'_, T> {
        self.storage.view_mut(self.len)
    }

    /// Copies out the element at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }

    /// Overwrites the element at `index`.
    ///
    /// # Returns
    ///
    /// `false` if `index` is out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) -> bool {
        if index >= self.len {
            return false;
        }
        self.as_mut_slice()[index] = value;
        true
    }

    /// Exclusive access to the element at `index`.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<ElemMut<'_, T>> {
        if index >= self.len {
            return None;
        }
        Some(self.as_mut_slice().into_elem(index))
    }

    /// Copies the elements into a heap `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    /// Iterates over copies of the elements.
    ///
    /// The iterator holds a view, so the sequence (and for arena storage, the
    /// arena) cannot be mutated while it is alive.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            view: self.as_slice(),
            next: 0,
        }
    }

    /// Makes room for at least `required` elements.
    fn ensure_capacity(&mut self, required: usize) -> StrataResult<()> {
        if required <= self.capacity {
            return Ok(());
        }
        if !G::GROWABLE {
            return Err(StrataError::GrowthForbidden {
                capacity: self.capacity,
                requested: required,
            });
        }

        let mut grown = self.capacity;
        while grown < required {
            grown = grown.saturating_mul(2);
        }
        self.storage.resize(grown)?;

        tracing::debug!(from = self.capacity, to = grown, "sequence capacity doubled");
        self.capacity = grown;
        Ok(())
    }

    /// Appends `value`.
    ///
    /// # Returns
    ///
    /// The new length.
    ///
    /// # Panics
    ///
    /// Panics if the sequence is fixed and full, or its arena is exhausted.
    pub fn push(&mut self, value: T) -> usize {
        self.try_push(value).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`Sequence::push`].
    ///
    /// # Errors
    ///
    /// [`StrataError::GrowthForbidden`] for a full fixed sequence,
    /// [`StrataError::CapacityExceeded`] if the arena cannot grow it.
    pub fn try_push(&mut self, value: T) -> StrataResult<usize> {
        let len = self.len;
        self.ensure_capacity(len + 1)?;
        self.storage.view_mut(len + 1)[len] = value;
        self.len = len + 1;
        Ok(self.len)
    }

    /// Appends every element of `values`, doubling as often as needed.
    ///
    /// # Returns
    ///
    /// The new length.
    ///
    /// # Panics
    ///
    /// Panics if the sequence is fixed and too small, or its arena is
    /// exhausted.
    pub fn extend_from_slice(&mut self, values: &[T]) -> usize {
        self.try_extend_from_slice(values).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`Sequence::extend_from_slice`].
    ///
    /// # Errors
    ///
    /// Same as [`Sequence::try_push`].
    pub fn try_extend_from_slice(&mut self, values: &[T]) -> StrataResult<usize> {
        let len = self.len;
        let end = len + values.len();
        self.ensure_capacity(end)?;
        self.storage.view_mut(end)[len..].copy_from_slice(values);
        self.len = end;
        Ok(self.len)
    }

    /// Inserts `value` at `index`, shifting later elements right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`, the sequence is fixed and full, or the arena
    /// is exhausted.
    pub fn insert(&mut self, index: usize, value: T) -> usize {
        self.try_insert(index, value).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`Sequence::insert`].
    ///
    /// # Errors
    ///
    /// [`StrataError::IndexOutOfBounds`] if `index > len`, otherwise the same
    /// as [`Sequence::try_push`].
    pub fn try_insert(&mut self, index: usize, value: T) -> StrataResult<usize> {
        *self.try_insert_slot(index)? = value;
        Ok(self.len)
    }

    /// Opens a zeroed slot at `index` and returns it for in-place
    /// initialisation.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Sequence::insert`].
    pub fn insert_slot(&mut self, index: usize) -> ElemMut<'_, T> {
        self.try_insert_slot(index).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`Sequence::insert_slot`].
    ///
    /// # Errors
    ///
    /// Same as [`Sequence::try_insert`].
    pub fn try_insert_slot(&mut self, index: usize) -> StrataResult<ElemMut<'_, T>> {
        let len = self.len;
        if index > len {
            return Err(StrataError::IndexOutOfBounds { index, len });
        }
        self.ensure_capacity(len + 1)?;
        self.len = len + 1;

        let mut slots = self.storage.view_mut(len + 1);
        slots.copy_within(index..len, index + 1);
        slots[index] = T::zeroed();
        Ok(slots.into_elem(index))
    }

    /// Appends a zeroed element and returns it for in-place initialisation.
    ///
    /// # Panics
    ///
    /// Panics if the sequence is fixed and full, or its arena is exhausted.
    pub fn get_slot(&mut self) -> ElemMut<'_, T> {
        self.try_get_slot().unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`Sequence::get_slot`].
    ///
    /// # Errors
    ///
    /// Same as [`Sequence::try_push`].
    pub fn try_get_slot(&mut self) -> StrataResult<ElemMut<'_, T>> {
        let len = self.len;
        self.try_insert_slot(len)
    }

    /// Removes and returns the element at `index`, preserving order.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        self.try_remove(index).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`Sequence::remove`].
    ///
    /// # Errors
    ///
    /// [`StrataError::IndexOutOfBounds`] if `index >= len`.
    pub fn try_remove(&mut self, index: usize) -> StrataResult<T> {
        let len = self.len;
        if index >= len {
            return Err(StrataError::IndexOutOfBounds { index, len });
        }

        let mut slots = self.storage.view_mut(len);
        let removed = slots[index];
        slots.copy_within(index + 1..len, index);
        drop(slots);

        self.len = len - 1;
        Ok(removed)
    }

    /// Removes `count` elements starting at `index`, preserving order.
    ///
    /// # Returns
    ///
    /// The new length.
    ///
    /// # Panics
    ///
    /// Panics if the range runs past the end.
    pub fn remove_range(&mut self, index: usize, count: usize) -> usize {
        self.try_remove_range(index, count).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`Sequence::remove_range`].
    ///
    /// # Errors
    ///
    /// [`StrataError::IndexOutOfBounds`] if `index + count > len`.
    pub fn try_remove_range(&mut self, index: usize, count: usize) -> StrataResult<usize> {
        let len = self.len;
        let end = index.saturating_add(count);
        if end > len {
            return Err(StrataError::IndexOutOfBounds { index: end, len });
        }

        self.storage.view_mut(len).copy_within(end..len, index);
        self.len = len - count;
        Ok(self.len)
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<T> {
        let last = self.len.checked_sub(1)?;
        let value = self.get(last);
        self.len = last;
        value
    }

    /// Swaps two elements.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.as_mut_slice().swap(a, b);
    }

    /// Overwrites every valid element with `value`.
    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }

    /// Drops all elements. Capacity is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Ensures room for `additional` more elements.
    ///
    /// # Panics
    ///
    /// Panics if the sequence is fixed and too small, or its arena is
    /// exhausted.
    pub fn reserve(&mut self, additional: usize) {
        self.try_reserve(additional).unwrap_or_else(|err| fatal(&err));
    }

    /// Fallible form of [`Sequence::reserve`].
    ///
    /// # Errors
    ///
    /// Same as [`Sequence::try_push`].
    pub fn try_reserve(&mut self, additional: usize) -> StrataResult<()> {
        self.ensure_capacity(self.len.saturating_add(additional))
    }

    /// Sorts in place with `compare`. Not stable.
    ///
    /// For arena storage the arena buffer is mutably borrowed during the
    /// sort, so `compare` must not read other containers in the same arena.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.as_mut_slice().sort_unstable_by(compare);
    }

    /// Rebuilds the sequence in the order given by `ordering`.
    ///
    /// With [`Direction::Forward`], element `i` becomes the old element at
    /// `ordering[i].index`. With [`Direction::Reverse`] the ranking is read
    /// back to front.
    ///
    /// # Panics
    ///
    /// Panics on any error of [`Sequence::try_reorder`].
    pub fn reorder(&mut self, ordering: &[Ranked], direction: Direction) {
        self.try_reorder(ordering, direction).unwrap_or_else(|err| fatal(&err));
    }

    /// Fallible form of [`Sequence::reorder`].
    ///
    /// # Errors
    ///
    /// [`StrataError::RankingMismatch`] if `ordering.len() != len`,
    /// [`StrataError::IndexOutOfBounds`] if a ranked index is out of range,
    /// or [`StrataError::CapacityExceeded`] if the arena cannot hold the
    /// scratch copy. The sequence is untouched on error.
    pub fn try_reorder(&mut self, ordering: &[Ranked], direction: Direction) -> StrataResult<()> {
        let len = self.len;
        if ordering.len() != len {
            return Err(StrataError::RankingMismatch {
                ranked: ordering.len(),
                len,
            });
        }
        if let Some(rank) = ordering.iter().find(|rank| rank.index as usize >= len) {
            return Err(StrataError::IndexOutOfBounds {
                index: rank.index as usize,
                len,
            });
        }

        // Scratch goes on top of the arena and is freed again on drop.
        let mut scratch: Storage<'a, T> = Storage::allocate(len.max(1), self.storage.backing())?;
        for i in 0..len {
            let rank = match direction {
                Direction::Forward => ordering[i],
                Direction::Reverse => ordering[len - 1 - i],
            };
            let value = self.storage.view(len)[rank.index as usize];
            scratch.view_mut(len)[i] = value;
        }
        for i in 0..len {
            let value = scratch.view(len)[i];
            self.storage.view_mut(len)[i] = value;
        }
        Ok(())
    }

    /// Shuffles in place (Fisher-Yates), driven by `rng`.
    ///
    /// Deterministic for a seeded engine such as
    /// [`RandomEngine`](crate::RandomEngine).
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut slots = self.as_mut_slice();
        for i in (1..slots.len()).rev() {
            let j = rng.gen_range(0..=i);
            slots.swap(i, j);
        }
    }

    /// Deep copy with the same capacity, growth policy and backing.
    ///
    /// # Errors
    ///
    /// [`StrataError::CapacityExceeded`] if the arena cannot hold the copy.
    pub fn try_clone(&self) -> StrataResult<Self> {
        Ok(Self {
            storage: self.storage.duplicate()?,
            len: self.len,
            capacity: self.capacity,
            _policy: PhantomData,
        })
    }
}

impl<T: Pod + PartialEq, G: GrowthPolicy> Sequence<'_, T, G> {
    /// Index of the first element equal to `value`.
    #[must_use]
    pub fn find(&self, value: &T) -> Option<usize> {
        self.as_slice().iter().position(|item| item == value)
    }

    /// Appends `value` unless an equal element is already present.
    ///
    /// # Returns
    ///
    /// The new length, or `None` if `value` was a duplicate.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Sequence::push`].
    pub fn push_unique(&mut self, value: T) -> Option<usize> {
        self.try_push_unique(value).unwrap_or_else(|err| fatal(&err))
    }

    /// Fallible form of [`Sequence::push_unique`].
    ///
    /// # Errors
    ///
    /// Same as [`Sequence::try_push`].
    pub fn try_push_unique(&mut self, value: T) -> StrataResult<Option<usize>> {
        if self.find(&value).is_some() {
            return Ok(None);
        }
        self.try_push(value).map(Some)
    }
}

impl<T: Pod + fmt::Debug, G: GrowthPolicy> fmt::Debug for Sequence<'_, T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

/// Iterator over copies of a sequence's elements.
pub struct Iter<'s, T> {
    view: SliceRef<'s, T>,
    next: usize,
}

impl<T: Copy> Iterator for Iter<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        let item = self.view.get(self.next).copied()?;
        self.next += 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.view.len() - self.next;
        (left, Some(left))
    }
}

impl<T: Copy> ExactSizeIterator for Iter<'_, T> {}

impl<'s, T: Pod, G: GrowthPolicy> IntoIterator for &'s Sequence<'_, T, G> {
    type Item = T;
    type IntoIter = Iter<'s, T>;

    fn into_iter(self) -> Iter<'s, T> {
        self.iter()
    }
}
