//! # Storage Backing
//!
//! Where a container's elements live: the heap, or a block in an [`Arena`].
//!
//! The backing is always chosen explicitly at construction time. Arena-backed
//! storage hands out `RefCell` guards, so retaining a view across a call that
//! grows any container in the same arena panics instead of aliasing.

use std::cell::{Ref, RefMut};
use std::fmt;
use std::ops::{Deref, DerefMut};

use bytemuck::Pod;

use super::arena::{Arena, ArenaBlock, MAX_ALIGNMENT};
use crate::error::StrataResult;

/// Allocation strategy for a container.
#[derive(Clone, Copy, Default)]
pub enum Backing<'a> {
    /// Own the elements in a heap `Vec`.
    #[default]
    Heap,
    /// Borrow the elements from an arena.
    Arena(&'a Arena),
}

impl fmt::Debug for Backing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heap => f.write_str("Heap"),
            Self::Arena(arena) => f.debug_tuple("Arena").field(arena).finish(),
        }
    }
}

/// Element storage of a fixed number of slots.
///
/// All slots are always initialised (zeroed), so the owning container only
/// tracks how many of them are logically valid.
pub(crate) enum Storage<'a, T: Pod> {
    Heap(Vec<T>),
    Arena {
        arena: &'a Arena,
        block: ArenaBlock<'a>,
    },
}

impl<'a, T: Pod> Storage<'a, T> {
    /// Allocates `slots` zeroed elements.
    pub(crate) fn allocate(slots: usize, backing: Backing<'a>) -> StrataResult<Self> {
        assert!(std::mem::size_of::<T>() > 0, "Zero-sized elements are not supported");
        assert!(
            std::mem::align_of::<T>() <= MAX_ALIGNMENT,
            "Element alignment cannot exceed {MAX_ALIGNMENT}"
        );

        match backing {
            Backing::Heap => Ok(Self::Heap(vec![T::zeroed(); slots])),
            Backing::Arena(arena) => {
                let block = arena.alloc(byte_len::<T>(slots))?;
                Ok(Self::Arena { arena, block })
            }
        }
    }

    pub(crate) fn backing(&self) -> Backing<'a> {
        match self {
            Self::Heap(_) => Backing::Heap,
            Self::Arena { arena, .. } => Backing::Arena(*arena),
        }
    }

    /// Resizes to `slots` elements, keeping the existing prefix.
    pub(crate) fn resize(&mut self, slots: usize) -> StrataResult<()> {
        match self {
            Self::Heap(data) => data.resize(slots, T::zeroed()),
            Self::Arena { arena, block } => {
                let arena: &'a Arena = *arena;
                *block = arena.realloc(*block, byte_len::<T>(slots))?;
            }
        }
        Ok(())
    }

    /// Deep copy with the same slot count and backing.
    pub(crate) fn duplicate(&self) -> StrataResult<Self> {
        match self {
            Self::Heap(data) => Ok(Self::Heap(data.clone())),
            Self::Arena { arena, block } => {
                let arena: &'a Arena = *arena;
                let fresh = arena.alloc(block.len())?;
                arena.copy_block(block, &fresh);
                Ok(Self::Arena {
                    arena,
                    block: fresh,
                })
            }
        }
    }

    /// The first `len` slots.
    pub(crate) fn view(&self, len: usize) -> SliceRef<'_, T> {
        match self {
            Self::Heap(data) => SliceRef(SliceRefInner::Heap(&data[..len])),
            Self::Arena { arena, block } => {
                let slots = Ref::map(arena.slice::<T>(block), |all| &all[..len]);
                SliceRef(SliceRefInner::Arena(slots))
            }
        }
    }

    /// The first `len` slots, writable.
    pub(crate) fn view_mut(&mut self, len: usize) -> SliceMut<'_, T> {
        match self {
            Self::Heap(data) => SliceMut(SliceMutInner::Heap(&mut data[..len])),
            Self::Arena { arena, block } => {
                let slots = RefMut::map(arena.slice_mut::<T>(block), |all| &mut all[..len]);
                SliceMut(SliceMutInner::Arena(slots))
            }
        }
    }
}

impl<T: Pod> Drop for Storage<'_, T> {
    fn drop(&mut self) {
        if let Self::Arena { arena, block } = self {
            arena.free(*block);
        }
    }
}

#[inline]
fn byte_len<T>(slots: usize) -> usize {
    // Saturates so an absurd request turns into an arena capacity error.
    slots.saturating_mul(std::mem::size_of::<T>())
}

/// Shared view of a container's elements.
///
/// Derefs to `[T]`. For arena-backed containers this holds a borrow of the
/// arena buffer; drop it before mutating any container in the same arena.
pub struct SliceRef<'s, T>(SliceRefInner<'s, T>);

enum SliceRefInner<'s, T> {
    Heap(&'s [T]),
    Arena(Ref<'s, [T]>),
}

impl<T> Deref for SliceRef<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        match &self.0 {
            SliceRefInner::Heap(slice) => slice,
            SliceRefInner::Arena(slice) => slice,
        }
    }
}

/// Exclusive view of a container's elements.
///
/// Derefs to `[T]`. Same borrow rules as [`SliceRef`].
pub struct SliceMut<'s, T>(SliceMutInner<'s, T>);

enum SliceMutInner<'s, T> {
    Heap(&'s mut [T]),
    Arena(RefMut<'s, [T]>),
}

impl<'s, T> SliceMut<'s, T> {
    /// Narrows the view to a single element.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn into_elem(self, index: usize) -> ElemMut<'s, T> {
        match self.0 {
            SliceMutInner::Heap(slice) => ElemMut(ElemMutInner::Heap(&mut slice[index])),
            SliceMutInner::Arena(slice) => {
                ElemMut(ElemMutInner::Arena(RefMut::map(slice, |s| &mut s[index])))
            }
        }
    }
}

impl<T> Deref for SliceMut<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        match &self.0 {
            SliceMutInner::Heap(slice) => slice,
            SliceMutInner::Arena(slice) => slice,
        }
    }
}

impl<T> DerefMut for SliceMut<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        match &mut self.0 {
            SliceMutInner::Heap(slice) => slice,
            SliceMutInner::Arena(slice) => slice,
        }
    }
}

/// Exclusive access to one element of a container.
pub struct ElemMut<'s, T>(ElemMutInner<'s, T>);

enum ElemMutInner<'s, T> {
    Heap(&'s mut T),
    Arena(RefMut<'s, T>),
}

impl<T> Deref for ElemMut<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match &self.0 {
            ElemMutInner::Heap(elem) => elem,
            ElemMutInner::Arena(elem) => elem,
        }
    }
}

impl<T> DerefMut for ElemMut<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.0 {
            ElemMutInner::Heap(elem) => elem,
            ElemMutInner::Arena(elem) => elem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_storage_is_zeroed() {
        let storage: Storage<'_, u64> = Storage::allocate(8, Backing::Heap).unwrap();
        assert!(storage.view(8).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_arena_storage_resize_keeps_prefix() {
        let arena = Arena::new(1024);
        let mut storage: Storage<'_, u32> = Storage::allocate(2, Backing::Arena(&arena)).unwrap();
        storage.view_mut(2).copy_from_slice(&[7, 9]);
        storage.resize(4).unwrap();
        assert_eq!(&*storage.view(4), &[7, 9, 0, 0]);
    }

    #[test]
    fn test_dropping_top_storage_frees_it() {
        let arena = Arena::new(1024);
        {
            let _storage: Storage<'_, u32> = Storage::allocate(4, Backing::Arena(&arena)).unwrap();
            assert_eq!(arena.live_allocations(), 1);
        }
        assert_eq!(arena.live_allocations(), 0);
    }

    #[test]
    fn test_elem_mut_writes_through() {
        let arena = Arena::new(1024);
        let mut storage: Storage<'_, u16> = Storage::allocate(3, Backing::Arena(&arena)).unwrap();
        *storage.view_mut(3).into_elem(1) = 42;
        assert_eq!(&*storage.view(3), &[0, 42, 0]);
    }
}
