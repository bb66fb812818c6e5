//! # Arena Allocator
//!
//! A bump allocator over one fixed buffer with stack-ordered frees.
//!
//! The arena keeps a stack of offsets. The top entry is the end of the most
//! recent live allocation and the entry below it is that allocation's start,
//! which is what makes LIFO `free` and in-place `realloc` O(1). Anything else
//! degrades to "leak until reset".

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, Range};

use bytemuck::{Pod, Zeroable};

use crate::error::{StrataError, StrataResult};

/// Alignment used when the caller does not ask for one.
pub const DEFAULT_ALIGNMENT: usize = 2 * std::mem::size_of::<usize>();

/// Largest alignment the arena can honour.
pub const MAX_ALIGNMENT: usize = 16;

/// Unit of backing storage. Keeps the buffer base 16-byte aligned so typed
/// views can be cast out of it without copying.
#[derive(Clone, Copy, Zeroable, Pod)]
#[repr(C, align(16))]
struct Chunk([u8; MAX_ALIGNMENT]);

/// A live allocation inside an [`Arena`].
///
/// Blocks borrow the arena they came from, so the borrow checker refuses a
/// [`Arena::reset`] while any block is still held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct ArenaBlock<'arena> {
    offset: usize,
    len: usize,
    _arena: PhantomData<&'arena Arena>,
}

impl ArenaBlock<'_> {
    /// Byte offset from the start of the arena buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Size of the allocation in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// A fixed-capacity linear allocator.
///
/// Allocation only needs `&self`, so any number of containers can share one
/// arena. [`Arena::reset`] needs `&mut self`, which statically guarantees that
/// nothing allocated since the last reset is still in use.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new(64 * 1024 * 1024);
///
/// loop {
///     let frame = arena.frame();
///     let colors = frame.alloc(4 * 16 * entity_count)?;
///     // ... fill and submit ...
/// } // frame scope ends, arena is reset
/// ```
pub struct Arena {
    /// The backing storage, zeroed at creation.
    storage: RefCell<Box<[Chunk]>>,
    /// Offset stack. Never empty: entry 0 is the base.
    offsets: RefCell<Vec<usize>>,
    /// Total capacity in bytes.
    capacity: usize,
    /// Allocations since the last reset.
    allocations: Cell<usize>,
    /// LIFO frees since the last reset.
    frees: Cell<usize>,
}

impl Arena {
    /// Creates a new arena with the specified capacity in bytes.
    ///
    /// The whole buffer is allocated and zeroed up front.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        tracing::info!(capacity, "arena created");

        let chunks = capacity.div_ceil(MAX_ALIGNMENT);
        let mut offsets = Vec::with_capacity(1024);
        offsets.push(0);

        Self {
            storage: RefCell::new(vec![Chunk::zeroed(); chunks].into_boxed_slice()),
            offsets: RefCell::new(offsets),
            capacity,
            allocations: Cell::new(0),
            frees: Cell::new(0),
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the end offset of the most recent live allocation.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        let offsets = self.offsets.borrow();
        offsets[offsets.len() - 1]
    }

    /// Returns the bytes left after the current top offset.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity - self.used()
    }

    /// Number of allocations that are still on the offset stack.
    #[inline]
    #[must_use]
    pub fn live_allocations(&self) -> usize {
        self.offsets.borrow().len() - 1
    }

    /// Number of allocations made since the last reset.
    #[inline]
    #[must_use]
    pub fn allocation_count(&self) -> usize {
        self.allocations.get()
    }

    /// Number of frees that actually popped the stack since the last reset.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.frees.get()
    }

    /// Allocates `size` zeroed bytes at [`DEFAULT_ALIGNMENT`].
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::CapacityExceeded`] if the aligned allocation
    /// does not fit.
    pub fn alloc(&self, size: usize) -> StrataResult<ArenaBlock<'_>> {
        self.alloc_aligned(size, DEFAULT_ALIGNMENT)
    }

    /// Allocates `size` zeroed bytes at `alignment`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidAlignment`] if `alignment` is not a power
    /// of two up to [`MAX_ALIGNMENT`], or [`StrataError::CapacityExceeded`] if
    /// the allocation does not fit.
    pub fn alloc_aligned(&self, size: usize, alignment: usize) -> StrataResult<ArenaBlock<'_>> {
        check_alignment(alignment)?;

        let mut offsets = self.offsets.borrow_mut();
        let top = offsets.len() - 1;
        let aligned = align_forward(offsets[top], alignment);
        let end = self.checked_end(aligned, size)?;

        // Zero-sized blocks never touch the stack, so they can't shadow a
        // real allocation on free.
        if size == 0 {
            return Ok(ArenaBlock {
                offset: aligned,
                len: 0,
                _arena: PhantomData,
            });
        }

        // The previous top becomes the aligned start of this allocation.
        offsets[top] = aligned;
        offsets.push(end);
        drop(offsets);

        self.allocations.set(self.allocations.get() + 1);
        self.zero(aligned..end);

        Ok(ArenaBlock {
            offset: aligned,
            len: size,
            _arena: PhantomData,
        })
    }

    /// Resizes `block` to `new_size` bytes at [`DEFAULT_ALIGNMENT`].
    ///
    /// # Errors
    ///
    /// See [`Arena::realloc_aligned`].
    pub fn realloc<'a>(&'a self, block: ArenaBlock<'a>, new_size: usize) -> StrataResult<ArenaBlock<'a>> {
        self.realloc_aligned(block, new_size, DEFAULT_ALIGNMENT)
    }

    /// Resizes `block` to `new_size` bytes.
    ///
    /// If `block` is the most recent live allocation it is resized in place
    /// and any added bytes are zeroed. Otherwise a new block is allocated and
    /// `min(old, new)` bytes are copied over; the old block stays leaked until
    /// the next reset.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidAlignment`] or
    /// [`StrataError::CapacityExceeded`] as for [`Arena::alloc_aligned`].
    pub fn realloc_aligned<'a>(
        &'a self,
        block: ArenaBlock<'a>,
        new_size: usize,
        alignment: usize,
    ) -> StrataResult<ArenaBlock<'a>> {
        check_alignment(alignment)?;

        if block.is_empty() {
            return self.alloc_aligned(new_size, alignment);
        }

        if self.is_top(block) {
            let end = self.checked_end(block.offset, new_size)?;
            {
                let mut offsets = self.offsets.borrow_mut();
                let top = offsets.len() - 1;
                offsets[top] = end;
            }
            if new_size > block.len {
                self.zero(block.offset + block.len..end);
            }
            return Ok(ArenaBlock {
                offset: block.offset,
                len: new_size,
                _arena: PhantomData,
            });
        }

        tracing::debug!(
            offset = block.offset,
            old_size = block.len,
            new_size,
            "arena realloc of a non-top block, copying"
        );

        let fresh = self.alloc_aligned(new_size, alignment)?;
        let copied = block.len.min(new_size);
        self.copy_bytes(block.offset, fresh.offset, copied);
        Ok(fresh)
    }

    /// Frees `block` if it is the most recent live allocation.
    ///
    /// Frees out of stack order are silently ignored; that memory comes back
    /// on the next reset. Zero-sized blocks were never pushed and are ignored
    /// too.
    ///
    /// # Returns
    ///
    /// `true` if the offset stack was popped.
    pub fn free(&self, block: ArenaBlock<'_>) -> bool {
        if block.is_empty() || !self.is_top(block) {
            return false;
        }
        self.offsets.borrow_mut().pop();
        self.frees.set(self.frees.get() + 1);
        true
    }

    /// Pops the offset stack back to the base entry.
    ///
    /// This is an O(1) operation - no memory is freed or zeroed.
    #[inline]
    pub fn reset(&mut self) {
        tracing::trace!(
            used = self.used(),
            allocations = self.allocations.get(),
            frees = self.frees.get(),
            "arena reset"
        );
        let offsets = self.offsets.get_mut();
        offsets.truncate(1);
        offsets[0] = 0;
        self.allocations.set(0);
        self.frees.set(0);
    }

    /// Opens a frame scope that resets the arena when it is dropped.
    #[inline]
    pub fn frame(&mut self) -> FrameScope<'_> {
        FrameScope { arena: self }
    }

    /// Read access to the bytes of `block`.
    ///
    /// # Panics
    ///
    /// Panics if the arena storage is currently borrowed mutably.
    #[must_use]
    pub fn bytes<'s>(&'s self, block: &ArenaBlock<'_>) -> Ref<'s, [u8]> {
        let range = block.range();
        Ref::map(self.storage.borrow(), move |chunks| {
            &bytemuck::cast_slice::<Chunk, u8>(chunks)[range]
        })
    }

    /// Write access to the bytes of `block`.
    ///
    /// # Panics
    ///
    /// Panics if the arena storage is currently borrowed.
    #[must_use]
    pub fn bytes_mut<'s>(&'s self, block: &ArenaBlock<'_>) -> RefMut<'s, [u8]> {
        let range = block.range();
        RefMut::map(self.storage.borrow_mut(), move |chunks| {
            &mut bytemuck::cast_slice_mut::<Chunk, u8>(chunks)[range]
        })
    }

    /// Typed read access to `block`.
    ///
    /// # Panics
    ///
    /// Panics if the block is not a whole number of `T` or is misaligned for
    /// `T`, or if the storage is borrowed mutably.
    #[must_use]
    pub fn slice<'s, T: Pod>(&'s self, block: &ArenaBlock<'_>) -> Ref<'s, [T]> {
        Ref::map(self.bytes(block), |bytes| bytemuck::cast_slice(bytes))
    }

    /// Typed write access to `block`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Arena::slice`], plus any outstanding borrow.
    #[must_use]
    pub fn slice_mut<'s, T: Pod>(&'s self, block: &ArenaBlock<'_>) -> RefMut<'s, [T]> {
        RefMut::map(self.bytes_mut(block), |bytes| bytemuck::cast_slice_mut(bytes))
    }

    /// Copies `src`'s bytes into the front of `dst`.
    pub(crate) fn copy_block(&self, src: &ArenaBlock<'_>, dst: &ArenaBlock<'_>) {
        self.copy_bytes(src.offset, dst.offset, src.len.min(dst.len));
    }

    fn is_top(&self, block: ArenaBlock<'_>) -> bool {
        let offsets = self.offsets.borrow();
        let n = offsets.len();
        n >= 2 && offsets[n - 2] == block.offset
    }

    fn checked_end(&self, start: usize, size: usize) -> StrataResult<usize> {
        start
            .checked_add(size)
            .filter(|&end| end <= self.capacity)
            .ok_or(StrataError::CapacityExceeded {
                requested: size,
                available: self.capacity.saturating_sub(start),
            })
    }

    fn zero(&self, range: Range<usize>) {
        let mut storage = self.storage.borrow_mut();
        bytemuck::cast_slice_mut::<Chunk, u8>(&mut storage)[range].fill(0);
    }

    fn copy_bytes(&self, from: usize, to: usize, len: usize) {
        let mut storage = self.storage.borrow_mut();
        bytemuck::cast_slice_mut::<Chunk, u8>(&mut storage).copy_within(from..from + len, to);
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("used", &self.used())
            .field("live_allocations", &self.live_allocations())
            .finish()
    }
}

/// Exclusive, scoped access to an [`Arena`] for one frame.
///
/// Derefs to the arena so containers can be created in it. When the scope is
/// dropped the arena is reset; the borrow checker has already proven that
/// everything allocated inside the scope is gone by then.
pub struct FrameScope<'a> {
    arena: &'a mut Arena,
}

impl Deref for FrameScope<'_> {
    type Target = Arena;

    #[inline]
    fn deref(&self) -> &Arena {
        self.arena
    }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        self.arena.reset();
    }
}

/// Rounds `offset` up to the next multiple of `alignment` (a power of two).
#[inline]
const fn align_forward(offset: usize, alignment: usize) -> usize {
    (offset + alignment - 1) & !(alignment - 1)
}

fn check_alignment(alignment: usize) -> StrataResult<()> {
    if alignment.is_power_of_two() && alignment <= MAX_ALIGNMENT {
        Ok(())
    } else {
        Err(StrataError::InvalidAlignment {
            alignment,
            max: MAX_ALIGNMENT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_allocation() {
        let arena = Arena::new(1024);
        let block = arena.alloc(10).unwrap();
        assert_eq!(block.offset(), 0);
        assert_eq!(block.len(), 10);
        assert_eq!(arena.used(), 10);
        assert_eq!(arena.live_allocations(), 1);
    }

    #[test]
    fn test_arena_reset() {
        let mut arena = Arena::new(1024);
        let _ = arena.alloc(10).unwrap();
        assert!(arena.used() > 0);

        arena.reset();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.live_allocations(), 0);
        assert_eq!(arena.allocation_count(), 0);
    }

    #[test]
    fn test_reset_reuses_base_offset() {
        let mut arena = Arena::new(256);
        let first = arena.alloc(100).unwrap().offset();
        arena.reset();
        let second = arena.alloc(100).unwrap().offset();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exact_capacity_boundary() {
        let arena = Arena::new(100);
        assert!(arena.alloc(101).is_err());
        assert!(arena.alloc(100).is_ok());
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn test_capacity_error_reports_available() {
        let arena = Arena::new(64);
        let _ = arena.alloc(40).unwrap();
        // Next offset aligns 40 up to 48, leaving 16 bytes.
        let err = arena.alloc(32).unwrap_err();
        assert_eq!(
            err,
            StrataError::CapacityExceeded {
                requested: 32,
                available: 16
            }
        );
    }

    #[test]
    fn test_alignment_is_applied() {
        let arena = Arena::new(256);
        let _ = arena.alloc_aligned(3, 1).unwrap();
        let block = arena.alloc_aligned(8, 8).unwrap();
        assert_eq!(block.offset(), 8);
    }

    #[test]
    fn test_invalid_alignment_rejected() {
        let arena = Arena::new(256);
        assert!(matches!(
            arena.alloc_aligned(8, 3),
            Err(StrataError::InvalidAlignment { alignment: 3, .. })
        ));
        assert!(matches!(
            arena.alloc_aligned(8, 32),
            Err(StrataError::InvalidAlignment { alignment: 32, .. })
        ));
    }

    #[test]
    fn test_lifo_free_pops() {
        let arena = Arena::new(256);
        let a = arena.alloc(16).unwrap();
        let b = arena.alloc(16).unwrap();

        // Out of order: ignored.
        assert!(!arena.free(a));
        assert_eq!(arena.live_allocations(), 2);

        assert!(arena.free(b));
        assert!(arena.free(a));
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.free_count(), 2);
    }

    #[test]
    fn test_realloc_top_grows_in_place_and_zeroes() {
        let arena = Arena::new(256);
        let block = arena.alloc(8).unwrap();
        arena.bytes_mut(&block).fill(0xAB);

        let grown = arena.realloc(block, 16).unwrap();
        assert_eq!(grown.offset(), block.offset());
        let bytes = arena.bytes(&grown);
        assert!(bytes[..8].iter().all(|&b| b == 0xAB));
        assert!(bytes[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_realloc_non_top_copies() {
        let arena = Arena::new(256);
        let a = arena.alloc(8).unwrap();
        arena.bytes_mut(&a).copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let _b = arena.alloc(8).unwrap();

        let moved = arena.realloc(a, 4).unwrap();
        assert_ne!(moved.offset(), a.offset());
        assert_eq!(&*arena.bytes(&moved), &[1, 2, 3, 4]);
        assert_eq!(arena.live_allocations(), 3);
    }

    #[test]
    fn test_realloc_past_capacity_fails() {
        let arena = Arena::new(32);
        let block = arena.alloc(16).unwrap();
        assert!(matches!(
            arena.realloc(block, 33),
            Err(StrataError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_typed_views() {
        let arena = Arena::new(256);
        let block = arena.alloc(4 * std::mem::size_of::<u32>()).unwrap();
        arena.slice_mut::<u32>(&block).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(&*arena.slice::<u32>(&block), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_sized_blocks_do_not_touch_stack() {
        let arena = Arena::new(64);
        let empty = arena.alloc(0).unwrap();
        let real = arena.alloc(8).unwrap();
        assert!(!arena.free(empty));
        assert_eq!(arena.live_allocations(), 1);
        assert!(arena.free(real));
    }

    #[test]
    fn test_free_after_padding_still_pops() {
        let arena = Arena::new(64);
        let a = arena.alloc_aligned(3, 1).unwrap();
        let b = arena.alloc_aligned(8, 8).unwrap();
        assert!(arena.free(b));
        assert!(arena.free(a));
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn test_frame_scope_resets_on_drop() {
        let mut arena = Arena::new(1024);
        {
            let frame = arena.frame();
            let _ = frame.alloc(512).unwrap();
            assert_eq!(frame.used(), 512);
        }
        assert_eq!(arena.used(), 0);
    }
}
