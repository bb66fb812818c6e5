//! # Memory Management
//!
//! The frame arena and the backing strategies containers allocate through.
//!
//! ## Design Philosophy
//!
//! Transient per-frame data goes into one pre-allocated arena that is reset
//! once the frame is submitted:
//! - No general-purpose allocation in the frame loop
//! - O(1) bulk release
//! - Backing is picked explicitly per container, never implied

mod arena;
mod backing;

pub use arena::{Arena, ArenaBlock, FrameScope, DEFAULT_ALIGNMENT, MAX_ALIGNMENT};
pub use backing::{Backing, ElemMut, SliceMut, SliceRef};

pub(crate) use backing::Storage;
