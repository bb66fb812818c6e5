//! # Collections
//!
//! Containers that live on the heap or in an [`Arena`](crate::Arena):
//! - [`Sequence`] / [`FixedSequence`] - contiguous storage
//! - [`HashTable`], [`HashSet`], [`CountTable`] - open-addressing tables

pub mod hash;
mod sequence;

pub use hash::{CountTable, HashSet, HashTable};
pub use sequence::{Fixed, FixedSequence, Growable, GrowthPolicy, Iter, Sequence};
