//! # STRATA Core
//!
//! Memory substrate for a real-time frame loop:
//! - A bump [`Arena`] with stack-ordered frees and O(1) reset
//! - [`Sequence`] containers on the heap or in an arena
//! - Open-addressing [`HashTable`], [`HashSet`] and [`CountTable`]
//! - A generational slot store, the [`Hotel`]
//!
//! ## Architecture Rules
//!
//! 1. **Explicit backing** - every container is told where its memory lives
//! 2. **Capacity bugs are loud** - overflowing a fixed container or an arena
//!    aborts with the requested and available sizes (`try_*` forms return
//!    them as [`StrataError`] instead)
//! 3. **Misses are quiet** - stale hotel keys and absent hash keys are `None`
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::{Arena, Hotel, Sequence};
//!
//! let mut arena = Arena::new(64 * 1024 * 1024);
//! let mut sprites: Hotel<Sprite> = Hotel::new(256);
//!
//! loop {
//!     let frame = arena.frame();
//!     let mut visible: Sequence<'_, u32> = Sequence::new_in(1024, &frame);
//!     for (key, sprite) in sprites.iter() {
//!         // ...
//!     }
//! } // frame dropped: arena reset
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collections;
pub mod config;
pub mod error;
pub mod hashing;
pub mod hotel;
pub mod memory;
pub mod ordering;
pub mod random;

pub use collections::{CountTable, FixedSequence, HashSet, HashTable, Sequence};
pub use config::StrataConfig;
pub use error::{StrataError, StrataResult};
pub use hotel::{Hotel, Room, RoomKey};
pub use memory::{Arena, ArenaBlock, Backing, FrameScope};
pub use ordering::{Direction, Ranked};
pub use random::RandomEngine;
