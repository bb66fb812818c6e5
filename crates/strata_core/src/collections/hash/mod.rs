//! # Hash Containers
//!
//! Open-addressing tables keyed by the raw bytes of [`Pod`](bytemuck::Pod)
//! keys:
//! - [`HashTable`] maps keys to values
//! - [`HashSet`] tracks membership
//! - [`CountTable`] counts occurrences
//!
//! ## Layout
//!
//! Slot states, keys and values live in parallel fixed-capacity sequences on
//! the heap or in an arena. A key's home slot is its
//! [one-at-a-time hash](crate::hashing::hash_bytes) modulo the capacity and
//! collisions probe linearly, wrapping at the end.
//!
//! ## Growth
//!
//! Before a new key claims a slot, the table doubles and rehashes every live
//! key if live keys would exceed half the capacity. If only the tombstones
//! push the probe load past half, they are purged in place and the capacity
//! stays, so insert/remove churn of fresh keys never grows the table.
//!
//! ## Removal
//!
//! Removing a key leaves a tombstone. Lookups probe past tombstones, inserts
//! reuse the first one on their probe path and a rehash discards them. A key
//! stored behind a removed collider therefore stays reachable.

mod count;
mod map;
mod set;
mod table;

pub use count::CountTable;
pub use map::{HashTable, Iter};
pub use set::HashSet;
