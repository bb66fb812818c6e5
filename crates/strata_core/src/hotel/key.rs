//! Generational room handles.

use bytemuck::{Pod, Zeroable};

/// Handle to a room in a [`Hotel`](super::Hotel).
///
/// A key stays checkable forever: once its room is cleared and handed out
/// again the generation moves on and the old key stops resolving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(C)]
pub struct RoomKey {
    generation: u32,
    id: u32,
}

impl RoomKey {
    /// A key no room ever matches. Live rooms start at generation 1.
    pub const NULL: Self = Self { generation: 0, id: 0 };

    /// Creates a key from its parts.
    ///
    /// # Arguments
    ///
    /// * `generation` - Generation the room had when it was acquired
    /// * `id` - Room number, counted across floors
    #[inline]
    #[must_use]
    pub const fn new(generation: u32, id: u32) -> Self {
        Self { generation, id }
    }

    /// The generation part.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// The room number.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.id
    }

    /// Whether this is [`RoomKey::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.generation == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let key = RoomKey::new(3, 17);
        assert_eq!(key.generation(), 3);
        assert_eq!(key.id(), 17);
        assert!(!key.is_null());
        assert!(RoomKey::default().is_null());
    }

    #[test]
    fn test_keys_hash_by_bytes() {
        use crate::hashing::hash_key;
        assert_ne!(hash_key(&RoomKey::new(1, 2)), hash_key(&RoomKey::new(2, 1)));
    }
}
