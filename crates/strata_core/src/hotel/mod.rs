//! # Hotel
//!
//! A generational slot store for pooled objects that come and go every frame.
//!
//! Rooms are grouped into fixed-size floors. The hotel only ever adds floors,
//! so a room's number (its id) never changes. Each room carries:
//! - an occupancy flag
//! - a generation, bumped every time the room is handed out
//! - the payload
//!
//! A [`RoomKey`] resolves only while its room is occupied with the same
//! generation. Stale keys come back as `None`, never as someone else's data.

mod key;

pub use key::RoomKey;

use std::fmt;

/// One slot of a [`Hotel`].
#[derive(Clone, Debug)]
pub struct Room<T> {
    key: RoomKey,
    occupied: bool,
    data: T,
}

impl<T> Room<T> {
    /// Key of the current (or most recent) guest.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> RoomKey {
        self.key
    }

    /// Whether the room is taken.
    #[inline]
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// The payload. Stale if the room is free.
    #[inline]
    #[must_use]
    pub const fn data(&self) -> &T {
        &self.data
    }
}

struct Floor<T> {
    rooms: Box<[Room<T>]>,
}

/// Generational slot store with stable room numbers.
///
/// Building a floor fills every new room with `T::default()`, so the
/// operations that can add floors ([`Hotel::new`], [`Hotel::acquire`],
/// [`Hotel::place`]) require `T: Default`. Lookups, clearing and iteration
/// work for any `T`. A room is filled only once: on reuse it keeps the
/// previous guest's payload.
///
/// # Example
///
/// ```rust,ignore
/// let mut sprites: Hotel<Sprite> = Hotel::new(256);
/// let key = sprites.place(Sprite::at(10.0, 20.0));
///
/// for (key, sprite) in sprites.iter() {
///     draw(sprite);
/// }
///
/// sprites.clear(key);
/// assert!(sprites.get(key).is_none());
/// ```
pub struct Hotel<T> {
    floors: Vec<Floor<T>>,
    floor_capacity: usize,
    occupied: usize,
    /// Every room below this id is occupied.
    vacancy_hint: usize,
}

// Floors are filled with `T::default()`.
impl<T: Default> Hotel<T> {
    /// Creates a hotel with one floor of `floor_capacity` rooms.
    ///
    /// # Panics
    ///
    /// Panics if `floor_capacity` is zero.
    #[must_use]
    pub fn new(floor_capacity: usize) -> Self {
        assert!(floor_capacity > 0, "Capacity must be greater than zero");

        let mut hotel = Self {
            floors: Vec::new(),
            floor_capacity,
            occupied: 0,
            vacancy_hint: 0,
        };
        hotel.add_floor();
        hotel
    }

    /// Takes the free room with the lowest id, adding a floor if every room
    /// is occupied.
    ///
    /// # Returns
    ///
    /// The room's new key and its payload, which still holds whatever the
    /// previous guest left behind.
    pub fn acquire(&mut self) -> (RoomKey, &mut T) {
        if self.occupied == self.room_count() {
            self.add_floor();
        }

        let floor_capacity = self.floor_capacity;
        let start = self.vacancy_hint;
        let id = (start..self.room_count())
            .find(|&id| !self.floors[id / floor_capacity].rooms[id % floor_capacity].occupied)
            .unwrap_or_else(|| unreachable!("occupied count says a room is free"));

        self.occupied += 1;
        self.vacancy_hint = id + 1;

        let room = &mut self.floors[id / floor_capacity].rooms[id % floor_capacity];
        room.occupied = true;
        room.key = RoomKey::new(room.key.generation().wrapping_add(1).max(1), room.key.id());
        (room.key, &mut room.data)
    }

    /// Acquires a room and moves `value` into it.
    pub fn place(&mut self, value: T) -> RoomKey {
        let (key, data) = self.acquire();
        *data = value;
        key
    }

    fn add_floor(&mut self) {
        let index = self.floors.len();
        let first_id = index * self.floor_capacity;
        let end = first_id + self.floor_capacity;
        assert!(
            u32::try_from(end).is_ok(),
            "Hotel cannot number more than u32::MAX rooms"
        );

        let rooms = (first_id..end)
            .map(|id| Room {
                key: RoomKey::new(0, id as u32),
                occupied: false,
                data: T::default(),
            })
            .collect();
        self.floors.push(Floor { rooms });

        tracing::debug!(floor = index, rooms = end, "hotel floor added");
    }
}

impl<T> Hotel<T> {
    /// Rooms per floor.
    #[inline]
    #[must_use]
    pub const fn floor_capacity(&self) -> usize {
        self.floor_capacity
    }

    /// Number of floors.
    #[inline]
    #[must_use]
    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    /// Total rooms across all floors.
    #[inline]
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.floors.len() * self.floor_capacity
    }

    /// Number of occupied rooms.
    #[inline]
    #[must_use]
    pub const fn occupied_count(&self) -> usize {
        self.occupied
    }

    /// Whether no room is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    #[inline]
    fn room(&self, id: u32) -> Option<&Room<T>> {
        let id = id as usize;
        self.floors
            .get(id / self.floor_capacity)
            .map(|floor| &floor.rooms[id % self.floor_capacity])
    }

    #[inline]
    fn room_mut(&mut self, id: u32) -> Option<&mut Room<T>> {
        let id = id as usize;
        let floor_capacity = self.floor_capacity;
        self.floors
            .get_mut(id / floor_capacity)
            .map(|floor| &mut floor.rooms[id % floor_capacity])
    }

    /// The payload behind `key`, if the key is still live.
    #[must_use]
    pub fn get(&self, key: RoomKey) -> Option<&T> {
        self.room(key.id())
            .filter(|room| room.occupied && room.key == key)
            .map(|room| &room.data)
    }

    /// Mutable payload behind `key`, if the key is still live.
    #[must_use]
    pub fn get_mut(&mut self, key: RoomKey) -> Option<&mut T> {
        self.room_mut(key.id())
            .filter(|room| room.occupied && room.key == key)
            .map(|room| &mut room.data)
    }

    /// Whether `key` is still live.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: RoomKey) -> bool {
        self.get(key).is_some()
    }

    /// Frees the room behind `key`. The payload is left as is.
    ///
    /// # Returns
    ///
    /// `false` if the key was already stale.
    pub fn clear(&mut self, key: RoomKey) -> bool {
        let Some(room) = self.room_mut(key.id()) else {
            return false;
        };
        if !room.occupied || room.key != key {
            return false;
        }
        room.occupied = false;

        self.occupied -= 1;
        self.vacancy_hint = self.vacancy_hint.min(key.id() as usize);
        true
    }

    /// Frees every room on floor `index`.
    ///
    /// # Returns
    ///
    /// Number of rooms that were occupied.
    pub fn clear_floor(&mut self, index: usize) -> usize {
        let Some(floor) = self.floors.get_mut(index) else {
            return 0;
        };

        let mut freed = 0;
        for room in floor.rooms.iter_mut().filter(|room| room.occupied) {
            room.occupied = false;
            freed += 1;
        }

        self.occupied -= freed;
        self.vacancy_hint = self.vacancy_hint.min(index * self.floor_capacity);
        freed
    }

    /// Frees every room. Floors and generations are kept.
    pub fn reset(&mut self) {
        for index in 0..self.floors.len() {
            self.clear_floor(index);
        }
        self.vacancy_hint = 0;
    }

    /// All rooms in id order, free ones included.
    pub fn rooms(&self) -> impl Iterator<Item = &Room<T>> + '_ {
        self.floors.iter().flat_map(|floor| floor.rooms.iter())
    }

    /// Occupied rooms in id order.
    pub fn iter(&self) -> impl Iterator<Item = (RoomKey, &T)> + '_ {
        self.rooms()
            .filter(|room| room.occupied)
            .map(|room| (room.key, &room.data))
    }

    /// Occupied rooms in id order, with mutable payloads.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (RoomKey, &mut T)> + '_ {
        self.floors
            .iter_mut()
            .flat_map(|floor| floor.rooms.iter_mut())
            .filter(|room| room.occupied)
            .map(|room| (room.key, &mut room.data))
    }

    /// Key of the occupied room with the lowest id.
    #[must_use]
    pub fn first_occupied(&self) -> Option<RoomKey> {
        self.iter().next().map(|(key, _)| key)
    }

    /// Key of the next occupied room after `after`'s id.
    ///
    /// Together with [`Hotel::first_occupied`] this walks the hotel without
    /// borrowing it between steps, so rooms can be cleared along the way.
    #[must_use]
    pub fn next_occupied(&self, after: RoomKey) -> Option<RoomKey> {
        let start = after.id() as usize + 1;
        self.rooms()
            .skip(start)
            .find(|room| room.occupied)
            .map(Room::key)
    }
}

impl<T> fmt::Debug for Hotel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hotel")
            .field("floor_capacity", &self.floor_capacity)
            .field("floors", &self.floors.len())
            .field("occupied", &self.occupied)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_room_floors() {
        let mut hotel: Hotel<u32> = Hotel::new(2);
        let h0 = hotel.place(10);
        let h1 = hotel.place(11);
        assert_eq!(hotel.floor_count(), 1);

        let h2 = hotel.place(12);
        assert_eq!(h0, RoomKey::new(1, 0));
        assert_eq!(h1, RoomKey::new(1, 1));
        assert_eq!(h2, RoomKey::new(1, 2));
        assert_eq!(hotel.floor_count(), 2);
        assert_eq!(hotel.room_count(), 4);

        assert!(hotel.clear(h1));
        let (again, _) = hotel.acquire();
        assert_eq!(again, RoomKey::new(2, 1));
        assert_eq!(hotel.get(h1), None);
        assert!(hotel.get(RoomKey::new(2, 1)).is_some());
    }

    #[derive(Debug, PartialEq)]
    struct Tint(u8);

    impl Default for Tint {
        fn default() -> Self {
            Self(0xFF)
        }
    }

    #[test]
    fn test_new_floors_hold_default_payload() {
        let mut hotel: Hotel<Tint> = Hotel::new(1);
        let (first, tint) = hotel.acquire();
        assert_eq!(*tint, Tint(0xFF));
        tint.0 = 7;

        // Second acquire builds a new floor.
        let (_, fresh) = hotel.acquire();
        assert_eq!(*fresh, Tint(0xFF));
        assert_eq!(hotel.floor_count(), 2);

        assert!(hotel.clear(first));
        let (_, reused) = hotel.acquire();
        assert_eq!(*reused, Tint(7));
    }

    #[test]
    fn test_lookup_fails_after_clear_even_when_reused() {
        let mut hotel: Hotel<&'static str> = Hotel::new(4);
        let first = hotel.place("first");
        assert_eq!(hotel.get(first), Some(&"first"));

        assert!(hotel.clear(first));
        assert!(!hotel.clear(first));
        assert_eq!(hotel.get(first), None);

        let second = hotel.place("second");
        assert_eq!(second.id(), first.id());
        assert_eq!(hotel.get(first), None);
        assert_eq!(hotel.get(second), Some(&"second"));
    }

    #[test]
    fn test_acquire_takes_lowest_free_id() {
        let mut hotel: Hotel<u8> = Hotel::new(3);
        let keys: Vec<RoomKey> = (0..6).map(|i| hotel.place(i)).collect();
        hotel.clear(keys[4]);
        hotel.clear(keys[1]);

        assert_eq!(hotel.place(100).id(), 1);
        assert_eq!(hotel.place(101).id(), 4);
        assert_eq!(hotel.place(102).id(), 6);
        assert_eq!(hotel.floor_count(), 3);
    }

    #[test]
    fn test_out_of_range_and_null_keys_miss() {
        let mut hotel: Hotel<u8> = Hotel::new(2);
        assert_eq!(hotel.get(RoomKey::new(1, 99)), None);
        assert!(!hotel.clear(RoomKey::new(1, 99)));
        assert_eq!(hotel.get(RoomKey::NULL), None);
        assert!(hotel.get_mut(RoomKey::NULL).is_none());
    }

    #[test]
    fn test_iteration_in_id_order() {
        let mut hotel: Hotel<u32> = Hotel::new(2);
        let keys: Vec<RoomKey> = (0..5).map(|i| hotel.place(i * 10)).collect();
        hotel.clear(keys[2]);

        let seen: Vec<u32> = hotel.iter().map(|(_, v)| *v).collect();
        assert_eq!(seen, vec![0, 10, 30, 40]);
        assert_eq!(hotel.rooms().count(), 6);
        assert_eq!(hotel.rooms().filter(|r| r.is_occupied()).count(), 4);

        for (_, value) in hotel.iter_mut() {
            *value += 1;
        }
        assert_eq!(hotel.get(keys[4]), Some(&41));
    }

    #[test]
    fn test_cursor_walk_allows_clearing() {
        let mut hotel: Hotel<u32> = Hotel::new(2);
        for i in 0..6 {
            hotel.place(i);
        }

        let mut cursor = hotel.first_occupied();
        while let Some(key) = cursor {
            cursor = hotel.next_occupied(key);
            if hotel.get(key).is_some_and(|v| v % 2 == 1) {
                hotel.clear(key);
            }
        }
        let left: Vec<u32> = hotel.iter().map(|(_, v)| *v).collect();
        assert_eq!(left, vec![0, 2, 4]);
    }

    #[test]
    fn test_clear_floor_and_reset() {
        let mut hotel: Hotel<u16> = Hotel::new(2);
        let keys: Vec<RoomKey> = (0..4).map(|i| hotel.place(i)).collect();

        assert_eq!(hotel.clear_floor(0), 2);
        assert_eq!(hotel.clear_floor(7), 0);
        assert_eq!(hotel.occupied_count(), 2);
        assert!(!hotel.contains(keys[0]));
        assert!(hotel.contains(keys[3]));
        assert_eq!(hotel.place(9).id(), 0);

        hotel.reset();
        assert!(hotel.is_empty());
        assert_eq!(hotel.floor_count(), 2);
        assert_eq!(hotel.first_occupied(), None);
        // Generations survive a reset.
        assert_eq!(hotel.place(1), RoomKey::new(3, 0));
    }

    #[test]
    fn test_payload_is_stale_not_wiped() {
        let mut hotel: Hotel<u64> = Hotel::new(1);
        let key = hotel.place(77);
        hotel.clear(key);
        let (_, data) = hotel.acquire();
        assert_eq!(*data, 77);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn stale_keys_never_resolve(ops in prop::collection::vec(any::<Option<u8>>(), 1..200)) {
                let mut hotel: Hotel<u32> = Hotel::new(4);
                let mut live: Vec<(RoomKey, u32)> = Vec::new();
                let mut dead: Vec<RoomKey> = Vec::new();

                for (step, op) in ops.into_iter().enumerate() {
                    let step = step as u32;
                    match op {
                        Some(pick) if !live.is_empty() => {
                            let (key, _) = live.swap_remove(pick as usize % live.len());
                            prop_assert!(hotel.clear(key));
                            dead.push(key);
                        }
                        _ => live.push((hotel.place(step), step)),
                    }

                    prop_assert_eq!(hotel.occupied_count(), live.len());
                    for &(key, value) in &live {
                        prop_assert_eq!(hotel.get(key), Some(&value));
                    }
                    for &key in &dead {
                        prop_assert!(hotel.get(key).is_none());
                    }
                }
            }
        }
    }
}
