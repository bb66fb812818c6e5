//! # Substrate Configuration
//!
//! Sizing knobs, read once at startup from TOML.
//!
//! ```toml
//! frame_arena_bytes = 67108864
//! default_sequence_capacity = 64
//! default_table_capacity = 64
//! hotel_floor_capacity = 256
//! ```
//!
//! Every field is optional and falls back to [`StrataConfig::default`].

use serde::{Deserialize, Serialize};

use crate::collections::{HashTable, Sequence};
use crate::error::{StrataError, StrataResult};
use crate::hotel::Hotel;
use crate::memory::Arena;

/// Default per-frame arena size: 64 MiB.
pub const DEFAULT_FRAME_ARENA_BYTES: usize = 64 * 1024 * 1024;

/// Sizing for the containers a frame loop creates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrataConfig {
    /// Capacity of the per-frame arena in bytes.
    pub frame_arena_bytes: usize,
    /// Initial capacity of sequences built from this config.
    pub default_sequence_capacity: usize,
    /// Initial slot count of hash tables built from this config.
    pub default_table_capacity: usize,
    /// Rooms per hotel floor.
    pub hotel_floor_capacity: usize,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            frame_arena_bytes: DEFAULT_FRAME_ARENA_BYTES,
            default_sequence_capacity: 64,
            default_table_capacity: 64,
            hotel_floor_capacity: 256,
        }
    }
}

impl StrataConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] if the document does not parse
    /// or fails [`StrataConfig::validate`].
    pub fn from_toml_str(source: &str) -> StrataResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| StrataError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the config as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> StrataResult<String> {
        toml::to_string(self).map_err(|err| StrataError::InvalidConfig(err.to_string()))
    }

    /// Rejects zero sizes.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> StrataResult<()> {
        let fields = [
            ("frame_arena_bytes", self.frame_arena_bytes),
            ("default_sequence_capacity", self.default_sequence_capacity),
            ("default_table_capacity", self.default_table_capacity),
            ("hotel_floor_capacity", self.hotel_floor_capacity),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(StrataError::InvalidConfig(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    /// Creates the per-frame arena.
    #[must_use]
    pub fn frame_arena(&self) -> Arena {
        Arena::new(self.frame_arena_bytes)
    }

    /// Creates an empty growable sequence in `arena`.
    ///
    /// # Panics
    ///
    /// Panics if the arena cannot hold the initial capacity.
    #[must_use]
    pub fn sequence_in<'a, T: bytemuck::Pod>(&self, arena: &'a Arena) -> Sequence<'a, T> {
        Sequence::new_in(self.default_sequence_capacity, arena)
    }

    /// Creates an empty heap-backed hash table.
    #[must_use]
    pub fn table<K: bytemuck::Pod, V: bytemuck::Pod>(&self) -> HashTable<'static, K, V> {
        HashTable::new(self.default_table_capacity)
    }

    /// Creates an empty hotel.
    #[must_use]
    pub fn hotel<T: Default>(&self) -> Hotel<T> {
        Hotel::new(self.hotel_floor_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(StrataConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = StrataConfig::from_toml_str("hotel_floor_capacity = 8\n").unwrap();
        assert_eq!(config.hotel_floor_capacity, 8);
        assert_eq!(config.frame_arena_bytes, DEFAULT_FRAME_ARENA_BYTES);

        let hotel: Hotel<u32> = config.hotel();
        assert_eq!(hotel.floor_capacity(), 8);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let err = StrataConfig::from_toml_str("default_table_capacity = 0").unwrap_err();
        assert_eq!(
            err,
            StrataError::InvalidConfig("default_table_capacity must be greater than zero".into())
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(matches!(
            StrataConfig::from_toml_str("frame_arena = 12"),
            Err(StrataError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = StrataConfig {
            frame_arena_bytes: 4096,
            ..StrataConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(StrataConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_builders_use_configured_sizes() {
        let config = StrataConfig {
            frame_arena_bytes: 4096,
            default_sequence_capacity: 3,
            default_table_capacity: 16,
            hotel_floor_capacity: 4,
        };
        let arena = config.frame_arena();
        assert_eq!(arena.capacity(), 4096);

        let seq: Sequence<'_, u32> = config.sequence_in(&arena);
        assert_eq!(seq.capacity(), 3);

        let table: HashTable<'_, u32, u32> = config.table();
        assert_eq!(table.capacity(), 16);
    }
}
