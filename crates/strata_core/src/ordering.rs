//! # Priority Orderings
//!
//! An externally computed ranking (draw order, sort keys, scores) expressed
//! as `(index, priority)` pairs, applied to a sequence with
//! [`Sequence::reorder`](crate::Sequence::reorder).

use std::cmp::Ordering;

use bytemuck::{Pod, Zeroable};

/// An element index paired with its priority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Ranked {
    /// Index of the element in the sequence being ranked.
    pub index: u32,
    /// Priority of that element. Lower sorts first.
    pub priority: f32,
}

impl Ranked {
    /// Creates a new ranking entry.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, priority: f32) -> Self {
        Self { index, priority }
    }

    /// Total order on priority. NaN sorts after every number.
    #[inline]
    #[must_use]
    pub fn cmp_priority(a: &Self, b: &Self) -> Ordering {
        a.priority.total_cmp(&b.priority)
    }

    /// Sorts a ranking by ascending priority.
    pub fn sort(ranking: &mut [Self]) {
        ranking.sort_unstable_by(Self::cmp_priority);
    }
}

/// Which end of a ranking comes first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Lowest priority first.
    #[default]
    Forward,
    /// Highest priority first.
    Reverse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_priority() {
        let mut ranking = [
            Ranked::new(0, 3.0),
            Ranked::new(1, -1.0),
            Ranked::new(2, 2.5),
        ];
        Ranked::sort(&mut ranking);
        let order: Vec<u32> = ranking.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let mut ranking = [Ranked::new(0, f32::NAN), Ranked::new(1, 1.0)];
        Ranked::sort(&mut ranking);
        assert_eq!(ranking[0].index, 1);
    }
}
