//! Position index over id-keyed ordered sequences
//!
//! The owning sequence is the source of truth; the index maps each id to its
//! current position and is rebuilt after every structural change. Lookups
//! return `None` for unknown ids rather than a sentinel position.

use std::collections::HashMap;
use std::hash::Hash;

/// Entities addressable by id inside an ordered sequence
pub trait Identified {
    /// Identifier type
    type Id: Copy + Eq + Hash;

    /// This entity's id
    fn id(&self) -> Self::Id;
}

/// Id → position map for one ordered sequence
#[derive(Debug, Clone)]
pub struct PositionIndex<K> {
    positions: HashMap<K, usize>,
}

impl<K> Default for PositionIndex<K> {
    fn default() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> PositionIndex<K> {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build index for a sequence
    #[must_use]
    pub fn build<T: Identified<Id = K>>(items: &[T]) -> Self {
        let mut index = Self::new();
        index.rebuild(items);
        index
    }

    /// Recompute every position from the sequence
    pub fn rebuild<T: Identified<Id = K>>(&mut self, items: &[T]) {
        self.positions.clear();
        self.positions.reserve(items.len());
        for (position, item) in items.iter().enumerate() {
            self.positions.insert(item.id(), position);
        }
        debug_assert_eq!(
            self.positions.len(),
            items.len(),
            "duplicate id in indexed sequence"
        );
    }

    /// Position of one id
    #[inline]
    #[must_use]
    pub fn index_of(&self, id: &K) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Positions of several ids in one pass
    ///
    /// Unknown ids are absent from the returned map.
    #[must_use]
    pub fn indexes_of<'a, I>(&self, ids: I) -> HashMap<K, usize>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        ids.into_iter()
            .filter_map(|id| self.index_of(id).map(|position| (*id, position)))
            .collect()
    }

    /// Whether the id is indexed
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &K) -> bool {
        self.positions.contains_key(id)
    }

    /// Number of indexed ids
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the index is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct Item(u32);

    impl Identified for Item {
        type Id = u32;

        fn id(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn index_of_reports_not_found_distinctly() {
        let items = vec![Item(7), Item(3)];
        let index = PositionIndex::build(&items);

        assert_eq!(index.index_of(&7), Some(0));
        assert_eq!(index.index_of(&3), Some(1));
        assert_eq!(index.index_of(&99), None);
    }

    #[test]
    fn rebuild_tracks_reordering() {
        let mut items = vec![Item(1), Item(2), Item(3)];
        let mut index = PositionIndex::build(&items);

        items.remove(0);
        index.rebuild(&items);

        assert_eq!(index.index_of(&1), None);
        assert_eq!(index.index_of(&2), Some(0));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn indexes_of_skips_unknown() {
        let items = vec![Item(1), Item(2)];
        let index = PositionIndex::build(&items);

        let found = index.indexes_of(&[2, 5]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[&2], 1);
    }
}
