//! Pair statistics: aggregates, occurrence lists, and the registry seam.
//!
//! Every tracked pair of adjacent symbols owns an aggregate carrying its
//! committed count, the pending delta accumulated since the last commit, and
//! a doubly linked list of token positions where the pair starts. The list is
//! intrusive: links live in two parallel index arrays sized to the token
//! stream, one slot per position.

use crate::error::Result;
use crate::hash_table::HashTable;
use crate::keyed_map::KeyedMap;

/// Sentinel index for absent positions and links.
pub(crate) const NIL: u32 = u32::MAX;

/// Packs two symbol ids into one registry key.
pub(crate) fn pack_pair(a: u32, b: u32) -> u64 {
    ((a as u64) << 32) | b as u64
}

/// Big-endian (count, pair) key for the priority index: lexicographic byte
/// order equals numeric order, so `remove_last` pops the best pair and ties
/// go to the larger packed key.
pub(crate) fn priority_key(count: i64, pair: u64) -> [u8; 12] {
    debug_assert!(count >= 0 && count <= u32::MAX as i64);
    let mut key = [0u8; 12];
    key[..4].copy_from_slice(&(count as u32).to_be_bytes());
    key[4..].copy_from_slice(&pair.to_be_bytes());
    key
}

pub(crate) fn pair_of_priority_key(key: &[u8]) -> u64 {
    u64::from_be_bytes(key[4..12].try_into().expect("priority key is 12 bytes"))
}

/// Parallel prev/next arrays realizing all occurrence lists at once.
pub(crate) struct OccurrenceLinks {
    pub left: Vec<u32>,
    pub right: Vec<u32>,
}

impl OccurrenceLinks {
    pub fn new(len: usize) -> Self {
        Self {
            left: vec![NIL; len],
            right: vec![NIL; len],
        }
    }
}

/// Running statistics for one tracked symbol pair.
pub(crate) struct PairAggregate {
    pub sym_a: u32,
    pub sym_b: u32,
    /// Committed count, as last folded into the priority index.
    pub count: i64,
    /// Delta accumulated since the last commit.
    pub pending: i64,
    /// Present in the engine's touched list.
    pub touched: bool,
    head: u32,
    tail: u32,
}

impl PairAggregate {
    /// Fresh aggregate seeded with its first occurrence position.
    pub fn new(sym_a: u32, sym_b: u32, index: u32) -> Self {
        Self {
            sym_a,
            sym_b,
            count: 0,
            pending: 0,
            touched: true,
            head: index,
            tail: index,
        }
    }

    pub fn head(&self) -> u32 {
        self.head
    }

    /// Appends a position to the occurrence list.
    pub fn link(&mut self, links: &mut OccurrenceLinks, index: u32) {
        if self.tail == NIL {
            self.head = index;
        } else {
            links.right[self.tail as usize] = index;
            links.left[index as usize] = self.tail;
        }
        self.tail = index;
    }

    /// Unlinks a position. Unlinking a position that is not in the list only
    /// clears that position's own cells.
    pub fn unlink(&mut self, links: &mut OccurrenceLinks, index: u32) {
        let left = links.left[index as usize];
        let right = links.right[index as usize];

        if left != NIL {
            links.right[left as usize] = right;
        }
        if right != NIL {
            links.left[right as usize] = left;
        }
        links.left[index as usize] = NIL;
        links.right[index as usize] = NIL;

        if index == self.head {
            self.head = right;
        }
        if index == self.tail {
            self.tail = left;
        }
    }

    /// Drops the whole list, clearing every member position's cells.
    pub fn clear(&mut self, links: &mut OccurrenceLinks) {
        let mut index = self.head;
        while index != NIL {
            let next = links.right[index as usize];
            links.left[index as usize] = NIL;
            links.right[index as usize] = NIL;
            index = next;
        }
        self.head = NIL;
        self.tail = NIL;
    }
}

/// Backing store seam for the pair registry. [`HashTable`] is the primary
/// store; [`KeyedMap`] is the interchangeable ordered alternate.
pub(crate) trait PairStore {
    fn get_mut(&mut self, key: u64) -> Option<&mut PairAggregate>;
    fn insert(&mut self, key: u64, aggregate: PairAggregate) -> Result<()>;
    fn remove(&mut self, key: u64) -> Option<PairAggregate>;
}

impl PairStore for HashTable<PairAggregate> {
    fn get_mut(&mut self, key: u64) -> Option<&mut PairAggregate> {
        HashTable::get_mut(self, key)
    }

    fn insert(&mut self, key: u64, aggregate: PairAggregate) -> Result<()> {
        self.add(key, aggregate)
    }

    fn remove(&mut self, key: u64) -> Option<PairAggregate> {
        self.delete(key)
    }
}

impl PairStore for KeyedMap<PairAggregate> {
    fn get_mut(&mut self, key: u64) -> Option<&mut PairAggregate> {
        KeyedMap::get_mut(self, key)
    }

    fn insert(&mut self, key: u64, aggregate: PairAggregate) -> Result<()> {
        self.set(key, aggregate);
        Ok(())
    }

    fn remove(&mut self, key: u64) -> Option<PairAggregate> {
        self.delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_key_ordering() {
        // Count dominates; the packed pair breaks ties.
        let low = priority_key(3, u64::MAX);
        let high = priority_key(4, 0);
        assert!(low < high);

        let tie_a = priority_key(4, pack_pair(1, 2));
        let tie_b = priority_key(4, pack_pair(1, 3));
        assert!(tie_a < tie_b);
        assert_eq!(pair_of_priority_key(&tie_b), pack_pair(1, 3));
    }

    #[test]
    fn test_link_unlink() {
        let mut links = OccurrenceLinks::new(16);
        let mut agg = PairAggregate::new(1, 2, 3);
        agg.link(&mut links, 7);
        agg.link(&mut links, 11);

        assert_eq!(agg.head(), 3);
        assert_eq!(links.right[3], 7);
        assert_eq!(links.right[7], 11);

        agg.unlink(&mut links, 7);
        assert_eq!(links.right[3], 11);
        assert_eq!(links.left[11], 3);

        agg.unlink(&mut links, 3);
        assert_eq!(agg.head(), 11);
        agg.unlink(&mut links, 11);
        assert_eq!(agg.head(), NIL);

        // Re-linking after a full drain restarts the list.
        agg.link(&mut links, 5);
        assert_eq!(agg.head(), 5);
    }

    #[test]
    fn test_clear_resets_cells() {
        let mut links = OccurrenceLinks::new(8);
        let mut agg = PairAggregate::new(0, 0, 0);
        agg.link(&mut links, 2);
        agg.link(&mut links, 4);
        agg.clear(&mut links);
        assert_eq!(agg.head(), NIL);
        assert!(links.left.iter().all(|&v| v == NIL));
        assert!(links.right.iter().all(|&v| v == NIL));
    }
}
