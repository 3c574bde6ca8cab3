//! Fixed-capacity hash table with open addressing.
//!
//! Linear probing with tombstone deletion: a deleted slot keeps a tombstone
//! marker so later probes for keys placed past it still find them. The table
//! never resizes; capacity is planned up front by the caller.

use crate::error::{Error, Result};

enum Slot<V> {
    Empty,
    Tombstone,
    Occupied { key: u64, value: V },
}

/// Open-addressing map from u64 keys to values.
pub struct HashTable<V> {
    slots: Vec<Slot<V>>,
    mask: usize,
}

/// Multiplicative scramble of a 64-bit key. Fast and adequate for probe
/// distribution, not a cryptographic hash.
pub fn hash64(a: u64) -> u64 {
    let a = a.wrapping_mul(0xc6a4_a793_5bd1_e995);
    a ^ (a >> 47)
}

impl<V> HashTable<V> {
    /// Creates a table with `1 << bits` slots.
    pub fn with_capacity_bits(bits: u32) -> Self {
        let capacity = 1usize << bits;
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Empty);
        Self {
            slots,
            mask: capacity - 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Inserts `value` under `key`. An existing entry for the same key wins;
    /// otherwise the first tombstone or empty slot on the probe path is
    /// claimed. A full probe cycle without a claimable slot is
    /// [`Error::CapacityExceeded`].
    pub fn add(&mut self, key: u64, value: V) -> Result<()> {
        let mut index = hash64(key) as usize;
        let mut claim = None;
        for _ in 0..=self.mask {
            match &self.slots[index & self.mask] {
                Slot::Occupied { key: other, .. } if *other != key => index += 1,
                Slot::Occupied { .. } => return Ok(()),
                _ => {
                    claim = Some(index & self.mask);
                    break;
                }
            }
        }
        match claim {
            Some(at) => {
                self.slots[at] = Slot::Occupied { key, value };
                Ok(())
            }
            None => Err(Error::CapacityExceeded("hash table slots")),
        }
    }

    pub fn get(&self, key: u64) -> Option<&V> {
        self.find(key).map(|at| match &self.slots[at] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!(),
        })
    }

    pub fn get_mut(&mut self, key: u64) -> Option<&mut V> {
        let at = self.find(key)?;
        match &mut self.slots[at] {
            Slot::Occupied { value, .. } => Some(value),
            _ => unreachable!(),
        }
    }

    /// Removes the entry for `key`, leaving a tombstone in its slot.
    pub fn delete(&mut self, key: u64) -> Option<V> {
        let at = self.find(key)?;
        match std::mem::replace(&mut self.slots[at], Slot::Tombstone) {
            Slot::Occupied { value, .. } => Some(value),
            _ => unreachable!(),
        }
    }

    /// Probes for `key`, skipping tombstones, stopping at a match or a true
    /// empty slot.
    fn find(&self, key: u64) -> Option<usize> {
        let mut index = hash64(key) as usize;
        for _ in 0..=self.mask {
            match &self.slots[index & self.mask] {
                Slot::Empty => return None,
                Slot::Occupied { key: other, .. } if *other == key => {
                    return Some(index & self.mask);
                }
                _ => index += 1,
            }
        }
        None
    }
}
