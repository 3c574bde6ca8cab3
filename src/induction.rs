//! Symbol induction: iterative merging of the most frequent adjacent pair.
//!
//! The engine bootstraps one symbol per distinct literal byte, then repeats:
//! commit pending pair-count deltas, pop the best (count, pair) entry from
//! the priority index, and replace every occurrence of that pair with a fresh
//! composite symbol, patching the two boundary pairs around each rewrite.
//! Pairs whose committed count falls below [`MIN_COUNT`] are evicted.

use crate::bitstream::bit_size;
use crate::error::{Error, Result};
use crate::hash_table::HashTable;
use crate::ordered_index::OrderedIndex;
use crate::pairs::{
    pack_pair, pair_of_priority_key, priority_key, OccurrenceLinks, PairAggregate, PairStore, NIL,
};
use tracing::debug;

/// Symbol id reserved for the record terminator.
pub(crate) const TERMINATOR: u32 = 0;
/// Token-slot sentinel for a consumed position.
pub(crate) const TOMBSTONE: u32 = u32::MAX;
/// Pairs seen fewer times than this are not worth a symbol.
pub(crate) const MIN_COUNT: i64 = 4;
/// Symbol ids fit 24 bits; induction stops at the cap.
pub(crate) const MAX_SYMBOLS: usize = 1 << 24;

/// One immutable symbol: a literal byte, the terminator, or a composite of
/// two earlier symbols.
pub(crate) struct SymbolEntry {
    /// Literal byte value, or the left child id for composites.
    pub child_a: u32,
    /// Right child id for composites; NIL marks a literal or the terminator.
    pub child_b: u32,
    /// Token slots covered by the expansion.
    pub size: u32,
    /// True when the rightmost expansion is the terminator.
    pub has_terminator: bool,
}

impl SymbolEntry {
    pub fn is_composite(&self) -> bool {
        self.child_b != NIL
    }

    /// The literal byte, or None for the terminator and composites.
    pub fn literal_byte(&self) -> Option<u8> {
        if self.child_b == NIL && self.child_a != NIL {
            Some(self.child_a as u8)
        } else {
            None
        }
    }
}

/// The induced alphabet. Id 0 is always the terminator; composite children
/// always have strictly smaller ids than their parent.
pub(crate) struct SymbolTable {
    entries: Vec<SymbolEntry>,
}

impl SymbolTable {
    fn new() -> Self {
        Self {
            entries: vec![SymbolEntry {
                child_a: NIL,
                child_b: NIL,
                size: 1,
                has_terminator: true,
            }],
        }
    }

    fn alloc(&mut self, entry: SymbolEntry) -> Result<u32> {
        if self.entries.len() >= MAX_SYMBOLS {
            return Err(Error::CapacityExceeded("symbol id space"));
        }
        let id = self.entries.len() as u32;
        self.entries.push(entry);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, id: u32) -> &SymbolEntry {
        &self.entries[id as usize]
    }
}

/// Runs induction over `records` with the default hash-table registry.
pub(crate) fn induce(records: &[&[u8]]) -> Result<(SymbolTable, Vec<u32>)> {
    let total: usize = records.iter().map(|r| r.len()).sum::<usize>() + records.len();
    // Distinct adjacent pairs are bounded by the token count, so a table of
    // the next power of two at or above it never fills mid-run.
    let bits = bit_size(total as u64).max(4);
    induce_with(records, HashTable::with_capacity_bits(bits))
}

/// Runs induction with a caller-supplied registry backing store.
pub(crate) fn induce_with<S: PairStore>(
    records: &[&[u8]],
    store: S,
) -> Result<(SymbolTable, Vec<u32>)> {
    let mut engine = InductionEngine::new(records, store)?;
    engine.seed_statistics()?;
    engine.merge_loop()?;
    debug!(
        symbols = engine.table.len(),
        tokens = engine.tokens.iter().filter(|&&t| t != TOMBSTONE).count(),
        "symbol induction complete"
    );
    Ok((engine.table, engine.tokens))
}

struct InductionEngine<S: PairStore> {
    table: SymbolTable,
    /// Live occurrences per symbol id, kept in lockstep with `table`.
    counts: Vec<i64>,
    tokens: Vec<u32>,
    links: OccurrenceLinks,
    store: S,
    touched: Vec<u64>,
    priority: OrderedIndex,
}

impl<S: PairStore> InductionEngine<S> {
    fn new(records: &[&[u8]], store: S) -> Result<Self> {
        let mut table = SymbolTable::new();
        let mut counts = vec![0i64];
        let mut references = [0u32; 256]; // 0 = unassigned; id 0 is the terminator
        let total: usize = records.iter().map(|r| r.len()).sum::<usize>() + records.len();
        let mut tokens = Vec::with_capacity(total);

        for record in records {
            for &byte in *record {
                let mut id = references[byte as usize];
                if id == 0 {
                    id = table.alloc(SymbolEntry {
                        child_a: byte as u32,
                        child_b: NIL,
                        size: 1,
                        has_terminator: false,
                    })?;
                    counts.push(0);
                    references[byte as usize] = id;
                }
                tokens.push(id);
            }
            tokens.push(TERMINATOR);
        }

        let links = OccurrenceLinks::new(tokens.len());
        Ok(Self {
            table,
            counts,
            tokens,
            links,
            store,
            touched: Vec::new(),
            priority: OrderedIndex::new(12),
        })
    }

    /// Registers every adjacent pair of the bootstrap token stream. In a run
    /// of identical symbols, overlapping matches alternate between counted
    /// and merely linked so no token is claimed by two counted pairs.
    fn seed_statistics(&mut self) -> Result<()> {
        if self.tokens.is_empty() {
            return Ok(());
        }
        let mut last_pair: Option<u64> = None;
        for i in 0..self.tokens.len() - 1 {
            self.counts[self.tokens[i] as usize] += 1;
            let current = pack_pair(self.tokens[i], self.tokens[i + 1]);
            let count_me = Some(current) != last_pair;
            self.add_pair(
                self.tokens[i],
                self.tokens[i + 1],
                i as u32,
                count_me,
                true,
                true,
            )?;
            last_pair = if count_me { Some(current) } else { None };
        }
        let last = *self.tokens.last().expect("tokens nonempty");
        self.counts[last as usize] += 1;
        Ok(())
    }

    fn merge_loop(&mut self) -> Result<()> {
        loop {
            self.commit_touched();

            let Some(entry) = self.priority.remove_last() else {
                break;
            };
            let key = pair_of_priority_key(&entry);
            let Some(mut winner) = self.store.remove(key) else {
                break;
            };
            if self.table.len() >= MAX_SYMBOLS {
                break;
            }

            let new_symbol = self.table.alloc(SymbolEntry {
                child_a: winner.sym_a,
                child_b: winner.sym_b,
                size: self.table.get(winner.sym_a).size + self.table.get(winner.sym_b).size,
                has_terminator: self.table.get(winner.sym_b).has_terminator,
            })?;
            self.counts.push(0);

            self.merge_winner(&mut winner, key, new_symbol)?;
        }
        Ok(())
    }

    /// Rewrites every occurrence of the winner pair to `new_symbol`,
    /// patching the pair statistics on both sides of each rewrite.
    fn merge_winner(
        &mut self,
        winner: &mut PairAggregate,
        key: u64,
        new_symbol: u32,
    ) -> Result<()> {
        let next_offset = self.table.get(winner.sym_a).size as usize;
        let len = self.tokens.len();
        let mut index = winner.head();
        let mut last_trigger: Option<u64> = None;

        while index != NIL {
            let future = self.links.right[index as usize];
            let i = index as usize;
            // Overlapping occurrences consumed earlier in this pass are
            // tombstoned and skipped.
            if self.tokens[i] != TOMBSTONE {
                let mut prev = i as isize - 1;
                while prev >= 0 && self.tokens[prev as usize] == TOMBSTONE {
                    prev -= 1;
                }
                if prev >= 0 {
                    let left_key = pack_pair(self.tokens[prev as usize], self.tokens[i]);
                    self.remove_pair(left_key, prev as u32);
                }

                let next_index = i + next_offset; // slot holding the right child
                debug_assert_eq!(self.tokens[next_index], winner.sym_b);
                let mut next_next = next_index + 1;
                while next_next < len && self.tokens[next_next] == TOMBSTONE {
                    next_next += 1;
                }
                if next_next < len {
                    let right_key = pack_pair(winner.sym_b, self.tokens[next_next]);
                    if right_key != key {
                        self.remove_pair(right_key, next_index as u32);
                    }
                }

                winner.unlink(&mut self.links, index);
                self.counts[self.tokens[i] as usize] -= 1;
                self.counts[self.tokens[next_index] as usize] -= 1;
                self.counts[new_symbol as usize] += 1;
                self.tokens[i] = new_symbol;
                self.tokens[next_index] = TOMBSTONE;

                if prev >= 0 {
                    let p = prev as usize;
                    let prev_key = pack_pair(self.tokens[p], new_symbol);
                    let count_me = Some(prev_key) != last_trigger;
                    self.add_pair(self.tokens[p], new_symbol, prev as u32, count_me, false, true)?;
                    last_trigger = if count_me && self.tokens[p] == new_symbol {
                        Some(prev_key)
                    } else {
                        None
                    };
                }
                if next_next < len {
                    self.add_pair(new_symbol, self.tokens[next_next], index, true, true, false)?;
                }
            }
            index = future;
        }
        Ok(())
    }

    /// Registers one occurrence of (a, b) starting at `index`. Pairs may not
    /// start at a terminator-bearing symbol, and unless forced, both sides
    /// must individually still be frequent enough to matter.
    fn add_pair(
        &mut self,
        a: u32,
        b: u32,
        index: u32,
        count_me: bool,
        force_first: bool,
        force_second: bool,
    ) -> Result<()> {
        if self.table.get(a).has_terminator
            || (!force_first && self.counts[a as usize] < MIN_COUNT)
            || (!force_second && self.counts[b as usize] < MIN_COUNT)
        {
            return Ok(());
        }
        let key = pack_pair(a, b);
        match self.store.get_mut(key) {
            None => {
                self.store.insert(key, PairAggregate::new(a, b, index))?;
                self.touched.push(key);
            }
            Some(aggregate) => {
                if !aggregate.touched {
                    aggregate.touched = true;
                    self.touched.push(key);
                }
                aggregate.link(&mut self.links, index);
            }
        }
        if count_me {
            if let Some(aggregate) = self.store.get_mut(key) {
                aggregate.pending += 1;
            }
        }
        Ok(())
    }

    /// Retracts the occurrence of a tracked pair starting at `index`.
    fn remove_pair(&mut self, key: u64, index: u32) {
        if let Some(aggregate) = self.store.get_mut(key) {
            if !aggregate.touched {
                aggregate.touched = true;
                self.touched.push(key);
            }
            aggregate.pending -= 1;
            aggregate.unlink(&mut self.links, index);
        }
    }

    /// Folds pending deltas into committed counts, refreshing each touched
    /// pair's priority entry (the entry key embeds the count) and evicting
    /// pairs that fell below [`MIN_COUNT`].
    fn commit_touched(&mut self) {
        let touched = std::mem::take(&mut self.touched);
        for key in touched {
            let Some(aggregate) = self.store.get_mut(key) else {
                continue;
            };
            let old = priority_key(aggregate.count, key);
            self.priority.delete(&old);

            aggregate.count += aggregate.pending;
            aggregate.pending = 0;
            aggregate.touched = false;

            if aggregate.count >= MIN_COUNT {
                self.priority.insert(&priority_key(aggregate.count, key));
            } else {
                aggregate.clear(&mut self.links);
                self.store.remove(key);
            }
        }
    }
}

#[cfg(test)]
impl SymbolTable {
    /// Expands a symbol to the literal bytes it covers (tests only).
    pub(crate) fn expand(&self, id: u32, out: &mut Vec<u8>) {
        let entry = self.get(id);
        if entry.is_composite() {
            self.expand(entry.child_a, out);
            self.expand(entry.child_b, out);
        } else if let Some(byte) = entry.literal_byte() {
            out.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyed_map::KeyedMap;

    fn expand_tokens(table: &SymbolTable, tokens: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        for &token in tokens {
            if token != TOMBSTONE {
                table.expand(token, &mut out);
            }
        }
        out
    }

    #[test]
    fn test_empty_record() {
        let (table, tokens) = induce(&[b""]).unwrap();
        assert_eq!(table.len(), 1); // terminator only
        assert_eq!(tokens, vec![TERMINATOR]);
    }

    #[test]
    fn test_bootstrap_assigns_one_id_per_byte() {
        let (table, tokens) = induce(&[b"abcabc"]).unwrap();
        // 6 pairs of count <= 2: nothing reaches MIN_COUNT, no merges.
        assert_eq!(table.len(), 4); // terminator + a, b, c
        assert_eq!(tokens.len(), 7);
        assert_eq!(expand_tokens(&table, &tokens), b"abcabc");
    }

    #[test]
    fn test_run_of_identical_bytes() {
        let (table, tokens) = induce(&[b"aaaaaaaaaa"]).unwrap();
        // 'aa' occurs 5 times without overlap; one composite is induced.
        assert_eq!(table.len(), 3);
        let composite = table.get(2);
        assert!(composite.is_composite());
        assert_eq!(composite.size, 2);
        assert!(!composite.has_terminator);

        let live: Vec<u32> = tokens.iter().copied().filter(|&t| t != TOMBSTONE).collect();
        assert_eq!(live, vec![2, 2, 2, 2, 2, TERMINATOR]);
        assert_eq!(expand_tokens(&table, &tokens), b"aaaaaaaaaa");
    }

    #[test]
    fn test_repeated_pattern_induces_symbols() {
        let data = b"abababababababab"; // "ab" x 8
        let (table, tokens) = induce(&[data]).unwrap();
        assert!(table.len() > 3, "expected induced symbols");
        assert_eq!(expand_tokens(&table, &tokens), data);
    }

    #[test]
    fn test_coverage_is_exact() {
        let data: Vec<u8> = (0u16..1024).map(|i| (i % 7) as u8).collect();
        let (table, tokens) = induce(&[&data]).unwrap();
        assert_eq!(expand_tokens(&table, &tokens), data);
        // Terminator stays at the end of the stream.
        let last_live = tokens.iter().rev().find(|&&t| t != TOMBSTONE).unwrap();
        assert!(table.get(*last_live).has_terminator);
    }

    #[test]
    fn test_multiple_records() {
        let (table, tokens) = induce(&[b"ab", b"ab"]).unwrap();
        let live: Vec<u32> = tokens.iter().copied().filter(|&t| t != TOMBSTONE).collect();
        // Pair counts stay below MIN_COUNT: literal tokens survive, one
        // terminator per record, and no pair crosses the boundary.
        assert_eq!(live.len(), 6);
        assert_eq!(live[2], TERMINATOR);
        assert_eq!(live[5], TERMINATOR);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_keyed_map_store_matches_hash_store() {
        let data = b"the quick brown fox jumps over the lazy dog the quick brown fox";
        let (hash_table, hash_tokens) = induce(&[data]).unwrap();
        let (map_table, map_tokens) =
            induce_with(&[data], KeyedMap::<PairAggregate>::new()).unwrap();
        assert_eq!(hash_table.len(), map_table.len());
        assert_eq!(hash_tokens, map_tokens);
    }

    #[test]
    fn test_symbol_ids_strictly_increasing() {
        let data: Vec<u8> = b"xyxyxyxyxyxyxyxyxyxy".repeat(4);
        let (table, _) = induce(&[&data]).unwrap();
        for id in 1..table.len() as u32 {
            let entry = table.get(id);
            if entry.is_composite() {
                assert!(entry.child_a < id);
                assert!(entry.child_b < id);
            }
        }
    }
}
