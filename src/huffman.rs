//! Canonical Huffman code construction and tree serialization.
//!
//! Every symbol in the induced alphabet is a coding leaf, weighted by its
//! live token occurrences plus one per composite that references it: children
//! need codewords for the tree section even when they no longer appear in the
//! data. Codes are canonical, so the wire carries only per-depth counts and
//! the per-leaf payloads — never the tree shape itself.

use crate::bitstream::{bit_size, BitCode, BitWriter};
use crate::error::{Error, Result};
use crate::induction::{SymbolTable, TERMINATOR};
use crate::ordered_index::OrderedIndex;
use crate::pairs::NIL;
use std::io::Write;
use tracing::debug;

/// Codeword depths are serialized in a 6-bit field.
const MAX_DEPTH: usize = 63;
/// Literal leaves across the whole tree: 256 byte values plus the terminator.
const LITERAL_BUDGET: u64 = 257;

/// A fully assigned canonical code for one alphabet.
pub(crate) struct CanonicalHuffman {
    /// Emission-ready (bit-reversed) codeword per symbol id.
    codes: Vec<BitCode>,
    /// Symbol ids per depth, literal leaves first, discovery order preserved.
    levels: Vec<Vec<u32>>,
    first_depth: usize,
    last_depth: usize,
    /// Largest per-depth leaf count, sizing the count fields on the wire.
    max_level_count: u64,
}

/// Internal fork in the coding tree under construction.
struct Fork {
    left: u32,
    right: u32,
    /// Symbol id for leaves, NIL for true forks.
    symbol: u32,
}

fn queue_key(freq: u64, seq: u32) -> [u8; 8] {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&(freq as u32).to_be_bytes());
    key[4..].copy_from_slice(&seq.to_be_bytes());
    key
}

impl CanonicalHuffman {
    /// Builds the canonical code for `table` weighted by `freqs`.
    pub fn build(table: &SymbolTable, freqs: &[u64]) -> Result<Self> {
        let n = table.len();
        debug_assert_eq!(freqs.len(), n);

        // The ordered index is the min-queue: keys sort by (frequency,
        // sequence), so remove_first pops the rarest node.
        let mut arena: Vec<Fork> = Vec::with_capacity(2 * n);
        let mut queue = OrderedIndex::new(8);
        for (id, &freq) in freqs.iter().enumerate() {
            if freq > u32::MAX as u64 {
                return Err(Error::CapacityExceeded("symbol frequency range"));
            }
            arena.push(Fork {
                left: NIL,
                right: NIL,
                symbol: id as u32,
            });
            queue.insert(&queue_key(freq, id as u32));
        }
        while queue.len() > 1 {
            let small = queue.remove_first().expect("queue has two entries");
            let other = queue.remove_first().expect("queue has two entries");
            let freq = u32::from_be_bytes(small[..4].try_into().unwrap()) as u64
                + u32::from_be_bytes(other[..4].try_into().unwrap()) as u64;
            if freq > u32::MAX as u64 {
                return Err(Error::CapacityExceeded("symbol frequency range"));
            }
            let seq = arena.len() as u32;
            arena.push(Fork {
                left: u32::from_be_bytes(small[4..].try_into().unwrap()),
                right: u32::from_be_bytes(other[4..].try_into().unwrap()),
                symbol: NIL,
            });
            queue.insert(&queue_key(freq, seq));
        }
        let root = queue
            .remove_first()
            .map(|key| u32::from_be_bytes(key[4..].try_into().unwrap()))
            .expect("alphabet is never empty");

        // Leaf depths via an explicit stack; the coding tree can be as deep
        // as the alphabet is large, so no recursion here.
        let mut levels: Vec<Vec<u32>> = vec![Vec::new(); MAX_DEPTH + 1];
        let mut depth_of = vec![0u32; n];
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let fork = &arena[node as usize];
            if fork.symbol != NIL {
                if depth > MAX_DEPTH {
                    return Err(Error::CapacityExceeded("codeword depth"));
                }
                depth_of[fork.symbol as usize] = depth as u32;
            } else {
                stack.push((fork.left, depth + 1));
                stack.push((fork.right, depth + 1));
            }
        }
        // Depth lists in symbol-id order give the stable discovery-order
        // tie-break; the stable sort then moves literal leaves to the front.
        for id in 0..n as u32 {
            levels[depth_of[id as usize] as usize].push(id);
        }
        for level in levels.iter_mut() {
            level.sort_by_key(|&id| table.get(id).is_composite());
        }

        let first_depth = levels
            .iter()
            .position(|l| !l.is_empty())
            .expect("alphabet is never empty");
        let last_depth = levels
            .iter()
            .rposition(|l| !l.is_empty())
            .expect("alphabet is never empty");
        let max_level_count = levels.iter().map(|l| l.len()).max().unwrap_or(0) as u64;

        // Canonical assignment: consecutive values within a depth, shifted
        // left once per depth increase, stored reversed for LSB-first
        // emission.
        let mut codes = vec![BitCode::new(0, 0); n];
        let mut value = 0u64;
        let mut len = first_depth as u32;
        for level in &levels[first_depth..=last_depth] {
            for &id in level {
                codes[id as usize] = BitCode::new(len, value).reversed();
                value += 1;
            }
            len += 1;
            value <<= 1;
        }

        Ok(Self {
            codes,
            levels,
            first_depth,
            last_depth,
            max_level_count,
        })
    }

    pub fn code(&self, symbol: u32) -> &BitCode {
        &self.codes[symbol as usize]
    }

    /// Serializes the tree section: sizing header, per-depth counts, the
    /// terminator's codeword, then per depth the literal/composite split
    /// with literal bytes and composite child codewords.
    pub fn write_tree<W: Write>(
        &self,
        table: &SymbolTable,
        writer: &mut BitWriter<W>,
    ) -> Result<()> {
        let start = writer.bit_len();
        let count_bits = bit_size(self.max_level_count);
        writer.push_bits(count_bits as u64, 5)?;
        writer.push_bits(self.last_depth as u64, 6)?;
        // The field is sized for depths below last; a first depth equal to a
        // power of two wraps to zero and the decoder reconstructs it.
        let first_bits = if self.last_depth == 0 {
            0
        } else {
            bit_size(self.last_depth as u64 - 1)
        };
        writer.push_bits(self.first_depth as u64, first_bits)?;

        for level in &self.levels[self.first_depth..=self.last_depth] {
            writer.push_bits(level.len() as u64, count_bits)?;
        }

        writer.push_code(&self.codes[TERMINATOR as usize])?;

        let mut literal_budget = LITERAL_BUDGET;
        for level in &self.levels[self.first_depth..=self.last_depth] {
            if level.is_empty() {
                continue;
            }
            let literal_count = level
                .iter()
                .take_while(|&&id| !table.get(id).is_composite())
                .count();
            let field = bit_size(literal_budget).min(bit_size(level.len() as u64));
            writer.push_bits(literal_count as u64, field)?;
            literal_budget -= literal_count as u64;

            for &id in &level[..literal_count] {
                // The terminator sits among the literals but carries no byte.
                if let Some(byte) = table.get(id).literal_byte() {
                    writer.push_byte(byte)?;
                }
            }
            for &id in &level[literal_count..] {
                let entry = table.get(id);
                writer.push_code(&self.codes[entry.child_a as usize])?;
                writer.push_code(&self.codes[entry.child_b as usize])?;
            }
        }

        debug!(
            bytes = (writer.bit_len() - start + 7) / 8,
            depths = self.last_depth - self.first_depth + 1,
            "library serialized"
        );
        Ok(())
    }
}
