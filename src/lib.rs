//! # bytepair-rs - Grammar-Induction Byte Compression
//!
//! A lossless byte-stream compressor in two stages:
//! 1. **Pair induction**: the most frequent pair of adjacent symbols is
//!    repeatedly merged into a new composite symbol, growing a hierarchical
//!    dictionary over the input.
//! 2. **Canonical Huffman coding**: the induced alphabet gets canonical
//!    codewords, so the stream carries only codeword lengths and leaf
//!    payloads — a minimal decoder rebuilds everything from the stream alone.
//!
//! ## Example
//!
//! ```
//! let data = b"abcabcabcabcabcabcabcabc";
//!
//! let mut encoded = Vec::new();
//! bytepair_rs::encode(data, &mut encoded).unwrap();
//!
//! let decoded = bytepair_rs::decode(encoded.as_slice()).unwrap();
//! assert_eq!(decoded, data);
//! ```
//!
//! ## Structure
//!
//! The interesting machinery is in the indexed structures backing the
//! encoder: an [`OrderedIndex`] B+Tree doubling as the pair priority queue
//! and the Huffman min-queue, a [`KeyedMap`] B+Tree for ordered u64-keyed
//! storage, and a fixed-capacity open-addressing [`HashTable`] holding the
//! live pair statistics. All are usable on their own.
//!
//! Encoding is single-threaded and batch-oriented: one pass builds the whole
//! alphabet and code in memory before any output is written.

mod bitstream;
mod decoder;
mod encoder;
mod error;
mod hash_table;
mod huffman;
mod induction;
mod keyed_map;
mod ordered_index;
mod pairs;

#[cfg(test)]
mod tests;

pub use bitstream::{BitCode, BitReader, BitWriter};
pub use decoder::{decode, decode_into, decode_records, Decoder};
pub use encoder::{encode, encode_records, Encoder};
pub use error::{Error, Result};
pub use hash_table::{hash64, HashTable};
pub use keyed_map::KeyedMap;
pub use ordered_index::OrderedIndex;
