//! The block store: a map from block hash to block, preserving insertion
//! order so timestamp-bound queries can be served by a single linear scan.
//!
//! Generalises `blockchain/block_helper.py::BlockMap`.

use std::collections::HashMap;

use crate::block::Block;

#[derive(Debug, Default)]
pub struct BlockStore {
    /// Insertion-ordered list of hashes, mirrored by `by_hash` for O(1)
    /// lookups. Kept separate (rather than, say, an `IndexMap`) to avoid a
    /// new dependency for one small ordering need.
    order: Vec<String>,
    by_hash: HashMap<String, Block>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub fn get(&self, hash: &str) -> Option<&Block> {
        self.by_hash.get(hash)
    }

    pub fn add(&mut self, block: Block) {
        let hash = block.hash().to_string();
        if self.by_hash.insert(hash.clone(), block).is_none() {
            self.order.push(hash);
        }
    }

    pub fn remove(&mut self, hash: &str) -> Option<Block> {
        let removed = self.by_hash.remove(hash);
        if removed.is_some() {
            self.order.retain(|h| h != hash);
        }
        removed
    }

    /// Blocks in insertion order; `since` strictly filters to
    /// newer-than-bound timestamps when given, or returns everything when
    /// `None`.
    pub fn blocks_after(&self, since: Option<u64>) -> Vec<&Block> {
        self.order
            .iter()
            .filter_map(|h| self.by_hash.get(h))
            .filter(|b| since.map(|bound| b.header.timestamp > bound).unwrap_or(true))
            .collect()
    }

    /// All blocks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.order.iter().filter_map(|h| self.by_hash.get(h))
    }
}
