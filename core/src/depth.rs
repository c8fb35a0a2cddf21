//! Tracks depth-from-genesis for every known block hash.
//!
//! Generalises `forks/fork_helper.py::BlockDepthManager`.

use std::collections::HashMap;

use crate::{block::Block, error::Error, NULL_BLOCK_HASH};

#[derive(Debug, Default)]
pub struct BlockDepthIndex {
    depths: HashMap<String, u64>,
}

impl BlockDepthIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `block`'s depth: 1 if it has no predecessor, else one more
    /// than its predecessor's recorded depth.
    ///
    /// Fails with [`Error::MissingPredecessor`] if `prev_hash` is not
    /// [`NULL_BLOCK_HASH`] and has no recorded depth. The caller
    /// (`ForkManager::add_blocks`) must have already admitted the
    /// predecessor via the validator before reaching this call.
    pub fn add(&mut self, block: &Block) -> Result<(), Error> {
        let depth = if block.prev_hash() == NULL_BLOCK_HASH {
            1
        } else {
            let prev_depth = self.depths.get(block.prev_hash()).copied().ok_or_else(|| {
                Error::MissingPredecessor {
                    block_hash: block.hash().to_string(),
                    prev_hash: block.prev_hash().to_string(),
                }
            })?;
            prev_depth + 1
        };
        self.depths.insert(block.hash().to_string(), depth);
        Ok(())
    }

    pub fn remove(&mut self, hash: &str) -> Result<(), Error> {
        self.depths.remove(hash).map(|_| ()).ok_or_else(|| Error::RemoveNonExistent(hash.to_string()))
    }

    pub fn depth(&self, hash: &str) -> Option<u64> {
        self.depths.get(hash).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::create_block;
    use crate::transaction::Transaction;

    fn block(prev: &str) -> crate::block::Block {
        create_block(vec![Transaction::new("u1", 0, "")], prev, 0)
    }

    #[test]
    fn genesis_predecessor_gets_depth_one() {
        let mut idx = BlockDepthIndex::new();
        let b = block(NULL_BLOCK_HASH);
        let hash = b.hash().to_string();
        idx.add(&b).unwrap();
        assert_eq!(idx.depth(&hash), Some(1));
    }

    #[test]
    fn depth_increments_along_a_chain() {
        let mut idx = BlockDepthIndex::new();
        let b1 = block(NULL_BLOCK_HASH);
        let b1_hash = b1.hash().to_string();
        idx.add(&b1).unwrap();
        let b2 = block(&b1_hash);
        idx.add(&b2).unwrap();
        assert_eq!(idx.depth(b2.hash()), Some(2));
    }

    #[test]
    fn missing_predecessor_is_an_error() {
        let mut idx = BlockDepthIndex::new();
        let b = block("some-unknown-hash");
        assert!(matches!(idx.add(&b), Err(Error::MissingPredecessor { .. })));
    }

    #[test]
    fn remove_nonexistent_is_an_error() {
        let mut idx = BlockDepthIndex::new();
        assert!(matches!(idx.remove("nope"), Err(Error::RemoveNonExistent(_))));
    }
}
