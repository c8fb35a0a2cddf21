//! Per-block `user_id -> trans_no` index, the sole mechanism for
//! per-user ordering checks against a fork.
//!
//! Generalises `forks/fork_helper.py::LatestTrans`. Back-walking is
//! O(fork depth) per query; callers could memoize per `(block_hash,
//! user_id)` once encountered, but correctness never depends on it, so
//! this keeps the straightforward walk.

use std::collections::HashMap;

use crate::{block::Block, error::Error, NULL_BLOCK_HASH};

#[derive(Debug, Default)]
pub struct LatestPerUserIndex {
    /// `user_id -> trans_no` restricted to each block's own transactions.
    per_block: HashMap<String, HashMap<String, i64>>,
    prev_hash: HashMap<String, String>,
}

impl LatestPerUserIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.per_block.contains_key(hash)
    }

    /// Registers `block`'s own `user_id -> trans_no` entries (the *last*
    /// occurrence per user inside the block. Since a block's transactions
    /// are contiguous per user, that is simply the max trans_no seen for
    /// that user in the block.
    pub fn add(&mut self, block: &Block) {
        let mut user_trans: HashMap<String, i64> = HashMap::new();
        for tx in &block.transactions {
            user_trans
                .entry(tx.user_id.clone())
                .and_modify(|n| *n = (*n).max(tx.trans_no))
                .or_insert(tx.trans_no);
        }
        self.per_block.insert(block.hash().to_string(), user_trans);
        self.prev_hash.insert(block.hash().to_string(), block.prev_hash().to_string());
    }

    pub fn remove(&mut self, hash: &str) -> Result<(), Error> {
        let removed = self.per_block.remove(hash).is_some();
        self.prev_hash.remove(hash);
        if removed {
            Ok(())
        } else {
            Err(Error::RemoveNonExistent(hash.to_string()))
        }
    }

    /// Walks backward from `start_hash` through `prev_hash` links, returning
    /// the first occurrence of `user_id`, or `-1` if it reaches
    /// [`NULL_BLOCK_HASH`] or an unknown hash.
    pub fn latest(&self, user_id: &str, start_hash: &str) -> i64 {
        let mut cur = start_hash.to_string();
        loop {
            let Some(users) = self.per_block.get(&cur) else { return -1 };
            if let Some(no) = users.get(user_id) {
                return *no;
            }
            let prev = &self.prev_hash[&cur];
            if prev == NULL_BLOCK_HASH {
                return -1;
            }
            cur = prev.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::create_block;
    use crate::transaction::Transaction;

    #[test]
    fn latest_walks_back_through_ancestors() {
        let mut idx = LatestPerUserIndex::new();
        let b1 = create_block(vec![Transaction::new("alice", 0, "")], NULL_BLOCK_HASH, 0);
        let b1_hash = b1.hash().to_string();
        idx.add(&b1);

        let b2 = create_block(vec![Transaction::new("bob", 0, "")], &b1_hash, 0);
        idx.add(&b2);

        assert_eq!(idx.latest("alice", b2.hash()), 0);
        assert_eq!(idx.latest("bob", b2.hash()), 0);
        assert_eq!(idx.latest("carol", b2.hash()), -1);
    }

    #[test]
    fn latest_is_minus_one_for_unknown_start_hash() {
        let idx = LatestPerUserIndex::new();
        assert_eq!(idx.latest("alice", "unknown"), -1);
    }

    #[test]
    fn remove_nonexistent_errors() {
        let mut idx = LatestPerUserIndex::new();
        assert!(idx.remove("nope").is_err());
    }
}
