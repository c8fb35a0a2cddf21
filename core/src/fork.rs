//! Fork bookkeeping: tracks branch heads, selects the longest, and prunes
//! branches that have fallen too far behind.
//!
//! Generalises `forks/fork_manager.py::ForkManager`. Where the Python
//! original keeps `fork_start_block_hash` ambiguous (sometimes read as "the
//! mutable head"), this implementation only ever treats it as the immutable
//! hash of the block where the branch diverged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    block::Block, depth::BlockDepthIndex, latest::LatestPerUserIndex, store::BlockStore,
    validator::BlockValidator,
};

/// A view of one tip of the block DAG.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fork {
    pub fork_id: u64,
    pub head_block_hash: String,
    pub timestamp: u64,
    pub num_blocks: u64,
    pub fork_start_block_hash: String,
}

/// Tracks every fork, the longest one, and prunes the rest once they fall
/// more than `prune_threshold` blocks behind.
#[derive(Debug)]
pub struct ForkManager {
    forks: HashMap<u64, Fork>,
    /// The fork currently tipped at a given block hash.
    head_index: HashMap<String, u64>,
    longest_fork: Option<u64>,
    next_fork_id: u64,
    prune_threshold: u64,
    depth_index: BlockDepthIndex,
    latest_index: LatestPerUserIndex,
}

impl ForkManager {
    pub fn new(prune_threshold: u64) -> Self {
        Self {
            forks: HashMap::new(),
            head_index: HashMap::new(),
            longest_fork: None,
            next_fork_id: 0,
            prune_threshold,
            depth_index: BlockDepthIndex::new(),
            latest_index: LatestPerUserIndex::new(),
        }
    }

    pub fn longest_fork(&self) -> Option<&Fork> {
        self.longest_fork.and_then(|id| self.forks.get(&id))
    }

    pub fn fork_count(&self) -> usize {
        self.forks.len()
    }

    pub fn forks(&self) -> impl Iterator<Item = &Fork> {
        self.forks.values()
    }

    pub fn depth(&self, hash: &str) -> Option<u64> {
        self.depth_index.depth(hash)
    }

    /// `-1` if there is no longest fork yet, else the latest committed
    /// `trans_no` for `user_id` on it.
    pub fn latest_trans_no_on_longest(&self, user_id: &str) -> i64 {
        match self.longest_fork() {
            None => -1,
            Some(fork) => self.latest_index.latest(user_id, &fork.head_block_hash),
        }
    }

    /// Validates and inserts each block in `blocks`, independently. A
    /// validation failure for one block does not abort the batch; its slot
    /// in the returned `Vec` carries the error string instead.
    pub fn add_blocks(&mut self, blocks: Vec<Block>) -> Vec<Result<(), String>> {
        let mut statuses = Vec::with_capacity(blocks.len());
        for block in blocks {
            statuses.push(self.add_one(block));
        }
        statuses
    }

    fn add_one(&mut self, block: Block) -> Result<(), String> {
        BlockValidator::validate_incoming(&block, &self.latest_index).map_err(|e| e.to_string())?;

        self.depth_index.add(&block).map_err(|e| {
            tracing::error!(target: "obscura::fork", block_hash = %block.hash(), error = %e, "depth index rejected a validator-admitted block");
            e.to_string()
        })?;
        let depth = self.depth_index.depth(block.hash()).expect("depth was just inserted");

        let hash = block.hash().to_string();
        let prev = block.prev_hash().to_string();
        let timestamp = block.header.timestamp;

        let fork_id = match self.head_index.remove(&prev) {
            Some(fork_id) => {
                let fork = self.forks.get_mut(&fork_id).expect("head_index and forks must agree");
                fork.head_block_hash = hash.clone();
                fork.num_blocks = depth;
                fork.timestamp = timestamp;
                fork_id
            }
            None => {
                let fork_id = self.next_fork_id;
                self.next_fork_id += 1;
                self.forks.insert(
                    fork_id,
                    Fork {
                        fork_id,
                        head_block_hash: hash.clone(),
                        timestamp,
                        num_blocks: depth,
                        fork_start_block_hash: hash.clone(),
                    },
                );
                fork_id
            }
        };
        self.head_index.insert(hash, fork_id);

        let is_new_longest = match self.longest_fork {
            None => true,
            Some(longest_id) => depth > self.forks[&longest_id].num_blocks,
        };
        if is_new_longest {
            self.longest_fork = Some(fork_id);
        }

        self.latest_index.add(&block);
        Ok(())
    }

    /// Walks from `fork.head_block_hash` back through `prev_hash` links
    /// (looked up in `store`) until `fork.fork_start_block_hash` is
    /// reached; inclusive of both endpoints.
    pub fn block_hashes_in_fork(&self, fork: &Fork, store: &BlockStore) -> Vec<String> {
        let mut hashes = Vec::new();
        let mut cur_hash = fork.head_block_hash.clone();
        while cur_hash != fork.fork_start_block_hash {
            let cur_block = store.get(&cur_hash).expect("fork block must be present in the store");
            hashes.push(cur_hash.clone());
            cur_hash = cur_block.prev_hash().to_string();
        }
        hashes.push(fork.fork_start_block_hash.clone());
        hashes
    }

    /// Drops every fork more than `prune_threshold` blocks shorter than the
    /// longest fork, releasing their block hashes for the caller to pull
    /// back out of the block store and feed their transactions back to the
    /// pool. Returns the released hashes.
    pub fn cleanup(&mut self, store: &BlockStore) -> Vec<String> {
        let Some(longest_id) = self.longest_fork else { return Vec::new() };
        let longest_depth = self.forks[&longest_id].num_blocks;
        let threshold = self.prune_threshold;

        let to_prune: Vec<u64> = self
            .forks
            .values()
            .filter(|fork| fork.num_blocks < longest_depth.saturating_sub(threshold))
            .map(|fork| fork.fork_id)
            .collect();

        let mut released = Vec::new();
        for fork_id in to_prune {
            let fork = self.forks.get(&fork_id).expect("fork_id collected from self.forks").clone();
            let hashes = self.block_hashes_in_fork(&fork, store);
            for hash in &hashes {
                if let Err(e) = self.depth_index.remove(hash) {
                    tracing::error!(target: "obscura::fork", %hash, error = %e, "depth index missing entry during prune");
                }
                if let Err(e) = self.latest_index.remove(hash) {
                    tracing::error!(target: "obscura::fork", %hash, error = %e, "latest index missing entry during prune");
                }
            }
            self.head_index.remove(&fork.head_block_hash);
            self.forks.remove(&fork_id);
            released.extend(hashes);
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::create_block;
    use crate::transaction::Transaction;
    use crate::NULL_BLOCK_HASH;

    fn chain_block(prev: &str, user: &str, no: i64) -> Block {
        create_block(vec![Transaction::new(user, no, "")], prev, 0)
    }

    #[test]
    fn single_block_becomes_its_own_fork() {
        let mut fm = ForkManager::new(6);
        let b = chain_block(NULL_BLOCK_HASH, "alice", 0);
        let hash = b.hash().to_string();
        let statuses = fm.add_blocks(vec![b]);
        assert_eq!(statuses, vec![Ok(())]);
        let longest = fm.longest_fork().unwrap();
        assert_eq!(longest.num_blocks, 1);
        assert_eq!(longest.head_block_hash, hash);
        assert_eq!(longest.fork_start_block_hash, hash);
    }

    #[test]
    fn extending_a_fork_updates_its_head_in_place() {
        let mut fm = ForkManager::new(6);
        let b1 = chain_block(NULL_BLOCK_HASH, "alice", 0);
        let b1_hash = b1.hash().to_string();
        fm.add_blocks(vec![b1]);
        let b2 = chain_block(&b1_hash, "alice", 1);
        let b2_hash = b2.hash().to_string();
        fm.add_blocks(vec![b2]);

        assert_eq!(fm.fork_count(), 1);
        let longest = fm.longest_fork().unwrap();
        assert_eq!(longest.head_block_hash, b2_hash);
        assert_eq!(longest.fork_start_block_hash, b1_hash);
        assert_eq!(longest.num_blocks, 2);
    }

    #[test]
    fn diverging_block_creates_a_second_fork_without_changing_longest() {
        let mut fm = ForkManager::new(6);
        let b1 = chain_block(NULL_BLOCK_HASH, "alice", 0);
        let b1_hash = b1.hash().to_string();
        fm.add_blocks(vec![b1]);
        let b2 = chain_block(&b1_hash, "alice", 1);
        let b2_hash = b2.hash().to_string();
        fm.add_blocks(vec![b2]);

        // A second block building directly off genesis (b1) diverges.
        let b2_alt = chain_block(&b1_hash, "bob", 0);
        fm.add_blocks(vec![b2_alt]);

        assert_eq!(fm.fork_count(), 2);
        assert_eq!(fm.longest_fork().unwrap().head_block_hash, b2_hash);
    }

    #[test]
    fn first_to_reach_a_depth_wins_on_ties() {
        let mut fm = ForkManager::new(6);
        let b1 = chain_block(NULL_BLOCK_HASH, "alice", 0);
        let b1_hash = b1.hash().to_string();
        fm.add_blocks(vec![b1]);

        let b2_first = chain_block(&b1_hash, "alice", 1);
        let b2_first_hash = b2_first.hash().to_string();
        fm.add_blocks(vec![b2_first]);

        let b2_second = chain_block(&b1_hash, "bob", 0);
        fm.add_blocks(vec![b2_second]);

        // both tip forks are at depth 2; the first to arrive keeps longest_fork.
        assert_eq!(fm.longest_fork().unwrap().head_block_hash, b2_first_hash);
    }

    #[test]
    fn cleanup_prunes_forks_past_the_threshold_and_releases_their_hashes() {
        let mut fm = ForkManager::new(2);
        let mut store = BlockStore::new();

        let b1 = chain_block(NULL_BLOCK_HASH, "alice", 0);
        let b1_hash = b1.hash().to_string();
        store.add(b1.clone());
        fm.add_blocks(vec![b1]);

        // The main branch claims b1's head slot first and extends to depth 5,
        // so the later divergence below starts its own fork instead of
        // extending this one.
        let mut prev = b1_hash.clone();
        for i in 1..5 {
            let b = chain_block(&prev, "alice", i);
            prev = b.hash().to_string();
            store.add(b.clone());
            fm.add_blocks(vec![b]);
        }

        // short branch, diverging off b1 after the main chain has already
        // moved past it: its own single-block fork, depth 2.
        let short = chain_block(&b1_hash, "bob", 0);
        let short_hash = short.hash().to_string();
        store.add(short.clone());
        fm.add_blocks(vec![short]);

        assert_eq!(fm.fork_count(), 2);
        let released = fm.cleanup(&store);
        assert_eq!(released, vec![short_hash]);
        assert_eq!(fm.fork_count(), 1);
    }
}
