//! The chain-state engine: the single owner of a node's blocks, forks, and
//! pending transaction pool.
//!
//! Generalises `blockchain/blockchain_ds.py::BlockChain`. `ChainEngine` is
//! not internally synchronized: callers that share one across threads wrap
//! it in a `tokio::sync::Mutex`, the way the `rpc`/`network` crates do.

use crate::{
    block::{create_block, Block},
    config::Config,
    error::{Error, Result},
    fork::{Fork, ForkManager},
    pool::FreeTransactionPool,
    snapshot::ChainSnapshot,
    store::BlockStore,
    transaction::Transaction,
    NULL_BLOCK_HASH,
};

/// Owns every block and fork this node knows about, plus the pool of
/// transactions not yet included in a block.
#[derive(Debug)]
pub struct ChainEngine {
    config: Config,
    store: BlockStore,
    pool: FreeTransactionPool,
    forks: ForkManager,
}

impl ChainEngine {
    pub fn new(config: Config) -> Self {
        let forks = ForkManager::new(config.prune_threshold);
        Self { config, store: BlockStore::new(), pool: FreeTransactionPool::new(), forks }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn longest_fork(&self) -> Option<&Fork> {
        self.forks.longest_fork()
    }

    /// Validates and queues a locally-originated transaction. If the pool now
    /// holds at least `config.trans_per_block` valid, contiguous transactions
    /// against the current longest fork, mines and appends one or more
    /// blocks in the same call and returns them; otherwise returns `[]`.
    ///
    /// Mirrors `blockchain_ds.py::add_transaction`: the mining check and the
    /// mine itself happen synchronously inside this call so that, from an
    /// observer's perspective, the submission and any resulting blocks become
    /// visible atomically.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<Vec<Block>> {
        if !tx.validate() {
            return Err(Error::InvalidTransactionDetails { user_id: tx.user_id, trans_no: tx.trans_no });
        }
        self.pool.add(tx)?;

        if self.pool.size() < self.config.trans_per_block {
            return Ok(Vec::new());
        }

        let valid = self.pool.valid_prefixes(|user_id| self.forks.latest_trans_no_on_longest(user_id));
        if valid.len() < self.config.trans_per_block {
            return Ok(Vec::new());
        }

        Ok(self.mine_and_append(valid))
    }

    /// Mines as many full blocks as `valid` has room for (`trans_per_block`
    /// transactions each, chained one after another off the current longest
    /// fork), admits them through [`ForkManager`], commits their transactions
    /// out of the pool, and prunes any fork left behind. Returns the blocks
    /// that were successfully admitted, in mining order.
    pub fn mine_and_append(&mut self, mut valid: Vec<Transaction>) -> Vec<Block> {
        let mut prev_hash = self
            .forks
            .longest_fork()
            .map(|f| f.head_block_hash.clone())
            .unwrap_or_else(|| NULL_BLOCK_HASH.to_string());

        let trans_per_block = self.config.trans_per_block;
        let mut mined = Vec::new();
        let mut consumed = Vec::new();
        while valid.len() >= trans_per_block {
            let batch: Vec<Transaction> = valid.drain(..trans_per_block).collect();
            let block = create_block(batch.clone(), &prev_hash, self.config.difficulty);
            prev_hash = block.hash().to_string();
            consumed.extend(batch);
            mined.push(block);
        }

        if mined.is_empty() {
            return mined;
        }

        let statuses = self.forks.add_blocks(mined.clone());
        let mut admitted = Vec::with_capacity(mined.len());
        for (block, status) in mined.into_iter().zip(statuses) {
            match status {
                Ok(()) => {
                    self.store.add(block.clone());
                    admitted.push(block);
                }
                Err(e) => {
                    tracing::error!(
                        target: "obscura::engine",
                        block_hash = %block.hash(),
                        error = %e,
                        "self-mined block failed its own validation",
                    );
                }
            }
        }

        let leftover = self.pool.commit(&consumed);
        if !leftover.is_empty() {
            tracing::warn!(
                target: "obscura::engine",
                count = leftover.len(),
                "mined blocks committed transactions the pool could not remove",
            );
        }
        self.cleanup();
        admitted
    }

    /// Validates and admits a batch of blocks received from a peer,
    /// independently. Returns one status per input block, in order.
    ///
    /// A block that validates is added to the store, its transactions are
    /// absorbed into the pool's committed floor (removing them if still
    /// pending), and a [`Self::cleanup`] pass runs to prune any fork that
    /// has fallen behind as a result.
    pub fn submit_external_blocks(&mut self, blocks: Vec<Block>) -> Vec<std::result::Result<(), String>> {
        let mut statuses = Vec::with_capacity(blocks.len());
        for block in blocks {
            let status = self.forks.add_blocks(vec![block.clone()]).into_iter().next().expect("one block in, one status out");
            if status.is_ok() {
                self.pool.absorb_confirmed(&block.transactions);
                let _ = self.pool.commit(&block.transactions);
                self.store.add(block);
            }
            statuses.push(status);
        }
        self.cleanup();
        statuses
    }

    /// Prunes forks that have fallen more than `config.prune_threshold`
    /// blocks behind the longest fork, and returns their transactions to the
    /// pool as unconfirmed (a no-op for any transaction already committed on
    /// the surviving fork, since [`FreeTransactionPool::add`] rejects those).
    pub fn cleanup(&mut self) {
        let released = self.forks.cleanup(&self.store);
        for hash in released {
            if let Some(block) = self.store.remove(&hash) {
                for tx in block.transactions {
                    let _ = self.pool.add(tx);
                }
            }
        }
    }

    /// Blocks with `timestamp` strictly newer than `since`, or every block
    /// when `since` is `None`.
    pub fn blocks_newer_than(&self, since: Option<u64>) -> Vec<Block> {
        self.store.blocks_after(since).into_iter().cloned().collect()
    }

    /// Every block the engine currently holds, in insertion order.
    pub fn block_list(&self) -> Vec<Block> {
        self.store.iter().cloned().collect()
    }

    /// Transactions not yet included in any block.
    pub fn transactions_not_added(&self) -> Vec<Transaction> {
        self.pool.transactions()
    }

    /// Serializes configuration, blocks newer than `since` (every block when
    /// `None`), the pool, and the fork directory.
    pub fn snapshot(&self, since: Option<u64>) -> ChainSnapshot {
        ChainSnapshot {
            config: self.config.clone(),
            blocks: self.blocks_newer_than(since),
            forks: self.forks.forks().cloned().collect(),
            longest_fork_id: self.forks.longest_fork().map(|f| f.fork_id),
            pending_transactions: self.pool.transactions(),
        }
    }
}
