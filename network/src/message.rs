//! Wire types carried over gossip topics and the peer bootstrap handshake.
//!
//! Grounded on `node.py`/`registry.py`: a node gossips transactions and
//! blocks to its peers and, on startup, registers with a known peer to
//! receive the current chain state.

use obscura_core::{Block, Transaction};
use serde::{Deserialize, Serialize};

/// The two gossip topics a node subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Transaction,
    Block,
}

impl Topic {
    /// The gossipsub topic string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Transaction => "obscura/transaction/1",
            Topic::Block => "obscura/block/1",
        }
    }
}

/// An envelope published to a gossip topic. `payload` is the
/// `bincode`-encoded [`obscura_core::Transaction`] or [`obscura_core::Block`],
/// decoded by the receiving handler according to `topic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipMessage {
    pub topic: Topic,
    pub payload: Vec<u8>,
}

impl GossipMessage {
    pub fn new(topic: Topic, payload: Vec<u8>) -> Self {
        Self { topic, payload }
    }

    pub fn for_transaction(tx: &Transaction) -> bincode::Result<Self> {
        Ok(Self::new(Topic::Transaction, bincode::serialize(tx)?))
    }

    pub fn for_block(block: &Block) -> bincode::Result<Self> {
        Ok(Self::new(Topic::Block, bincode::serialize(block)?))
    }

    pub fn decode_transaction(&self) -> bincode::Result<Transaction> {
        bincode::deserialize(&self.payload)
    }

    pub fn decode_block(&self) -> bincode::Result<Block> {
        bincode::deserialize(&self.payload)
    }
}

/// Sent by a joining node to the peer it bootstraps from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerHello {
    pub node_id: String,
    pub network: String,
    /// The number of blocks the joining node already has, so the peer it
    /// bootstraps from can decide how much history to send back.
    pub chain_height: u64,
}

/// Returned in response to a [`PeerHello`]: the `BLOCKS_AND_TRANS` bootstrap
/// reply. The joining node drains `blocks` into
/// [`obscura_core::engine::ChainEngine::submit_external_blocks`] first, then
/// `free_txs` into repeated [`obscura_core::engine::ChainEngine::submit_transaction`]
/// calls, tolerating duplicates of either.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapPayload {
    pub blocks: Vec<Block>,
    pub free_txs: Vec<Transaction>,
}
