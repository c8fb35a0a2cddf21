//! JSON-serializable view of the engine's current state.
//!
//! Generalises `blockchain/blockchain_ds.py::BlockChain.to_json`, which the
//! Python original renders straight off `self.__dict__`. This crate instead
//! assembles an explicit [`ChainSnapshot`] so the wire shape is independent
//! of the engine's internal representation.

use serde::{Deserialize, Serialize};

use crate::{block::Block, config::Config, error::{Error, Result}, fork::Fork, transaction::Transaction};

/// A point-in-time view of the engine, suitable for serializing to JSON for
/// the local RPC surface or for persisting across a restart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainSnapshot {
    pub config: Config,
    /// Every block the engine currently holds, across all live forks, in
    /// insertion order.
    pub blocks: Vec<Block>,
    pub forks: Vec<Fork>,
    pub longest_fork_id: Option<u64>,
    /// Transactions not yet included in any block.
    pub pending_transactions: Vec<Transaction>,
}

impl ChainSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Serialization(e.to_string()))
    }
}
