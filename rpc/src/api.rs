//! The node's local JSON-RPC surface.
//!
//! Generalises `blockchain_proto/local_web_server.py`, which exposes the
//! same three verbs over a hand-rolled HTTP handler. `jsonrpsee`'s `#[rpc]`
//! macro gives the same surface a typed client/server contract.

use std::sync::Arc;

use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use obscura_core::{engine::ChainEngine, snapshot::ChainSnapshot, transaction::Transaction};
use obscura_network::{GossipMessage, NetworkHandle};
use tokio::sync::Mutex;

#[rpc(server, client, namespace = "obscura")]
pub trait ObscuraApi {
    /// The full current chain state: every block the node holds, its
    /// forks, and its pending transaction pool.
    #[method(name = "getBlockchain")]
    async fn get_blockchain(&self) -> RpcResult<ChainSnapshot>;

    /// Transactions submitted but not yet included in any block.
    #[method(name = "getUnaddedTrans")]
    async fn get_unadded_trans(&self) -> RpcResult<Vec<Transaction>>;

    /// Submits transactions to the pool. Returns one human-readable status
    /// line per input transaction, in order, naming the `user_id`/`trans_no`
    /// and, on acceptance, whether the submission caused any blocks to be
    /// mined.
    #[method(name = "addTrans")]
    async fn add_trans(&self, transactions: Vec<Transaction>) -> RpcResult<Vec<String>>;
}

/// Binds [`ChainEngine`] to the three local verbs. When `network` is set,
/// newly accepted local transactions and any blocks their submission mines
/// are republished over gossip, matching §6's "newly created blocks and
/// newly accepted local transactions are republished."
pub struct ObscuraRpc {
    engine: Arc<Mutex<ChainEngine>>,
    network: Option<NetworkHandle>,
}

impl ObscuraRpc {
    pub fn new(engine: Arc<Mutex<ChainEngine>>, network: Option<NetworkHandle>) -> Self {
        Self { engine, network }
    }
}

#[jsonrpsee::core::async_trait]
impl ObscuraApiServer for ObscuraRpc {
    async fn get_blockchain(&self) -> RpcResult<ChainSnapshot> {
        let engine = self.engine.lock().await;
        Ok(engine.snapshot(None))
    }

    async fn get_unadded_trans(&self) -> RpcResult<Vec<Transaction>> {
        let engine = self.engine.lock().await;
        Ok(engine.transactions_not_added())
    }

    async fn add_trans(&self, transactions: Vec<Transaction>) -> RpcResult<Vec<String>> {
        let mut statuses = Vec::with_capacity(transactions.len());
        let mut accepted_txs = Vec::new();
        let mut mined_blocks = Vec::new();

        {
            let mut engine = self.engine.lock().await;
            for tx in transactions {
                let user_id = tx.user_id.clone();
                let trans_no = tx.trans_no;
                let gossip_tx = tx.clone();
                match engine.submit_transaction(tx) {
                    Ok(blocks) => {
                        accepted_txs.push(gossip_tx);
                        if blocks.is_empty() {
                            statuses.push(format!("{user_id}:{trans_no} accepted"));
                        } else {
                            statuses.push(format!(
                                "{user_id}:{trans_no} accepted, mined {} block(s)",
                                blocks.len()
                            ));
                        }
                        mined_blocks.extend(blocks);
                    }
                    Err(e) => statuses.push(format!("{user_id}:{trans_no} rejected: {e}")),
                }
            }
        } // engine lock released before any gossip publish

        if let Some(network) = &self.network {
            for tx in &accepted_txs {
                match GossipMessage::for_transaction(tx) {
                    Ok(message) => {
                        if let Err(e) = network.publish(message).await {
                            tracing::warn!(target: "obscura::rpc", error = %e, "failed to publish accepted transaction");
                        }
                    }
                    Err(e) => tracing::warn!(target: "obscura::rpc", error = %e, "failed to encode accepted transaction"),
                }
            }
            for block in &mined_blocks {
                match GossipMessage::for_block(block) {
                    Ok(message) => {
                        if let Err(e) = network.publish(message).await {
                            tracing::warn!(target: "obscura::rpc", error = %e, "failed to publish mined block");
                        }
                    }
                    Err(e) => tracing::warn!(target: "obscura::rpc", error = %e, "failed to encode mined block"),
                }
            }
        }

        Ok(statuses)
    }
}
