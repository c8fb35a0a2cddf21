use std::{net::SocketAddr, sync::Arc};

use jsonrpsee::server::{Server, ServerHandle};
use obscura_core::engine::ChainEngine;
use obscura_network::NetworkHandle;
use tokio::sync::Mutex;

use crate::{
    api::{ObscuraApiServer, ObscuraRpc},
    error::RpcError,
};

/// Starts the local JSON-RPC server bound to `addr`, serving `engine`. When
/// `network` is given, transactions accepted and blocks mined through
/// `addTrans` are republished over it. Returns a handle the caller can use to
/// stop the server.
pub async fn run_server(
    addr: SocketAddr,
    engine: Arc<Mutex<ChainEngine>>,
    network: Option<NetworkHandle>,
) -> Result<ServerHandle, RpcError> {
    let server = Server::builder().build(addr).await.map_err(|e| RpcError::Start(e.to_string()))?;
    let rpc = ObscuraRpc::new(engine, network);
    let handle = server.start(rpc.into_rpc());
    tracing::info!(target: "obscura::rpc", %addr, "local RPC server listening");
    Ok(handle)
}
