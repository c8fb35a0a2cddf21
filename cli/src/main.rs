//! Command-line entry point for running an Obscura node.
//!
//! Generalises `node.py::parseargs`/`main`: a registry address to bootstrap
//! from, a gossip port, a local web-interface (RPC) port, and the two
//! consensus parameters also exposed on [`obscura_core::config::Config`].

use std::{net::SocketAddr, sync::Arc};

use clap::{Parser, Subcommand};
use obscura_core::{config::ConfigBuilder, engine::ChainEngine};
use obscura_network::{GossipMessage, NetworkEvent, NetworkHandle, Topic};
use tokio::sync::Mutex;

#[derive(Parser)]
#[command(name = "obscura")]
#[command(about = "Obscura blockchain node", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full node: gossip networking plus the local RPC surface.
    Node(NodeArgs),
}

#[derive(Parser)]
struct NodeArgs {
    /// Address of the registry service this node bootstraps its peer list from.
    #[arg(long)]
    registry_address: String,

    /// Port the node's gossip networking listens on.
    #[arg(long)]
    port: u16,

    /// Port the local JSON-RPC interface listens on.
    #[arg(long = "web-interface-port")]
    web_interface_port: u16,

    /// Number of valid, contiguous transactions required before a block is mined.
    #[arg(long = "trans-per-block", default_value_t = 10)]
    trans_per_block: usize,

    /// Proof-of-work difficulty: leading hex zero characters a block hash must have.
    #[arg(long, default_value_t = 2)]
    difficulty: u32,

    /// Network name tag, carried in peer identification.
    #[arg(long, default_value = "main")]
    network: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Node(args) => run_node(args).await,
    }
}

async fn run_node(args: NodeArgs) {
    let config = ConfigBuilder::new()
        .difficulty(args.difficulty)
        .trans_per_block(args.trans_per_block)
        .network(args.network.clone())
        .finish();
    let engine = Arc::new(Mutex::new(ChainEngine::new(config)));

    let (network_handle, mut network_events, network_task) = match obscura_network::spawn(&args.network) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!(target: "obscura::cli", error = %e, "failed to start networking");
            return;
        }
    };

    let rpc_addr: SocketAddr = format!("127.0.0.1:{}", args.web_interface_port).parse().expect("valid socket address");
    let rpc_handle = match obscura_rpc::run_server(rpc_addr, Arc::clone(&engine), Some(network_handle.clone())).await
    {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(target: "obscura::cli", error = %e, "failed to start RPC server");
            return;
        }
    };

    tracing::info!(
        target: "obscura::cli",
        registry_address = %args.registry_address,
        port = args.port,
        web_interface_port = args.web_interface_port,
        "node started",
    );

    while let Some(event) = network_events.recv().await {
        if let NetworkEvent::MessageReceived(message) = event {
            handle_gossip_message(&engine, &network_handle, message).await;
        }
    }

    rpc_handle.stop().ok();
    network_task.abort();
}

/// Applies one gossip message to the engine. A transaction that crosses the
/// mining threshold produces blocks here, same as a locally submitted one
/// would through the RPC surface; any such block is republished immediately.
/// Blocks received directly from peers go straight to
/// [`obscura_core::engine::ChainEngine::submit_external_blocks`] and are not
/// re-gossiped (gossipsub itself handles further propagation).
async fn handle_gossip_message(engine: &Arc<Mutex<ChainEngine>>, network: &NetworkHandle, message: GossipMessage) {
    match message.topic {
        Topic::Transaction => {
            let Ok(tx) = message.decode_transaction() else { return };
            let mined = {
                let mut engine = engine.lock().await;
                match engine.submit_transaction(tx) {
                    Ok(blocks) => blocks,
                    Err(e) => {
                        tracing::debug!(target: "obscura::cli", error = %e, "gossiped transaction rejected");
                        return;
                    }
                }
            };
            for block in &mined {
                match GossipMessage::for_block(block) {
                    Ok(message) => {
                        if let Err(e) = network.publish(message).await {
                            tracing::warn!(target: "obscura::cli", error = %e, "failed to publish mined block");
                        }
                    }
                    Err(e) => tracing::warn!(target: "obscura::cli", error = %e, "failed to encode mined block"),
                }
            }
        }
        Topic::Block => {
            if let Ok(block) = message.decode_block() {
                let mut engine = engine.lock().await;
                for status in engine.submit_external_blocks(vec![block]) {
                    if let Err(e) = status {
                        tracing::debug!(target: "obscura::cli", error = %e, "gossiped block rejected");
                    }
                }
            }
        }
    }
}
