//! Local JSON-RPC surface over a node's [`obscura_core::engine::ChainEngine`].

pub mod api;
pub mod error;
pub mod server;

pub use api::{ObscuraApiClient, ObscuraApiServer, ObscuraRpc};
pub use error::RpcError;
pub use server::run_server;
