use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to start local RPC server: {0}")]
    Start(String),
}
