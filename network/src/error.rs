use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("network configuration failed: {0}")]
    Config(String),

    #[error("network handle's command channel is closed")]
    HandleClosed,
}
