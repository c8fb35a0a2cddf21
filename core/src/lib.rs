//! Obscura Core Library
//!
//! The chain-state engine for a proto-blockchain node: transactions, blocks,
//! the free transaction pool, fork tracking, and the [`engine::ChainEngine`]
//! that ties them together. Networking, RPC and the CLI are thin shells
//! around [`engine::ChainEngine`] built by the other workspace crates.

/// Sentinel value standing in for "no predecessor." Used as the
/// `prev_block_hash` of any block with no parent, so a fork's first block is
/// indistinguishable from one generalised to always have a predecessor hash.
pub const NULL_BLOCK_HASH: &str = "NULL-BLOCK-HASH";

pub mod block;
pub mod config;
pub mod depth;
pub mod engine;
pub mod error;
pub mod fork;
pub mod latest;
pub mod pool;
pub mod puzzle;
pub mod snapshot;
pub mod store;
pub mod transaction;
pub mod validator;

pub use block::{Block, BlockHeader};
pub use config::Config;
pub use engine::ChainEngine;
pub use error::{Error, Result};
pub use transaction::Transaction;
