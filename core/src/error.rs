//! Error types for the **Obscura** core crate.
//!
//! All high-level operations return [`crate::Result`] which is a convenient
//! alias for `core::result::Result<T, Error>`.
//!
//! The enum is intentionally minimal and high-level. Lower-level failures
//! (index lookups, validator checks) are mapped into one of these variants
//! before bubbling up to callers. Validator and pool errors are not fatal to
//! the engine: callers render them to a status string per block or per
//! transaction and move on to the next item in a batch (see
//! [`crate::fork::ForkManager::add_blocks`] and
//! [`crate::pool::FreeTransactionPool::add`]).
//!
//! # Examples
//!
//! ```
//! use obscura_core::{Error, Result};
//!
//! fn demo_fn(fail: bool) -> Result<()> {
//!     if fail {
//!         Err(Error::InvalidProofOfWork)
//!     } else {
//!         Ok(())
//!     }
//! }
//! ```

use thiserror::Error;

/// Core crate error type.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// A block with this hash is already present in the store.
    #[error("block {0} was already added")]
    DuplicateBlock(String),

    /// `prev_block_hash` does not refer to any block known to the fork manager.
    #[error("preceding block {prev_hash} for incoming block {block_hash} not found")]
    MissingPredecessor { block_hash: String, prev_hash: String },

    /// A user's `trans_no`s inside a block are not a gap-free ascending run.
    #[error("transactions for {user_id} in block {block_hash} are not in order")]
    UnorderedTransactions { user_id: String, block_hash: String },

    /// The first `trans_no` for a user in an incoming block does not follow
    /// the latest committed `trans_no` for that user on the target fork.
    #[error(
        "earliest transaction for {user_id} in block {block_hash} is {got} \
         while the latest recorded transaction is {latest} (should be exactly 1 more)"
    )]
    TransactionNumberMismatch { user_id: String, block_hash: String, got: i64, latest: i64 },

    /// Recomputing `block_hash`/`transactions_hash` did not match the header.
    #[error("invalid block hash")]
    InvalidBlockHash,

    /// The nonce does not solve the proof-of-work puzzle at the claimed difficulty.
    #[error("invalid proof of work")]
    InvalidProofOfWork,

    /// A transaction with this `(user_id, trans_no)` is already pending or
    /// already committed on this node.
    #[error("transaction {user_id}:{trans_no} was already added")]
    AlreadyAdded { user_id: String, trans_no: i64 },

    /// Attempted to remove a block/hash that an index has no record of. This
    /// signals a bookkeeping bug rather than bad input; it is logged, never
    /// propagated to a remote caller.
    #[error("attempted to remove non-existent entry {0}")]
    RemoveNonExistent(String),

    /// A submitted transaction's `details` field exceeds
    /// [`crate::transaction::MAX_DETAILS_LEN`].
    #[error("transaction {user_id}:{trans_no} details exceed the maximum length")]
    InvalidTransactionDetails { user_id: String, trans_no: i64 },

    /// JSON encoding or decoding of a [`crate::snapshot::ChainSnapshot`] failed.
    #[error("snapshot serialization failure: {0}")]
    Serialization(String),
}

/// Convenient result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
