//! Blocks: a header plus an ordered list of transactions.
//!
//! Mirrors `blockchain/block_simple.py` (`BlockHeader`/`BlockSimple`) and
//! `blockchain/block_helper.py` (`create_block`/`validate_block_hashes`),
//! generalised from the original's `datetime`/pickled-string hashing to a
//! `u64` microsecond timestamp and a `sha2`-backed [`crate::puzzle`].

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{error::Error, puzzle, transaction::Transaction, NULL_BLOCK_HASH};

/// Returns the current time as microseconds since the Unix epoch.
///
/// Distinct calls are effectively guaranteed to produce distinct values, so
/// two blocks mined back to back still get distinct puzzle inputs.
pub(crate) fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_micros() as u64
}

/// Header fields. `block_hash` is derived from the rest; the remaining
/// fields are inputs to its derivation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    pub block_hash: String,
    pub transactions_hash: String,
    pub prev_block_hash: String,
    pub timestamp: u64,
    pub difficulty: u32,
    pub nonce: String,
}

/// A header plus its ordered transaction list.
///
/// Transactions are sorted `(user_id, trans_no)` ascending; consecutive
/// transactions for the same user have consecutive `trans_no` values. Both
/// properties are established by [`create_block`] and checked again (for
/// incoming blocks) by [`crate::validator::BlockValidator`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> &str {
        &self.header.block_hash
    }

    pub fn prev_hash(&self) -> &str {
        &self.header.prev_block_hash
    }
}

fn puzzle_input(transactions_hash: &str, prev_block_hash: &str, timestamp: u64, difficulty: u32) -> String {
    format!("{transactions_hash}{prev_block_hash}{timestamp}{difficulty}")
}

fn derive_block_hash(
    transactions_hash: &str,
    prev_block_hash: &str,
    timestamp: u64,
    difficulty: u32,
    nonce: &str,
) -> String {
    puzzle::hash(&format!("{transactions_hash}{prev_block_hash}{timestamp}{difficulty}{nonce}"))
}

/// Sorts `txs`, solves the proof-of-work puzzle and assembles a [`Block`].
///
/// `prev_hash` should be [`NULL_BLOCK_HASH`] for a block with no predecessor.
pub fn create_block(mut txs: Vec<Transaction>, prev_hash: &str, difficulty: u32) -> Block {
    txs.sort();
    let transactions_hash = Transaction::compact_hash(&txs);
    let timestamp = now_micros();
    let input = puzzle_input(&transactions_hash, prev_hash, timestamp, difficulty);
    let nonce = puzzle::solve(&input, difficulty);
    let block_hash = derive_block_hash(&transactions_hash, prev_hash, timestamp, difficulty, &nonce);

    Block {
        header: BlockHeader {
            block_hash,
            transactions_hash,
            prev_block_hash: prev_hash.to_string(),
            timestamp,
            difficulty,
            nonce,
        },
        transactions: txs,
    }
}

/// Recomputes `transactions_hash` and `block_hash` and re-verifies the
/// proof-of-work. Fails with [`Error::InvalidBlockHash`] or
/// [`Error::InvalidProofOfWork`] on mismatch.
pub fn validate_block_hashes(block: &Block) -> Result<(), Error> {
    let transactions_hash = Transaction::compact_hash(&block.transactions);
    let header = &block.header;
    let input = puzzle_input(&transactions_hash, &header.prev_block_hash, header.timestamp, header.difficulty);
    let expected_block_hash = derive_block_hash(
        &transactions_hash,
        &header.prev_block_hash,
        header.timestamp,
        header.difficulty,
        &header.nonce,
    );

    if transactions_hash != header.transactions_hash || expected_block_hash != header.block_hash {
        return Err(Error::InvalidBlockHash);
    }

    if !puzzle::verify(&input, &header.nonce, header.difficulty) {
        return Err(Error::InvalidProofOfWork);
    }

    Ok(())
}

/// Returns true if `hash` is the sentinel "no predecessor" value.
pub fn is_null_hash(hash: &str) -> bool {
    hash == NULL_BLOCK_HASH
}
