//! Transactions: the dummy unit of work carried by the proto-blockchain.
//!
//! A [`Transaction`] does not move value or carry a signature; it only
//! records that user `user_id` performed their `trans_no`-th action,
//! described by `details`. Its identity is
//! `(user_id, trans_no)` and it is totally ordered first by `user_id`, then
//! by `trans_no`, matching `transactions/transaction.py::Transaction.__lt__`.

use serde::{Deserialize, Serialize};

use crate::{error::Error, puzzle};

/// Maximum length, in bytes, of [`Transaction::details`].
pub const MAX_DETAILS_LEN: usize = 64;

/// A single per-user, ordered record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub user_id: String,
    pub trans_no: i64,
    pub details: String,
}

impl Transaction {
    pub fn new(user_id: impl Into<String>, trans_no: i64, details: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), trans_no, details: details.into() }
    }

    /// `true` if `details` does not exceed [`MAX_DETAILS_LEN`] bytes.
    pub fn validate(&self) -> bool {
        self.details.len() <= MAX_DETAILS_LEN
    }

    /// Canonical string form used as the hashing input: `"{user_id}: [{trans_no}] {details}"`.
    pub fn canonical_string(&self) -> String {
        format!("{}: [{}] {}", self.user_id, self.trans_no, self.details)
    }

    /// SHA-256 hash of the concatenation of the canonical string form of
    /// every transaction in `txs`, in list order. Permutation-sensitive:
    /// reordering `txs` changes the hash.
    pub fn compact_hash(txs: &[Transaction]) -> String {
        let mut s = String::new();
        for t in txs {
            s.push_str(&t.canonical_string());
        }
        puzzle::hash(&s)
    }
}

impl PartialOrd for Transaction {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Transaction {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.user_id, self.trans_no).cmp(&(&other.user_id, other.trans_no))
    }
}

/// Checks that `trans_no`s for each user in `txs` are already sorted and
/// form a gap-free ascending run starting wherever the first entry for that
/// user begins. Groups are identified by contiguous runs of the same
/// `user_id`, matching the grouping `BlockValidator` performs over an
/// already-(user_id, trans_no)-sorted block.
pub fn validate_contiguous(txs: &[Transaction], block_hash: &str) -> Result<(), Error> {
    let mut i = 0;
    while i < txs.len() {
        let user_id = &txs[i].user_id;
        let mut j = i;
        while j + 1 < txs.len() && txs[j + 1].user_id == *user_id {
            if txs[j + 1].trans_no != txs[j].trans_no + 1 {
                return Err(Error::UnorderedTransactions {
                    user_id: user_id.clone(),
                    block_hash: block_hash.to_string(),
                });
            }
            j += 1;
        }
        i = j + 1;
    }
    Ok(())
}
