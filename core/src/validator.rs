//! Structural and semantic validation of incoming blocks.
//!
//! Generalises `forks/fork_helper.py::ForkValidator`. The Python original
//! tests "already known" and "predecessor known" against its own
//! `LatestTrans` instance (`inc_block.hash() in self.latest_trans`); this
//! validator does the same against a borrowed [`LatestPerUserIndex`], which
//! [`crate::fork::ForkManager`] owns and later registers the block into.

use std::collections::HashMap;

use crate::{block, block::Block, error::Error, latest::LatestPerUserIndex, NULL_BLOCK_HASH};

pub struct BlockValidator;

impl BlockValidator {
    /// Runs the full incoming-block check sequence, short-circuiting on the
    /// first failure:
    ///
    /// 1. Unknown, non-null predecessor -> [`Error::MissingPredecessor`].
    /// 2. Hash already registered in `latest_index` -> [`Error::DuplicateBlock`].
    /// 3. Per-user `trans_no`s inside the block are gap-free and ascending
    ///    -> else [`Error::UnorderedTransactions`].
    /// 4. Each user's first `trans_no` in the block is exactly one more
    ///    than `latest_index.latest(user_id, block.prev_hash())` -> else
    ///    [`Error::TransactionNumberMismatch`].
    /// 5. Structural proof-of-work/hash check via
    ///    [`block::validate_block_hashes`].
    pub fn validate_incoming(block: &Block, latest_index: &LatestPerUserIndex) -> Result<(), Error> {
        let prev = block.prev_hash();
        if prev != NULL_BLOCK_HASH && !latest_index.contains(prev) {
            return Err(Error::MissingPredecessor {
                block_hash: block.hash().to_string(),
                prev_hash: prev.to_string(),
            });
        }

        if latest_index.contains(block.hash()) {
            return Err(Error::DuplicateBlock(block.hash().to_string()));
        }

        crate::transaction::validate_contiguous(&block.transactions, block.hash())?;

        let mut first_per_user: HashMap<&str, i64> = HashMap::new();
        for tx in &block.transactions {
            first_per_user.entry(tx.user_id.as_str()).or_insert(tx.trans_no);
        }
        for (user_id, &first) in &first_per_user {
            let latest = latest_index.latest(user_id, prev);
            if first != latest + 1 {
                return Err(Error::TransactionNumberMismatch {
                    user_id: user_id.to_string(),
                    block_hash: block.hash().to_string(),
                    got: first,
                    latest,
                });
            }
        }

        block::validate_block_hashes(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::create_block;
    use crate::transaction::Transaction;

    #[test]
    fn accepts_first_block_off_null_hash() {
        let latest = LatestPerUserIndex::new();
        let b = create_block(vec![Transaction::new("alice", 0, "")], NULL_BLOCK_HASH, 0);
        assert!(BlockValidator::validate_incoming(&b, &latest).is_ok());
    }

    #[test]
    fn rejects_unknown_predecessor() {
        let latest = LatestPerUserIndex::new();
        let b = create_block(vec![Transaction::new("alice", 0, "")], "ghost", 0);
        assert!(matches!(BlockValidator::validate_incoming(&b, &latest), Err(Error::MissingPredecessor { .. })));
    }

    #[test]
    fn rejects_duplicate_block() {
        let mut latest = LatestPerUserIndex::new();
        let b = create_block(vec![Transaction::new("alice", 0, "")], NULL_BLOCK_HASH, 0);
        latest.add(&b);
        assert!(matches!(BlockValidator::validate_incoming(&b, &latest), Err(Error::DuplicateBlock(_))));
    }

    #[test]
    fn rejects_trans_no_mismatch_against_fork_history() {
        let mut latest = LatestPerUserIndex::new();
        let b1 = create_block(vec![Transaction::new("alice", 0, "")], NULL_BLOCK_HASH, 0);
        latest.add(&b1);
        // alice's next block should start at trans_no 1, not 3.
        let b2 = create_block(vec![Transaction::new("alice", 3, "")], b1.hash(), 0);
        assert!(matches!(
            BlockValidator::validate_incoming(&b2, &latest),
            Err(Error::TransactionNumberMismatch { .. })
        ));
    }

    #[test]
    fn rejects_gap_within_a_block() {
        let latest = LatestPerUserIndex::new();
        let mut b = create_block(vec![Transaction::new("alice", 0, "")], NULL_BLOCK_HASH, 0);
        b.transactions.push(Transaction::new("alice", 2, ""));
        assert!(matches!(BlockValidator::validate_incoming(&b, &latest), Err(Error::UnorderedTransactions { .. })));
    }
}
