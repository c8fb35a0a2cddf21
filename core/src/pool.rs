//! The free transaction pool: transactions not yet included in any block on
//! any fork.
//!
//! Generalises `transactions/free_transaction_manager.py::FreeTransactionManager`
//! from Python lists/`numpy` index arithmetic to sorted `Vec`s; the
//! per-user bookkeeping (`pending_txs`, `pending_nos`, `max_committed_no`)
//! is unchanged in shape.

use std::collections::{HashMap, HashSet};

use crate::{error::Error, transaction::Transaction};

#[derive(Debug, Default)]
struct UserPool {
    /// Pending transactions for this user, kept sorted by `trans_no`.
    pending_txs: Vec<Transaction>,
    /// Mirrors `pending_txs`' `trans_no`s, for O(1) membership checks.
    pending_nos: HashSet<i64>,
}

/// Holds unconfirmed transactions and yields maximal valid per-user prefixes
/// to back block creation.
#[derive(Debug, Default)]
pub struct FreeTransactionPool {
    users: HashMap<String, UserPool>,
    /// Insertion order of users, so that `valid_prefixes` iterates users in a
    /// stable (first-seen) order. Callers never rely on cross-user order,
    /// but stability makes tests and snapshots reproducible.
    user_order: Vec<String>,
    max_committed_no: HashMap<String, i64>,
    size: usize,
}

impl FreeTransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of pending transactions across all users.
    pub fn size(&self) -> usize {
        self.size
    }

    fn max_committed(&self, user_id: &str) -> i64 {
        self.max_committed_no.get(user_id).copied().unwrap_or(-1)
    }

    /// Adds `tx` to the pool. Fails with [`Error::AlreadyAdded`] if
    /// `tx.trans_no` is at or below the user's committed floor, or already
    /// pending.
    pub fn add(&mut self, tx: Transaction) -> Result<(), Error> {
        if tx.trans_no <= self.max_committed(&tx.user_id) {
            return Err(Error::AlreadyAdded { user_id: tx.user_id, trans_no: tx.trans_no });
        }

        let user = self.users.entry(tx.user_id.clone()).or_insert_with(|| {
            self.user_order.push(tx.user_id.clone());
            UserPool::default()
        });

        if user.pending_nos.contains(&tx.trans_no) {
            return Err(Error::AlreadyAdded { user_id: tx.user_id, trans_no: tx.trans_no });
        }

        let insert_at = user.pending_txs.partition_point(|t| t.trans_no < tx.trans_no);
        user.pending_nos.insert(tx.trans_no);
        user.pending_txs.insert(insert_at, tx);
        self.size += 1;
        Ok(())
    }

    /// For each user with pending transactions, finds the longest
    /// contiguous run starting at `latest_trans_no_fn(user_id) + 1` and
    /// appends it to the result. `latest_trans_no_fn` should return `-1` for
    /// a user unknown on the target fork.
    pub fn valid_prefixes(&self, mut latest_trans_no_fn: impl FnMut(&str) -> i64) -> Vec<Transaction> {
        let mut result = Vec::new();
        for user_id in &self.user_order {
            let Some(user) = self.users.get(user_id) else { continue };
            if user.pending_txs.is_empty() {
                continue;
            }
            let last = latest_trans_no_fn(user_id);
            let expected_start = last + 1;
            let Some(start) = user.pending_txs.iter().position(|t| t.trans_no == expected_start) else {
                continue;
            };
            let mut end = start;
            while end + 1 < user.pending_txs.len()
                && user.pending_txs[end + 1].trans_no == user.pending_txs[end].trans_no + 1
            {
                end += 1;
            }
            result.extend(user.pending_txs[start..=end].iter().cloned());
        }
        result
    }

    /// Removes `sorted_txs` from their users' pending sets, then drops any
    /// remaining pending transaction at or below the smallest `trans_no`
    /// committed per user in this batch. Returns the subset of `sorted_txs`
    /// that could not be removed (expected to be empty; a non-empty result
    /// signals a consistency bug and should be logged by the caller).
    pub fn commit(&mut self, sorted_txs: &[Transaction]) -> Vec<Transaction> {
        let mut first_in_batch: HashMap<String, i64> = HashMap::new();
        let mut failures = Vec::new();

        for tx in sorted_txs {
            first_in_batch
                .entry(tx.user_id.clone())
                .and_modify(|n| *n = (*n).min(tx.trans_no))
                .or_insert(tx.trans_no);

            match self.users.get_mut(&tx.user_id) {
                Some(user) if user.pending_nos.remove(&tx.trans_no) => {
                    user.pending_txs.retain(|t| t.trans_no != tx.trans_no);
                    self.size -= 1;
                }
                _ => failures.push(tx.clone()),
            }
        }

        for (user_id, floor) in &first_in_batch {
            let existing = self.max_committed(user_id);
            self.max_committed_no.insert(user_id.clone(), existing.max(*floor));

            if let Some(user) = self.users.get_mut(user_id) {
                let before = user.pending_txs.len();
                user.pending_txs.retain(|t| t.trans_no > *floor);
                user.pending_nos.retain(|no| *no > *floor);
                self.size -= before - user.pending_txs.len();
            }
        }

        failures
    }

    /// Raises `max_committed_no[user_id]` to account for transactions
    /// confirmed by an externally-received block that this node never saw
    /// in its own pool. Does not remove anything; the subsequent
    /// [`Self::commit`] call (tolerating absence) is the removal path.
    pub fn absorb_confirmed(&mut self, txs: &[Transaction]) {
        for tx in txs {
            let existing = self.max_committed(&tx.user_id);
            self.max_committed_no.insert(tx.user_id.clone(), existing.max(tx.trans_no));
        }
    }

    /// All pending transactions, in (user insertion order, trans_no) order.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.user_order
            .iter()
            .filter_map(|u| self.users.get(u))
            .flat_map(|u| u.pending_txs.iter().cloned())
            .collect()
    }
}
