use obscura_core::{
    block::create_block,
    config::Config,
    engine::ChainEngine,
    error::Error,
    transaction::Transaction,
    NULL_BLOCK_HASH,
};

fn engine(trans_per_block: usize) -> ChainEngine {
    ChainEngine::new(Config { difficulty: 1, trans_per_block, prune_threshold: 6, network: "test".into() })
}

/// A single user's contiguous transactions get mined into one block as soon
/// as enough of them have accumulated.
#[test]
fn single_user_transactions_are_mined_once_enough_accumulate() {
    let mut e = engine(3);
    for no in 0..2 {
        assert!(e.submit_transaction(Transaction::new("alice", no, "")).unwrap().is_empty());
    }
    let blocks = e.submit_transaction(Transaction::new("alice", 2, "")).unwrap();
    let block = blocks.into_iter().next().expect("three contiguous transactions should mine");
    assert_eq!(block.transactions.len(), 3);
    assert!(e.transactions_not_added().is_empty());
    assert_eq!(e.longest_fork().unwrap().num_blocks, 1);
}

/// A transaction that leaves a gap in a user's sequence is excluded from
/// mining until the gap is filled.
#[test]
fn transaction_past_a_gap_is_withheld_from_mining() {
    let mut e = engine(2);
    assert!(e.submit_transaction(Transaction::new("alice", 0, "")).unwrap().is_empty());
    let blocks = e.submit_transaction(Transaction::new("alice", 1, "")).unwrap();
    e.submit_transaction(Transaction::new("alice", 3, "")).unwrap(); // gap: no trans_no 2
    let block = blocks.into_iter().next().expect("the leading contiguous pair should mine");
    assert_eq!(block.transactions.len(), 2);
    assert_eq!(block.transactions[1].trans_no, 1);
    let remaining = e.transactions_not_added();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].trans_no, 3);
}

/// Two users' transactions interleave into the same block, each
/// independently contiguous.
#[test]
fn two_users_interleave_into_one_block() {
    let mut e = engine(4);
    assert!(e.submit_transaction(Transaction::new("alice", 0, "")).unwrap().is_empty());
    assert!(e.submit_transaction(Transaction::new("bob", 0, "")).unwrap().is_empty());
    assert!(e.submit_transaction(Transaction::new("alice", 1, "")).unwrap().is_empty());
    let blocks = e.submit_transaction(Transaction::new("bob", 1, "")).unwrap();
    let block = blocks.into_iter().next().unwrap();
    assert_eq!(block.transactions.len(), 4);
    // block.transactions is sorted (user_id, trans_no), so alice's pair leads.
    assert_eq!(block.transactions[0].user_id, "alice");
    assert_eq!(block.transactions[2].user_id, "bob");
}

/// Resubmitting a transaction already committed into a block is rejected,
/// whether the resubmission happens before or after the block that carried
/// it was mined.
#[test]
fn double_submission_is_rejected_after_commit() {
    let mut e = engine(1);
    e.submit_transaction(Transaction::new("alice", 0, "first")).unwrap();
    assert_eq!(
        e.submit_transaction(Transaction::new("alice", 0, "replay")),
        Err(Error::AlreadyAdded { user_id: "alice".into(), trans_no: 0 })
    );
}

/// When two blocks extend the same predecessor, the engine keeps both
/// forks and, once one pulls far enough ahead, prunes the loser and
/// returns its transactions to the pool.
#[test]
fn forking_and_pruning_favors_the_longer_branch() {
    let mut e = engine(1);
    let genesis = create_block(vec![Transaction::new("alice", 0, "genesis")], NULL_BLOCK_HASH, 1);
    e.submit_external_blocks(vec![genesis.clone()]);

    let losing_tip = create_block(vec![Transaction::new("carol", 0, "orphaned")], genesis.hash(), 1);
    e.submit_external_blocks(vec![losing_tip.clone()]);
    assert_eq!(e.longest_fork().unwrap().head_block_hash, losing_tip.hash());

    let mut prev = genesis.hash().to_string();
    let mut winning_tip_hash = prev.clone();
    for i in 0..8 {
        let b = create_block(vec![Transaction::new("alice", i + 1, "")], &prev, 1);
        winning_tip_hash = b.hash().to_string();
        prev = winning_tip_hash.clone();
        e.submit_external_blocks(vec![b]);
    }

    assert_eq!(e.longest_fork().unwrap().head_block_hash, winning_tip_hash);
    // carol's transaction was absorbed into the commit floor when the losing
    // tip first arrived; pruning that fork does not lower the floor, so it
    // stays out of the pool rather than being returned.
    assert!(!e.transactions_not_added().iter().any(|t| t.user_id == "carol"));
    assert_eq!(
        e.submit_transaction(Transaction::new("carol", 0, "replay")),
        Err(Error::AlreadyAdded { user_id: "carol".into(), trans_no: 0 })
    );
}

/// An incoming block whose predecessor is unknown, or whose declared
/// per-user starting `trans_no` does not follow the fork's history, is
/// rejected without disturbing the rest of the batch.
#[test]
fn incoming_block_conflicts_are_rejected_independently() {
    let mut e = engine(100);
    let genesis = create_block(vec![Transaction::new("alice", 0, "")], NULL_BLOCK_HASH, 1);
    let orphan = create_block(vec![Transaction::new("bob", 0, "")], "unknown-predecessor", 1);
    let wrong_start = create_block(vec![Transaction::new("alice", 5, "")], genesis.hash(), 1);

    let statuses = e.submit_external_blocks(vec![genesis.clone(), orphan, wrong_start]);
    assert!(statuses[0].is_ok());
    assert!(statuses[1].is_err());
    assert!(statuses[2].is_err());
    assert_eq!(e.block_list(), vec![genesis]);
}

#[test]
fn snapshot_round_trips_through_json_after_activity() {
    let mut e = engine(2);
    e.submit_transaction(Transaction::new("alice", 0, "")).unwrap();
    e.submit_transaction(Transaction::new("alice", 1, "")).unwrap();
    e.submit_transaction(Transaction::new("alice", 2, "")).unwrap();

    let snapshot = e.snapshot(None);
    let json = snapshot.to_json().unwrap();
    let restored = obscura_core::snapshot::ChainSnapshot::from_json(&json).unwrap();
    assert_eq!(snapshot, restored);
    assert_eq!(restored.blocks.len(), 1);
    assert_eq!(restored.pending_transactions.len(), 1);
}
