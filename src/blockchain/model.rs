use chrono::Utc;
use log::{debug, info, warn};

use super::pow::MiningControl;
use super::{Block, DIFFICULTY_ADJUSTMENT_INTERVAL, DifficultyController, INITIAL_MINING_REWARD};
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

/// Simple in-memory blockchain with Proof-of-Work.
///
/// Holds the chain, the pending pool and the mining parameters. Not
/// synchronized; see [`crate::node::Node`] for shared access.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub chain: Vec<Block>,
    pending_transactions: Vec<Transaction>,
    difficulty: u32,
    initial_difficulty: u32,
    mining_reward: i64,
    controller: DifficultyController,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block stamped now.
    pub fn new(difficulty: u32) -> Self {
        Self::with_genesis_timestamp(difficulty, Utc::now().timestamp_millis())
    }

    pub fn with_genesis_timestamp(difficulty: u32, genesis_timestamp: i64) -> Self {
        Self {
            chain: vec![Block::genesis(genesis_timestamp)],
            pending_transactions: Vec::new(),
            difficulty,
            initial_difficulty: difficulty,
            mining_reward: INITIAL_MINING_REWARD,
            controller: DifficultyController::new(DIFFICULTY_ADJUSTMENT_INTERVAL),
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Queue a transaction for the next block. Rejected transactions leave
    /// the pool untouched.
    pub fn create_transaction(&mut self, tx: Transaction) -> Result<()> {
        if let Err(e) = tx.validate() {
            warn!("rejected transaction {:?}: {}", tx, e);
            return Err(e.into());
        }
        self.pending_transactions.push(tx);
        debug!("pending pool size now {}", self.pending_transactions.len());
        Ok(())
    }

    /// Candidate block over a snapshot of the whole pending pool, linked to
    /// the current tip. Not mined.
    pub fn prepare_block(&self) -> Block {
        let mut block = Block::new(
            self.last_block().hash.clone(),
            self.pending_transactions.clone(),
        );
        block.difficulty = self.difficulty;
        block
    }

    /// Mine the pending pool into a new block, blocking until a nonce is found,
    /// then reset the pool to a single reward for `reward_address`.
    pub fn mine_pending_transactions(&mut self, reward_address: &str) -> &Block {
        let mut block = self.prepare_block();
        block.mine(self.difficulty);
        self.append_block(block, reward_address)
    }

    /// Like [`Blockchain::mine_pending_transactions`], but the search can be
    /// aborted through `control`. An aborted round changes nothing.
    pub fn mine_pending_transactions_with(
        &mut self,
        reward_address: &str,
        control: &MiningControl,
    ) -> Result<&Block> {
        let mut block = self.prepare_block();
        block.mine_with(self.difficulty, control)?;
        Ok(self.append_block(block, reward_address))
    }

    /// Append a block mined outside the ledger (from [`Blockchain::prepare_block`]).
    ///
    /// The block must extend the current tip, carry a fresh hash meeting the
    /// current difficulty, and hold a prefix of the pending pool. Transactions
    /// queued after that prefix are kept behind the reward.
    pub fn commit_block(&mut self, block: Block, reward_address: &str) -> Result<&Block> {
        if block.previous_hash != self.last_block().hash {
            warn!("stale block: tip moved to {}", self.last_block().hash);
            return Err(LedgerError::StaleBlock);
        }
        if block.difficulty != self.difficulty || !block.is_valid(self.difficulty) {
            return Err(LedgerError::InvalidProof);
        }
        if !self.pending_transactions.starts_with(&block.transactions) {
            warn!("stale block: pending pool no longer matches its snapshot");
            return Err(LedgerError::StaleBlock);
        }
        Ok(self.append_block(block, reward_address))
    }

    fn append_block(&mut self, block: Block, reward_address: &str) -> &Block {
        let consumed = block.transactions.len().min(self.pending_transactions.len());
        let late: Vec<Transaction> = self.pending_transactions.drain(consumed..).collect();

        info!(
            "Block #{} successfully mined (hash={}, nonce={}, txs={})",
            self.chain.len(),
            block.hash,
            block.nonce,
            block.transactions.len()
        );
        self.chain.push(block);

        self.pending_transactions.clear();
        self.pending_transactions
            .push(Transaction::reward(reward_address, self.mining_reward));
        self.pending_transactions.extend(late);

        if self.controller.should_adjust(self.mined_blocks()) {
            self.controller
                .adjust(&mut self.difficulty, &mut self.mining_reward);
        }

        self.last_block()
    }

    /// Validate the entire chain: genesis, linkage, hashes and PoW against
    /// the difficulty schedule.
    pub fn is_valid_chain(&self) -> bool {
        let Some(genesis) = self.chain.first() else {
            return false;
        };
        if genesis.previous_hash != "0"
            || !genesis.transactions.is_empty()
            || genesis.hash != genesis.compute_hash()
        {
            return false;
        }

        for i in 1..self.chain.len() {
            let current = &self.chain[i];
            let prev = &self.chain[i - 1];

            if current.previous_hash != prev.hash {
                return false;
            }

            let expected = self
                .controller
                .difficulty_at(self.initial_difficulty, i as u64);
            if current.difficulty != expected || !current.is_valid(expected) {
                return false;
            }
        }

        true
    }

    /// Replay every mined transaction touching `address`.
    /// Pending transactions are not counted.
    pub fn get_balance_for_address(&self, address: &str) -> i128 {
        self.chain
            .iter()
            .flat_map(|block| block.transactions.iter())
            .fold(0i128, |mut balance, tx| {
                if tx.from.as_deref() == Some(address) {
                    balance -= i128::from(tx.amount);
                }
                if tx.to == address {
                    balance += i128::from(tx.amount);
                }
                balance
            })
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Blocks appended after genesis.
    pub fn mined_blocks(&self) -> u64 {
        self.chain.len().saturating_sub(1) as u64
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn initial_difficulty(&self) -> u32 {
        self.initial_difficulty
    }

    pub fn mining_reward(&self) -> i64 {
        self.mining_reward
    }

    pub fn adjustment_interval(&self) -> u64 {
        self.controller.interval()
    }

    pub fn next_adjustment_height(&self) -> u64 {
        self.controller.next_adjustment_height(self.mined_blocks())
    }
}

#[cfg(test)]
mod tests {
    use super::Blockchain;
    use crate::blockchain::pow::{CancelToken, MiningControl, MiningLimits};
    use crate::error::{LedgerError, ValidationError};
    use crate::transaction::Transaction;

    fn transfer(from: &str, to: &str, amount: i64) -> Transaction {
        Transaction::new(Some(from.into()), to, amount)
    }

    /// Genesis plus four mined blocks, the first holding a transfer.
    fn sample_chain() -> Blockchain {
        let mut bc = Blockchain::new(1);
        bc.create_transaction(transfer("A", "B", 10)).unwrap();
        for _ in 0..4 {
            bc.mine_pending_transactions("R");
        }
        bc
    }

    #[test]
    fn fresh_ledger_has_only_genesis() {
        let bc = Blockchain::with_genesis_timestamp(2, 1_000);
        assert_eq!(bc.len(), 1);
        assert_eq!(bc.chain[0].previous_hash, "0");
        assert!(bc.chain[0].transactions.is_empty());
        assert_eq!(bc.chain[0].timestamp, 1_000);
        assert_eq!(bc.difficulty(), 2);
        assert_eq!(bc.mining_reward(), 5);
        assert_eq!(bc.adjustment_interval(), 100);
        assert!(bc.pending_transactions().is_empty());
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn create_transaction_preserves_order() {
        let mut bc = Blockchain::new(1);
        bc.create_transaction(transfer("A", "B", 1)).unwrap();
        bc.create_transaction(transfer("B", "C", 2)).unwrap();
        bc.create_transaction(transfer("A", "B", 1)).unwrap();
        let amounts: Vec<i64> = bc.pending_transactions().iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![1, 2, 1]);
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn rejected_transaction_leaves_pool_unchanged() {
        let mut bc = Blockchain::new(1);
        bc.create_transaction(transfer("A", "B", 1)).unwrap();

        let err = bc.create_transaction(transfer("A", "B", 0)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidTransaction(ValidationError::NonPositiveAmount(0))
        ));
        let err = bc.create_transaction(transfer("A", "", 3)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidTransaction(ValidationError::MissingRecipient)
        ));
        assert_eq!(bc.pending_transactions().len(), 1);
    }

    #[test]
    fn mined_blocks_link_to_predecessors() {
        let bc = sample_chain();
        assert_eq!(bc.len(), 5);
        for i in 1..bc.len() {
            assert_eq!(bc.chain[i].previous_hash, bc.chain[i - 1].hash);
            assert!(bc.chain[i].hash.starts_with('0'));
            assert_eq!(bc.chain[i].difficulty, 1);
        }
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn three_empty_rounds_earn_three_rewards() {
        let mut bc = Blockchain::new(1);
        for _ in 0..3 {
            bc.mine_pending_transactions("R");
        }
        assert_eq!(bc.len(), 4);

        // Each reward is paid in the following block, so the third is still pending.
        assert_eq!(bc.get_balance_for_address("R"), 10);
        assert_eq!(bc.pending_transactions(), &[Transaction::reward("R", 5)]);
        let earned = bc.get_balance_for_address("R")
            + bc.pending_transactions()
                .iter()
                .map(|t| i128::from(t.amount))
                .sum::<i128>();
        assert_eq!(earned, 15);
    }

    #[test]
    fn mined_block_holds_the_pool_snapshot() {
        let mut bc = Blockchain::new(1);
        let tx = transfer("A", "B", 10);
        bc.create_transaction(tx.clone()).unwrap();

        let block = bc.mine_pending_transactions("R").clone();
        assert_eq!(block.transactions, vec![tx]);
        assert_eq!(bc.pending_transactions(), &[Transaction::reward("R", 5)]);
    }

    #[test]
    fn balance_counts_only_mined_transactions() {
        let mut bc = Blockchain::new(1);
        bc.mine_pending_transactions("A"); // reward for A queued
        bc.mine_pending_transactions("A"); // A +5 mined
        bc.create_transaction(transfer("A", "B", 3)).unwrap();
        bc.mine_pending_transactions("B"); // A -3, B +3, A +5 mined
        bc.create_transaction(transfer("B", "C", 1)).unwrap(); // pending only

        assert_eq!(bc.get_balance_for_address("A"), 5 + 5 - 3);
        assert_eq!(bc.get_balance_for_address("B"), 3);
        assert_eq!(bc.get_balance_for_address("C"), 0);
        assert_eq!(bc.get_balance_for_address("nobody"), 0);
    }

    #[test]
    fn self_transfer_nets_to_zero() {
        let mut bc = Blockchain::new(1);
        bc.create_transaction(transfer("A", "A", 4)).unwrap();
        bc.mine_pending_transactions("R");
        assert_eq!(bc.get_balance_for_address("A"), 0);
    }

    #[test]
    fn tampered_timestamp_is_detected_at_every_height() {
        let bc = sample_chain();
        for i in 1..bc.len() {
            let mut copy = bc.clone();
            copy.chain[i].timestamp += 1;
            assert!(!copy.is_valid_chain(), "tampering at {i} went unnoticed");
        }
    }

    #[test]
    fn tampered_amount_is_detected_at_every_height() {
        let bc = sample_chain();
        for i in 1..bc.len() {
            let mut copy = bc.clone();
            copy.chain[i].transactions[0].amount += 100;
            assert!(!copy.is_valid_chain(), "tampering at {i} went unnoticed");
        }
    }

    #[test]
    fn remined_block_breaks_the_link() {
        let mut bc = sample_chain();
        bc.chain[1].transactions[0].amount = 1_000;
        bc.chain[1].mine(1);
        assert!(!bc.is_valid_chain());
    }

    #[test]
    fn understated_difficulty_is_detected() {
        let mut bc = sample_chain();
        bc.chain[2].difficulty = 0;
        assert!(!bc.is_valid_chain());
    }

    #[test]
    fn tampered_genesis_is_detected() {
        let mut bc = sample_chain();
        bc.chain[0].previous_hash = "1".into();
        assert!(!bc.is_valid_chain());
    }

    #[test]
    fn empty_chain_is_invalid() {
        let mut bc = Blockchain::new(1);
        bc.chain.clear();
        assert!(!bc.is_valid_chain());
    }

    #[test]
    fn difficulty_rises_once_after_hundred_blocks() {
        let mut bc = Blockchain::new(1);
        for _ in 0..99 {
            bc.mine_pending_transactions("R");
        }
        assert_eq!(bc.difficulty(), 1);
        assert_eq!(bc.mining_reward(), 5);

        bc.mine_pending_transactions("R");
        assert_eq!(bc.len(), 101);
        assert_eq!(bc.difficulty(), 2);
        assert_eq!(bc.mining_reward(), 4);
        assert_eq!(bc.next_adjustment_height(), 201);

        // The reward queued by the 100th round still uses the old amount.
        assert_eq!(bc.pending_transactions(), &[Transaction::reward("R", 5)]);

        let block = bc.mine_pending_transactions("R");
        assert_eq!(block.difficulty, 2);
        assert!(block.hash.starts_with("00"));
        assert_eq!(bc.difficulty(), 2);
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn cancelled_round_changes_nothing() {
        let mut bc = Blockchain::new(64);
        bc.create_transaction(transfer("A", "B", 2)).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let control = MiningControl::new(token, MiningLimits::default());

        let err = bc.mine_pending_transactions_with("R", &control).unwrap_err();
        assert!(matches!(err, LedgerError::MiningCancelled { .. }));
        assert_eq!(bc.len(), 1);
        assert_eq!(bc.pending_transactions(), &[transfer("A", "B", 2)]);
    }

    #[test]
    fn bounded_round_succeeds_when_easy() {
        let mut bc = Blockchain::new(1);
        let block = bc
            .mine_pending_transactions_with("R", &MiningControl::unbounded())
            .unwrap();
        assert!(block.hash.starts_with('0'));
        assert_eq!(bc.len(), 2);
    }

    #[test]
    fn commit_keeps_late_transactions_after_reward() {
        let mut bc = Blockchain::new(1);
        bc.create_transaction(transfer("A", "B", 1)).unwrap();
        let mut block = bc.prepare_block();
        block.mine(1);

        bc.create_transaction(transfer("C", "D", 2)).unwrap();
        bc.commit_block(block, "R").unwrap();

        assert_eq!(bc.len(), 2);
        assert_eq!(bc.chain[1].transactions, vec![transfer("A", "B", 1)]);
        assert_eq!(
            bc.pending_transactions(),
            &[Transaction::reward("R", 5), transfer("C", "D", 2)]
        );
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn commit_rejects_stale_tip() {
        let mut bc = Blockchain::new(1);
        let mut block = bc.prepare_block();
        block.mine(1);
        bc.mine_pending_transactions("X");

        assert!(matches!(
            bc.commit_block(block, "R"),
            Err(LedgerError::StaleBlock)
        ));
        assert_eq!(bc.len(), 2);
    }

    #[test]
    fn commit_rejects_unmined_block() {
        let mut bc = Blockchain::new(3);
        let mut block = bc.prepare_block();
        block.nonce += 1; // hash cache now stale
        assert!(matches!(
            bc.commit_block(block, "R"),
            Err(LedgerError::InvalidProof)
        ));
        assert_eq!(bc.len(), 1);
    }
}
