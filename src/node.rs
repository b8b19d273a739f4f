use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use log::{info, warn};

use crate::blockchain::{
    Block, Blockchain, CancelToken, DIFF_MAX, DIFF_MIN, MiningControl, MiningJob, MiningLimits,
};
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;

type MiningSlot = Arc<Mutex<Option<CancelToken>>>;

/// Process-scoped owner of one ledger.
///
/// Readers share the ledger through an `RwLock`. Writers (submit, commit,
/// reset) take it briefly; the nonce search itself runs on a [`MiningJob`]
/// without holding it. At most one mining round is in flight at a time.
///
/// Lock order is `active` before `ledger`.
#[derive(Debug)]
pub struct Node {
    ledger: RwLock<Blockchain>,
    active: MiningSlot,
    limits: MiningLimits,
}

/// A round started by [`Node::start_mining`]. It holds the node's mining slot
/// until passed to [`Node::finish_mining`]; dropping it unfinished cancels the
/// search and frees the slot.
#[derive(Debug)]
pub struct MiningRound {
    job: Option<MiningJob>,
    slot: MiningSlot,
}

impl Drop for MiningRound {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            drop(job);
            *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
            warn!("MINER - round dropped before completion");
        }
    }
}

impl Node {
    pub fn new(difficulty: u32, limits: MiningLimits) -> Self {
        Self::with_ledger(Blockchain::new(difficulty), limits)
    }

    pub fn with_ledger(ledger: Blockchain, limits: MiningLimits) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            active: Arc::new(Mutex::new(None)),
            limits,
        }
    }

    /// Read access to the current ledger. Only fully appended blocks are visible.
    pub fn ledger(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.ledger.read().expect("ledger lock poisoned")
    }

    /// Validate and queue a transaction. Returns the new pool size.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<usize> {
        let mut ledger = self.ledger.write().expect("ledger lock poisoned");
        ledger.create_transaction(tx)?;
        Ok(ledger.pending_transactions().len())
    }

    /// Snapshot the pending pool and start searching for a nonce in the background.
    pub fn start_mining(&self, reward_address: &str) -> Result<MiningRound> {
        let reward_address = reward_address.trim();
        if reward_address.is_empty() {
            return Err(LedgerError::MissingRewardAddress);
        }

        let mut active = self.active.lock().expect("mining lock poisoned");
        if active.is_some() {
            return Err(LedgerError::MiningInProgress);
        }

        let (candidate, difficulty) = {
            let ledger = self.ledger();
            (ledger.prepare_block(), ledger.difficulty())
        };
        let control = MiningControl::new(CancelToken::new(), self.limits);
        let token = control.token().clone();
        let job = MiningJob::spawn(candidate, difficulty, control, reward_address.to_string())?;

        *active = Some(token);
        info!(
            "MINER - started round at difficulty {} for {}",
            difficulty, reward_address
        );
        Ok(MiningRound {
            job: Some(job),
            slot: Arc::clone(&self.active),
        })
    }

    /// Wait for `round` and append its block. Returns the block's chain index
    /// with the block. Always releases the mining slot.
    pub fn finish_mining(&self, mut round: MiningRound) -> Result<(usize, Block)> {
        let outcome = match round.job.take() {
            Some(job) => job.wait(),
            None => Err(LedgerError::WorkerFailed),
        };

        let mut active = self.active.lock().expect("mining lock poisoned");
        let result = outcome.and_then(|(block, reward_address)| {
            let mut ledger = self.ledger.write().expect("ledger lock poisoned");
            let block = ledger.commit_block(block, &reward_address)?.clone();
            Ok((ledger.len() - 1, block))
        });
        *active = None;

        if let Err(e) = &result {
            warn!("MINER - round ended without a block: {e}");
        }
        result
    }

    /// Start a round and wait for it on the calling thread.
    pub fn mine(&self, reward_address: &str) -> Result<Block> {
        let round = self.start_mining(reward_address)?;
        self.finish_mining(round).map(|(_, block)| block)
    }

    /// Signal the in-flight round to stop. Returns `false` when idle.
    pub fn cancel_mining(&self) -> bool {
        let active = self.active.lock().expect("mining lock poisoned");
        match active.as_ref() {
            Some(token) => {
                token.cancel();
                info!("MINER - cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn is_mining(&self) -> bool {
        self.active.lock().expect("mining lock poisoned").is_some()
    }

    /// Replace the ledger with a fresh one. Refused while a round is in flight.
    pub fn reset(&self, difficulty: u32) -> Result<()> {
        if !(DIFF_MIN..=DIFF_MAX).contains(&difficulty) {
            return Err(LedgerError::DifficultyOutOfRange(difficulty));
        }
        let active = self.active.lock().expect("mining lock poisoned");
        if active.is_some() {
            return Err(LedgerError::MiningInProgress);
        }
        let mut ledger = self.ledger.write().expect("ledger lock poisoned");
        *ledger = Blockchain::new(difficulty);
        info!("new ledger created at difficulty {}", difficulty);
        Ok(())
    }
}
