use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use super::Block;
use super::pow::{CancelToken, MiningControl};
use crate::error::{LedgerError, Result};

/// A proof-of-work search running on its own thread.
///
/// The outcome comes back over a channel; [`MiningJob::wait`] blocks for it.
/// Dropping a job cancels its search.
#[derive(Debug)]
pub struct MiningJob {
    reward_address: String,
    cancel: CancelToken,
    done: Receiver<Result<Block>>,
    handle: Option<JoinHandle<()>>,
}

impl MiningJob {
    /// Start mining `candidate` at `difficulty` on a background thread.
    pub fn spawn(
        mut candidate: Block,
        difficulty: u32,
        control: MiningControl,
        reward_address: String,
    ) -> Result<Self> {
        let cancel = control.token().clone();
        let (tx, done) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("pow-miner".into())
            .spawn(move || {
                let outcome = candidate
                    .mine_with(difficulty, &control)
                    .map(|attempts| {
                        debug!(
                            "MINER - found nonce {} after {} attempts (hash={})",
                            candidate.nonce, attempts, candidate.hash
                        );
                        candidate
                    });
                // The receiver may already be gone; nothing to report to then.
                let _ = tx.send(outcome);
            })
            .map_err(|e| {
                warn!("could not start mining thread: {e}");
                LedgerError::WorkerFailed
            })?;

        Ok(Self {
            reward_address,
            cancel,
            done,
            handle: Some(handle),
        })
    }

    /// Block until the search ends. Returns the sealed block, or why it stopped.
    pub fn wait(mut self) -> Result<(Block, String)> {
        let outcome = self.done.recv().map_err(|_| LedgerError::WorkerFailed)?;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(LedgerError::WorkerFailed);
            }
        }
        let reward_address = std::mem::take(&mut self.reward_address);
        outcome.map(|block| (block, reward_address))
    }
}

impl Drop for MiningJob {
    fn drop(&mut self) {
        // The worker is detached, not joined; it exits on its next check.
        self.cancel.cancel();
    }
}
