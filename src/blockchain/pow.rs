use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::LedgerError;

/// The deadline is only consulted every this many attempts.
const DEADLINE_CHECK_EVERY: u64 = 1024;

/// Shared flag used to abort a running nonce search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Optional bounds applied to every mining round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiningLimits {
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u64>,
}

/// Cancellation and bounds for one proof-of-work search.
#[derive(Debug, Clone)]
pub struct MiningControl {
    cancel: CancelToken,
    deadline: Option<Instant>,
    max_attempts: Option<u64>,
}

impl MiningControl {
    /// The deadline (if any) starts counting now.
    pub fn new(cancel: CancelToken, limits: MiningLimits) -> Self {
        Self {
            cancel,
            deadline: limits.timeout.map(|t| Instant::now() + t),
            max_attempts: limits.max_attempts,
        }
    }

    /// No bounds; only the returned control's token can stop the search.
    pub fn unbounded() -> Self {
        Self::new(CancelToken::new(), MiningLimits::default())
    }

    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Called after each failed attempt; `Err` aborts the search.
    pub(crate) fn check(&self, attempts: u64) -> Result<(), LedgerError> {
        if self.cancel.is_cancelled() {
            return Err(LedgerError::MiningCancelled { attempts });
        }
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return Err(LedgerError::MiningExhausted { attempts });
            }
        }
        if attempts % DEADLINE_CHECK_EVERY == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(LedgerError::MiningTimedOut { attempts });
                }
            }
        }
        Ok(())
    }
}

/// True when the first `difficulty` hex characters of `hash` are all '0'.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
