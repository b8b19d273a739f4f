use thiserror::Error;

/// Reasons a submitted transaction is refused before it reaches the pending pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("recipient address is required")]
    MissingRecipient,
    #[error("sender address is required (rewards are minted by the ledger only)")]
    MissingSender,
    #[error("amount must be > 0 (got {0})")]
    NonPositiveAmount(i64),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] ValidationError),
    #[error("reward address is required")]
    MissingRewardAddress,
    #[error("mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },
    #[error("mining deadline exceeded after {attempts} attempts")]
    MiningTimedOut { attempts: u64 },
    #[error("mining gave up after {attempts} attempts")]
    MiningExhausted { attempts: u64 },
    #[error("a mining round is already in progress")]
    MiningInProgress,
    #[error("block does not extend the current chain tip or pending pool")]
    StaleBlock,
    #[error("block hash is stale or does not meet its difficulty")]
    InvalidProof,
    #[error("difficulty {0} is out of range")]
    DifficultyOutOfRange(u32),
    #[error("mining worker failed")]
    WorkerFailed,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
