pub mod block;
pub mod difficulty;
pub mod miner;
pub mod model;
pub mod pow;

pub use block::Block;
pub use difficulty::DifficultyController;
pub use miner::MiningJob;
pub use model::Blockchain;
pub use pow::{CancelToken, MiningControl, MiningLimits};

/// Default Proof-of-Work difficulty (number of leading zeros).
pub const DEFAULT_DIFFICULTY: u32 = 1;

/// Reward paid for the first blocks; decays at every adjustment.
pub const INITIAL_MINING_REWARD: i64 = 5;

/// Mined blocks between two difficulty adjustments.
pub const DIFFICULTY_ADJUSTMENT_INTERVAL: u64 = 100;

/// Difficulty bounds accepted when creating a ledger (keep low to avoid long waits)
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 6;
