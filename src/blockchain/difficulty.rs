use log::info;

/// Fixed-cadence retargeting: every `interval` mined blocks the difficulty
/// goes up by one and the mining reward goes down by one.
///
/// There is no feedback from actual mining time and no floor on the reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyController {
    interval: u64,
}

impl DifficultyController {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// `mined_blocks` excludes genesis.
    pub fn should_adjust(&self, mined_blocks: u64) -> bool {
        mined_blocks > 0 && mined_blocks % self.interval == 0
    }

    pub fn adjust(&self, difficulty: &mut u32, mining_reward: &mut i64) {
        *difficulty = difficulty.saturating_add(1);
        *mining_reward = mining_reward.saturating_sub(1);
        info!(
            "Difficulty increased to {} (reward now {})",
            difficulty, mining_reward
        );
    }

    /// Difficulty the schedule prescribes for the block at `height`
    /// (genesis is height 0 and is never mined).
    pub fn difficulty_at(&self, initial: u32, height: u64) -> u32 {
        if height == 0 {
            return 0;
        }
        let steps = (height - 1) / self.interval;
        initial.saturating_add(u32::try_from(steps).unwrap_or(u32::MAX))
    }

    /// Height of the first block mined under the next adjustment.
    pub fn next_adjustment_height(&self, mined_blocks: u64) -> u64 {
        (mined_blocks / self.interval + 1) * self.interval + 1
    }
}
