use super::{Block, MIN_DIFFICULTY};

/// Difficulty for the next block, judged by how long it has been since `last_block`.
///
/// Slower than `target_interval_ms` eases it by one bit, anything else tightens
/// it by one. Never drops below `MIN_DIFFICULTY`.
pub fn adjust_difficulty(last_block: &Block, timestamp: i64, target_interval_ms: i64) -> u32 {
    let elapsed = timestamp.saturating_sub(last_block.timestamp);
    let next = if elapsed > target_interval_ms {
        last_block.difficulty.saturating_sub(1)
    } else {
        last_block.difficulty.saturating_add(1)
    };
    next.max(MIN_DIFFICULTY)
}
