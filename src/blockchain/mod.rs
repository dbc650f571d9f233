pub mod block;
pub mod difficulty;
pub mod model;

pub use block::Block;
pub use difficulty::adjust_difficulty;
pub use model::{Blockchain, ChainSnapshot};

/// `previous_hash` of the genesis block (it has no real predecessor).
pub const GENESIS_PREVIOUS_HASH: &str = "---";

/// Fixed hash of the genesis block.
pub const GENESIS_HASH: &str = "hash-one";

pub const GENESIS_PAYLOAD: &str = "genesis";

/// Difficulty floor (leading zero bits).
pub const MIN_DIFFICULTY: u32 = 1;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
