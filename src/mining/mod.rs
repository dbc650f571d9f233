use log::trace;

use crate::blockchain::{Block, adjust_difficulty, block::hash_fields, now_millis};
use crate::crypto::{HashError, meets_difficulty};

/// Result of one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    /// A block extending the searched chain.
    Found(Block),
    /// `peer_check` reported a chain replacement; the partial block was discarded.
    Preempted,
}

/// Interruptible proof-of-work search. The caller is polled for fresh gossip
/// before every attempt, so an adopted chain abandons the stale search after
/// at most one hash.
#[derive(Debug)]
pub struct Miner {
    target_interval_ms: i64,
    attempts: u64,
}

impl Miner {
    pub fn new(target_interval_ms: i64) -> Self {
        Self {
            target_interval_ms,
            attempts: 0,
        }
    }

    /// Search for a block on top of `last`.
    ///
    /// `peer_check` runs before each attempt and returns `true` when the
    /// caller's chain was replaced underneath this search. Difficulty is
    /// re-derived on every attempt from the time elapsed since `last`.
    pub fn mine<F>(
        &mut self,
        last: &Block,
        payload: &str,
        mut peer_check: F,
    ) -> Result<MineOutcome, HashError>
    where
        F: FnMut() -> bool,
    {
        let mut nonce: u64 = 0;

        loop {
            if peer_check() {
                trace!("search preempted after nonce {nonce}");
                return Ok(MineOutcome::Preempted);
            }

            nonce += 1;
            self.attempts += 1;
            let timestamp = now_millis();
            let difficulty = adjust_difficulty(last, timestamp, self.target_interval_ms);
            let hash = hash_fields(timestamp, &last.hash, payload, nonce, difficulty);

            if meets_difficulty(&hash, difficulty)? {
                return Ok(MineOutcome::Found(Block {
                    timestamp,
                    previous_hash: last.hash.clone(),
                    hash,
                    payload: payload.to_string(),
                    nonce,
                    difficulty,
                }));
            }
        }
    }

    /// Hash attempts since the last call; resets the counter.
    pub fn take_attempts(&mut self) -> u64 {
        std::mem::take(&mut self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;

    fn genesis() -> Block {
        Block::genesis(now_millis(), 1)
    }

    #[test]
    fn found_block_links_and_meets_its_difficulty() {
        let last = genesis();
        let mut miner = Miner::new(1_000);
        let outcome = miner.mine(&last, "payload", || false).unwrap();

        let MineOutcome::Found(block) = outcome else {
            panic!("expected a block, got {outcome:?}");
        };
        assert_eq!(block.previous_hash, "hash-one");
        assert_eq!(block.payload, "payload");
        assert_eq!(block.hash, block.compute_hash());
        assert!(block.satisfies_own_difficulty().unwrap());
        assert!(block.difficulty.abs_diff(last.difficulty) <= 1);
        assert!(block.nonce >= 1);
        assert_eq!(miner.take_attempts(), block.nonce);
        assert_eq!(miner.take_attempts(), 0);
    }

    #[test]
    fn preempted_before_first_attempt() {
        let bc = Blockchain::new(genesis());
        let mut miner = Miner::new(1_000);
        let outcome = miner.mine(bc.last_block(), "payload", || true).unwrap();

        assert_eq!(outcome, MineOutcome::Preempted);
        assert_eq!(miner.take_attempts(), 0);
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn preempted_mid_search_discards_partial_work() {
        // Keep the target out of reach so the search is still running when
        // the poll reports a replacement.
        let mut hard = genesis();
        hard.difficulty = 200;
        let mut miner = Miner::new(i64::MAX);
        let mut polls = 0;
        let outcome = miner
            .mine(&hard, "payload", || {
                polls += 1;
                polls > 50
            })
            .unwrap();
        assert_eq!(outcome, MineOutcome::Preempted);
        assert_eq!(polls, 51);
        assert_eq!(miner.take_attempts(), 50);
    }

    #[test]
    fn successive_blocks_chain_together() {
        let mut bc = Blockchain::new(genesis());
        let mut miner = Miner::new(1_000);
        for i in 0..4 {
            match miner.mine(bc.last_block(), &format!("block {i}"), || false).unwrap() {
                MineOutcome::Found(block) => bc.push(block),
                MineOutcome::Preempted => panic!("no peers, nothing to preempt"),
            }
        }
        assert_eq!(bc.len(), 5);
        for pair in bc.blocks().windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].hash);
        }
    }
}
