use log::debug;
use serde::Serialize;

use crate::blockchain::Block;

/// How much of each candidate block is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ValidationPolicy {
    /// Hash linkage and the ±1 difficulty step between neighbours.
    #[default]
    Linkage,
    /// `Linkage`, plus every non-genesis block must carry its own correct
    /// digest and that digest must meet the block's difficulty.
    ProofOfWork,
}

/// Chain validation and the strict longest-chain fork choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// Validate a whole chain. Chains of zero or one block are trivially valid.
    pub fn is_valid(&self, chain: &[Block]) -> bool {
        for (i, pair) in chain.windows(2).enumerate() {
            let (prev, current) = (&pair[0], &pair[1]);

            if current.difficulty.abs_diff(prev.difficulty) > 1 {
                debug!(
                    "block {} difficulty jumps {} -> {}",
                    i + 1,
                    prev.difficulty,
                    current.difficulty
                );
                return false;
            }

            if current.previous_hash != prev.hash {
                debug!("block {} does not link to its predecessor", i + 1);
                return false;
            }

            if self.policy == ValidationPolicy::ProofOfWork && !self.proof_holds(current) {
                debug!("block {} fails proof-of-work re-verification", i + 1);
                return false;
            }
        }
        true
    }

    fn proof_holds(&self, block: &Block) -> bool {
        if block.hash != block.compute_hash() {
            return false;
        }
        // A malformed digest here came from a peer, not from our own hasher,
        // so it is simply an invalid block.
        block.satisfies_own_difficulty().unwrap_or(false)
    }

    /// Strict longest-chain rule: only a longer, valid candidate wins.
    /// Equal-length forks never cause a switch.
    pub fn should_replace(&self, local: &[Block], candidate: &[Block]) -> bool {
        if candidate.len() <= local.len() {
            return false;
        }
        if !self.is_valid(candidate) {
            debug!(
                "rejecting invalid candidate of length {} (local {})",
                candidate.len(),
                local.len()
            );
            return false;
        }
        true
    }
}
