use serde::Serialize;

use super::{GENESIS_HASH, GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH};
use crate::crypto::{HashError, crypto_hash, meets_difficulty};

/// A single block in the chain. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub timestamp: i64, // Unix timestamp in milliseconds (UTC)
    pub previous_hash: String,
    pub hash: String,
    pub payload: String,
    pub nonce: u64,      // Proof-of-Work nonce
    pub difficulty: u32, // required leading zero bits
}

impl Block {
    /// Create the genesis block (first block in every chain).
    pub fn genesis(timestamp: i64, initial_difficulty: u32) -> Self {
        Self {
            timestamp,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
            payload: GENESIS_PAYLOAD.to_string(),
            nonce: 0,
            difficulty: initial_difficulty,
        }
    }

    /// Digest over the fields in the same order the miner hashes them.
    pub fn compute_hash(&self) -> String {
        hash_fields(
            self.timestamp,
            &self.previous_hash,
            &self.payload,
            self.nonce,
            self.difficulty,
        )
    }

    /// Whether the cached `hash` carries at least `difficulty` leading zero bits.
    pub fn satisfies_own_difficulty(&self) -> Result<bool, HashError> {
        meets_difficulty(&self.hash, self.difficulty)
    }
}

pub(crate) fn hash_fields(
    timestamp: i64,
    previous_hash: &str,
    payload: &str,
    nonce: u64,
    difficulty: u32,
) -> String {
    crypto_hash(&[&timestamp, &previous_hash, &payload, &nonce, &difficulty])
}
