use std::sync::Arc;

use super::Block;

/// An immutable copy of a whole chain, as exchanged over gossip.
pub type ChainSnapshot = Arc<Vec<Block>>;

/// A participant's local chain. Always starts with the genesis block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    chain: Vec<Block>,
}

impl Blockchain {
    pub fn new(genesis: Block) -> Self {
        Self {
            chain: vec![genesis],
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        // `chain` is never empty: built with genesis, and replacements are
        // only accepted from strictly longer candidates.
        &self.chain[self.chain.len() - 1]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Append one freshly mined block.
    pub fn push(&mut self, block: Block) {
        self.chain.push(block);
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        Arc::new(self.chain.clone())
    }

    /// Swap in a copy of `candidate` wholesale. The snapshot itself is left untouched.
    pub fn replace_with(&mut self, candidate: &ChainSnapshot) {
        self.chain = candidate.as_ref().clone();
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.chain
    }
}
