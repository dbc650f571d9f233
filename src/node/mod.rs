use std::sync::mpsc::Sender;

use chrono::Utc;
use log::{debug, info};
use serde::Serialize;

use crate::blockchain::{Block, Blockchain};
use crate::consensus::Validator;
use crate::crypto::HashError;
use crate::gossip::GossipChannel;
use crate::mining::{MineOutcome, Miner};

#[derive(Debug, Clone, Copy)]
pub struct ParticipantSettings {
    pub target_length: usize,
    pub target_interval_ms: i64,
    pub validator: Validator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantState {
    Mining,
    Done,
}

/// Counters accumulated since the last flush, sent whenever the chain grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsFlush {
    pub participant: String,
    pub height: usize,
    pub receptions: u64,
    pub attempts: u64,
    pub replacements: u64,
}

/// Running totals over a participant's whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParticipantTotals {
    pub receptions: u64,
    pub attempts: u64,
    pub replacements: u64,
    pub blocks_mined: u64,
}

impl ParticipantTotals {
    pub fn absorb(&mut self, flush: &StatsFlush) {
        self.receptions += flush.receptions;
        self.attempts += flush.attempts;
        self.replacements += flush.replacements;
    }
}

/// What a finished participant hands to reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantReport {
    pub name: String,
    pub chain: Vec<Block>,
    pub totals: ParticipantTotals,
}

/// One participant: drain gossip, maybe adopt, otherwise mine, then broadcast.
pub struct Participant {
    name: String,
    chain: Blockchain,
    gossip: GossipChannel,
    miner: Miner,
    settings: ParticipantSettings,
    state: ParticipantState,
    replacements: u64,
    totals: ParticipantTotals,
    stats_tx: Option<Sender<StatsFlush>>,
}

impl Participant {
    pub fn new(
        name: impl Into<String>,
        genesis: Block,
        gossip: GossipChannel,
        settings: ParticipantSettings,
    ) -> Self {
        Self {
            name: name.into(),
            chain: Blockchain::new(genesis),
            gossip,
            miner: Miner::new(settings.target_interval_ms),
            settings,
            state: ParticipantState::Mining,
            replacements: 0,
            totals: ParticipantTotals::default(),
            stats_tx: None,
        }
    }

    /// Attach a reporting channel that receives a `StatsFlush` each time the chain grows.
    pub fn with_stats(mut self, stats_tx: Sender<StatsFlush>) -> Self {
        self.stats_tx = Some(stats_tx);
        self
    }

    pub fn run(mut self) -> Result<ParticipantReport, HashError> {
        info!(
            "Starting participant {} ({} peers, target length {})",
            self.name,
            self.gossip.peer_count(),
            self.settings.target_length
        );

        while self.step()? == ParticipantState::Mining {}

        self.flush();
        info!(
            "Finished participant {} at length {} ({} mined, {} adopted)",
            self.name,
            self.chain.len(),
            self.totals.blocks_mined,
            self.totals.replacements
        );
        Ok(ParticipantReport {
            name: self.name,
            chain: self.chain.into_blocks(),
            totals: self.totals,
        })
    }

    /// One scheduling turn: ingest gossip, then run a single search.
    pub fn step(&mut self) -> Result<ParticipantState, HashError> {
        if self.reached_target() {
            self.state = ParticipantState::Done;
            return Ok(self.state);
        }

        if self.check_channels() {
            return Ok(self.update_state());
        }

        let payload = Utc::now().to_rfc3339();
        let last = self.chain.last_block().clone();
        let height = self.chain.len();
        let outcome = {
            let Self {
                chain,
                gossip,
                miner,
                settings,
                replacements,
                name,
                ..
            } = self;
            miner.mine(&last, &payload, || {
                adopt_best(name, chain, gossip, &settings.validator, replacements)
            })?
        };

        match outcome {
            MineOutcome::Found(block) => {
                self.chain.push(block);
                let tip = self.chain.last_block();
                debug!(
                    "{} mined block #{} nonce={} difficulty={}",
                    self.name,
                    self.chain.len() - 1,
                    tip.nonce,
                    tip.difficulty
                );
                self.totals.blocks_mined += 1;
                self.gossip.broadcast(&self.chain.snapshot());
                self.flush();
            }
            MineOutcome::Preempted => {
                debug!("{} abandoned search at length {}", self.name, height);
                self.flush();
            }
        }
        Ok(self.update_state())
    }

    /// Drain gossip once and adopt the best candidate if it wins fork choice.
    fn check_channels(&mut self) -> bool {
        let adopted = adopt_best(
            &self.name,
            &mut self.chain,
            &mut self.gossip,
            &self.settings.validator,
            &mut self.replacements,
        );
        if adopted {
            self.flush();
        }
        adopted
    }

    fn reached_target(&self) -> bool {
        self.chain.len() >= self.settings.target_length
    }

    fn update_state(&mut self) -> ParticipantState {
        if self.reached_target() {
            self.state = ParticipantState::Done;
        }
        self.state
    }

    fn flush(&mut self) {
        let flush = StatsFlush {
            participant: self.name.clone(),
            height: self.chain.len(),
            receptions: self.gossip.take_receptions(),
            attempts: self.miner.take_attempts(),
            replacements: std::mem::take(&mut self.replacements),
        };
        self.totals.absorb(&flush);
        if let Some(tx) = &self.stats_tx {
            if tx.send(flush).is_err() {
                debug!("{}: stats receiver gone, dropping flush", self.name);
                self.stats_tx = None;
            }
        }
    }
}

fn adopt_best(
    name: &str,
    chain: &mut Blockchain,
    gossip: &mut GossipChannel,
    validator: &Validator,
    replacements: &mut u64,
) -> bool {
    let Some(candidate) = gossip.drain_inbound() else {
        return false;
    };
    if !validator.should_replace(chain.blocks(), &candidate) {
        return false;
    }
    debug!(
        "{} adopting chain of length {} (was {})",
        name,
        candidate.len(),
        chain.len()
    );
    chain.replace_with(&candidate);
    *replacements += 1;
    true
}
