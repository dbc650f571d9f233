use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;

use serde::Serialize;

use crate::blockchain::Block;
use crate::node::{ParticipantTotals, StatsFlush};

/// Timing statistics over one final chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainReport {
    pub blocks: usize,
    pub target_interval_ms: i64,
    /// Time between each block and its predecessor; 0 for genesis.
    pub intervals_ms: Vec<i64>,
    pub difficulties: Vec<u32>,
    pub total_time_ms: i64,
    pub average_interval_ms: f64,
    pub average_pct_of_target: f64,
    /// Intervals strictly above the target.
    pub deviation_count: usize,
    pub max_interval_ms: i64,
    pub max_pct_of_target: f64,
}

impl ChainReport {
    pub fn from_chain(chain: &[Block], target_interval_ms: i64) -> Self {
        let mut intervals_ms = Vec::with_capacity(chain.len());
        let mut difficulties = Vec::with_capacity(chain.len());
        if let Some(first) = chain.first() {
            intervals_ms.push(0);
            difficulties.push(first.difficulty);
        }
        for pair in chain.windows(2) {
            intervals_ms.push(pair[1].timestamp - pair[0].timestamp);
            difficulties.push(pair[1].difficulty);
        }

        let total_time_ms = match (chain.first(), chain.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0,
        };
        let average_interval_ms = if chain.is_empty() {
            0.0
        } else {
            total_time_ms as f64 / chain.len() as f64
        };
        let max_interval_ms = intervals_ms.iter().copied().max().unwrap_or(0).max(0);
        let deviation_count = intervals_ms
            .iter()
            .filter(|&&t| t > target_interval_ms)
            .count();

        Self {
            blocks: chain.len(),
            target_interval_ms,
            intervals_ms,
            difficulties,
            total_time_ms,
            average_interval_ms,
            average_pct_of_target: pct_of(average_interval_ms, target_interval_ms),
            deviation_count,
            max_interval_ms,
            max_pct_of_target: pct_of(max_interval_ms as f64, target_interval_ms),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn pct_of(value: f64, target: i64) -> f64 {
    if target <= 0 {
        return 0.0;
    }
    (value / target as f64 * 100.0 * 100.0).round() / 100.0
}

/// Sums the `StatsFlush` messages participants send while they run.
#[derive(Debug, Default)]
pub struct StatsCollector {
    per_participant: BTreeMap<String, ParticipantTotals>,
    flushes: usize,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every flush currently queued on `rx` without blocking.
    pub fn collect(&mut self, rx: &Receiver<StatsFlush>) {
        for flush in rx.try_iter() {
            self.record(&flush);
        }
    }

    pub fn record(&mut self, flush: &StatsFlush) {
        self.flushes += 1;
        self.per_participant
            .entry(flush.participant.clone())
            .or_default()
            .absorb(flush);
    }

    pub fn totals(&self, participant: &str) -> Option<&ParticipantTotals> {
        self.per_participant.get(participant)
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn grand_total(&self) -> ParticipantTotals {
        let mut sum = ParticipantTotals::default();
        for t in self.per_participant.values() {
            sum.receptions += t.receptions;
            sum.attempts += t.attempts;
            sum.replacements += t.replacements;
        }
        sum
    }
}
