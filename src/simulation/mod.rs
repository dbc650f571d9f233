use std::sync::mpsc;
use std::thread;

use log::{info, warn};
use thiserror::Error;

use crate::blockchain::{Block, now_millis};
use crate::config::{ConfigError, SimConfig};
use crate::consensus::Validator;
use crate::crypto::HashError;
use crate::gossip::mesh;
use crate::node::{Participant, ParticipantReport, ParticipantSettings};
use crate::report::StatsCollector;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to spawn participant {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("participant {name} aborted: {source}")]
    Participant {
        name: String,
        #[source]
        source: HashError,
    },
    #[error("participant {0} panicked")]
    Panicked(String),
}

/// Everything a finished run leaves behind for reporting.
#[derive(Debug)]
pub struct SimulationOutcome {
    pub reports: Vec<ParticipantReport>,
    pub stats: StatsCollector,
}

/// Shared genesis, full-mesh gossip, one thread per participant; joins them all.
pub fn run(config: &SimConfig) -> Result<SimulationOutcome, SimError> {
    config.validate()?;

    let genesis = Block::genesis(now_millis(), config.initial_difficulty);
    let settings = ParticipantSettings {
        target_length: config.target_length,
        target_interval_ms: config.target_interval_ms,
        validator: Validator::new(config.validation),
    };
    let (stats_tx, stats_rx) = mpsc::channel();

    info!(
        "Launching {} participants (target length {}, mine rate {}ms, {:?} validation)",
        config.participants, config.target_length, config.target_interval_ms, config.validation
    );

    let mut handles = Vec::with_capacity(config.participants);
    for (i, gossip) in mesh(config.participants).into_iter().enumerate() {
        let name = format!("#{i}");
        let participant = Participant::new(name.clone(), genesis.clone(), gossip, settings)
            .with_stats(stats_tx.clone());
        let handle = thread::Builder::new()
            .name(format!("participant-{name}"))
            .spawn(move || participant.run())
            .map_err(|source| SimError::Spawn {
                name: name.clone(),
                source,
            })?;
        handles.push((name, handle));
    }
    drop(stats_tx);

    let mut reports = Vec::with_capacity(handles.len());
    let mut failure = None;
    for (name, handle) in handles {
        match handle.join() {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(source)) => {
                warn!("participant {name} aborted: {source}");
                failure.get_or_insert(SimError::Participant { name, source });
            }
            Err(_) => {
                warn!("participant {name} panicked");
                failure.get_or_insert(SimError::Panicked(name));
            }
        }
    }
    if let Some(err) = failure {
        return Err(err);
    }

    let mut stats = StatsCollector::new();
    stats.collect(&stats_rx);
    info!("All participants finished ({} stat flushes)", stats.flush_count());

    Ok(SimulationOutcome { reports, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::ValidationPolicy;

    fn config(participants: usize, target_length: usize) -> SimConfig {
        SimConfig {
            participants,
            target_length,
            initial_difficulty: 1,
            target_interval_ms: 1_000,
            validation: ValidationPolicy::Linkage,
        }
    }

    fn common_prefix(a: &[Block], b: &[Block]) -> usize {
        a.iter().zip(b).take_while(|(x, y)| x == y).count()
    }

    #[test]
    fn two_participants_converge() {
        let outcome = run(&config(2, 5)).unwrap();
        assert_eq!(outcome.reports.len(), 2);

        let strict = Validator::new(ValidationPolicy::ProofOfWork);
        for r in &outcome.reports {
            assert!(r.chain.len() >= 5, "{} stopped at {}", r.name, r.chain.len());
            assert!(strict.is_valid(&r.chain), "{} has an invalid chain", r.name);
            for pair in r.chain.windows(2) {
                assert_eq!(pair[1].previous_hash, pair[0].hash);
                assert!(pair[1].difficulty.abs_diff(pair[0].difficulty) <= 1);
            }
        }

        let (a, b) = (&outcome.reports[0].chain, &outcome.reports[1].chain);
        let shorter = a.len().min(b.len());
        // Both may find a block at the final height at the same instant and
        // stop before seeing each other's; history below the tip is shared.
        assert!(
            common_prefix(a, b) >= shorter - 1,
            "chains diverge at {} of {}",
            common_prefix(a, b),
            shorter
        );
        assert_eq!(a[0], b[0]);
    }

    #[test]
    fn stats_flushes_match_report_totals() {
        let outcome = run(&config(3, 4)).unwrap();
        for r in &outcome.reports {
            let flushed = outcome.stats.totals(&r.name).expect("participant flushed");
            assert_eq!(flushed.attempts, r.totals.attempts);
            assert_eq!(flushed.receptions, r.totals.receptions);
            assert_eq!(flushed.replacements, r.totals.replacements);
        }
        let mined: u64 = outcome.reports.iter().map(|r| r.totals.blocks_mined).sum();
        assert!(mined >= 3);
    }

    #[test]
    fn single_participant_runs_alone() {
        let outcome = run(&config(1, 3)).unwrap();
        assert_eq!(outcome.reports[0].chain.len(), 3);
        assert_eq!(outcome.reports[0].totals.receptions, 0);
    }

    #[test]
    fn rejects_bad_config() {
        let err = run(&config(0, 5)).unwrap_err();
        assert!(matches!(err, SimError::Config(ConfigError::NoParticipants)));
    }
}
