mod blockchain;
mod config;
mod consensus;
mod crypto;
mod gossip;
mod mining;
mod node;
mod report;
mod simulation;

use dotenvy::dotenv;
use log::info;
use std::env;
use std::error::Error;

use config::SimConfig;
use report::ChainReport;

fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenv();
    env_logger::init();

    let config = SimConfig::from_env().with_participant_arg(env::args().nth(1))?;

    println!(
        "⛏️ Simulating {} miners racing to {} blocks",
        config.participants, config.target_length
    );

    let outcome = simulation::run(&config)?;

    for r in &outcome.reports {
        let summary = ChainReport::from_chain(&r.chain, config.target_interval_ms);
        if let Some(flushed) = outcome.stats.totals(&r.name) {
            info!(
                "{}: length={} mined={} adopted={} received={} attempts={}",
                r.name,
                r.chain.len(),
                r.totals.blocks_mined,
                flushed.replacements,
                flushed.receptions,
                flushed.attempts
            );
        }
        println!("Participant {}\n{}", r.name, summary.to_json()?);
    }

    let all = outcome.stats.grand_total();
    println!(
        "Done: {} hash attempts, {} chains received, {} chain replacements",
        all.attempts, all.receptions, all.replacements
    );
    Ok(())
}
