//! Ringlead election simulator
//!
//! Lay out a random ring, run both election variants on it and report the
//! outcomes. Optionally write the optimized run's timeline as JSON.
//!
//! Usage: `ringlead-sim [ring_size] [originators] [seed] [timeline.json]`

use std::env;

use ringlead_election::Algorithm;
use ringlead_vis::{Experiment, ExperimentConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    let defaults = ExperimentConfig::default();

    let config = ExperimentConfig {
        ring_size: args.get(1).and_then(|s| s.parse().ok()).unwrap_or(defaults.ring_size),
        originators: args.get(2).and_then(|s| s.parse().ok()).unwrap_or(defaults.originators),
        seed: args.get(3).and_then(|s| s.parse().ok()).unwrap_or(defaults.seed),
        direction: defaults.direction,
    };
    let timeline_path = args.get(4);

    println!("Ringlead Election Simulator");
    println!("===========================");
    println!();

    let experiment = Experiment::new(&config)?;
    println!("Ring ({} nodes, seed {}):", config.ring_size, config.seed);
    let ring = experiment.ring(Algorithm::Basic)?;
    for (from, to) in ring.edges(experiment.direction()) {
        println!("  {} -> {}", from, to);
    }
    let originators: Vec<_> = experiment
        .originators()
        .iter()
        .map(|&p| experiment.identifiers()[p])
        .collect();
    println!("Originators: {:?}", originators);
    println!();

    let comparison = experiment.compare()?;
    for (name, outcome) in [("basic", comparison.basic), ("optimized", comparison.optimized)] {
        println!(
            "{:>9}: leader {} (position {}) elected {} in {} messages",
            name, outcome.identifier, outcome.leader, outcome.elected, outcome.messages
        );
    }
    println!("  savings: {} messages", comparison.message_savings());

    if let Some(path) = timeline_path {
        let run = experiment.run(Algorithm::Optimized)?;
        std::fs::write(path, run.timeline.to_json()?)?;
        println!();
        println!("Wrote {} steps to {}", run.timeline.len(), path);
    }

    Ok(())
}
