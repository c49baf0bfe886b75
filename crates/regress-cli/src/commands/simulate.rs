use crate::config::{ConfigError, SimulationConfig};
use crate::support::{block_on_or_exit, load_config_or_exit, print_json};
use regress_kernel::Outcome;
use regress_kernel::toy::ToyOracle;
use regress_strategy::{Step, StrategyError, StrategyKind, build_strategy};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct SimulationReport {
    strategy: StrategyKind,
    availability: String,
    introduced_at: u64,
    finished: bool,
    emitted: Vec<u64>,
    considered: Vec<(u64, Outcome)>,
    gaps: Vec<(u64, u64)>,
    /// Last index without the regression and first index with it, as narrowed.
    culprit: Option<(u64, u64)>,
    probes: usize,
}

fn simulated_outcome(simulation: &SimulationConfig, index: u64) -> Outcome {
    if simulation.dirty.contains(&index) {
        Outcome::Dirty
    } else if index >= simulation.introduced_at {
        Outcome::Positive
    } else {
        Outcome::Negative
    }
}

fn toy_world(
    simulation: &SimulationConfig,
    first: u64,
    last: u64,
) -> Result<ToyOracle, ConfigError> {
    let oracle = ToyOracle::named(&simulation.availability)
        .ok_or_else(|| ConfigError::UnknownWorld(simulation.availability.clone()))?;
    Ok(if simulation.lookup {
        oracle.with_lookup(first, last)
    } else {
        oracle
    })
}

pub fn run(config_path: String, json: bool) {
    let config = load_config_or_exit(&config_path);
    let simulation = config.simulation().cloned().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    let oracle = toy_world(&simulation, config.range.first, config.range.last)
        .map(Arc::new)
        .unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        });
    let kind = config.strategy.kind;

    let outcome = block_on_or_exit(async {
        let mut strategy = build_strategy(
            kind,
            oracle.clone(),
            &config.range,
            config.strategy.config.clone(),
            Vec::new(),
        )
        .await?;

        let mut emitted = Vec::new();
        let mut finished = false;
        while emitted.len() < simulation.max_steps {
            match strategy.next(true).await? {
                Step::Next(state) => {
                    oracle.record(state.index(), simulated_outcome(&simulation, state.index()));
                    emitted.push(state.index());
                }
                Step::Finished => {
                    finished = true;
                    break;
                }
            }
        }
        let considered: Vec<(u64, Outcome)> = strategy
            .considered()
            .iter()
            .map(|entry| (entry.index(), entry.outcome))
            .collect();
        Ok::<_, StrategyError>((emitted, finished, considered, strategy.gaps().index_pairs()))
    });
    let (emitted, finished, considered, gaps) = outcome.unwrap_or_else(|e| {
        eprintln!("error: simulation failed: {e}");
        std::process::exit(1);
    });
    if !finished {
        tracing::warn!(max_steps = simulation.max_steps, "simulation stopped before finishing");
    }

    let conclusive: Vec<&(u64, Outcome)> = considered
        .iter()
        .filter(|(_, outcome)| outcome.is_conclusive())
        .collect();
    let culprit = conclusive
        .windows(2)
        .find(|pair| pair[0].1 == Outcome::Negative && pair[1].1 == Outcome::Positive)
        .map(|pair| (pair[0].0, pair[1].0));

    let report = SimulationReport {
        strategy: kind,
        availability: simulation.availability.clone(),
        introduced_at: simulation.introduced_at,
        finished,
        emitted,
        considered,
        gaps,
        culprit,
        probes: oracle.probe_count(),
    };

    if json {
        print_json(&report);
        return;
    }

    println!("regress simulate");
    println!("  Strategy: {}", report.strategy);
    println!("  World: {}", report.availability);
    println!("  Evaluations: {}", report.emitted.len());
    println!(
        "  Order: {}",
        report
            .emitted
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Availability probes: {}", report.probes);
    println!("  Gaps: {}", report.gaps.len());
    match report.culprit {
        Some((good, bad)) => println!("  Culprit range: ({good}, {bad}]"),
        None => println!("  Culprit range: not found"),
    }
    if !report.finished {
        println!("  Stopped after {} steps", simulation.max_steps);
    }
}
