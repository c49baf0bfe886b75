//! Shared fixtures for strategy tests.

use crate::config::StrategyConfig;
use crate::step::{Step, Strategy};
use regress_kernel::toy::ToyOracle;
use regress_kernel::{EvaluationRange, Outcome, StateOracle};
use std::sync::Arc;

/// Fast polling, default probing.
pub fn config() -> StrategyConfig {
    StrategyConfig {
        poll_interval_ms: 1,
        ..StrategyConfig::default()
    }
}

pub fn range() -> EvaluationRange {
    EvaluationRange::commits(0, 99)
}

pub fn toy_oracle(name: &str) -> Arc<ToyOracle> {
    Arc::new(ToyOracle::named(name).unwrap_or_else(|| panic!("unknown toy world: {name}")))
}

pub fn toy(name: &str) -> Arc<dyn StateOracle> {
    toy_oracle(name)
}

pub fn threshold(below: u64) -> impl Fn(u64) -> Outcome {
    move |index| {
        if index < below {
            Outcome::Positive
        } else {
            Outcome::Negative
        }
    }
}

/// Take up to `steps` states, recording each outcome as soon as it is handed out.
pub async fn drive<S, F>(strategy: &mut S, oracle: &ToyOracle, outcome: F, steps: usize) -> Vec<u64>
where
    S: Strategy + ?Sized,
    F: Fn(u64) -> Outcome,
{
    let mut emitted = Vec::new();
    for _ in 0..steps {
        match strategy.next(true).await.expect("toy strategy should not fail") {
            Step::Next(state) => {
                oracle.record(state.index(), outcome(state.index()));
                emitted.push(state.index());
            }
            Step::Finished => break,
        }
    }
    emitted
}

/// Drive to exhaustion.
pub async fn drive_to_end<S, F>(strategy: &mut S, oracle: &ToyOracle, outcome: F) -> Vec<u64>
where
    S: Strategy + ?Sized,
    F: Fn(u64) -> Outcome,
{
    drive(strategy, oracle, outcome, usize::MAX).await
}
