use crate::config::RunConfig;
use crate::support::{block_on_or_exit, file_oracle_or_exit, load_config_or_exit, print_json};
use regress_kernel::{State, StateOracle};
use regress_store::{FileOracle, ResultRecord, ResultStore, ResultStoreError, claim_pending};
use regress_strategy::{Step, StrategyError, StrategyKind, build_strategy};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct NextReport {
    strategy: StrategyKind,
    finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    considered: usize,
    gaps: Vec<(u64, u64)>,
}

/// Attempts before giving up on a contended results log.
const CLAIM_ATTEMPTS: u32 = 5;

#[derive(Debug, thiserror::Error)]
enum NextError {
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("results log: {0}")]
    Store(#[from] ResultStoreError),

    #[error("index {index} was claimed by another caller {attempts} times in a row")]
    Contended { index: u64, attempts: u32 },
}

#[derive(Debug, PartialEq, Eq)]
enum Claim {
    Won,
    /// Already in the log, or the log is locked by another caller.
    Lost,
}

/// Record `state` as pending unless another caller already handed it out.
fn claim(results: &Path, state: &State) -> Result<Claim, ResultStoreError> {
    let mut pending = ResultRecord::pending(state.index());
    if let Some(id) = state.id() {
        pending = pending.with_state_id(id);
    }
    match claim_pending(results, &pending) {
        Ok(true) => Ok(Claim::Won),
        Ok(false) | Err(ResultStoreError::LockBusy { .. }) => Ok(Claim::Lost),
        Err(e) => Err(e),
    }
}

struct Decision {
    step: Step,
    considered: usize,
    gaps: Vec<(u64, u64)>,
}

/// Replay the strategy over the log and claim what it hands out. A lost
/// claim means the log changed underneath, so the decision is made again.
async fn decide_and_claim(
    config: &RunConfig,
    oracle: Arc<FileOracle>,
    wait: bool,
) -> Result<Decision, NextError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let seed = ResultStore::load(&config.results)?.states(oracle.space());
        let mut strategy = build_strategy(
            config.strategy.kind,
            oracle.clone(),
            &config.range,
            config.strategy.config.clone(),
            seed,
        )
        .await?;
        let step = strategy.next(wait).await?;
        let decision = Decision {
            considered: strategy.considered().len(),
            gaps: strategy.gaps().index_pairs(),
            step,
        };

        let Some(state) = decision.step.state().cloned() else {
            return Ok(decision);
        };
        if claim(&config.results, &state)? == Claim::Won {
            return Ok(decision);
        }
        if attempt >= CLAIM_ATTEMPTS {
            return Err(NextError::Contended {
                index: state.index(),
                attempts: attempt,
            });
        }
        tracing::debug!(
            index = state.index(),
            attempt,
            "index claimed elsewhere, deciding again"
        );
        tokio::time::sleep(Duration::from_millis(25 * u64::from(attempt))).await;
    }
}

pub fn run(config_path: String, no_wait: bool, json: bool) {
    let config = load_config_or_exit(&config_path);
    let oracle = Arc::new(file_oracle_or_exit(&config));
    let kind = config.strategy.kind;

    let Decision {
        step,
        considered,
        gaps,
    } = block_on_or_exit(decide_and_claim(&config, oracle, !no_wait)).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    if let Step::Next(state) = &step {
        tracing::info!(index = state.index(), strategy = %kind, "handed out");
    }

    let report = NextReport {
        strategy: kind,
        finished: step.is_finished(),
        index: step.state().map(|state| state.index()),
        name: step.state().map(|state| state.name()),
        considered,
        gaps,
    };

    if json {
        print_json(&report);
    } else {
        println!("regress next");
        println!("  Strategy: {}", report.strategy);
        match &step {
            Step::Next(state) => println!("  Next: {} (index {})", state.name(), state.index()),
            Step::Finished => println!("  Finished: nothing left worth evaluating"),
        }
        println!("  Considered: {}", report.considered);
        println!("  Gaps: {}", report.gaps.len());
    }
}
