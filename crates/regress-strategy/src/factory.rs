//! Strategy selection by name.

use crate::composite::CompositeStrategy;
use crate::config::StrategyConfig;
use crate::error::StrategyError;
use crate::search::SearchStrategy;
use crate::sequence::SequenceStrategy;
use crate::step::Strategy;
use regress_kernel::{EvaluationRange, State, StateOracle};
use std::sync::Arc;

/// The available strategies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Coverage only: spread evaluations evenly, ignoring outcomes.
    GapSequence,
    /// Pinpoint only: bisect between differing outcomes.
    GapSearch,
    /// Coverage up to the sequence limit, then pinpoint.
    #[default]
    Composite,
}

impl StrategyKind {
    pub const ALL: [Self; 3] = [Self::GapSequence, Self::GapSearch, Self::Composite];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GapSequence => "gap_sequence",
            Self::GapSearch => "gap_search",
            Self::Composite => "composite",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "gap_sequence" | "sequence" => Ok(Self::GapSequence),
            "gap_search" | "search" => Ok(Self::GapSearch),
            "composite" => Ok(Self::Composite),
            _ => Err(format!("unknown strategy: {s}")),
        }
    }
}

/// Build a strategy over `range`.
///
/// `seed` lists states already handed out, e.g. by an earlier process
/// working on the same results; they are never handed out again.
pub async fn build_strategy(
    kind: StrategyKind,
    oracle: Arc<dyn StateOracle>,
    range: &EvaluationRange,
    config: StrategyConfig,
    seed: Vec<State>,
) -> Result<Box<dyn Strategy>, StrategyError> {
    let strategy: Box<dyn Strategy> = match kind {
        StrategyKind::GapSequence => Box::new(
            SequenceStrategy::open(oracle, range, config)
                .await?
                .with_considered(seed),
        ),
        StrategyKind::GapSearch => Box::new(
            SearchStrategy::open(oracle, range, config)
                .await?
                .with_considered(seed),
        ),
        StrategyKind::Composite => Box::new(
            CompositeStrategy::open(oracle, range, config)
                .await?
                .with_considered(seed),
        ),
    };
    let (lower, upper) = strategy.boundaries();
    tracing::debug!(
        strategy = %kind,
        lower = lower.index(),
        upper = upper.index(),
        "strategy ready"
    );
    Ok(strategy)
}
