//! Coverage pass: spread evaluations evenly over the range.
//!
//! Each call splits the widest interval between considered states at the
//! available index closest to its midpoint. Outcomes are ignored. The pass
//! ends when the limit is reached or no interval has an available index
//! left.

use crate::config::StrategyConfig;
use crate::considered::{ConsideredStates, UnavailabilityGaps};
use crate::error::StrategyError;
use crate::factory::StrategyKind;
use crate::frontier::Frontier;
use crate::step::{Step, Strategy};
use async_trait::async_trait;
use regress_kernel::{EvaluationRange, State, StateOracle};
use std::sync::Arc;

pub struct SequenceStrategy {
    pub(crate) frontier: Frontier,
    limit: usize,
    refreshed: bool,
}

impl SequenceStrategy {
    /// Resolve the boundaries of `range`; the limit comes from
    /// `config.sequence_limit` (0 = unbounded).
    pub async fn open(
        oracle: Arc<dyn StateOracle>,
        range: &EvaluationRange,
        config: StrategyConfig,
    ) -> Result<Self, StrategyError> {
        let limit = config.sequence_limit;
        Ok(Self {
            frontier: Frontier::open(oracle, range, config).await?,
            limit,
            refreshed: false,
        })
    }

    /// States already handed out elsewhere; they count towards the limit.
    pub fn with_considered(mut self, states: impl IntoIterator<Item = State>) -> Self {
        self.frontier.seed(states);
        self
    }

    fn limit_reached(&self) -> bool {
        self.limit > 0 && self.frontier.considered.len() >= self.limit
    }
}

#[async_trait]
impl Strategy for SequenceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GapSequence
    }

    async fn next(&mut self, _wait: bool) -> Result<Step, StrategyError> {
        if !self.refreshed {
            self.frontier.refresh(false).await?;
            self.refreshed = true;
        }
        if self.limit_reached() {
            tracing::debug!(limit = self.limit, "sequence limit reached");
            return Ok(Step::Finished);
        }
        if let Some(boundary) = self.frontier.take_boundary() {
            return Ok(Step::Next(boundary));
        }

        let candidates = self
            .frontier
            .considered
            .adjacent_pairs()
            .map(|(lo, hi)| (lo.clone(), hi.clone()))
            .collect();
        Ok(match self.frontier.split_widest(candidates).await? {
            Some(state) => Step::Next(state),
            None => Step::Finished,
        })
    }

    fn considered(&self) -> &ConsideredStates {
        &self.frontier.considered
    }

    fn gaps(&self) -> &UnavailabilityGaps {
        &self.frontier.gaps
    }

    fn boundaries(&self) -> (&State, &State) {
        self.frontier.boundaries()
    }
}
