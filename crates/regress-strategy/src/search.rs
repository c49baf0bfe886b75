//! Pinpoint pass: narrow every place where the outcome flips.
//!
//! Between two consecutive conclusive outcomes that differ, every interval
//! between neighbouring considered states is a candidate, unless both of its
//! ends are dirty. The widest candidate is split first. The pass ends when
//! each flip is down to adjacent states or to a proven gap.

use crate::config::StrategyConfig;
use crate::considered::{ConsideredStates, UnavailabilityGaps};
use crate::error::StrategyError;
use crate::factory::StrategyKind;
use crate::frontier::Frontier;
use crate::sequence::SequenceStrategy;
use crate::step::{Step, Strategy};
use async_trait::async_trait;
use regress_kernel::{EvaluatedState, EvaluationRange, State, StateOracle};
use std::sync::Arc;

pub struct SearchStrategy {
    frontier: Frontier,
}

impl SearchStrategy {
    pub async fn open(
        oracle: Arc<dyn StateOracle>,
        range: &EvaluationRange,
        config: StrategyConfig,
    ) -> Result<Self, StrategyError> {
        Ok(Self {
            frontier: Frontier::open(oracle, range, config).await?,
        })
    }

    /// Continue where a coverage pass stopped, keeping its boundaries,
    /// considered states and gaps.
    pub fn from_sequence(mut sequence: SequenceStrategy) -> Self {
        Self::take_over(&mut sequence)
    }

    /// Like [`SearchStrategy::from_sequence`], leaving `sequence` empty.
    pub(crate) fn take_over(sequence: &mut SequenceStrategy) -> Self {
        Self {
            frontier: sequence.frontier.hand_off(),
        }
    }

    /// States already handed out elsewhere.
    pub fn with_considered(mut self, states: impl IntoIterator<Item = State>) -> Self {
        self.frontier.seed(states);
        self
    }
}

/// Intervals worth splitting: the neighbour pairs spanning each change
/// between consecutive conclusive outcomes, minus those with two dirty ends.
fn flip_intervals(entries: &[EvaluatedState]) -> Vec<(State, State)> {
    let conclusive: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.outcome.is_conclusive())
        .map(|(position, _)| position)
        .collect();

    let mut intervals = Vec::new();
    for window in conclusive.windows(2) {
        let (from, to) = (window[0], window[1]);
        if entries[from].outcome == entries[to].outcome {
            continue;
        }
        for pair in entries[from..=to].windows(2) {
            if pair[0].outcome.is_dirty() && pair[1].outcome.is_dirty() {
                continue;
            }
            intervals.push((pair[0].state.clone(), pair[1].state.clone()));
        }
    }
    intervals
}

#[async_trait]
impl Strategy for SearchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GapSearch
    }

    async fn next(&mut self, wait: bool) -> Result<Step, StrategyError> {
        self.frontier.refresh(wait).await?;
        if let Some(boundary) = self.frontier.take_boundary() {
            return Ok(Step::Next(boundary));
        }

        let candidates = flip_intervals(self.frontier.considered.as_slice());
        Ok(match self.frontier.split_widest(candidates).await? {
            Some(state) => Step::Next(state),
            None => {
                tracing::debug!(
                    considered = self.frontier.considered.len(),
                    gaps = self.frontier.gaps.len(),
                    "every outcome change is pinpointed"
                );
                Step::Finished
            }
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
