//! Coverage first, then pinpointing.

use crate::config::StrategyConfig;
use crate::considered::{ConsideredStates, UnavailabilityGaps};
use crate::error::StrategyError;
use crate::factory::StrategyKind;
use crate::search::SearchStrategy;
use crate::sequence::SequenceStrategy;
use crate::step::{Step, Strategy};
use async_trait::async_trait;
use regress_kernel::{EvaluationRange, State, StateOracle};
use std::sync::Arc;

enum Phase {
    Coverage(SequenceStrategy),
    Pinpoint(SearchStrategy),
}

/// Runs a bounded [`SequenceStrategy`] until it finishes, then hands all of
/// its state to a [`SearchStrategy`] once.
pub struct CompositeStrategy {
    phase: Phase,
}

impl CompositeStrategy {
    pub async fn open(
        oracle: Arc<dyn StateOracle>,
        range: &EvaluationRange,
        config: StrategyConfig,
    ) -> Result<Self, StrategyError> {
        Ok(Self {
            phase: Phase::Coverage(SequenceStrategy::open(oracle, range, config).await?),
        })
    }

    pub fn with_considered(mut self, states: impl IntoIterator<Item = State>) -> Self {
        self.phase = match self.phase {
            Phase::Coverage(sequence) => Phase::Coverage(sequence.with_considered(states)),
            Phase::Pinpoint(search) => Phase::Pinpoint(search.with_considered(states)),
        };
        self
    }

    /// Whether the coverage pass is over.
    pub fn is_pinpointing(&self) -> bool {
        matches!(self.phase, Phase::Pinpoint(_))
    }

    fn current(&self) -> &dyn Strategy {
        match &self.phase {
            Phase::Coverage(sequence) => sequence as &dyn Strategy,
            Phase::Pinpoint(search) => search,
        }
    }
}

#[async_trait]
impl Strategy for CompositeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Composite
    }

    async fn next(&mut self, wait: bool) -> Result<Step, StrategyError> {
        if let Phase::Coverage(sequence) = &mut self.phase {
            match sequence.next(wait).await? {
                Step::Next(state) => return Ok(Step::Next(state)),
                Step::Finished => {
                    let search = SearchStrategy::take_over(sequence);
                    tracing::info!(
                        considered = search.considered().len(),
                        gaps = search.gaps().len(),
                        "coverage pass finished, pinpointing outcome changes"
                    );
                    self.phase = Phase::Pinpoint(search);
                }
            }
        }
        match &mut self.phase {
            Phase::Pinpoint(search) => search.next(wait).await,
            Phase::Coverage(_) => Ok(Step::Finished),
        }
    }

    fn considered(&self) -> &ConsideredStates {
        self.current().considered()
    }

    fn gaps(&self) -> &UnavailabilityGaps {
        self.current().gaps()
    }

    fn boundaries(&self) -> (&State, &State) {
        self.current().boundaries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config, drive, drive_to_end, range, threshold, toy_oracle};
    use regress_kernel::Outcome;

    #[tokio::test]
    async fn covers_then_pinpoints() {
        let oracle = toy_oracle("always");
        let mut strategy =
            CompositeStrategy::open(oracle.clone(), &range(), config().with_sequence_limit(10))
                .await
                .expect("boundaries should resolve");

        let coverage = drive(&mut strategy, &oracle, threshold(50), 10).await;
        assert_eq!(coverage, vec![0, 99, 49, 74, 24, 36, 61, 86, 12, 42]);
        assert!(!strategy.is_pinpointing());

        let pinpoint = drive_to_end(&mut strategy, &oracle, threshold(50)).await;
        assert_eq!(pinpoint, vec![55, 52, 50]);
        assert!(strategy.is_pinpointing());
        assert!(strategy.next(true).await.expect("finished").is_finished());
    }

    #[tokio::test]
    async fn gaps_from_coverage_survive_the_handoff() {
        let oracle = toy_oracle("every_eleventh");
        let mut strategy =
            CompositeStrategy::open(oracle.clone(), &range(), config().with_sequence_limit(0))
                .await
                .expect("boundaries should resolve");

        let emitted = drive_to_end(&mut strategy, &oracle, threshold(35)).await;
        assert_eq!(emitted.len(), 10);
        assert!(strategy.is_pinpointing());
        assert_eq!(strategy.gaps().len(), 9);
        assert_eq!(strategy.considered().len(), 10);
    }

    #[tokio::test]
    async fn seeded_coverage_past_its_limit_goes_straight_to_pinpointing() {
        let oracle = toy_oracle("always");
        oracle.record(0, Outcome::Positive);
        oracle.record(99, Outcome::Negative);
        let mut strategy =
            CompositeStrategy::open(oracle.clone(), &range(), config().with_sequence_limit(2))
                .await
                .expect("boundaries should resolve")
                .with_considered([State::new(0), State::new(99)]);

        let emitted = drive(&mut strategy, &oracle, threshold(50), 1).await;
        assert_eq!(emitted, vec![49]);
        assert!(strategy.is_pinpointing());
    }

    #[tokio::test]
    async fn two_shifts_are_pinpointed_after_coverage() {
        let oracle = toy_oracle("always");
        let outcome = |index: u64| {
            if index < 33 || 81 < index {
                Outcome::Positive
            } else {
                Outcome::Negative
            }
        };
        let mut strategy =
            CompositeStrategy::open(oracle.clone(), &range(), config().with_sequence_limit(10))
                .await
                .expect("boundaries should resolve");

        let coverage = drive(&mut strategy, &oracle, outcome, 10).await;
        assert_eq!(coverage, vec![0, 99, 49, 74, 24, 36, 61, 86, 12, 42]);
        drive_to_end(&mut strategy, &oracle, outcome).await;

        let considered = strategy.considered();
        for index in [32, 33, 81, 82] {
            assert!(considered.contains(&State::new(index)), "missing {index}");
        }
        for index in [1, 13, 37, 50, 62, 87] {
            assert!(!considered.contains(&State::new(index)), "spent on {index}");
        }
    }

    #[tokio::test]
    async fn nothing_is_handed_out_inside_a_proven_gap() {
        for world in ["every_eleventh", "sparse_first_half", "even"] {
            let oracle = toy_oracle(world);
            let mut strategy =
                CompositeStrategy::open(oracle.clone(), &range(), config().with_sequence_limit(6))
                    .await
                    .expect("boundaries should resolve");

            let mut emitted = Vec::new();
            while let Step::Next(state) = strategy.next(true).await.expect("toy world") {
                assert!(
                    !strategy.gaps().contains_index(state.index()),
                    "{world}: {} lies inside a gap",
                    state.index()
                );
                oracle.record(state.index(), threshold(35)(state.index()));
                emitted.push(state.index());
            }

            assert!(!emitted.is_empty());
            assert!(
                strategy
                    .considered()
                    .iter()
                    .all(|entry| !strategy.gaps().contains_index(entry.index())),
                "{world}: considered state inside a gap"
            );
        }
    }
}
