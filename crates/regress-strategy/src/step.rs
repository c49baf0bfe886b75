//! The contract every strategy exposes to a driver.

use crate::considered::{ConsideredStates, UnavailabilityGaps};
use crate::error::StrategyError;
use crate::factory::StrategyKind;
use async_trait::async_trait;
use regress_kernel::State;

/// Result of asking a strategy for more work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Evaluate this state next.
    Next(State),
    /// Nothing left worth evaluating.
    Finished,
}

impl Step {
    pub fn state(&self) -> Option<&State> {
        match self {
            Self::Next(state) => Some(state),
            Self::Finished => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// A single-threaded state machine handing out states to evaluate.
///
/// One `next` may be in flight per instance; callers serialize access.
#[async_trait]
pub trait Strategy: Send {
    fn kind(&self) -> StrategyKind;

    /// Decide the next state to evaluate.
    ///
    /// With `wait`, strategies that react to outcomes first give pending
    /// evaluations a bounded chance to report.
    async fn next(&mut self, wait: bool) -> Result<Step, StrategyError>;

    fn considered(&self) -> &ConsideredStates;

    fn gaps(&self) -> &UnavailabilityGaps;

    /// The resolved lower and upper boundary states.
    fn boundaries(&self) -> (&State, &State);
}
