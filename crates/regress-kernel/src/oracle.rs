//! The oracle a strategy consults about the build space.
//!
//! The oracle is the only leaf dependency of the strategies. It constructs
//! states, tells whether a build artifact exists for one, and reports every
//! result recorded so far. Richer backends may additionally expose:
//!
//! - [`AvailabilityLookup`]: jump straight to the nearest builds on either
//!   side of an index instead of probing neighbours one by one.
//! - [`ReleaseCatalog`]: translate release numbers into commit numbers.
//!
//! Capabilities are queried, not attempted: an oracle without one returns
//! `None` from the accessor and callers fall back on their own.

use crate::error::OracleError;
use crate::outcome::EvaluatedState;
use crate::state::{IndexSpace, State};
use async_trait::async_trait;

#[async_trait]
pub trait StateOracle: Send + Sync {
    /// The index space states are constructed in.
    fn space(&self) -> IndexSpace {
        IndexSpace::Commit
    }

    /// Deterministically build the state for `index`.
    fn create_state(&self, index: u64) -> State {
        State::in_space(index, self.space())
    }

    /// Every state in range with a recorded outcome, dirty ones included.
    ///
    /// Eventual consistency is acceptable: a result recorded a moment ago
    /// may not show up yet.
    async fn create_evaluated_states(&self) -> Result<Vec<EvaluatedState>, OracleError>;

    /// Whether a runnable artifact exists for `state`.
    async fn has_available_artifact(&self, state: &State) -> Result<bool, OracleError>;

    fn availability_lookup(&self) -> Option<&dyn AvailabilityLookup> {
        None
    }

    fn release_catalog(&self) -> Option<&dyn ReleaseCatalog> {
        None
    }
}

/// Direct neighbour lookup over the set of available artifacts.
#[async_trait]
pub trait AvailabilityLookup: Send + Sync {
    /// The closest available states strictly before and strictly after `state`.
    async fn previous_and_next_available(
        &self,
        state: &State,
    ) -> Result<(Option<State>, Option<State>), OracleError>;
}

/// Release-to-commit translation.
#[async_trait]
pub trait ReleaseCatalog: Send + Sync {
    /// The commit number a major release was cut from.
    async fn commit_of_release(&self, major: u64) -> Result<u64, OracleError>;
}
