//! Toy build spaces for strategy testing and dry runs.
//!
//! A toy space is an availability rule over indices plus an in-memory table
//! of recorded outcomes. Drivers record outcomes themselves after each state
//! is handed out, which mimics evaluation workers reporting into shared
//! storage.
//!
//! ## Named availability worlds
//!
//! - **always**: every index has an artifact.
//! - **even**: only even indices have artifacts.
//! - **every_eleventh**: only multiples of 11 have artifacts.
//! - **sparse_first_half**: below 50 only multiples of 22, everything above.

use crate::error::OracleError;
use crate::oracle::{AvailabilityLookup, ReleaseCatalog, StateOracle};
use crate::outcome::{EvaluatedState, Outcome};
use crate::state::State;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Availability rule over raw indices.
pub type AvailabilityRule = Arc<dyn Fn(u64) -> bool + Send + Sync>;

/// Get a named availability rule.
pub fn get_availability(name: &str) -> Option<AvailabilityRule> {
    let rule: AvailabilityRule = match name {
        "always" => Arc::new(|_| true),
        "even" => Arc::new(|i| i % 2 == 0),
        "every_eleventh" => Arc::new(|i| i % 11 == 0),
        "sparse_first_half" => Arc::new(|i| if i < 50 { i % 22 == 0 } else { true }),
        _ => return None,
    };
    Some(rule)
}

/// In-memory oracle over an availability rule.
///
/// The direct-lookup capability is only offered when a lookup window is
/// configured, so both resolver paths can be exercised against the same
/// rule.
pub struct ToyOracle {
    available: AvailabilityRule,
    lookup_window: Option<(u64, u64)>,
    releases: BTreeMap<u64, u64>,
    outcomes: Mutex<BTreeMap<u64, Outcome>>,
    probes: AtomicUsize,
}

impl ToyOracle {
    pub fn new(available: AvailabilityRule) -> Self {
        Self {
            available,
            lookup_window: None,
            releases: BTreeMap::new(),
            outcomes: Mutex::new(BTreeMap::new()),
            probes: AtomicUsize::new(0),
        }
    }

    /// Oracle over a named availability world.
    pub fn named(name: &str) -> Option<Self> {
        get_availability(name).map(Self::new)
    }

    /// Offer [`AvailabilityLookup`] over `[lo, hi]`.
    pub fn with_lookup(mut self, lo: u64, hi: u64) -> Self {
        self.lookup_window = Some((lo, hi));
        self
    }

    /// Offer [`ReleaseCatalog`] over the given release → commit table.
    pub fn with_releases(mut self, releases: BTreeMap<u64, u64>) -> Self {
        self.releases = releases;
        self
    }

    /// Record (or overwrite) the outcome observed at `index`.
    pub fn record(&self, index: u64, outcome: Outcome) {
        self.table().insert(index, outcome);
    }

    /// Number of availability checks answered so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    fn is_available(&self, index: u64) -> bool {
        (self.available)(index)
    }

    fn table(&self) -> MutexGuard<'_, BTreeMap<u64, Outcome>> {
        self.outcomes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StateOracle for ToyOracle {
    async fn create_evaluated_states(&self) -> Result<Vec<EvaluatedState>, OracleError> {
        Ok(self
            .table()
            .iter()
            .map(|(&index, &outcome)| EvaluatedState::new(self.create_state(index), outcome))
            .collect())
    }

    async fn has_available_artifact(&self, state: &State) -> Result<bool, OracleError> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        Ok(self.is_available(state.index()))
    }

    fn availability_lookup(&self) -> Option<&dyn AvailabilityLookup> {
        if self.lookup_window.is_some() {
            Some(self as &dyn AvailabilityLookup)
        } else {
            None
        }
    }

    fn release_catalog(&self) -> Option<&dyn ReleaseCatalog> {
        if self.releases.is_empty() {
            None
        } else {
            Some(self as &dyn ReleaseCatalog)
        }
    }
}

#[async_trait]
impl AvailabilityLookup for ToyOracle {
    async fn previous_and_next_available(
        &self,
        state: &State,
    ) -> Result<(Option<State>, Option<State>), OracleError> {
        let Some((lo, hi)) = self.lookup_window else {
            return Ok((None, None));
        };
        let index = state.index();
        let previous = (lo..index.min(hi.saturating_add(1)))
            .rev()
            .find(|&i| self.is_available(i))
            .map(|i| self.create_state(i));
        let next = (index.saturating_add(1).max(lo)..=hi)
            .find(|&i| self.is_available(i))
            .map(|i| self.create_state(i));
        Ok((previous, next))
    }
}

#[async_trait]
impl ReleaseCatalog for ToyOracle {
    async fn commit_of_release(&self, major: u64) -> Result<u64, OracleError> {
        self.releases
            .get(&major)
            .copied()
            .ok_or(OracleError::UnknownRelease(major))
    }
}
