//! The two append-only records every strategy keeps.
//!
//! - [`ConsideredStates`]: every state emitted or known to be evaluated,
//!   strictly increasing by index.
//! - [`UnavailabilityGaps`]: open intervals proven to contain no artifact.

use regress_kernel::{EvaluatedState, Outcome, State};
use std::collections::{BTreeMap, BTreeSet};

/// Strictly increasing, duplicate-free list of considered states with the
/// outcome currently known for each.
///
/// Entries are only ever added. A refresh may update the outcome attached to
/// an existing entry, never remove or reorder it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsideredStates {
    entries: Vec<EvaluatedState>,
}

impl ConsideredStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[EvaluatedState] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvaluatedState> {
        self.entries.iter()
    }

    pub fn indices(&self) -> Vec<u64> {
        self.entries.iter().map(EvaluatedState::index).collect()
    }

    pub fn contains(&self, state: &State) -> bool {
        self.position(state.index()).is_ok()
    }

    pub fn outcome_of(&self, index: u64) -> Option<Outcome> {
        self.position(index).ok().map(|pos| self.entries[pos].outcome)
    }

    /// Add a state with no known outcome. Returns `false` if already present.
    pub fn insert_pending(&mut self, state: State) -> bool {
        match self.position(state.index()) {
            Ok(_) => false,
            Err(pos) => {
                self.entries.insert(pos, EvaluatedState::pending(state));
                true
            }
        }
    }

    /// Fold upstream results in.
    ///
    /// Upstream outcomes replace local ones; local entries absent upstream
    /// are kept as they are.
    pub fn merge(&mut self, fetched: impl IntoIterator<Item = EvaluatedState>) {
        let mut by_index: BTreeMap<u64, EvaluatedState> = self
            .entries
            .drain(..)
            .map(|entry| (entry.index(), entry))
            .collect();
        for entry in fetched {
            by_index.insert(entry.index(), entry);
        }
        self.entries = by_index.into_values().collect();
    }

    /// Whether every considered state shows up in `fetched`.
    pub fn all_reported_in(&self, fetched: &[EvaluatedState]) -> bool {
        let reported: BTreeSet<u64> = fetched.iter().map(EvaluatedState::index).collect();
        self.entries
            .iter()
            .all(|entry| reported.contains(&entry.index()))
    }

    /// Consecutive pairs in index order.
    pub fn adjacent_pairs(&self) -> impl Iterator<Item = (&State, &State)> {
        self.entries
            .windows(2)
            .map(|pair| (&pair[0].state, &pair[1].state))
    }

    fn position(&self, index: u64) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&index, EvaluatedState::index)
    }
}

/// Open intervals `(lo, hi)` proven to contain no available artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnavailabilityGaps {
    gaps: BTreeSet<(State, State)>,
}

impl UnavailabilityGaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that nothing strictly between `lo` and `hi` is available.
    pub fn record(&mut self, lo: State, hi: State) -> bool {
        self.gaps.insert((lo, hi))
    }

    /// Whether the open interval `(lo, hi)` lies inside a recorded gap.
    ///
    /// A pair whose endpoints sit inside or on the ends of a gap has an
    /// interior that is a subset of the gap's interior.
    pub fn covers(&self, lo: &State, hi: &State) -> bool {
        self.gaps
            .iter()
            .any(|(gap_lo, gap_hi)| gap_lo <= lo && hi <= gap_hi)
    }

    /// Whether `index` lies strictly inside some gap.
    pub fn contains_index(&self, index: u64) -> bool {
        self.gaps
            .iter()
            .any(|(lo, hi)| lo.index() < index && index < hi.index())
    }

    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(State, State)> {
        self.gaps.iter()
    }

    pub fn index_pairs(&self) -> Vec<(u64, u64)> {
        self.gaps
            .iter()
            .map(|(lo, hi)| (lo.index(), hi.index()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluated(index: u64, outcome: Outcome) -> EvaluatedState {
        EvaluatedState::new(State::new(index), outcome)
    }

    #[test]
    fn insert_pending_keeps_order_and_rejects_duplicates() {
        let mut considered = ConsideredStates::new();
        assert!(considered.insert_pending(State::new(50)));
        assert!(considered.insert_pending(State::new(3)));
        assert!(considered.insert_pending(State::new(99)));
        assert!(!considered.insert_pending(State::new(3)));
        assert_eq!(considered.indices(), vec![3, 50, 99]);
    }

    #[test]
    fn merge_updates_outcomes_and_retains_local_entries() {
        let mut considered = ConsideredStates::new();
        considered.insert_pending(State::new(10));
        considered.insert_pending(State::new(40));

        considered.merge(vec![
            evaluated(40, Outcome::Negative),
            evaluated(20, Outcome::Positive),
        ]);

        assert_eq!(considered.indices(), vec![10, 20, 40]);
        assert_eq!(considered.outcome_of(10), Some(Outcome::Unknown));
        assert_eq!(considered.outcome_of(40), Some(Outcome::Negative));
    }

    #[test]
    fn merging_the_same_upstream_twice_is_idempotent() {
        let upstream = vec![evaluated(5, Outcome::Dirty), evaluated(1, Outcome::Positive)];
        let mut considered = ConsideredStates::new();
        considered.insert_pending(State::new(9));

        considered.merge(upstream.clone());
        let first = considered.clone();
        considered.merge(upstream);
        assert_eq!(considered, first);
        assert_eq!(considered.indices(), vec![1, 5, 9]);
    }

    #[test]
    fn all_reported_in_requires_every_local_entry() {
        let mut considered = ConsideredStates::new();
        considered.insert_pending(State::new(1));
        considered.insert_pending(State::new(2));
        assert!(!considered.all_reported_in(&[evaluated(1, Outcome::Positive)]));
        assert!(considered.all_reported_in(&[
            evaluated(2, Outcome::Dirty),
            evaluated(1, Outcome::Positive),
            evaluated(7, Outcome::Negative),
        ]));
    }

    #[test]
    fn gaps_cover_exact_and_nested_pairs_only() {
        let mut gaps = UnavailabilityGaps::new();
        gaps.record(State::new(34), State::new(40));

        assert!(gaps.covers(&State::new(34), &State::new(40)));
        assert!(gaps.covers(&State::new(35), &State::new(38)));
        assert!(!gaps.covers(&State::new(30), &State::new(38)));
        assert!(!gaps.covers(&State::new(36), &State::new(44)));

        assert!(gaps.contains_index(37));
        assert!(!gaps.contains_index(34));
        assert_eq!(gaps.index_pairs(), vec![(34, 40)]);
    }
}
