//! State shared by the sequence and search strategies.

use crate::config::StrategyConfig;
use crate::considered::{ConsideredStates, UnavailabilityGaps};
use crate::error::StrategyError;
use crate::resolver::AvailabilityResolver;
use regress_kernel::{EvaluatedState, EvaluationRange, State, StateOracle};
use std::sync::Arc;

pub(crate) struct Frontier {
    oracle: Arc<dyn StateOracle>,
    resolver: AvailabilityResolver,
    config: StrategyConfig,
    lower: State,
    upper: State,
    pub(crate) considered: ConsideredStates,
    pub(crate) gaps: UnavailabilityGaps,
}

impl Frontier {
    /// Resolve the boundary states of `range` to the nearest available
    /// artifacts. Fails before any state is handed out.
    pub(crate) async fn open(
        oracle: Arc<dyn StateOracle>,
        range: &EvaluationRange,
        config: StrategyConfig,
    ) -> Result<Self, StrategyError> {
        let (first, last) = range.requested_states(oracle.as_ref()).await?;
        let resolver = AvailabilityResolver::new(Arc::clone(&oracle), &config);
        let unavailable = |side| StrategyError::BoundaryUnavailable {
            side,
            first: first.index(),
            last: last.index(),
        };

        let lower = resolver
            .closest_available(&first, (&first, &last))
            .await?
            .ok_or_else(|| unavailable("lower"))?;
        let upper = resolver
            .closest_available(&last, (&first, &last))
            .await?
            .ok_or_else(|| unavailable("upper"))?;
        tracing::debug!(
            requested_first = first.index(),
            requested_last = last.index(),
            lower = lower.index(),
            upper = upper.index(),
            "resolved boundary states"
        );

        Ok(Self {
            oracle,
            resolver,
            config,
            lower,
            upper,
            considered: ConsideredStates::new(),
            gaps: UnavailabilityGaps::new(),
        })
    }

    /// Move the accumulated records into a new frontier over the same range.
    ///
    /// `self` is left with empty records and must not be used afterwards.
    pub(crate) fn hand_off(&mut self) -> Self {
        Self {
            oracle: Arc::clone(&self.oracle),
            resolver: self.resolver.clone(),
            config: self.config.clone(),
            lower: self.lower.clone(),
            upper: self.upper.clone(),
            considered: std::mem::take(&mut self.considered),
            gaps: std::mem::take(&mut self.gaps),
        }
    }

    pub(crate) fn boundaries(&self) -> (&State, &State) {
        (&self.lower, &self.upper)
    }

    /// Treat `states` as already handed out.
    pub(crate) fn seed(&mut self, states: impl IntoIterator<Item = State>) {
        for state in states {
            if self.in_range(state.index()) {
                self.considered.insert_pending(state);
            }
        }
    }

    /// Pull recorded results into the considered states.
    ///
    /// With `wait`, re-read up to the configured number of attempts until
    /// every considered state has been reported upstream, then proceed
    /// regardless.
    pub(crate) async fn refresh(&mut self, wait: bool) -> Result<(), StrategyError> {
        let mut fetched = self.fetch().await?;
        if wait {
            let attempts = self.config.effective_poll_attempts();
            let mut attempt = 1;
            while !self.considered.all_reported_in(&fetched) && attempt < attempts {
                tracing::debug!(attempt, attempts, "waiting for pending evaluations");
                tokio::time::sleep(self.config.poll_interval()).await;
                fetched = self.fetch().await?;
                attempt += 1;
            }
            if !self.considered.all_reported_in(&fetched) {
                tracing::warn!(
                    attempts,
                    "evaluations still pending after polling; deciding without them"
                );
            }
        }
        self.considered.merge(fetched);
        Ok(())
    }

    /// Hand out a boundary state that has not been considered yet.
    pub(crate) fn take_boundary(&mut self) -> Option<State> {
        for boundary in [&self.lower, &self.upper] {
            if !self.considered.contains(boundary) {
                let state = boundary.clone();
                self.considered.insert_pending(state.clone());
                return Some(state);
            }
        }
        None
    }

    /// Split the widest candidate that still has room, recording gaps for
    /// candidates without any available artifact.
    pub(crate) async fn split_widest(
        &mut self,
        mut candidates: Vec<(State, State)>,
    ) -> Result<Option<State>, StrategyError> {
        while let Some(position) = widest(&candidates, &self.gaps) {
            let (lo, hi) = candidates.swap_remove(position);
            match self.find_splitter(&lo, &hi).await? {
                Some(splitter) => {
                    tracing::debug!(
                        lo = lo.index(),
                        splitter = splitter.index(),
                        hi = hi.index(),
                        "splitting interval"
                    );
                    self.considered.insert_pending(splitter.clone());
                    return Ok(Some(splitter));
                }
                None => {
                    tracing::debug!(lo = lo.index(), hi = hi.index(), "unavailability gap");
                    self.gaps.record(lo, hi);
                }
            }
        }
        Ok(None)
    }

    /// The available state closest to the floor midpoint of `(lo, hi)`.
    async fn find_splitter(&self, lo: &State, hi: &State) -> Result<Option<State>, StrategyError> {
        if lo.free_between(hi) == 0 {
            return Ok(None);
        }
        let midpoint = lo.index() + (hi.index() - lo.index()) / 2;
        let target = self.oracle.create_state(midpoint);
        self.resolver.closest_available(&target, (lo, hi)).await
    }

    async fn fetch(&self) -> Result<Vec<EvaluatedState>, StrategyError> {
        let fetched = self.oracle.create_evaluated_states().await?;
        Ok(fetched
            .into_iter()
            .filter(|evaluated| self.in_range(evaluated.index()))
            .collect())
    }

    fn in_range(&self, index: u64) -> bool {
        self.lower.index() <= index && index <= self.upper.index()
    }
}

/// Position of the widest splittable candidate not covered by a gap.
///
/// Ties go to the candidate with the lowest starting index.
fn widest(candidates: &[(State, State)], gaps: &UnavailabilityGaps) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, (lo, hi))| lo.free_between(hi) > 0 && !gaps.covers(lo, hi))
        .min_by_key(|(_, (lo, hi))| {
            (
                std::cmp::Reverse(hi.index() - lo.index()),
                lo.index(),
            )
        })
        .map(|(position, _)| position)
}
