//! Nearest-available-artifact resolution.
//!
//! Given a target index and bounds, find an index with an available
//! artifact, as close to the target as possible and strictly inside the
//! bounds. The target itself is accepted whenever it is available.
//!
//! Two paths:
//! 1. The oracle offers [`AvailabilityLookup`]: ask it for the nearest
//!    available neighbours and keep the closest one inside the bounds.
//! 2. Otherwise probe outward. Round `r` (starting at 1, growing by 2) tests
//!    offsets `-r, +r, -(r+1), +(r+1), -(r+2), +(r+2)` concurrently, clipped
//!    to the bounds. The earliest available offset in that order wins; the
//!    call returns as soon as it is settled and the remaining probes are
//!    dropped with the task set.
//!
//! [`AvailabilityLookup`]: regress_kernel::AvailabilityLookup

use crate::config::StrategyConfig;
use crate::error::StrategyError;
use regress_kernel::{State, StateOracle};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Probe offsets per radius round, in preference order.
const ROUND_OFFSETS: [(bool, u64); 6] = [
    (false, 0),
    (true, 0),
    (false, 1),
    (true, 1),
    (false, 2),
    (true, 2),
];

#[derive(Clone)]
pub struct AvailabilityResolver {
    oracle: Arc<dyn StateOracle>,
    width: usize,
    timeout: Duration,
}

impl AvailabilityResolver {
    pub fn new(oracle: Arc<dyn StateOracle>, config: &StrategyConfig) -> Self {
        Self {
            oracle,
            width: config.effective_probe_width(),
            timeout: config.probe_timeout(),
        }
    }

    /// Closest state to `target` with an available artifact, strictly inside
    /// `bounds` (unless `target` itself is available).
    pub async fn closest_available(
        &self,
        target: &State,
        bounds: (&State, &State),
    ) -> Result<Option<State>, StrategyError> {
        if probe(self.oracle.as_ref(), target, self.timeout).await? {
            return Ok(Some(target.clone()));
        }

        let (lo, hi) = (bounds.0.index(), bounds.1.index());
        let inside = |state: &State| lo < state.index() && state.index() < hi;

        if let Some(lookup) = self.oracle.availability_lookup() {
            let (previous, next) =
                tokio::time::timeout(self.timeout, lookup.previous_and_next_available(target))
                    .await
                    .map_err(|_| StrategyError::ProbeTimeout {
                        index: target.index(),
                        timeout_ms: duration_ms(self.timeout),
                    })??;
            let mut candidates: Vec<State> = [previous, next].into_iter().flatten().collect();
            candidates.sort_by_key(|state| state.index().abs_diff(target.index()));
            return Ok(candidates.into_iter().find(|state| inside(state)));
        }

        self.probe_outward(target.index(), lo, hi).await
    }

    async fn probe_outward(
        &self,
        target: u64,
        lo: u64,
        hi: u64,
    ) -> Result<Option<State>, StrategyError> {
        let mut radius: u64 = 1;
        while target.saturating_sub(radius) > lo || target.saturating_add(radius) < hi {
            let candidates: Vec<State> = ROUND_OFFSETS
                .iter()
                .filter_map(|&(upward, extra)| {
                    let step = radius.checked_add(extra)?;
                    let index = if upward {
                        target.checked_add(step)?
                    } else {
                        target.checked_sub(step)?
                    };
                    (lo < index && index < hi).then(|| self.oracle.create_state(index))
                })
                .collect();

            for batch in candidates.chunks(self.width) {
                if let Some(found) = self.probe_batch(batch).await? {
                    tracing::trace!(target, radius, found = found.index(), "probe hit");
                    return Ok(Some(found));
                }
            }
            radius = radius.saturating_add(2);
        }
        Ok(None)
    }

    /// Probe a batch concurrently; return the first available state in batch
    /// order once every earlier one is known to be unavailable.
    ///
    /// A failed probe only counts once every earlier slot has settled as
    /// unavailable, so a later failure never hides an earlier hit.
    async fn probe_batch(&self, batch: &[State]) -> Result<Option<State>, StrategyError> {
        let mut tasks = JoinSet::new();
        for (position, state) in batch.iter().cloned().enumerate() {
            let oracle = Arc::clone(&self.oracle);
            let timeout = self.timeout;
            tasks.spawn(async move {
                let available = probe(oracle.as_ref(), &state, timeout).await;
                (position, available.map(|hit| hit.then_some(state)))
            });
        }

        let mut settled: Vec<Option<Result<Option<State>, StrategyError>>> =
            std::iter::repeat_with(|| None).take(batch.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            let (position, outcome) =
                joined.map_err(|e| StrategyError::ProbeTask(e.to_string()))?;
            settled[position] = Some(outcome);

            for slot in settled.iter_mut() {
                match slot {
                    None => break,
                    Some(Ok(None)) => {}
                    Some(_) => return slot.take().unwrap_or(Ok(None)),
                }
            }
        }
        Ok(None)
    }
}

async fn probe(
    oracle: &dyn StateOracle,
    state: &State,
    timeout: Duration,
) -> Result<bool, StrategyError> {
    tokio::time::timeout(timeout, oracle.has_available_artifact(state))
        .await
        .map_err(|_| StrategyError::ProbeTimeout {
            index: state.index(),
            timeout_ms: duration_ms(timeout),
        })?
        .map_err(StrategyError::from)
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config, toy};
    use async_trait::async_trait;
    use regress_kernel::{EvaluatedState, OracleError};

    fn resolver(oracle: Arc<dyn StateOracle>) -> AvailabilityResolver {
        AvailabilityResolver::new(oracle, &config())
    }

    async fn closest(oracle: Arc<dyn StateOracle>, target: u64, lo: u64, hi: u64) -> Option<u64> {
        resolver(oracle)
            .closest_available(&State::new(target), (&State::new(lo), &State::new(hi)))
            .await
            .expect("toy probes never fail")
            .map(|state| state.index())
    }

    #[tokio::test]
    async fn available_target_is_returned_as_is() {
        assert_eq!(closest(toy("always"), 5, 0, 10).await, Some(5));
    }

    #[tokio::test]
    async fn brute_force_prefers_lower_neighbour_on_ties() {
        assert_eq!(closest(toy("even"), 5, 0, 10).await, Some(4));
        assert_eq!(closest(toy("even"), 49, 0, 98).await, Some(48));
    }

    #[tokio::test]
    async fn brute_force_expands_radius() {
        assert_eq!(closest(toy("every_eleventh"), 49, 0, 99).await, Some(44));
        assert_eq!(closest(toy("every_eleventh"), 82, 66, 99).await, Some(77));
    }

    #[tokio::test]
    async fn nothing_strictly_inside_yields_none() {
        assert_eq!(closest(toy("even"), 1, 0, 2).await, None);
        assert_eq!(closest(toy("every_eleventh"), 38, 33, 44).await, None);
    }

    #[tokio::test]
    async fn lookup_capability_short_cuts_probing() {
        let oracle = Arc::new(
            regress_kernel::toy::ToyOracle::named("every_eleventh")
                .expect("world exists")
                .with_lookup(0, 99),
        );
        let as_dyn: Arc<dyn StateOracle> = oracle.clone();
        assert_eq!(closest(Arc::clone(&as_dyn), 49, 0, 99).await, Some(44));
        // Target probe only; neighbours came from the lookup.
        assert_eq!(oracle.probe_count(), 1);

        // The nearest neighbour (44) is outside the bounds, the other (55) is kept.
        assert_eq!(closest(Arc::clone(&as_dyn), 49, 44, 99).await, Some(55));
        assert_eq!(closest(as_dyn, 38, 33, 44).await, None);
    }

    struct FailingOracle;

    #[async_trait]
    impl StateOracle for FailingOracle {
        async fn create_evaluated_states(&self) -> Result<Vec<EvaluatedState>, OracleError> {
            Ok(Vec::new())
        }

        async fn has_available_artifact(&self, state: &State) -> Result<bool, OracleError> {
            if state.index() == 7 {
                Err(OracleError::Unreachable("artifact index offline".to_string()))
            } else {
                Ok(false)
            }
        }
    }

    #[tokio::test]
    async fn probe_failures_propagate() {
        let err = resolver(Arc::new(FailingOracle))
            .closest_available(&State::new(6), (&State::new(0), &State::new(20)))
            .await
            .expect_err("unreachable oracle must error");
        assert!(matches!(err, StrategyError::Oracle(OracleError::Unreachable(_))));
    }

    /// Index 9 answers late but available, 11 fails at once, the rest are empty.
    struct LateHitOracle {
        late_hit: bool,
    }

    #[async_trait]
    impl StateOracle for LateHitOracle {
        async fn create_evaluated_states(&self) -> Result<Vec<EvaluatedState>, OracleError> {
            Ok(Vec::new())
        }

        async fn has_available_artifact(&self, state: &State) -> Result<bool, OracleError> {
            match state.index() {
                9 => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(self.late_hit)
                }
                11 => Err(OracleError::Unreachable("mirror offline".to_string())),
                _ => Ok(false),
            }
        }
    }

    #[tokio::test]
    async fn later_failure_does_not_hide_an_earlier_hit() {
        let found = resolver(Arc::new(LateHitOracle { late_hit: true }))
            .closest_available(&State::new(10), (&State::new(0), &State::new(20)))
            .await
            .expect("the lower neighbour settles the round");
        assert_eq!(found.map(|state| state.index()), Some(9));

        let err = resolver(Arc::new(LateHitOracle { late_hit: false }))
            .closest_available(&State::new(10), (&State::new(0), &State::new(20)))
            .await
            .expect_err("failure counts once the lower neighbour is empty");
        assert!(matches!(err, StrategyError::Oracle(OracleError::Unreachable(_))));
    }

    struct SlowOracle;

    #[async_trait]
    impl StateOracle for SlowOracle {
        async fn create_evaluated_states(&self) -> Result<Vec<EvaluatedState>, OracleError> {
            Ok(Vec::new())
        }

        async fn has_available_artifact(&self, _state: &State) -> Result<bool, OracleError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn slow_probes_time_out() {
        let mut config = config();
        config.probe_timeout_ms = 10;
        let err = AvailabilityResolver::new(Arc::new(SlowOracle), &config)
            .closest_available(&State::new(3), (&State::new(0), &State::new(9)))
            .await
            .expect_err("slow oracle must time out");
        assert!(matches!(
            err,
            StrategyError::ProbeTimeout {
                index: 3,
                timeout_ms: 10
            }
        ));
    }
}
