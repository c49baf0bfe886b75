//! Requested evaluation ranges and their translation into boundary states.
//!
//! A range is requested either as raw commit numbers or as a pair of major
//! releases. Release pairs are evaluated directly when only release builds
//! are wanted, and otherwise translated into the commit numbers the releases
//! were cut from.

use crate::error::RangeError;
use crate::oracle::StateOracle;
use crate::state::State;
use serde::{Deserialize, Serialize};

/// Unit of the requested bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeUnit {
    #[default]
    Commits,
    Releases,
}

/// Inclusive bounds requested for an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRange {
    pub first: u64,
    pub last: u64,
    #[serde(default)]
    pub unit: RangeUnit,
    /// Evaluate release builds only (requires a release range).
    #[serde(default)]
    pub only_releases: bool,
}

impl EvaluationRange {
    pub fn commits(first: u64, last: u64) -> Self {
        Self {
            first,
            last,
            unit: RangeUnit::Commits,
            only_releases: false,
        }
    }

    pub fn releases(first: u64, last: u64, only_releases: bool) -> Self {
        Self {
            first,
            last,
            unit: RangeUnit::Releases,
            only_releases,
        }
    }

    /// Reject ranges that can never be resolved, before touching any oracle.
    pub fn validate(&self) -> Result<(), RangeError> {
        if self.first > self.last {
            return Err(RangeError::Inverted {
                first: self.first,
                last: self.last,
            });
        }
        if self.unit == RangeUnit::Commits && self.only_releases {
            return Err(RangeError::ReleaseOnlyWithCommits {
                first: self.first,
                last: self.last,
            });
        }
        Ok(())
    }

    /// The two states delimiting the range in the oracle's index space.
    ///
    /// These are the requested ends; whether artifacts exist for them is a
    /// separate question answered by the strategies.
    pub async fn requested_states(
        &self,
        oracle: &dyn StateOracle,
    ) -> Result<(State, State), RangeError> {
        self.validate()?;
        match (self.unit, self.only_releases) {
            (RangeUnit::Commits, _) | (RangeUnit::Releases, true) => Ok((
                oracle.create_state(self.first),
                oracle.create_state(self.last),
            )),
            (RangeUnit::Releases, false) => {
                let catalog = oracle
                    .release_catalog()
                    .ok_or(RangeError::NoReleaseCatalog)?;
                let first = catalog.commit_of_release(self.first).await?;
                let last = catalog.commit_of_release(self.last).await?;
                if first > last {
                    return Err(RangeError::Inverted { first, last });
                }
                Ok((oracle.create_state(first), oracle.create_state(last)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::oracle::ReleaseCatalog;
    use crate::outcome::EvaluatedState;
    use async_trait::async_trait;

    struct CatalogOracle {
        with_catalog: bool,
    }

    #[async_trait]
    impl StateOracle for CatalogOracle {
        async fn create_evaluated_states(&self) -> Result<Vec<EvaluatedState>, OracleError> {
            Ok(Vec::new())
        }

        async fn has_available_artifact(&self, _state: &State) -> Result<bool, OracleError> {
            Ok(true)
        }

        fn release_catalog(&self) -> Option<&dyn ReleaseCatalog> {
            if self.with_catalog {
                Some(self as &dyn ReleaseCatalog)
            } else {
                None
            }
        }
    }

    #[async_trait]
    impl ReleaseCatalog for CatalogOracle {
        async fn commit_of_release(&self, major: u64) -> Result<u64, OracleError> {
            match major {
                100 => Ok(5_000),
                101 => Ok(5_400),
                other => Err(OracleError::UnknownRelease(other)),
            }
        }
    }

    #[tokio::test]
    async fn commit_range_maps_directly() {
        let oracle = CatalogOracle {
            with_catalog: false,
        };
        let (lo, hi) = EvaluationRange::commits(10, 20)
            .requested_states(&oracle)
            .await
            .expect("commit range should resolve");
        assert_eq!((lo.index(), hi.index()), (10, 20));
    }

    #[tokio::test]
    async fn release_range_translates_through_catalog() {
        let oracle = CatalogOracle { with_catalog: true };
        let (lo, hi) = EvaluationRange::releases(100, 101, false)
            .requested_states(&oracle)
            .await
            .expect("release range should resolve");
        assert_eq!((lo.index(), hi.index()), (5_000, 5_400));
    }

    #[tokio::test]
    async fn release_range_without_catalog_is_rejected() {
        let oracle = CatalogOracle {
            with_catalog: false,
        };
        let err = EvaluationRange::releases(100, 101, false)
            .requested_states(&oracle)
            .await
            .expect_err("missing catalog must error");
        assert_eq!(err, RangeError::NoReleaseCatalog);
    }

    #[tokio::test]
    async fn unknown_release_surfaces_oracle_error() {
        let oracle = CatalogOracle { with_catalog: true };
        let err = EvaluationRange::releases(100, 140, false)
            .requested_states(&oracle)
            .await
            .expect_err("unknown release must error");
        assert_eq!(err, RangeError::Oracle(OracleError::UnknownRelease(140)));
    }

    #[test]
    fn inverted_and_release_only_commit_ranges_fail_validation() {
        assert_eq!(
            EvaluationRange::commits(9, 3).validate(),
            Err(RangeError::Inverted { first: 9, last: 3 })
        );
        let mut range = EvaluationRange::commits(1, 3);
        range.only_releases = true;
        assert!(matches!(
            range.validate(),
            Err(RangeError::ReleaseOnlyWithCommits { .. })
        ));
        assert!(EvaluationRange::releases(120, 120, true).validate().is_ok());
    }
}
