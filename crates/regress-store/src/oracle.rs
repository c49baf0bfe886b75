//! A `StateOracle` backed by a results file and an artifact manifest.

use crate::manifest::ArtifactManifest;
use crate::store::ResultStore;
use async_trait::async_trait;
use regress_kernel::{
    AvailabilityLookup, EvaluatedState, IndexSpace, OracleError, ReleaseCatalog, State,
    StateOracle,
};
use std::path::PathBuf;

/// Reads recorded outcomes from a JSONL results file and answers
/// availability from a manifest.
///
/// The results file is re-read on every fetch, so outcomes written by other
/// processes become visible on the next refresh. Pending records are not
/// reported as evaluated.
pub struct FileOracle {
    results: PathBuf,
    manifest: ArtifactManifest,
}

impl FileOracle {
    pub fn new(results: impl Into<PathBuf>, manifest: ArtifactManifest) -> Self {
        Self {
            results: results.into(),
            manifest,
        }
    }

    fn state_at(&self, index: Option<u64>) -> Option<State> {
        index.map(|index| self.create_state(index))
    }
}

#[async_trait]
impl StateOracle for FileOracle {
    fn space(&self) -> IndexSpace {
        self.manifest.space()
    }

    async fn create_evaluated_states(&self) -> Result<Vec<EvaluatedState>, OracleError> {
        let path = self.results.clone();
        let store = tokio::task::spawn_blocking(move || ResultStore::load(path))
            .await
            .map_err(|e| OracleError::Storage(e.to_string()))?
            .map_err(|e| OracleError::Storage(e.to_string()))?;

        let space = self.space();
        let evaluated: Vec<EvaluatedState> = store
            .records()
            .filter(|record| !record.is_pending())
            .map(|record| record.to_evaluated(space))
            .collect();
        tracing::trace!(
            path = %self.results.display(),
            evaluated = evaluated.len(),
            "read recorded results"
        );
        Ok(evaluated)
    }

    async fn has_available_artifact(&self, state: &State) -> Result<bool, OracleError> {
        Ok(self.manifest.contains(state.index()))
    }

    fn availability_lookup(&self) -> Option<&dyn AvailabilityLookup> {
        Some(self as &dyn AvailabilityLookup)
    }

    fn release_catalog(&self) -> Option<&dyn ReleaseCatalog> {
        if self.manifest.has_releases() {
            Some(self as &dyn ReleaseCatalog)
        } else {
            None
        }
    }
}

#[async_trait]
impl AvailabilityLookup for FileOracle {
    async fn previous_and_next_available(
        &self,
        state: &State,
    ) -> Result<(Option<State>, Option<State>), OracleError> {
        Ok((
            self.state_at(self.manifest.previous(state.index())),
            self.state_at(self.manifest.next(state.index())),
        ))
    }
}

#[async_trait]
impl ReleaseCatalog for FileOracle {
    async fn commit_of_release(&self, major: u64) -> Result<u64, OracleError> {
        self.manifest
            .commit_of_release(major)
            .ok_or(OracleError::UnknownRelease(major))
    }
}
