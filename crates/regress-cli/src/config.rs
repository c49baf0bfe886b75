//! The run configuration file.
//!
//! ```toml
//! results = "results.jsonl"
//! artifacts_file = "artifacts.json"   # or an inline [artifacts] table
//!
//! [range]
//! first = 0
//! last = 99
//!
//! [strategy]
//! kind = "composite"
//! sequence_limit = 8
//!
//! [simulation]
//! availability = "every_eleventh"
//! introduced_at = 35
//! ```
//!
//! Relative paths are resolved against the directory of the file.

use regress_kernel::EvaluationRange;
use regress_store::{ArtifactManifest, ManifestError};
use regress_strategy::{StrategyConfig, StrategyKind};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error("{path}: {message}")]
    Parse { path: String, message: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("no artifacts configured: set `artifacts_file` or an [artifacts] table")]
    MissingArtifacts,

    #[error("no [simulation] table in the run configuration")]
    MissingSimulation,

    #[error("unknown availability world `{0}`")]
    UnknownWorld(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub range: EvaluationRange,

    #[serde(default)]
    pub strategy: StrategySection,

    #[serde(default = "default_results")]
    pub results: PathBuf,

    #[serde(default)]
    pub artifacts: Option<ArtifactManifest>,

    #[serde(default)]
    pub artifacts_file: Option<PathBuf>,

    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategySection {
    #[serde(default)]
    pub kind: StrategyKind,

    #[serde(flatten)]
    pub config: StrategyConfig,
}

/// A synthetic world for `regress simulate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Named availability rule: always, even, every_eleventh, sparse_first_half.
    #[serde(default = "default_world")]
    pub availability: String,

    /// First index at which the regression reproduces.
    pub introduced_at: u64,

    /// Indices whose evaluation is inconclusive.
    #[serde(default)]
    pub dirty: BTreeSet<u64>,

    /// Answer availability through direct neighbour lookup instead of probing.
    #[serde(default)]
    pub lookup: bool,

    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_results() -> PathBuf {
    PathBuf::from("results.jsonl")
}

fn default_world() -> String {
    "always".to_string()
}

fn default_max_steps() -> usize {
    10_000
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut config = Self::parse(&text).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.results.is_relative() {
            self.results = base.join(&self.results);
        }
        if let Some(file) = &self.artifacts_file
            && file.is_relative()
        {
            self.artifacts_file = Some(base.join(file));
        }
    }

    /// The configured manifest; the inline table wins over the file.
    pub fn manifest(&self) -> Result<ArtifactManifest, ConfigError> {
        match (&self.artifacts, &self.artifacts_file) {
            (Some(inline), _) => Ok(inline.clone()),
            (None, Some(file)) => Ok(ArtifactManifest::load(file)?),
            (None, None) => Err(ConfigError::MissingArtifacts),
        }
    }

    pub fn simulation(&self) -> Result<&SimulationConfig, ConfigError> {
        self.simulation.as_ref().ok_or(ConfigError::MissingSimulation)
    }
}
