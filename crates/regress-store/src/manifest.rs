//! Which indices have a downloadable build.

use regress_kernel::IndexSpace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error("{path}: parse error: {message}")]
    Parse { path: String, message: String },

    #[error("inverted span [{0}, {1}]")]
    InvertedSpan(u64, u64),
}

/// Known build artifacts for one index space, plus the release → commit
/// mapping used to translate release ranges.
///
/// Serialized form:
///
/// ```json
/// {
///   "space": "commit",
///   "available": [1000, 1012],
///   "spans": [[2000, 2100]],
///   "releases": [{ "major": 120, "commit": 1000 }]
/// }
/// ```
///
/// `spans` are inclusive. Availability is held as disjoint inclusive spans
/// keyed by their first index; touching spans are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ManifestFile", into = "ManifestFile")]
pub struct ArtifactManifest {
    space: IndexSpace,
    spans: BTreeMap<u64, u64>,
    releases: BTreeMap<u64, u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    space: IndexSpace,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    available: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    spans: Vec<[u64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    releases: Vec<ReleaseEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ReleaseEntry {
    major: u64,
    commit: u64,
}

impl TryFrom<ManifestFile> for ArtifactManifest {
    type Error = ManifestError;

    fn try_from(file: ManifestFile) -> Result<Self, Self::Error> {
        let mut manifest = Self::new(file.space, file.available);
        for [lo, hi] in file.spans {
            if lo > hi {
                return Err(ManifestError::InvertedSpan(lo, hi));
            }
            manifest.insert_span(lo, hi);
        }
        manifest.releases = file
            .releases
            .into_iter()
            .map(|entry| (entry.major, entry.commit))
            .collect();
        Ok(manifest)
    }
}

impl From<ArtifactManifest> for ManifestFile {
    fn from(manifest: ArtifactManifest) -> Self {
        let (singles, spans): (Vec<(u64, u64)>, Vec<(u64, u64)>) =
            manifest.spans.into_iter().partition(|(lo, hi)| lo == hi);
        Self {
            space: manifest.space,
            available: singles.into_iter().map(|(index, _)| index).collect(),
            spans: spans.into_iter().map(|(lo, hi)| [lo, hi]).collect(),
            releases: manifest
                .releases
                .into_iter()
                .map(|(major, commit)| ReleaseEntry { major, commit })
                .collect(),
        }
    }
}

impl ArtifactManifest {
    pub fn new(space: IndexSpace, available: impl IntoIterator<Item = u64>) -> Self {
        let mut manifest = Self {
            space,
            spans: BTreeMap::new(),
            releases: BTreeMap::new(),
        };
        for index in available {
            manifest.insert_span(index, index);
        }
        manifest
    }

    pub fn with_release(mut self, major: u64, commit: u64) -> Self {
        self.releases.insert(major, commit);
        self
    }

    /// Load a JSON manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ManifestError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ManifestError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Mark `[lo, hi]` available, merging with any span it overlaps or touches.
    fn insert_span(&mut self, mut lo: u64, mut hi: u64) {
        if let Some((&start, &end)) = self.spans.range(..=lo).next_back()
            && end.saturating_add(1) >= lo
        {
            lo = start;
            hi = hi.max(end);
        }
        loop {
            let following = self.spans.range(lo..).next().map(|(&start, &end)| (start, end));
            match following {
                Some((start, end)) if start <= hi.saturating_add(1) => {
                    self.spans.remove(&start);
                    hi = hi.max(end);
                }
                _ => break,
            }
        }
        self.spans.insert(lo, hi);
    }

    pub fn space(&self) -> IndexSpace {
        self.space
    }

    /// Number of available indices.
    pub fn len(&self) -> u64 {
        self.spans.iter().fold(0u64, |total, (lo, hi)| {
            total.saturating_add((hi - lo).saturating_add(1))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn contains(&self, index: u64) -> bool {
        self.spans
            .range(..=index)
            .next_back()
            .is_some_and(|(_, &hi)| hi >= index)
    }

    /// Nearest available index strictly below `index`.
    pub fn previous(&self, index: u64) -> Option<u64> {
        let below = index.checked_sub(1)?;
        self.spans
            .range(..=below)
            .next_back()
            .map(|(_, &hi)| hi.min(below))
    }

    /// Nearest available index strictly above `index`.
    pub fn next(&self, index: u64) -> Option<u64> {
        let above = index.checked_add(1)?;
        if self.contains(above) {
            return Some(above);
        }
        self.spans.range(above..).next().map(|(&lo, _)| lo)
    }

    pub fn has_releases(&self) -> bool {
        !self.releases.is_empty()
    }

    pub fn commit_of_release(&self, major: u64) -> Option<u64> {
        self.releases.get(&major).copied()
    }
}
