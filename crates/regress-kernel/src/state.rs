//! Points in the ordered build space.
//!
//! A [`State`] is a cheap, immutable value: one index plus an optional opaque
//! identifier (a commit hash, a release tag). Results never live on the
//! state itself; they are pulled from the oracle by whoever needs them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Which kind of index a state carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSpace {
    /// Source-control commit numbers.
    #[default]
    Commit,
    /// Major release version numbers.
    Release,
}

impl IndexSpace {
    /// Short prefix used when naming states in this space.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Commit => "c",
            Self::Release => "v",
        }
    }
}

/// One point in the ordered index space.
///
/// Equality, hashing and ordering are defined by `index` alone; `id` and
/// `space` are carried along for display and never affect comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    index: u64,
    #[serde(default)]
    space: IndexSpace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

impl State {
    /// A commit-space state without an identifier.
    pub fn new(index: u64) -> Self {
        Self {
            index,
            space: IndexSpace::Commit,
            id: None,
        }
    }

    /// A state in the given space.
    pub fn in_space(index: u64, space: IndexSpace) -> Self {
        Self {
            index,
            space,
            id: None,
        }
    }

    /// Attach an opaque identifier (e.g. a commit hash).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn space(&self) -> IndexSpace {
        self.space
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Human-facing name, e.g. `c_1024` or `v_120`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.space.prefix(), self.index)
    }

    /// Number of indices strictly between `self` and a later `other`.
    ///
    /// Zero when the two are adjacent, equal, or out of order.
    pub fn free_between(&self, other: &State) -> u64 {
        other.index.saturating_sub(self.index).saturating_sub(1)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({id})", self.name()),
            None => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn equality_ignores_identifier_and_space() {
        let a = State::new(7).with_id("abc123");
        let b = State::in_space(7, IndexSpace::Release);
        assert_eq!(a, b);
        assert_ne!(a, State::new(8));
    }

    #[test]
    fn ordering_follows_index() {
        let set: BTreeSet<State> = [9, 3, 5, 3].into_iter().map(State::new).collect();
        let indices: Vec<u64> = set.iter().map(State::index).collect();
        assert_eq!(indices, vec![3, 5, 9]);
    }

    #[test]
    fn free_between_counts_strict_interior() {
        assert_eq!(State::new(3).free_between(&State::new(4)), 0);
        assert_eq!(State::new(3).free_between(&State::new(6)), 2);
        assert_eq!(State::new(6).free_between(&State::new(3)), 0);
    }

    #[test]
    fn names_carry_space_prefix() {
        assert_eq!(State::new(42).name(), "c_42");
        assert_eq!(State::in_space(120, IndexSpace::Release).name(), "v_120");
        assert_eq!(State::new(1).with_id("deadbeef").to_string(), "c_1 (deadbeef)");
    }
}
