//! Experiment outcomes attached to evaluated states.

use crate::state::State;
use serde::{Deserialize, Serialize};

/// What an evaluation observed at one state.
///
/// Only [`Outcome::Positive`] and [`Outcome::Negative`] can anchor a
/// behavior boundary. `Dirty` means the run was inconclusive; `Unknown` means
/// the state was handed out but no result has been recorded yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Unknown,
    Dirty,
    Positive,
    Negative,
}

impl Outcome {
    /// Whether this outcome can anchor a boundary.
    pub fn is_conclusive(self) -> bool {
        matches!(self, Self::Positive | Self::Negative)
    }

    pub fn is_dirty(self) -> bool {
        self == Self::Dirty
    }

    /// Derive an outcome from the variables an experiment reported.
    ///
    /// `reproduced=ok` wins; otherwise `sanity_check=ok` means the experiment
    /// ran cleanly without reproducing. Anything else is dirty.
    pub fn from_variables<K, V>(variables: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let has = |key: &str| {
            variables.iter().any(|(k, v)| {
                k.as_ref().eq_ignore_ascii_case(key) && v.as_ref().eq_ignore_ascii_case("ok")
            })
        };
        if has("reproduced") {
            Self::Positive
        } else if has("sanity_check") {
            Self::Negative
        } else {
            Self::Dirty
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Dirty => "dirty",
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" | "pending" => Ok(Self::Unknown),
            "dirty" => Ok(Self::Dirty),
            "positive" | "reproduced" => Ok(Self::Positive),
            "negative" | "not_reproduced" => Ok(Self::Negative),
            other => Err(format!(
                "unknown outcome `{other}`; expected unknown, dirty, positive or negative"
            )),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state together with the outcome currently known for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedState {
    pub state: State,
    pub outcome: Outcome,
}

impl EvaluatedState {
    pub fn new(state: State, outcome: Outcome) -> Self {
        Self { state, outcome }
    }

    /// A state that was handed out but has no recorded result.
    pub fn pending(state: State) -> Self {
        Self::new(state, Outcome::Unknown)
    }

    pub fn index(&self) -> u64 {
        self.state.index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproduced_takes_precedence() {
        let vars = [("sanity_check", "OK"), ("Reproduced", "ok")];
        assert_eq!(Outcome::from_variables(&vars), Outcome::Positive);
    }

    #[test]
    fn sanity_check_alone_is_negative() {
        let vars = [("sanity_check", "ok"), ("reproduced", "nok")];
        assert_eq!(Outcome::from_variables(&vars), Outcome::Negative);
    }

    #[test]
    fn missing_signals_are_dirty() {
        let vars: [(&str, &str); 0] = [];
        assert_eq!(Outcome::from_variables(&vars), Outcome::Dirty);
        assert!(!Outcome::Dirty.is_conclusive());
        assert!(!Outcome::Unknown.is_conclusive());
    }

    #[test]
    fn outcome_round_trips_through_json_names() {
        let json = serde_json::to_string(&Outcome::Negative).expect("serialize");
        assert_eq!(json, "\"negative\"");
        assert_eq!("Positive".parse::<Outcome>(), Ok(Outcome::Positive));
        assert!("maybe".parse::<Outcome>().is_err());
    }
}
