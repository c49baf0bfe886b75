//! One line of the results file.

use chrono::{DateTime, Utc};
use regress_kernel::{EvaluatedState, IndexSpace, Outcome, State};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The recorded result for one index.
///
/// A record with [`Outcome::Unknown`] is pending: the index was handed out
/// for evaluation and nothing has been reported yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub index: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,

    #[serde(default)]
    pub outcome: Outcome,

    /// Raw variables reported by the experiment, e.g. `reproduced=ok`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,

    pub recorded_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn new(index: u64, outcome: Outcome) -> Self {
        Self {
            index,
            state_id: None,
            outcome,
            variables: BTreeMap::new(),
            recorded_at: Utc::now(),
        }
    }

    /// An index that was handed out but not evaluated yet.
    pub fn pending(index: u64) -> Self {
        Self::new(index, Outcome::Unknown)
    }

    /// A result derived from reported experiment variables.
    pub fn from_variables(index: u64, variables: BTreeMap<String, String>) -> Self {
        let pairs: Vec<(&String, &String)> = variables.iter().collect();
        let outcome = Outcome::from_variables(&pairs);
        Self {
            variables,
            ..Self::new(index, outcome)
        }
    }

    pub fn with_state_id(mut self, id: impl Into<String>) -> Self {
        self.state_id = Some(id.into());
        self
    }

    pub fn is_pending(&self) -> bool {
        self.outcome == Outcome::Unknown
    }

    pub fn state(&self, space: IndexSpace) -> State {
        let state = State::in_space(self.index, space);
        match &self.state_id {
            Some(id) => state.with_id(id.clone()),
            None => state,
        }
    }

    pub fn to_evaluated(&self, space: IndexSpace) -> EvaluatedState {
        EvaluatedState::new(self.state(space), self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_decide_the_outcome() {
        let vars = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        };

        let reproduced = ResultRecord::from_variables(
            4,
            vars(&[("sanity_check", "OK"), ("reproduced", "ok")]),
        );
        assert_eq!(reproduced.outcome, Outcome::Positive);
        assert_eq!(reproduced.variables.len(), 2);

        let clean = ResultRecord::from_variables(5, vars(&[("sanity_check", "ok")]));
        assert_eq!(clean.outcome, Outcome::Negative);

        let broken = ResultRecord::from_variables(6, vars(&[("reproduced", "failed")]));
        assert_eq!(broken.outcome, Outcome::Dirty);
    }

    #[test]
    fn minimal_json_line_parses_as_pending() {
        let record: ResultRecord =
            serde_json::from_str(r#"{"index":12,"recorded_at":"2024-05-01T10:00:00Z"}"#)
                .expect("minimal record should parse");
        assert!(record.is_pending());
        assert_eq!(record.state(IndexSpace::Release).name(), "v_12");
    }

    #[test]
    fn state_id_is_carried_to_the_state() {
        let record = ResultRecord::new(7, Outcome::Negative).with_state_id("a1b2c3");
        let evaluated = record.to_evaluated(IndexSpace::Commit);
        assert_eq!(evaluated.state.id(), Some("a1b2c3"));
        assert_eq!(evaluated.outcome, Outcome::Negative);
    }
}
