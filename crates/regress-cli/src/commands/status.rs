use crate::support::{load_config_or_exit, load_results_or_exit, print_json};
use regress_kernel::Outcome;
use regress_store::ResultRecord;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    results: Vec<&'a ResultRecord>,
    tally: BTreeMap<&'static str, usize>,
    changes: Vec<Change>,
}

/// Neighbouring conclusive results with different outcomes.
#[derive(Debug, Serialize)]
struct Change {
    from: u64,
    to: u64,
    from_outcome: Outcome,
    to_outcome: Outcome,
    /// Indices strictly between the two that could still be evaluated.
    unresolved: u64,
}

pub fn run(config_path: String, json: bool) {
    let config = load_config_or_exit(&config_path);
    let store = load_results_or_exit(&config.results);

    let changes: Vec<Change> = store
        .outcome_changes()
        .into_iter()
        .map(|(from, to)| Change {
            from: from.index,
            to: to.index,
            from_outcome: from.outcome,
            to_outcome: to.outcome,
            unresolved: to.index - from.index - 1,
        })
        .collect();
    let report = StatusReport {
        results: store.records().collect(),
        tally: store.tally(),
        changes,
    };

    if json {
        print_json(&report);
        return;
    }

    println!("regress status");
    println!("  Results: {}", config.results.display());
    println!("  Recorded: {}", store.len());
    for (outcome, count) in &report.tally {
        println!("    {outcome}: {count}");
    }
    if report.changes.is_empty() {
        println!("  Outcome changes: none yet");
    } else {
        println!("  Outcome changes:");
        for change in &report.changes {
            println!(
                "    - {} ({}) -> {} ({}), {} in between",
                change.from, change.from_outcome, change.to, change.to_outcome, change.unresolved
            );
        }
    }
}
