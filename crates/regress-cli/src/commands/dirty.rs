use crate::support::{load_config_or_exit, load_results_or_exit, print_json};
use regress_store::mutate_results;
use serde_json::json;

pub fn run(config_path: String, clear: bool, json: bool) {
    let config = load_config_or_exit(&config_path);

    let (dirty, cleared): (Vec<u64>, bool) = if clear {
        let removed = mutate_results(&config.results, |store| {
            let removed = store.clear_dirty();
            let changed = !removed.is_empty();
            (removed, changed)
        })
        .unwrap_or_else(|e| {
            eprintln!("error: failed to clear dirty results: {e}");
            std::process::exit(1);
        });
        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "cleared dirty results");
        }
        (removed, true)
    } else {
        let store = load_results_or_exit(&config.results);
        (store.dirty().iter().map(|record| record.index).collect(), false)
    };

    if json {
        print_json(&json!({
            "dirty": dirty,
            "cleared": cleared,
        }));
    } else {
        println!("regress dirty");
        println!("  Dirty: {}", dirty.len());
        for index in &dirty {
            println!("    - {index}");
        }
        if cleared && !dirty.is_empty() {
            println!("  Cleared: these indices will be handed out again");
        }
    }
}
