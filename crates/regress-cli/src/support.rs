use crate::config::RunConfig;
use regress_kernel::Outcome;
use regress_store::{FileOracle, ResultStore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;

pub fn load_config_or_exit(path: &str) -> RunConfig {
    RunConfig::load(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load config {path}: {e}");
        std::process::exit(1);
    })
}

pub fn file_oracle_or_exit(config: &RunConfig) -> FileOracle {
    let manifest = config.manifest().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    FileOracle::new(config.results.clone(), manifest)
}

pub fn load_results_or_exit(path: &Path) -> ResultStore {
    ResultStore::load(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load {}: {e}", path.display());
        std::process::exit(1);
    })
}

pub fn parse_outcome_or_exit(raw: &str) -> Outcome {
    raw.parse().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

/// Parse repeated `key=value` arguments.
pub fn parse_vars_or_exit(raw: &[String]) -> BTreeMap<String, String> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                (key.trim().to_string(), value.trim().to_string())
            }
            _ => {
                eprintln!("error: invalid variable `{pair}`; expected KEY=VALUE");
                std::process::exit(1);
            }
        })
        .collect()
}

/// Run `future` to completion on a fresh multi-thread runtime.
pub fn block_on_or_exit<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(1);
        });
    runtime.block_on(future)
}

pub fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => {
            eprintln!("error: failed to render JSON: {e}");
            std::process::exit(1);
        }
    }
}
