use crate::support::{load_config_or_exit, parse_outcome_or_exit, parse_vars_or_exit, print_json};
use regress_store::{ResultRecord, mutate_results};

pub struct Args {
    pub config: String,
    pub index: u64,
    pub outcome: Option<String>,
    pub vars: Vec<String>,
    pub state_id: Option<String>,
    pub json: bool,
}

pub fn run(args: Args) {
    let config = load_config_or_exit(&args.config);

    let mut record = match (&args.outcome, args.vars.is_empty()) {
        (Some(raw), true) => ResultRecord::new(args.index, parse_outcome_or_exit(raw)),
        (None, false) => ResultRecord::from_variables(args.index, parse_vars_or_exit(&args.vars)),
        (None, true) => {
            eprintln!("error: pass --outcome or at least one --var");
            std::process::exit(1);
        }
        (Some(_), false) => {
            eprintln!("error: --outcome and --var are mutually exclusive");
            std::process::exit(1);
        }
    };
    if let Some(id) = args.state_id {
        record = record.with_state_id(id);
    }

    let previous = mutate_results(&config.results, |store| {
        if record.state_id.is_none()
            && let Some(existing) = store.get(record.index)
        {
            record.state_id = existing.state_id.clone();
        }
        let previous = store.upsert(record.clone()).map(|old| old.outcome);
        (previous, true)
    })
    .unwrap_or_else(|e| {
        eprintln!("error: failed to record result: {e}");
        std::process::exit(1);
    });
    tracing::debug!(index = record.index, outcome = %record.outcome, "recorded result");

    if args.json {
        print_json(&record);
    } else {
        println!("regress record");
        println!("  Index: {}", record.index);
        println!("  Outcome: {}", record.outcome);
        if let Some(previous) = previous {
            println!("  Replaced: {previous}");
        }
    }
}
