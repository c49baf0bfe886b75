use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "regress",
    about = "Regress: decide which browser build to evaluate next when bisecting a regression",
    version
)]
pub struct Cli {
    /// Log strategy decisions to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hand out the next index to evaluate and record it as pending
    Next {
        /// Path to the run configuration
        #[arg(long, default_value = "regress.toml")]
        config: String,

        /// Do not wait for pending evaluations to report before deciding
        #[arg(long)]
        no_wait: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record the result of evaluating one index
    Record {
        /// Path to the run configuration
        #[arg(long, default_value = "regress.toml")]
        config: String,

        /// Evaluated index
        #[arg(long)]
        index: u64,

        /// Outcome: positive, negative, dirty (or reproduced / not_reproduced)
        #[arg(long, conflicts_with = "vars")]
        outcome: Option<String>,

        /// Experiment variable `key=value` (repeatable); decides the outcome
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Opaque build identifier (e.g. a commit hash)
        #[arg(long)]
        state_id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recorded results and where the outcome changes
    Status {
        /// Path to the run configuration
        #[arg(long, default_value = "regress.toml")]
        config: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List dirty results, optionally clearing them for re-evaluation
    Dirty {
        /// Path to the run configuration
        #[arg(long, default_value = "regress.toml")]
        config: String,

        /// Remove dirty results so their indices are handed out again
        #[arg(long)]
        clear: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the configured strategy to completion against a simulated world
    Simulate {
        /// Path to the run configuration
        #[arg(long, default_value = "regress.toml")]
        config: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
