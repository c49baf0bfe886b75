//! Regress CLI: the `regress` command.

mod cli;
mod commands;
mod config;
mod logging;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Next {
            config,
            no_wait,
            json,
        } => commands::next::run(config, no_wait, json),

        Commands::Record {
            config,
            index,
            outcome,
            vars,
            state_id,
            json,
        } => commands::record::run(commands::record::Args {
            config,
            index,
            outcome,
            vars,
            state_id,
            json,
        }),

        Commands::Status { config, json } => commands::status::run(config, json),

        Commands::Dirty {
            config,
            clear,
            json,
        } => commands::dirty::run(config, clear, json),

        Commands::Simulate { config, json } => commands::simulate::run(config, json),
    }
}
