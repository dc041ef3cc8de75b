//! homegin CLI - Command Line Interface for homegin Experiments
//!
//! The main entry point for the homegin command-line tool.
//!
//! # Commands
//! - `homegin run` - Leave-one-house-out training and evaluation
//! - `homegin build` - Build the graph store from house CSVs
//! - `homegin inspect` - Summarise a graph store
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// CLI-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::struct_excessive_bools)]

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod error;

use cli::{Cli, Commands};
use error::CliResult;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, config),
        Commands::Build(args) => commands::build::execute(args, config),
        Commands::Inspect(args) => commands::inspect::execute(args, config),
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` means debug and `--quiet` warn.
fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
