//! pointseg CLI
//!
//! Configuration and checkpoint tooling for point-cloud segmentation runs.
//!
//! # Usage
//!
//! ```bash
//! # Validate a config and print the resolved settings
//! pointseg check train.yaml
//!
//! # Show the newest checkpoint of a run
//! pointseg inspect results/Log_2024-01-01_00-00-00
//!
//! # Show a specific snapshot with every weight
//! pointseg inspect results/Log_2024-01-01_00-00-00 --index 3 --weights
//! ```

use clap::Parser;
use pointseg::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.quiet, cli.verbose));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
