//! CLI command implementations

mod check;
mod inspect;

#[cfg(test)]
mod tests;

use crate::cli::{Cli, Command, LogLevel};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);

    match cli.command {
        Command::Check(args) => check::run_check(args, log_level),
        Command::Inspect(args) => inspect::run_inspect(args, log_level),
    }
}
