//! CLI module for pointseg
//!
//! This module contains the argument types and command handlers.

mod args;
mod commands;
mod logging;

pub use args::{CheckArgs, Cli, Command, InspectArgs};
pub use commands::run_command;
pub use logging::{init_tracing, LogLevel};
