//! Command-line argument types

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pointseg: point-cloud segmentation training utilities
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "pointseg")]
#[command(version)]
#[command(about = "Inspect point-cloud segmentation training configurations and checkpoints")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate a training configuration and print the resolved settings
    Check(CheckArgs),

    /// Show the contents of a checkpoint
    Inspect(InspectArgs),
}

/// Arguments for the check command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct CheckArgs {
    /// Path to the YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the inspect command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InspectArgs {
    /// Checkpoint file, or a run or checkpoint directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Snapshot index in sorted order when PATH is a directory
    #[arg(short, long)]
    pub index: Option<usize>,

    /// List every weight with its shape
    #[arg(long)]
    pub weights: bool,
}
