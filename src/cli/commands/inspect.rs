//! Inspect command implementation

use crate::checkpoint::{load_record, CheckpointLayout, CheckpointRecord};
use crate::cli::logging::log;
use crate::cli::{InspectArgs, LogLevel};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Checkpoint file designated by `path`.
///
/// Files are used as is. A directory is searched for checkpoints, either
/// directly or under its `checkpoints/` subdirectory.
pub fn resolve_checkpoint(path: &Path, index: Option<usize>) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    let nested = CheckpointLayout::new(path);
    let layout = if nested.dir().is_dir() { nested } else { CheckpointLayout::at(path) };
    layout.resolve(index)
}

/// Format the record header as a string
pub fn format_record_info(path: &Path, record: &CheckpointRecord) -> String {
    let mut lines = vec![
        format!("Checkpoint: {}", path.display()),
        format!("  Completed epochs: {}", record.epoch),
    ];
    if let Some(saving_path) = &record.saving_path {
        lines.push(format!("  Saving path: {}", saving_path.display()));
    }
    if let Some(state) = &record.training_state {
        lines.push(format!("  Best training mIoU: {:.3}", state.best_train_score));
        lines.push(format!("  Best validation mIoU: {:.3}", state.best_val_score));
    }
    let values: usize = record.model_state.values().map(|t| t.data.len()).sum();
    lines.push(format!("  Weights: {} tensors, {values} values", record.model_state.len()));
    lines.join("\n")
}

/// Format optimizer groups as a string
pub fn format_optimizer_groups(record: &CheckpointRecord) -> String {
    let state = &record.optimizer_state;
    let mut lines = vec![format!(
        "  Optimizer: momentum {}, weight decay {}",
        state.momentum, state.weight_decay
    )];
    for group in &state.groups {
        lines.push(format!(
            "    {}: lr {:.6}, {} parameters",
            group.name,
            group.lr,
            group.members.len()
        ));
    }
    lines.join("\n")
}

/// Format every weight with its shape
pub fn format_weights(record: &CheckpointRecord) -> String {
    record
        .model_state
        .iter()
        .map(|(name, tensor)| format!("    {name} {:?}", tensor.shape))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run_inspect(args: InspectArgs, level: LogLevel) -> std::result::Result<(), String> {
    let path = resolve_checkpoint(&args.path, args.index).map_err(|e| e.to_string())?;
    let record = load_record(&path).map_err(|e| e.to_string())?;

    log(level, LogLevel::Normal, &format_record_info(&path, &record));
    log(level, LogLevel::Normal, &format_optimizer_groups(&record));
    if args.weights {
        log(level, LogLevel::Normal, &format_weights(&record));
    }
    Ok(())
}
