//! CLI command tests

use super::check::{format_decay_info, format_training_info, run_check};
use super::inspect::{format_optimizer_groups, format_record_info, resolve_checkpoint, run_inspect};
use super::*;
use crate::checkpoint::{CheckpointLayout, CheckpointRecord, CheckpointStore, TrainingState};
use crate::cli::{CheckArgs, InspectArgs};
use crate::config::{OptimizerSpec, TrainSpec};
use crate::model::{ParamRole, Parameter, StateDict};
use crate::optim::ParameterGroupOptimizer;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("train.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

fn record(epoch: usize) -> CheckpointRecord {
    let params = vec![
        Parameter::from_vec("head.weight", vec![2], vec![0.5, -0.5]).unwrap(),
        Parameter::zeros("block.offset", vec![3]).with_role(ParamRole::Offset),
    ];
    let optimizer = ParameterGroupOptimizer::new(&params, &OptimizerSpec::default());
    let state: StateDict = params.iter().map(|p| (p.name.clone(), p.to_tensor_data())).collect();
    CheckpointRecord::new(epoch, state, optimizer.state()).with_training_state(TrainingState {
        epoch,
        step: 0,
        best_train_score: 0.5,
        best_val_score: 0.25,
    })
}

#[test]
fn test_check_command_valid() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "training:\n  max_epoch: 5\n  saving: false\n");
    let cli = Cli { command: Command::Check(CheckArgs { config }), verbose: true, quiet: false };
    assert!(run_command(cli).is_ok());
}

#[test]
fn test_check_command_invalid_value() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "optimizer:\n  momentum: 2.0\n");
    let err = run_check(CheckArgs { config }, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("momentum"));
}

#[test]
fn test_check_command_unsupported_task() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "task: object_detection\n");
    let err = run_check(CheckArgs { config }, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("Unsupported task"));
}

#[test]
fn test_check_command_missing_file() {
    let args = CheckArgs { config: PathBuf::from("/nonexistent/train.yaml") };
    assert!(run_check(args, LogLevel::Quiet).is_err());
}

#[test]
fn test_format_training_info() {
    let mut spec = TrainSpec::default();
    spec.training.saving = false;
    let info = format_training_info(&spec);
    assert!(info.contains("Epochs: 100"));
    assert!(info.contains("Saving: disabled"));
}

#[test]
fn test_format_decay_info() {
    let mut spec = TrainSpec::default();
    spec.training.max_epoch = 150;
    let info = format_decay_info(&spec);
    assert!(info.contains("after every epoch"));
    assert!(info.contains("Final LR factor: 0.10"));
}

#[test]
fn test_format_record_info() {
    let info = format_record_info(std::path::Path::new("chkp_0010.json"), &record(10));
    assert!(info.contains("Completed epochs: 10"));
    assert!(info.contains("2 tensors, 5 values"));
    assert!(info.contains("Best validation mIoU: 0.250"));
}

#[test]
fn test_format_optimizer_groups() {
    let info = format_optimizer_groups(&record(1));
    assert!(info.contains("standard: lr 0.010000, 1 parameters"));
    assert!(info.contains("offset: lr 0.001000, 1 parameters"));
}

#[test]
fn test_resolve_checkpoint_from_run_dir() {
    let dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(CheckpointLayout::new(dir.path()));
    let first = store.save_snapshot(&record(10)).unwrap();
    let second = store.save_snapshot(&record(20)).unwrap();

    assert_eq!(resolve_checkpoint(dir.path(), Some(0)).unwrap(), first);
    // No rolling checkpoint: falls back to the newest snapshot
    assert_eq!(resolve_checkpoint(dir.path(), None).unwrap(), second);
    assert_eq!(resolve_checkpoint(&first, None).unwrap(), first);
}

#[test]
fn test_inspect_command() {
    let dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(CheckpointLayout::new(dir.path()));
    store.save_current(&record(3)).unwrap();
    let args = InspectArgs { path: dir.path().to_path_buf(), index: None, weights: true };
    assert!(run_inspect(args, LogLevel::Quiet).is_ok());
}

#[test]
fn test_inspect_command_empty_dir() {
    let dir = TempDir::new().unwrap();
    let args = InspectArgs { path: dir.path().to_path_buf(), index: None, weights: false };
    let err = run_inspect(args, LogLevel::Quiet).unwrap_err();
    assert!(err.contains("no checkpoint found"));
}
