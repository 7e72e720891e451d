//! End-to-end training runs through the public API
//!
//! A per-point linear classifier learns the sign of `x` on a single
//! four-point cloud. Runs write into temporary directories and are checked
//! through the files they leave behind.

use ndarray::{array, Array1, Array2};
use pointseg::checkpoint::{load_record, CheckpointLayout, EntryMode};
use pointseg::config::{parse_spec, LrDecaySpec, TrainSpec};
use pointseg::data::{
    CloudInfo, EvaluationSet, InMemoryLoader, InMemoryValidationSource, ValidationCloud,
};
use pointseg::model::{softmax, ModelMode, ParamRole, Parameter, SegmentationModel, StateDict, TensorData};
use pointseg::monitor::JsonLinesSink;
use pointseg::train::callback::{CallbackAction, CallbackContext, TrainerCallback, SENTINEL_FILE};
use pointseg::train::{Batch, StopReason, TrainingOrchestrator};
use pointseg::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FEATURES: usize = 3;
const CLASSES: usize = 2;

/// Scores `w · p + b` per point, trained with softmax cross-entropy
struct PointLinear {
    params: Vec<Parameter>,
    criterion: TensorData,
    mode: ModelMode,
}

impl PointLinear {
    fn new() -> Self {
        Self {
            params: vec![
                Parameter::zeros("head.weight", vec![CLASSES, FEATURES]),
                Parameter::zeros("head.offset", vec![CLASSES]).with_role(ParamRole::Offset),
            ],
            criterion: TensorData::new(vec![CLASSES], vec![1.0; CLASSES]),
            mode: ModelMode::Train,
        }
    }
}

impl SegmentationModel for PointLinear {
    fn num_classes(&self) -> usize {
        CLASSES
    }

    fn forward(&mut self, batch: &Batch) -> Result<Array2<f32>> {
        let w = self.params[0]
            .data
            .clone()
            .into_shape_with_order((CLASSES, FEATURES))
            .map_err(|e| Error::Model(e.to_string()))?;
        let b = &self.params[1].data;
        Ok(batch.points.dot(&w.t()) + b)
    }

    fn backward(&mut self, scores: &Array2<f32>, batch: &Batch) -> Result<f32> {
        let probs = softmax(scores);
        let n = batch.size() as f32;
        let mut delta = probs.clone();
        let mut loss = 0.0;
        for (i, &label) in batch.labels.iter().enumerate() {
            let c = label as usize;
            loss -= probs[[i, c]].max(1e-7).ln();
            delta[[i, c]] -= 1.0;
        }
        delta /= n;

        let grad_w = delta.t().dot(&batch.points);
        self.params[0].grad = Array1::from_iter(grad_w.iter().copied());
        self.params[1].grad = delta.sum_axis(ndarray::Axis(0));
        Ok(loss / n)
    }

    fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.params
    }

    fn set_mode(&mut self, mode: ModelMode) {
        self.mode = mode;
    }

    fn buffers(&self) -> StateDict {
        StateDict::from([("criterion.weight".to_string(), self.criterion.clone())])
    }

    fn load_buffer(&mut self, _name: &str, value: &TensorData) -> Result<()> {
        self.criterion = value.clone();
        Ok(())
    }
}

fn sign_points() -> Array2<f32> {
    array![[1.0, 0.0, 0.0], [2.0, 0.5, 0.0], [-1.0, 0.0, 0.5], [-2.0, 0.5, 0.5]]
}

fn sign_batch() -> Batch {
    Batch::new(sign_points(), vec![1, 1, 0, 0], vec![0, 1, 2, 3], vec![0; 4], vec![4]).unwrap()
}

fn loaders() -> (InMemoryLoader, InMemoryValidationSource) {
    let evaluation =
        EvaluationSet::new(sign_points(), vec![1, 1, 0, 0], vec![0, 1, 2, 3]).unwrap();
    let cloud = ValidationCloud {
        info: CloudInfo::new(0, "area_1", 4),
        labels: vec![1, 1, 0, 0],
        evaluation: Some(evaluation),
    };
    (
        InMemoryLoader::new(vec![sign_batch(), sign_batch()]),
        InMemoryValidationSource::new(vec![sign_batch()], vec![cloud]),
    )
}

fn spec_in(dir: &Path, max_epoch: usize) -> TrainSpec {
    let mut spec = TrainSpec::default();
    spec.training.max_epoch = max_epoch;
    spec.training.checkpoint_gap = 1;
    spec.training.saving_path = Some(dir.to_path_buf());
    spec.training.log_interval_secs = 0.0;
    spec.optimizer.learning_rate = 0.5;
    spec.optimizer.momentum = 0.0;
    spec.optimizer.weight_decay = 0.0;
    spec.lr_decay = LrDecaySpec::Disabled;
    spec.validation.smoothing = 0.0;
    spec
}

fn run(spec: TrainSpec, entry: &EntryMode) -> pointseg::train::TrainSummary {
    let mut orchestrator = TrainingOrchestrator::new(PointLinear::new(), spec, entry).unwrap();
    let (mut train, mut val) = loaders();
    orchestrator.train(&mut train, &mut val).unwrap()
}

fn metric_lines(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_fresh_run_writes_run_directory() {
    let tmp = TempDir::new().unwrap();
    let summary = run(spec_in(tmp.path(), 3), &EntryMode::Fresh);

    assert_eq!(summary.completed_epochs, 3);
    assert_eq!(summary.epochs_run, 3);
    assert_eq!(summary.stop_reason, Some(StopReason::Completed));
    assert_eq!(summary.global_step, 6);
    assert!(!summary.was_cancelled());
    assert!(summary.best_val_score > 0.0);

    let layout = CheckpointLayout::new(tmp.path());
    assert!(layout.current().exists());
    assert!(layout.best().exists());
    assert_eq!(layout.snapshots().unwrap().len(), 3);
    assert!(tmp.path().join("parameters.yaml").exists());
    assert!(tmp.path().join("training.txt").exists());
    assert!(tmp.path().join("val_IoUs.txt").exists());
    assert!(tmp.path().join("val_preds_1").join("area_1.txt").exists());
    assert!(!tmp.path().join(SENTINEL_FILE).exists());

    let record = load_record(&layout.current()).unwrap();
    assert_eq!(record.epoch, 3);
    assert_eq!(record.saving_path.as_deref(), Some(tmp.path()));
    assert!(record.model_state.contains_key("criterion.weight"));
    let state = record.training_state.unwrap();
    assert_eq!(state.best_val_score, summary.best_val_score);
}

#[test]
fn test_sign_is_learned() {
    let tmp = TempDir::new().unwrap();
    let summary = run(spec_in(tmp.path(), 5), &EntryMode::Fresh);
    let validation = summary.last_validation.unwrap();
    assert_eq!(validation.accuracy, 1.0);
    assert_eq!(validation.mean_iou, 1.0);
}

#[test]
fn test_training_log_has_one_line_per_step() {
    let tmp = TempDir::new().unwrap();
    run(spec_in(tmp.path(), 2), &EntryMode::Fresh);
    let log = fs::read_to_string(tmp.path().join("training.txt")).unwrap();
    let mut lines = log.lines();
    assert!(lines.next().unwrap().starts_with("epochs steps"));
    assert_eq!(lines.count(), 4);
}

#[test]
fn test_metrics_logged_under_prefixes() {
    let tmp = TempDir::new().unwrap();
    let metrics_path = tmp.path().join("metrics.jsonl");
    let sink = JsonLinesSink::open(&metrics_path).unwrap();
    let mut orchestrator =
        TrainingOrchestrator::new(PointLinear::new(), spec_in(tmp.path(), 2), &EntryMode::Fresh)
            .unwrap()
            .with_sink(sink);
    let (mut train, mut val) = loaders();
    orchestrator.train(&mut train, &mut val).unwrap();

    let lines = metric_lines(&metrics_path);
    assert_eq!(lines.len(), 4);
    let train_record = &lines[0]["metrics"];
    for key in ["Train/TP", "Train/FN", "Train/category-TP", "Train/F1", "Train/mIoU", "Train/accuracy"] {
        assert!(train_record.get(key).is_some(), "missing {key}");
    }
    let val_record = &lines[1]["metrics"];
    assert!(val_record.get("Validation/mIoU").is_some());
    assert!(val_record.get("Train/mIoU").is_none());
    assert_eq!(lines[1]["step"], 2);
}

#[test]
fn test_resume_continues_epoch_count() {
    let tmp = TempDir::new().unwrap();
    let first = run(spec_in(tmp.path(), 2), &EntryMode::Fresh);

    let layout = CheckpointLayout::new(tmp.path());
    let current = layout.resolve(None).unwrap();
    let mut spec = spec_in(tmp.path(), 3);
    spec.training.saving_path = None;
    let mut orchestrator =
        TrainingOrchestrator::new(PointLinear::new(), spec, &EntryMode::Resume(current)).unwrap();
    assert_eq!(orchestrator.scheduler().epoch(), 2);
    assert_eq!(orchestrator.saving_path(), Some(tmp.path()));
    assert_eq!(orchestrator.training_state().best_val_score, first.best_val_score);

    let (mut train, mut val) = loaders();
    let summary = orchestrator.train(&mut train, &mut val).unwrap();
    assert_eq!(summary.completed_epochs, 3);
    assert_eq!(summary.epochs_run, 1);
    assert_eq!(load_record(&layout.current()).unwrap().epoch, 3);
}

#[test]
fn test_finetune_restarts_at_epoch_zero() {
    let tmp = TempDir::new().unwrap();
    run(spec_in(tmp.path(), 2), &EntryMode::Fresh);
    let best = CheckpointLayout::new(tmp.path()).best();
    let record = load_record(&best).unwrap();

    let mut spec = spec_in(tmp.path(), 2);
    spec.training.saving = false;
    let orchestrator =
        TrainingOrchestrator::new(PointLinear::new(), spec, &EntryMode::Finetune(best)).unwrap();
    assert_eq!(orchestrator.scheduler().epoch(), 0);
    assert_eq!(orchestrator.training_state().best_val_score, 0.0);
    assert!(orchestrator.store().is_none());
    assert_eq!(
        orchestrator.model().parameters()[0].data.to_vec(),
        record.model_state["head.weight"].data
    );
}

/// Deletes the sentinel after the first epoch
struct DeleteSentinel(PathBuf);

impl TrainerCallback for DeleteSentinel {
    fn on_epoch_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        let _ = fs::remove_file(&self.0);
        CallbackAction::Continue
    }
}

#[test]
fn test_deleting_sentinel_cancels_run() {
    let tmp = TempDir::new().unwrap();
    let mut orchestrator =
        TrainingOrchestrator::new(PointLinear::new(), spec_in(tmp.path(), 5), &EntryMode::Fresh)
            .unwrap();
    orchestrator.add_callback(DeleteSentinel(tmp.path().join(SENTINEL_FILE)));
    let (mut train, mut val) = loaders();
    let summary = orchestrator.train(&mut train, &mut val).unwrap();

    assert!(summary.was_cancelled());
    assert_eq!(summary.completed_epochs, 1);
    assert_eq!(summary.global_step, 2);
    assert_eq!(CheckpointLayout::new(tmp.path()).snapshots().unwrap().len(), 1);
}

#[test]
fn test_sentinel_that_cannot_be_created_fails_run() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join(SENTINEL_FILE)).unwrap();
    let mut orchestrator =
        TrainingOrchestrator::new(PointLinear::new(), spec_in(tmp.path(), 3), &EntryMode::Fresh)
            .unwrap();
    let (mut train, mut val) = loaders();
    let err = orchestrator.train(&mut train, &mut val).unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert_eq!(orchestrator.scheduler().epoch(), 0);
    assert!(!CheckpointLayout::new(tmp.path()).current().exists());
}

#[test]
fn test_malformed_loader_batch_rejected() {
    let tmp = TempDir::new().unwrap();
    let batch = Batch {
        points: array![[1.0, 0.0, 0.0], [2.0, 0.5, 0.0]],
        labels: vec![1, 1],
        input_indices: vec![0, 1],
        cloud_ids: vec![0, 0],
        lengths: vec![2, 2],
    };
    let mut orchestrator =
        TrainingOrchestrator::new(PointLinear::new(), spec_in(tmp.path(), 2), &EntryMode::Fresh)
            .unwrap();
    let (_, mut val) = loaders();
    let mut train = InMemoryLoader::new(vec![batch]);
    let err = orchestrator.train(&mut train, &mut val).unwrap_err();

    assert!(matches!(err, Error::InvalidBatch(_)));
    assert!(!tmp.path().join(SENTINEL_FILE).exists());
}

#[test]
fn test_corrupt_current_falls_back_to_snapshot() {
    let tmp = TempDir::new().unwrap();
    run(spec_in(tmp.path(), 2), &EntryMode::Fresh);
    let layout = CheckpointLayout::new(tmp.path());
    fs::write(layout.current(), "{\"epoch\": 2}").unwrap();

    let err = TrainingOrchestrator::new(
        PointLinear::new(),
        spec_in(tmp.path(), 3),
        &EntryMode::Resume(layout.current()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::CorruptCheckpoint { .. }));
    assert!(err.is_recoverable());

    let fallback = layout.latest_snapshot().unwrap().unwrap();
    let orchestrator = TrainingOrchestrator::new(
        PointLinear::new(),
        spec_in(tmp.path(), 3),
        &EntryMode::Resume(fallback),
    )
    .unwrap();
    assert_eq!(orchestrator.scheduler().epoch(), 2);
}

#[test]
fn test_unsupported_task_rejected() {
    let mut spec = TrainSpec::default();
    spec.task = "slam".into();
    let err = TrainingOrchestrator::new(PointLinear::new(), spec, &EntryMode::Fresh).err().unwrap();
    assert!(matches!(err, Error::UnsupportedTask(name) if name == "slam"));
}

#[test]
fn test_model_width_must_match_labels() {
    let spec = parse_spec("labels:\n  values: [0, 1, 2]\n").unwrap();
    let err = TrainingOrchestrator::new(PointLinear::new(), spec, &EntryMode::Fresh).err().unwrap();
    assert!(matches!(err, Error::ShapeMismatch { expected: 3, actual: 2, .. }));
}

#[test]
fn test_run_without_saving_leaves_no_files() {
    let tmp = TempDir::new().unwrap();
    let mut spec = spec_in(tmp.path(), 2);
    spec.training.saving = false;
    let summary = run(spec, &EntryMode::Fresh);
    assert_eq!(summary.completed_epochs, 2);
    assert!(summary.saving_path.is_none());
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}
