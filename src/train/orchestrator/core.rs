//! Orchestrator state and construction

use crate::checkpoint::{
    CheckpointLayout, CheckpointRecord, CheckpointStore, EntryMode, TrainingState,
};
use crate::config::{validate_spec, TrainSpec};
use crate::error::{Error, Result};
use crate::eval::{BestScore, ValidationProbabilityAggregator};
use crate::labels::ClassLabelSpace;
use crate::model::SegmentationModel;
use crate::monitor::{MetricsSink, TracingSink};
use crate::optim::{Optimizer, ParameterGroupOptimizer};
use crate::train::callback::{
    CallbackContext, CallbackManager, ProgressCallback, SentinelFile, TrainerCallback,
    TrainingLogCallback,
};
use crate::train::scheduler::EpochScheduler;
use crate::train::validation::{AsciiCloudWriter, PredictionWriter, ValidationStrategy};
use std::path::Path;
use std::time::Instant;

/// Drives the epoch loop of a segmentation model
///
/// Owns the model, its optimizer, the epoch scheduler, the validation
/// aggregator and the checkpoint store for the duration of a run.
///
/// # Example
///
/// ```no_run
/// use pointseg::checkpoint::EntryMode;
/// use pointseg::config::load_spec;
/// use pointseg::data::{InMemoryLoader, InMemoryValidationSource};
/// use pointseg::model::SegmentationModel;
/// use pointseg::train::TrainingOrchestrator;
///
/// # fn build_model() -> Box<dyn SegmentationModel> { todo!() }
/// let spec = load_spec("train.yaml")?;
/// let mut orchestrator = TrainingOrchestrator::new(build_model(), spec, &EntryMode::Fresh)?;
///
/// let mut train = InMemoryLoader::new(Vec::new());
/// let mut val = InMemoryValidationSource::new(Vec::new(), Vec::new());
/// let summary = orchestrator.train(&mut train, &mut val)?;
/// println!("best validation mIoU {:.3}", summary.best_val_score);
/// # Ok::<(), pointseg::Error>(())
/// ```
pub struct TrainingOrchestrator<M: SegmentationModel> {
    pub(crate) model: M,
    pub(crate) optimizer: ParameterGroupOptimizer,
    pub(crate) scheduler: EpochScheduler,
    pub(crate) aggregator: Option<ValidationProbabilityAggregator>,
    pub(crate) sink: Box<dyn MetricsSink>,
    pub(crate) store: Option<CheckpointStore>,
    pub(crate) strategy: ValidationStrategy,
    pub(crate) callbacks: CallbackManager,
    /// Armed before the first epoch when the run saves
    pub(crate) sentinel: Option<SentinelFile>,
    pub(crate) writer: Option<Box<dyn PredictionWriter>>,
    pub(crate) space: ClassLabelSpace,
    pub(crate) spec: TrainSpec,
    pub(crate) best_train: BestScore,
    pub(crate) best_val: BestScore,
    pub(crate) global_step: usize,
    pub(crate) start_time: Option<Instant>,
}

impl<M: SegmentationModel> TrainingOrchestrator<M> {
    /// Build an orchestrator and apply `entry` to the model and optimizer.
    ///
    /// Resuming continues from the stored epoch, optimizer state and best
    /// scores, writing into the stored saving path unless the configuration names
    /// one. Finetuning only keeps the weights.
    pub fn new(mut model: M, mut spec: TrainSpec, entry: &EntryMode) -> Result<Self> {
        let strategy = ValidationStrategy::from_task(spec.task_kind()?);
        validate_spec(&spec).map_err(|e| Error::Config(format!("Invalid config: {e}")))?;
        let space = spec.labels.to_space()?;
        if model.num_classes() != space.num_model_classes() {
            return Err(Error::shape("model classes", space.num_model_classes(), model.num_classes()));
        }

        let mut optimizer = ParameterGroupOptimizer::new(model.parameters(), &spec.optimizer);
        let record = CheckpointStore::enter(entry, &mut model, &mut optimizer)?;

        let mut state = TrainingState::default();
        if let (EntryMode::Resume(_), Some(record)) = (entry, &record) {
            state = record.training_state.unwrap_or_default();
            state.epoch = record.epoch;
            if spec.training.saving_path.is_none() {
                spec.training.saving_path = record.saving_path.clone();
            }
        }

        let store = spec.training.resolve_saving_path().map(|dir| {
            tracing::info!(path = %dir.display(), "saving run to directory");
            CheckpointStore::new(CheckpointLayout::new(dir))
        });

        let scheduler = EpochScheduler::new(state.epoch, spec.training.max_epoch, spec.decay_table())
            .with_checkpoint_gap(spec.training.checkpoint_gap)
            .with_validate_every(spec.training.validate_every);

        let mut callbacks = CallbackManager::new();
        callbacks.add(ProgressCallback::new(spec.training.log_interval_secs));
        let mut sentinel = None;
        if let Some(dir) = spec.training.saving_path.as_deref().filter(|_| spec.training.saving) {
            callbacks.add(TrainingLogCallback::in_dir(dir));
            let file = SentinelFile::in_dir(dir);
            callbacks.add(file.clone());
            sentinel = Some(file);
        }

        let writer: Option<Box<dyn PredictionWriter>> =
            spec.validation.save_predictions.then(|| Box::new(AsciiCloudWriter) as _);

        tracing::info!(
            task = %spec.task,
            start_epoch = state.epoch,
            max_epoch = spec.training.max_epoch,
            classes = space.num_model_classes(),
            "training orchestrator ready"
        );

        Ok(Self {
            model,
            optimizer,
            scheduler,
            aggregator: None,
            sink: Box::new(TracingSink),
            store,
            strategy,
            callbacks,
            sentinel,
            writer,
            space,
            spec,
            best_train: BestScore::new(state.best_train_score),
            best_val: BestScore::new(state.best_val_score),
            global_step: 0,
            start_time: None,
        })
    }

    /// Replace the metrics sink (defaults to [`TracingSink`]).
    pub fn with_sink(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Replace the predicted cloud writer.
    pub fn with_prediction_writer(mut self, writer: impl PredictionWriter + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// Register an additional callback, run after the built-in ones.
    pub fn add_callback<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn optimizer(&self) -> &ParameterGroupOptimizer {
        &self.optimizer
    }

    pub fn scheduler(&self) -> &EpochScheduler {
        &self.scheduler
    }

    pub fn aggregator(&self) -> Option<&ValidationProbabilityAggregator> {
        self.aggregator.as_ref()
    }

    pub fn store(&self) -> Option<&CheckpointStore> {
        self.store.as_ref()
    }

    pub fn spec(&self) -> &TrainSpec {
        &self.spec
    }

    pub fn label_space(&self) -> &ClassLabelSpace {
        &self.space
    }

    /// Run directory when saving is enabled.
    pub fn saving_path(&self) -> Option<&Path> {
        self.spec.training.saving_path.as_deref().filter(|_| self.spec.training.saving)
    }

    /// Current progress counters.
    pub fn training_state(&self) -> TrainingState {
        TrainingState {
            epoch: self.scheduler.epoch(),
            step: self.scheduler.step(),
            best_train_score: self.best_train.value(),
            best_val_score: self.best_val.value(),
        }
    }

    /// Record of the live model and optimizer.
    pub fn checkpoint_record(&self) -> CheckpointRecord {
        let record = CheckpointRecord::new(
            self.scheduler.epoch(),
            self.model.state_dict(),
            self.optimizer.state(),
        )
        .with_training_state(self.training_state());
        match self.saving_path() {
            Some(dir) => record.with_saving_path(dir),
            None => record,
        }
    }

    pub(crate) fn elapsed_secs(&self) -> f64 {
        self.start_time.map_or(0.0, |t| t.elapsed().as_secs_f64())
    }

    /// Callback context from the current state
    pub(crate) fn build_context(&self) -> CallbackContext {
        CallbackContext {
            epoch: self.scheduler.epoch(),
            max_epochs: self.scheduler.max_epoch(),
            step: self.scheduler.step(),
            global_step: self.global_step,
            lr: self.optimizer.lr(),
            best_val_score: self.best_val.value(),
            elapsed_secs: self.elapsed_secs(),
            ..CallbackContext::default()
        }
    }
}
