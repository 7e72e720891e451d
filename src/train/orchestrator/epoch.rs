//! Epoch loop

use super::core::TrainingOrchestrator;
use super::summary::TrainSummary;
use crate::config::ClipMode;
use crate::data::{BatchLoader, ValidationSource};
use crate::error::{Error, Result};
use crate::eval::{SegmentationMetrics, ValidationProbabilityAggregator, VoteAccumulator};
use crate::model::{argmax_rows, SegmentationModel};
use crate::monitor::{record_from_metrics, TRAIN_PREFIX};
use crate::optim::{clip_grad_norm, clip_grad_value, Optimizer};
use crate::train::callback::CallbackAction;
use crate::train::scheduler::{EpochBoundary, StopReason};
use crate::train::validation::{ValidationContext, ValidationReport};
use std::time::Instant;

/// Per-epoch training accumulators
struct EpochStats {
    votes: VoteAccumulator,
    loss_sum: f64,
    batches: usize,
}

impl EpochStats {
    fn mean_loss(&self) -> f32 {
        if self.batches == 0 {
            0.0
        } else {
            (self.loss_sum / self.batches as f64) as f32
        }
    }
}

/// Outcome of the work done at one epoch boundary
struct BoundaryOutcome {
    train: SegmentationMetrics,
    validation: Option<ValidationReport>,
    action: CallbackAction,
}

impl<M: SegmentationModel> TrainingOrchestrator<M> {
    /// Train until `max_epoch` epochs are completed or the run is cancelled.
    ///
    /// Each processed epoch is followed by, in order: the learning-rate
    /// decay keyed by the finished epoch, validation when due, and the
    /// checkpoint writes (rolling, snapshot when due, best on a new best
    /// validation score).
    pub fn train<L, V>(&mut self, train_loader: &mut L, val_source: &mut V) -> Result<TrainSummary>
    where
        L: BatchLoader + ?Sized,
        V: ValidationSource + ?Sized,
    {
        self.start_time = Some(Instant::now());
        self.global_step = 0;
        if self.aggregator.is_none() {
            self.aggregator = Some(ValidationProbabilityAggregator::new(
                val_source.clouds(),
                self.space.num_model_classes(),
                self.spec.validation.smoothing,
            )?);
        }
        if let Some(dir) = self.saving_path() {
            let path = self.spec.save(dir)?;
            tracing::debug!(path = %path.display(), "parameters saved");
        }
        if let Some(sentinel) = &self.sentinel {
            sentinel.arm()?;
            tracing::debug!(path = %sentinel.path().display(), "sentinel file armed");
        }

        self.scheduler.start()?;
        let start_epoch = self.scheduler.epoch();
        let ctx = self.build_context();
        let outcome = if self.callbacks.on_train_begin(&ctx) == CallbackAction::Stop {
            self.scheduler.stop(StopReason::Cancelled).map(|()| (None, None))
        } else {
            self.run_epochs(train_loader, val_source)
        };

        let ctx = self.build_context();
        self.callbacks.on_train_end(&ctx);
        self.sink.flush()?;
        let (last_train, last_validation) = outcome?;

        let summary = TrainSummary {
            completed_epochs: self.scheduler.epoch(),
            epochs_run: self.scheduler.epoch() - start_epoch,
            stop_reason: self.scheduler.stop_reason(),
            global_step: self.global_step,
            best_train_score: self.best_train.value(),
            best_val_score: self.best_val.value(),
            last_train,
            last_validation,
            saving_path: self.saving_path().map(Into::into),
            elapsed_secs: self.elapsed_secs(),
        };
        tracing::info!(
            epochs = summary.completed_epochs,
            reason = ?summary.stop_reason,
            best_val = summary.best_val_score,
            elapsed_secs = summary.elapsed_secs,
            "training finished"
        );
        Ok(summary)
    }

    fn run_epochs<L, V>(
        &mut self,
        train_loader: &mut L,
        val_source: &mut V,
    ) -> Result<(Option<SegmentationMetrics>, Option<SegmentationMetrics>)>
    where
        L: BatchLoader + ?Sized,
        V: ValidationSource + ?Sized,
    {
        let mut last_train = None;
        let mut last_validation = None;

        while self.scheduler.begin_epoch()?.is_some() {
            let ctx = self.build_context();
            if self.callbacks.on_epoch_begin(&ctx) != CallbackAction::Continue {
                self.scheduler.finish_epoch(true)?;
                break;
            }

            let stats = self.train_epoch(train_loader)?;
            let Some(boundary) = self.scheduler.finish_epoch(false)? else {
                break;
            };
            let outcome = self.end_epoch(boundary, stats, val_source)?;
            last_train = Some(outcome.train);
            if let Some(metrics) = outcome.validation.and_then(|r| r.metrics) {
                last_validation = Some(metrics);
            }
            if outcome.action == CallbackAction::Stop {
                tracing::info!(epoch = boundary.finished, "stop requested by callback");
                self.scheduler.stop(StopReason::Cancelled)?;
                break;
            }
        }
        Ok((last_train, last_validation))
    }

    fn train_epoch<L: BatchLoader + ?Sized>(&mut self, loader: &mut L) -> Result<EpochStats> {
        let steps_per_epoch = loader.len();
        let mut stats = EpochStats { votes: VoteAccumulator::new(), loss_sum: 0.0, batches: 0 };

        for batch in loader.batches() {
            let batch = batch?;
            batch.validate()?;
            self.optimizer.zero_grad(self.model.parameters_mut());
            let scores = self.model.forward(&batch)?;
            if scores.nrows() != batch.size() {
                return Err(Error::shape("training scores", batch.size(), scores.nrows()));
            }
            if scores.ncols() != self.space.num_model_classes() {
                return Err(Error::shape(
                    "training score width",
                    self.space.num_model_classes(),
                    scores.ncols(),
                ));
            }
            let loss = self.model.backward(&scores, &batch)?;
            self.clip_gradients();
            self.optimizer.step(self.model.parameters_mut());

            let preds = self.space.channels_to_labels(&argmax_rows(&scores))?;
            stats.votes.add(&batch.cloud_ids, &batch.input_indices, &batch.labels, &preds)?;
            stats.loss_sum += f64::from(loss);
            stats.batches += 1;
            self.scheduler.record_step();
            self.global_step += 1;

            let batch_metrics = SegmentationMetrics::global(&batch.labels, &preds, &self.space)?;
            let mut ctx = self.build_context();
            ctx.steps_per_epoch = steps_per_epoch;
            ctx.loss = loss;
            ctx.accuracy = batch_metrics.accuracy;
            ctx.f1 = batch_metrics.f1;
            self.callbacks.on_step_end(&ctx);
        }
        Ok(stats)
    }

    fn clip_gradients(&mut self) {
        let threshold = self.spec.training.grad_clip;
        if threshold <= 0.0 {
            return;
        }
        let params = self.model.parameters_mut();
        match self.spec.training.clip_mode {
            ClipMode::Value => {
                let clipped = clip_grad_value(params, threshold);
                if clipped > 0 {
                    tracing::trace!(clipped, "gradient values clipped");
                }
            }
            ClipMode::Norm => {
                let norm = clip_grad_norm(params, threshold);
                tracing::trace!(norm, "gradient norm before clipping");
            }
        }
    }

    fn end_epoch<V>(
        &mut self,
        boundary: EpochBoundary,
        stats: EpochStats,
        val_source: &mut V,
    ) -> Result<BoundaryOutcome>
    where
        V: ValidationSource + ?Sized,
    {
        let (truth, pred) = stats.votes.merged();
        let train = SegmentationMetrics::global(&truth, &pred, &self.space)?;
        self.sink.log(self.global_step, &record_from_metrics(TRAIN_PREFIX, &train))?;
        if self.best_train.update(train.mean_iou) {
            tracing::debug!(mean_iou = train.mean_iou, "new best training mIoU");
        }
        tracing::info!(
            epoch = boundary.finished,
            loss = stats.mean_loss(),
            points = stats.votes.len(),
            "training mIoU = {:.1}%",
            train.mean_iou * 100.0
        );

        if let Some(factor) = boundary.decay {
            self.optimizer.scale_learning_rate(factor);
            tracing::debug!(factor, lr = self.optimizer.lr(), "learning rate decayed");
        }

        let validation = if boundary.validate {
            self.scheduler.begin_validation()?;
            let report = self.validate(val_source, &boundary);
            self.scheduler.end_validation()?;
            Some(report?)
        } else {
            None
        };
        let new_best = validation.as_ref().is_some_and(|r| r.is_new_best);

        if self.store.is_some() {
            self.scheduler.begin_checkpoint()?;
            let written = self.write_checkpoints(&boundary, new_best);
            self.scheduler.end_checkpoint()?;
            written?;
        }

        let mut ctx = self.build_context();
        ctx.epoch = boundary.finished;
        ctx.loss = stats.mean_loss();
        ctx.accuracy = train.accuracy;
        ctx.f1 = train.f1;
        ctx.val_score = validation.as_ref().and_then(ValidationReport::mean_iou);
        if ctx.val_score.is_some() {
            self.callbacks.on_validation(&ctx);
        }
        let action = self.callbacks.on_epoch_end(&ctx);

        Ok(BoundaryOutcome { train, validation, action })
    }

    fn validate<V>(&mut self, source: &mut V, boundary: &EpochBoundary) -> Result<ValidationReport>
    where
        V: ValidationSource + ?Sized,
    {
        let Some(aggregator) = self.aggregator.as_mut() else {
            return Ok(ValidationReport::skipped(self.best_val.value()));
        };
        let training = &self.spec.training;
        let saving_path = training.saving_path.as_deref().filter(|_| training.saving);
        let mut ctx = ValidationContext {
            aggregator,
            space: &self.space,
            sink: &mut *self.sink,
            best: &mut self.best_val,
            mode: self.spec.validation.confusion,
            completed: boundary.completed,
            global_step: self.global_step,
            snapshot: boundary.snapshot,
            saving_path,
            writer: self.writer.as_deref(),
        };
        self.strategy.run(&mut self.model, source, &mut ctx)
    }

    fn write_checkpoints(&self, boundary: &EpochBoundary, new_best: bool) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let record = self.checkpoint_record();
        store.save_current(&record)?;
        if boundary.snapshot {
            let path = store.save_snapshot(&record)?;
            tracing::info!(path = %path.display(), "snapshot saved");
        }
        if new_best {
            let path = store.save_best(&record)?;
            tracing::info!(path = %path.display(), score = self.best_val.value(), "best checkpoint saved");
        }
        Ok(())
    }
}
