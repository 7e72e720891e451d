//! Validation of whole-scene segmentation
//!
//! Sub-cloud probabilities are folded into the per-cloud aggregator while
//! stacked sub-cloud predictions are scored directly. The smoothed buffers
//! are only read back when predicted clouds are written.

use super::{ValidationContext, ValidationReport};
use crate::data::ValidationSource;
use crate::error::{Error, Result};
use crate::eval::{SegmentationMetrics, ValidationProbabilityAggregator};
use crate::labels::ClassLabelSpace;
use crate::model::{argmax_rows, softmax, ModelMode, SegmentationModel};
use crate::monitor::{record_from_metrics, VALIDATION_PREFIX};
use ndarray::Axis;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-class IoU history, one line per validation
pub const IOU_LOG_FILE: &str = "val_IoUs.txt";

/// Prefix of the per-epoch predicted cloud directories
pub const PREDICTION_DIR_PREFIX: &str = "val_preds_";

type LabelPairs = Vec<(Vec<i32>, Vec<i32>)>;

pub(super) fn validate<M, V>(
    model: &mut M,
    source: &mut V,
    ctx: &mut ValidationContext<'_>,
) -> Result<ValidationReport>
where
    M: SegmentationModel + ?Sized,
    V: ValidationSource + ?Sized,
{
    if source.clouds().is_empty() {
        tracing::info!("no validation clouds, skipping validation");
        return Ok(ValidationReport::skipped(ctx.best.value()));
    }

    model.set_mode(ModelMode::Eval);
    let parts = collect_predictions(model, source, ctx.aggregator, ctx.space);
    model.set_mode(ModelMode::Train);
    let parts = parts?;

    let proportions = ctx
        .space
        .proportions(source.clouds().iter().filter_map(|c| source.validation_labels(c.id)));
    let metrics = SegmentationMetrics::evaluate(ctx.mode, &parts, ctx.space, &proportions)?;
    let is_new_best = ctx.best.update(metrics.mean_iou);

    tracing::info!(
        epoch = ctx.completed,
        new_best = is_new_best,
        "validation mean IoU = {:.1}%, F1 = {:.1}%",
        metrics.mean_iou * 100.0,
        metrics.f1 * 100.0
    );
    ctx.sink.log(ctx.global_step, &record_from_metrics(VALIDATION_PREFIX, &metrics))?;

    let mut prediction_files = Vec::new();
    if let Some(dir) = ctx.saving_path {
        append_ious(dir, &metrics.ious)?;
        if let Some(writer) = ctx.writer.filter(|_| ctx.snapshot || is_new_best) {
            let out_dir = dir.join(format!("{PREDICTION_DIR_PREFIX}{}", ctx.completed));
            for cloud in source.clouds() {
                let Some(eval) = source.evaluation_set(cloud.id) else {
                    tracing::debug!(cloud = %cloud.name, "no evaluation points, not written");
                    continue;
                };
                let preds = ctx.aggregator.reproject(cloud.id, &eval.projection, ctx.space)?;
                prediction_files.push(writer.write(
                    &out_dir,
                    cloud,
                    eval.points.view(),
                    &preds,
                    &eval.labels,
                )?);
            }
            tracing::debug!(dir = %out_dir.display(), files = prediction_files.len(), "predicted clouds written");
        }
    }

    Ok(ValidationReport {
        metrics: Some(metrics),
        is_new_best,
        best_score: ctx.best.value(),
        prediction_files,
    })
}

fn collect_predictions<M, V>(
    model: &mut M,
    source: &mut V,
    aggregator: &mut ValidationProbabilityAggregator,
    space: &ClassLabelSpace,
) -> Result<LabelPairs>
where
    M: SegmentationModel + ?Sized,
    V: ValidationSource + ?Sized,
{
    let mut parts = Vec::new();
    for batch in source.batches() {
        let batch = batch?;
        batch.validate()?;
        let scores = model.forward(&batch)?;
        if scores.nrows() != batch.size() {
            return Err(Error::shape("validation scores", batch.size(), scores.nrows()));
        }
        let probs = softmax(&scores);
        // One blend per cloud and batch, even when sub-clouds overlap.
        for (cloud_id, rows) in batch.rows_by_cloud() {
            let indices: Vec<usize> = rows.iter().map(|&r| batch.input_indices[r]).collect();
            aggregator.update(cloud_id, &indices, probs.select(Axis(0), &rows).view())?;
        }
        for sub in batch.subclouds() {
            let rows = batch.slice_rows(&probs, &sub);
            let preds = space.channels_to_labels(&argmax_rows(&rows.to_owned()))?;
            parts.push((batch.labels[sub.range].to_vec(), preds));
        }
    }
    Ok(parts)
}

fn append_ious(dir: &Path, ious: &[f64]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(IOU_LOG_FILE);
    let line: Vec<String> = ious.iter().map(|v| format!("{v:.3}")).collect();
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", line.join(" "))?;
    Ok(path)
}
