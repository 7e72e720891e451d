//! Check command implementation

use crate::cli::logging::log;
use crate::cli::{CheckArgs, LogLevel};
use crate::config::{load_spec, LrDecaySpec, TrainSpec};

/// Format label configuration as a string
pub fn format_label_info(spec: &TrainSpec) -> String {
    let mut lines = vec![format!("  Label values: {:?}", spec.labels.values)];
    if !spec.labels.ignored.is_empty() {
        lines.push(format!("  Ignored labels: {:?}", spec.labels.ignored));
    }
    lines.join("\n")
}

/// Format training configuration as a string
pub fn format_training_info(spec: &TrainSpec) -> String {
    let t = &spec.training;
    let mut lines = vec![
        format!("  Epochs: {}", t.max_epoch),
        format!("  Snapshot every: {} epochs", t.checkpoint_gap),
        format!("  Validate every: {} epochs", t.validate_every),
    ];
    if t.grad_clip > 0.0 {
        lines.push(format!("  Gradient clipping: {} ({:?})", t.grad_clip, t.clip_mode));
    }
    match (&t.saving_path, t.saving) {
        (_, false) => lines.push("  Saving: disabled".to_string()),
        (Some(path), true) => lines.push(format!("  Saving path: {}", path.display())),
        (None, true) => lines.push("  Saving path: generated at start".to_string()),
    }
    lines.join("\n")
}

/// Format optimizer configuration as a string
pub fn format_optimizer_info(spec: &TrainSpec) -> String {
    let o = &spec.optimizer;
    [
        format!("  Learning rate: {}", o.learning_rate),
        format!("  Momentum: {}", o.momentum),
        format!("  Weight decay: {}", o.weight_decay),
        format!("  Offset learning rate: {}", o.learning_rate * o.deform_lr_factor),
    ]
    .join("\n")
}

/// Format the learning-rate decay schedule as a string
pub fn format_decay_info(spec: &TrainSpec) -> String {
    let table = spec.decay_table();
    let detail = match &spec.lr_decay {
        LrDecaySpec::Disabled => "none".to_string(),
        LrDecaySpec::EveryEpoch(f) => format!("x{f} after every epoch"),
        LrDecaySpec::Table(map) => format!("{} scheduled epochs", map.len()),
    };
    format!(
        "  LR decay: {detail}\n  Final LR factor: {:.4}",
        table.cumulative(0, spec.training.max_epoch)
    )
}

/// Format validation configuration as a string
pub fn format_validation_info(spec: &TrainSpec) -> String {
    let v = &spec.validation;
    format!(
        "  Smoothing: {}\n  Confusion: {:?}\n  Save predictions: {}",
        v.smoothing, v.confusion, v.save_predictions
    )
}

pub fn run_check(args: CheckArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Checking config: {}", args.config.display()));

    let spec = load_spec(&args.config).map_err(|e| e.to_string())?;

    log(level, LogLevel::Normal, "✓ Configuration is valid");
    log(level, LogLevel::Normal, &format!("  Task: {}", spec.task));
    log(level, LogLevel::Normal, &format_label_info(&spec));
    log(level, LogLevel::Normal, &format_training_info(&spec));
    log(level, LogLevel::Verbose, &format_optimizer_info(&spec));
    log(level, LogLevel::Verbose, &format_decay_info(&spec));
    log(level, LogLevel::Verbose, &format_validation_info(&spec));
    Ok(())
}
