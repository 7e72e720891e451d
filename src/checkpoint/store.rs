//! Atomic checkpoint persistence and restoration

use super::{CheckpointLayout, CheckpointRecord, LEGACY_DEFAULTABLE_KEYS, REQUIRED_KEYS};
use crate::error::{Error, Result};
use crate::model::{ModelMode, SegmentationModel};
use crate::optim::ParameterGroupOptimizer;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// How a run starts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntryMode {
    /// Fresh weights from the model, epoch 0
    #[default]
    Fresh,
    /// Weights, optimizer state and epoch from a checkpoint
    Resume(PathBuf),
    /// Weights only; epoch 0 and a fresh optimizer
    Finetune(PathBuf),
}

impl EntryMode {
    /// Checkpoint path, if the mode reads one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Fresh => None,
            Self::Resume(p) | Self::Finetune(p) => Some(p),
        }
    }
}

/// Reads and writes [`CheckpointRecord`]s for one run
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    layout: CheckpointLayout,
}

impl CheckpointStore {
    pub fn new(layout: CheckpointLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &CheckpointLayout {
        &self.layout
    }

    /// Write `record` to `path` via a temporary file and a rename.
    pub fn save(&self, record: &CheckpointRecord, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer(&mut writer, record)?;
        writer.flush()?;
        drop(writer);
        fs::rename(&temp_path, path)?;
        tracing::debug!(path = %path.display(), epoch = record.epoch, "checkpoint written");
        Ok(())
    }

    /// Read a record, checking for the required keys first.
    pub fn load(&self, path: &Path) -> Result<CheckpointRecord> {
        load_record(path)
    }

    /// Rolling checkpoint, overwritten every epoch.
    pub fn save_current(&self, record: &CheckpointRecord) -> Result<PathBuf> {
        let path = self.layout.current();
        self.save(record, &path)?;
        Ok(path)
    }

    /// Immutable snapshot after `record.epoch` completed epochs.
    pub fn save_snapshot(&self, record: &CheckpointRecord) -> Result<PathBuf> {
        let path = self.layout.snapshot(record.epoch);
        self.save(record, &path)?;
        Ok(path)
    }

    pub fn save_best(&self, record: &CheckpointRecord) -> Result<PathBuf> {
        let path = self.layout.best();
        self.save(record, &path)?;
        Ok(path)
    }

    /// Apply an entry mode to a live model and optimizer.
    ///
    /// Returns the loaded record, or `None` for a fresh start. The model is
    /// left in training mode.
    pub fn enter<M>(
        mode: &EntryMode,
        model: &mut M,
        optimizer: &mut ParameterGroupOptimizer,
    ) -> Result<Option<CheckpointRecord>>
    where
        M: SegmentationModel + ?Sized,
    {
        let record = match mode {
            EntryMode::Fresh => None,
            EntryMode::Finetune(path) => {
                let record = load_record(path)?;
                restore_weights(model, &record, path)?;
                tracing::info!(path = %path.display(), "model restored and ready for finetuning");
                Some(record)
            }
            EntryMode::Resume(path) => {
                let record = load_record(path)?;
                restore_weights(model, &record, path)?;
                optimizer.load_state(record.optimizer_state.clone(), path)?;
                tracing::info!(
                    path = %path.display(),
                    epoch = record.epoch,
                    "model and training state restored"
                );
                Some(record)
            }
        };
        model.set_mode(ModelMode::Train);
        Ok(record)
    }
}

/// Parse a checkpoint file.
///
/// The file is read as a JSON object and checked for `epoch`, `model_state`
/// and `optimizer_state` before decoding, so a truncated or foreign record
/// reports the missing key instead of a decoder position.
pub fn load_record(path: &Path) -> Result<CheckpointRecord> {
    let content = fs::read_to_string(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| Error::corrupt(path, e.to_string()))?;
    let object = value.as_object().ok_or_else(|| Error::corrupt(path, "record is not an object"))?;
    if let Some(missing) = REQUIRED_KEYS.iter().find(|k| !object.contains_key(**k)) {
        return Err(Error::corrupt(path, format!("missing key '{missing}'")));
    }
    serde_json::from_value(value).map_err(|e| Error::corrupt(path, e.to_string()))
}

/// Load the stored weights of `record` into `model`.
///
/// Keys listed in [`LEGACY_DEFAULTABLE_KEYS`] that the record lacks keep the
/// model's current value. Any other missing weight is a corrupt checkpoint.
pub fn restore_weights<M>(model: &mut M, record: &CheckpointRecord, path: &Path) -> Result<()>
where
    M: SegmentationModel + ?Sized,
{
    let mut state = record.model_state.clone();
    for (name, live) in model.state_dict() {
        if state.contains_key(&name) {
            continue;
        }
        if LEGACY_DEFAULTABLE_KEYS.contains(&name.as_str()) {
            tracing::warn!(key = %name, "checkpoint lacks legacy key, keeping live value");
            state.insert(name, live);
        } else {
            return Err(Error::corrupt(path, format!("missing weight '{name}'")));
        }
    }
    model.load_state_dict(&state).map_err(|e| match e {
        Error::Model(reason) => Error::corrupt(path, reason),
        other => other,
    })
}
