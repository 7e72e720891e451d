//! Epoch lifecycle state machine
//!
//! ```text
//! Idle -> Running -> { Validating | Checkpointing } -> Running -> ... -> Stopped
//! ```
//!
//! The scheduler owns the epoch counter and decides, at each epoch
//! boundary, which learning-rate decay applies, whether a snapshot is due
//! and whether validation runs. Driving it through any other transition is
//! a programming error reported as [`Error::InvalidTransition`].

use crate::error::{Error, Result};
use crate::optim::LrDecayTable;
use std::fmt;

/// Lifecycle state of a training run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Validating,
    Checkpointing,
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Validating => "Validating",
            Self::Checkpointing => "Checkpointing",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Why a run reached [`SchedulerState::Stopped`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// All `max_epoch` epochs were processed
    Completed,
    /// A cancellation request was observed at an epoch boundary
    Cancelled,
}

/// What happens after a processed epoch
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochBoundary {
    /// Index of the epoch that just finished
    pub finished: usize,
    /// Completed epochs after this one
    pub completed: usize,
    /// Learning-rate factor keyed by the finished epoch
    pub decay: Option<f32>,
    /// Whether an immutable snapshot is due
    pub snapshot: bool,
    /// Whether validation runs this epoch
    pub validate: bool,
}

/// Epoch counter plus lifecycle state
#[derive(Clone, Debug)]
pub struct EpochScheduler {
    state: SchedulerState,
    epoch: usize,
    step: usize,
    max_epoch: usize,
    checkpoint_gap: usize,
    validate_every: usize,
    decay: LrDecayTable,
    stop_reason: Option<StopReason>,
}

impl EpochScheduler {
    /// Scheduler running epochs `start_epoch..max_epoch`.
    pub fn new(start_epoch: usize, max_epoch: usize, decay: LrDecayTable) -> Self {
        Self {
            state: SchedulerState::Idle,
            epoch: start_epoch,
            step: 0,
            max_epoch,
            checkpoint_gap: 1,
            validate_every: 1,
            decay,
            stop_reason: None,
        }
    }

    /// Snapshot every `gap` completed epochs (0 disables snapshots).
    pub fn with_checkpoint_gap(mut self, gap: usize) -> Self {
        self.checkpoint_gap = gap;
        self
    }

    /// Validate every `every` completed epochs (0 disables validation).
    pub fn with_validate_every(mut self, every: usize) -> Self {
        self.validate_every = every;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Completed epochs, which is also the index of the next epoch to run.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Batches processed in the current epoch
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn max_epoch(&self) -> usize {
        self.max_epoch
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SchedulerState::Stopped
    }

    fn transition(&mut self, from: SchedulerState, to: SchedulerState) -> Result<()> {
        if self.state != from {
            return Err(Error::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        tracing::trace!(%from, %to, epoch = self.epoch, "scheduler transition");
        self.state = to;
        Ok(())
    }

    /// `Idle -> Running`
    pub fn start(&mut self) -> Result<()> {
        self.transition(SchedulerState::Idle, SchedulerState::Running)
    }

    /// Begin the next epoch and return its index.
    ///
    /// Returns `None` and stops once `max_epoch` epochs are done.
    pub fn begin_epoch(&mut self) -> Result<Option<usize>> {
        if self.state != SchedulerState::Running {
            return Err(Error::InvalidTransition {
                from: self.state.to_string(),
                to: SchedulerState::Running.to_string(),
            });
        }
        if self.epoch >= self.max_epoch {
            self.stop(StopReason::Completed)?;
            return Ok(None);
        }
        self.step = 0;
        Ok(Some(self.epoch))
    }

    /// Count one processed batch.
    pub fn record_step(&mut self) {
        self.step += 1;
    }

    /// Close the current epoch.
    ///
    /// With `cancelled` set the run stops without advancing the epoch.
    /// Otherwise the decay keyed by the finished epoch is looked up and the
    /// epoch counter advances.
    pub fn finish_epoch(&mut self, cancelled: bool) -> Result<Option<EpochBoundary>> {
        if self.state != SchedulerState::Running {
            return Err(Error::InvalidTransition {
                from: self.state.to_string(),
                to: SchedulerState::Running.to_string(),
            });
        }
        if cancelled {
            tracing::info!(epoch = self.epoch, "training stopped by cancellation request");
            self.stop(StopReason::Cancelled)?;
            return Ok(None);
        }

        let finished = self.epoch;
        let decay = self.decay.factor_for(finished);
        self.epoch += 1;
        let completed = self.epoch;
        Ok(Some(EpochBoundary {
            finished,
            completed,
            decay,
            snapshot: self.checkpoint_gap > 0 && completed % self.checkpoint_gap == 0,
            validate: self.validate_every > 0 && completed % self.validate_every == 0,
        }))
    }

    /// `Running -> Validating`
    pub fn begin_validation(&mut self) -> Result<()> {
        self.transition(SchedulerState::Running, SchedulerState::Validating)
    }

    /// `Validating -> Running`
    pub fn end_validation(&mut self) -> Result<()> {
        self.transition(SchedulerState::Validating, SchedulerState::Running)
    }

    /// `Running -> Checkpointing`
    pub fn begin_checkpoint(&mut self) -> Result<()> {
        self.transition(SchedulerState::Running, SchedulerState::Checkpointing)
    }

    /// `Checkpointing -> Running`
    pub fn end_checkpoint(&mut self) -> Result<()> {
        self.transition(SchedulerState::Checkpointing, SchedulerState::Running)
    }

    /// Move to `Stopped` from any live state.
    pub fn stop(&mut self, reason: StopReason) -> Result<()> {
        if matches!(self.state, SchedulerState::Stopped | SchedulerState::Idle) {
            return Err(Error::InvalidTransition {
                from: self.state.to_string(),
                to: SchedulerState::Stopped.to_string(),
            });
        }
        self.state = SchedulerState::Stopped;
        self.stop_reason = Some(reason);
        Ok(())
    }
}
