//! Callback system for training events
//!
//! Provides extensible hooks for training loop events:
//! - `on_train_begin` / `on_train_end`
//! - `on_epoch_begin` / `on_epoch_end`
//! - `on_step_end` / `on_validation`
//!
//! Epoch-begin hooks can skip an epoch; that is how cooperative
//! cancellation reaches the scheduler.
//!
//! # Example
//!
//! ```rust
//! use pointseg::train::callback::{CallbackAction, CallbackContext, TrainerCallback};
//!
//! struct StopAfter(usize);
//!
//! impl TrainerCallback for StopAfter {
//!     fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
//!         if ctx.epoch + 1 >= self.0 {
//!             CallbackAction::Stop
//!         } else {
//!             CallbackAction::Continue
//!         }
//!     }
//! }
//! ```

mod manager;
mod progress;
mod sentinel;
mod training_log;
mod traits;

pub use manager::CallbackManager;
pub use progress::ProgressCallback;
pub use sentinel::{CancellationSignal, SentinelFile, SENTINEL_FILE};
pub use training_log::{TrainingLogCallback, TRAINING_LOG_FILE};
pub use traits::{CallbackAction, CallbackContext, TrainerCallback};
