//! Checkpoint persistence
//!
//! A run keeps a rolling `current` checkpoint, periodic immutable snapshots
//! and the best-validation checkpoint. Records are JSON, written atomically,
//! and restored according to an [`EntryMode`].

mod layout;
mod record;
mod store;

pub use layout::CheckpointLayout;
pub use record::{CheckpointRecord, TrainingState, LEGACY_DEFAULTABLE_KEYS, REQUIRED_KEYS};
pub use store::{load_record, restore_weights, CheckpointStore, EntryMode};
