//! Checkpoint file naming inside a run directory

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CURRENT: &str = "current_chkp.json";
const BEST: &str = "best_val_chkp.json";
const SNAPSHOT_PREFIX: &str = "chkp_";

/// Paths of the checkpoint files of one run
///
/// ```text
/// <saving_path>/checkpoints/
///     current_chkp.json     overwritten every epoch
///     chkp_0010.json        immutable snapshot every checkpoint_gap epochs
///     best_val_chkp.json    overwritten on each new best validation score
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointLayout {
    dir: PathBuf,
}

impl CheckpointLayout {
    /// Layout under `<saving_path>/checkpoints`.
    pub fn new(saving_path: impl AsRef<Path>) -> Self {
        Self { dir: saving_path.as_ref().join("checkpoints") }
    }

    /// Layout rooted directly at `dir`.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn current(&self) -> PathBuf {
        self.dir.join(CURRENT)
    }

    pub fn best(&self) -> PathBuf {
        self.dir.join(BEST)
    }

    /// Snapshot written after `completed` epochs.
    pub fn snapshot(&self, completed: usize) -> PathBuf {
        self.dir.join(format!("{SNAPSHOT_PREFIX}{completed:04}.json"))
    }

    /// Snapshot files in sorted (oldest first) order.
    pub fn snapshots(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut found: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_snapshot(p))
            .collect();
        found.sort();
        Ok(found)
    }

    /// Newest snapshot, if any.
    pub fn latest_snapshot(&self) -> Result<Option<PathBuf>> {
        Ok(self.snapshots()?.pop())
    }

    /// Pick the checkpoint to start from.
    ///
    /// `None` selects the rolling current checkpoint, `Some(i)` the i-th
    /// snapshot in sorted order. A missing choice falls back to the newest
    /// snapshot.
    pub fn resolve(&self, index: Option<usize>) -> Result<PathBuf> {
        let snapshots = self.snapshots()?;
        let chosen = match index {
            None => Some(self.current()),
            Some(i) => snapshots.get(i).cloned(),
        };
        if let Some(path) = chosen.filter(|p| p.exists()) {
            return Ok(path);
        }
        match snapshots.last() {
            Some(newest) => {
                tracing::warn!(
                    requested = ?index,
                    fallback = %newest.display(),
                    "requested checkpoint missing, using newest snapshot"
                );
                Ok(newest.clone())
            }
            None => Err(Error::corrupt(&self.dir, "no checkpoint found")),
        }
    }
}

fn is_snapshot(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(SNAPSHOT_PREFIX) && n.ends_with(".json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_names() {
        let layout = CheckpointLayout::new("results/run");
        assert_eq!(layout.current(), Path::new("results/run/checkpoints/current_chkp.json"));
        assert_eq!(layout.snapshot(10), Path::new("results/run/checkpoints/chkp_0010.json"));
        assert_eq!(layout.best(), Path::new("results/run/checkpoints/best_val_chkp.json"));
    }

    #[test]
    fn test_snapshots_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let layout = CheckpointLayout::new(tmp.path());
        for e in [20, 10, 30] {
            touch(&layout.snapshot(e));
        }
        touch(&layout.current());
        touch(&layout.best());

        let snaps = layout.snapshots().unwrap();
        assert_eq!(snaps, vec![layout.snapshot(10), layout.snapshot(20), layout.snapshot(30)]);
        assert_eq!(layout.latest_snapshot().unwrap(), Some(layout.snapshot(30)));
    }

    #[test]
    fn test_missing_dir_has_no_snapshots() {
        let tmp = TempDir::new().unwrap();
        let layout = CheckpointLayout::new(tmp.path().join("nothing"));
        assert!(layout.snapshots().unwrap().is_empty());
        assert!(layout.resolve(None).is_err());
    }

    #[test]
    fn test_resolve_prefers_current_then_falls_back() {
        let tmp = TempDir::new().unwrap();
        let layout = CheckpointLayout::new(tmp.path());
        touch(&layout.snapshot(10));
        touch(&layout.snapshot(20));

        assert_eq!(layout.resolve(None).unwrap(), layout.snapshot(20));
        assert_eq!(layout.resolve(Some(0)).unwrap(), layout.snapshot(10));
        assert_eq!(layout.resolve(Some(7)).unwrap(), layout.snapshot(20));

        touch(&layout.current());
        assert_eq!(layout.resolve(None).unwrap(), layout.current());
    }
}
