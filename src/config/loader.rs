//! YAML loading entry point

use crate::config::schema::TrainSpec;
use crate::config::validate::validate_spec;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Load, parse and validate a training specification.
///
/// The task name is checked before numeric validation so an unsupported
/// task surfaces as [`Error::UnsupportedTask`] rather than a config error.
///
/// # Example
///
/// ```no_run
/// use pointseg::config::load_spec;
///
/// let spec = load_spec("train.yaml")?;
/// println!("{} epochs", spec.training.max_epoch);
/// # Ok::<(), pointseg::Error>(())
/// ```
pub fn load_spec<P: AsRef<Path>>(config_path: P) -> Result<TrainSpec> {
    let path = config_path.as_ref();
    let yaml_content = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    let spec = parse_spec(&yaml_content)?;
    tracing::debug!(path = %path.display(), task = %spec.task, "configuration loaded");
    Ok(spec)
}

/// Parse and validate a training specification from YAML text.
pub fn parse_spec(yaml: &str) -> Result<TrainSpec> {
    let spec: TrainSpec = serde_yaml::from_str(yaml)
        .map_err(|e| Error::Config(format!("Failed to parse YAML config: {e}")))?;

    spec.task_kind()?;
    validate_spec(&spec).map_err(|e| Error::Config(format!("Invalid config: {e}")))?;

    Ok(spec)
}
