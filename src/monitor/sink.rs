//! Metrics sink trait and implementations

use super::MetricRecord;
use crate::error::Result;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Destination of logged metric records
pub trait MetricsSink {
    /// Log `record` at a global `step`.
    fn log(&mut self, step: usize, record: &MetricRecord) -> Result<()>;

    /// Flush pending writes
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn log(&mut self, step: usize, record: &MetricRecord) -> Result<()> {
        (**self).log(step, record)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Emits every record as a structured `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn log(&mut self, step: usize, record: &MetricRecord) -> Result<()> {
        let fields: Vec<String> = record.iter().map(|(k, v)| format!("{k}={v:.4}")).collect();
        tracing::info!(step, metrics = %fields.join(" "), "metrics");
        Ok(())
    }
}

/// Keeps every record in memory
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    records: Vec<(usize, MetricRecord)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[(usize, MetricRecord)] {
        &self.records
    }

    /// Every logged value of `key`, with its step.
    pub fn values(&self, key: &str) -> Vec<(usize, f64)> {
        self.records.iter().filter_map(|(s, r)| r.get(key).map(|v| (*s, v))).collect()
    }

    /// Last logged value of `key`
    pub fn last(&self, key: &str) -> Option<f64> {
        self.values(key).last().map(|&(_, v)| v)
    }
}

impl MetricsSink for InMemorySink {
    fn log(&mut self, step: usize, record: &MetricRecord) -> Result<()> {
        self.records.push((step, record.clone()));
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    step: usize,
    metrics: &'a MetricRecord,
}

/// Appends one JSON object per record to a file
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: BufWriter::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricsSink for JsonLinesSink {
    fn log(&mut self, step: usize, record: &MetricRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &JsonLine { step, metrics: record })?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonLinesSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Forwards every record to several sinks
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn MetricsSink>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl MetricsSink for FanOutSink {
    fn log(&mut self, step: usize, record: &MetricRecord) -> Result<()> {
        for sink in &mut self.sinks {
            sink.log(step, record)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}
