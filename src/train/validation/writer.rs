//! Persistence of full-resolution validation predictions

use crate::data::CloudInfo;
use crate::error::{Error, Result};
use ndarray::ArrayView2;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the predicted labels of one validation cloud
pub trait PredictionWriter {
    /// Write `points` with their predicted and true labels under `dir`.
    ///
    /// Returns the path of the written file.
    fn write(
        &self,
        dir: &Path,
        cloud: &CloudInfo,
        points: ArrayView2<'_, f32>,
        predictions: &[i32],
        truth: &[i32],
    ) -> Result<PathBuf>;
}

/// Plain-text cloud writer, one `x y z pred class` line per point
#[derive(Clone, Copy, Debug, Default)]
pub struct AsciiCloudWriter;

impl AsciiCloudWriter {
    pub const HEADER: &'static str = "x y z pred class";

    /// File name for a cloud: its name with a `.txt` extension.
    pub fn file_name(cloud: &CloudInfo) -> String {
        let stem = Path::new(&cloud.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map_or_else(|| format!("cloud_{}", cloud.id), str::to_owned);
        format!("{stem}.txt")
    }
}

impl PredictionWriter for AsciiCloudWriter {
    fn write(
        &self,
        dir: &Path,
        cloud: &CloudInfo,
        points: ArrayView2<'_, f32>,
        predictions: &[i32],
        truth: &[i32],
    ) -> Result<PathBuf> {
        let n = points.nrows();
        if points.ncols() < 3 {
            return Err(Error::shape("prediction point coordinates", 3, points.ncols()));
        }
        if predictions.len() != n {
            return Err(Error::shape("predicted labels", n, predictions.len()));
        }
        if truth.len() != n {
            return Err(Error::shape("true labels", n, truth.len()));
        }

        fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(cloud));
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, "{}", Self::HEADER)?;
        for ((row, pred), class) in points.rows().into_iter().zip(predictions).zip(truth) {
            writeln!(out, "{} {} {} {pred} {class}", row[0], row[1], row[2])?;
        }
        out.flush()?;
        Ok(path)
    }
}
