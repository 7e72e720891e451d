//! In-memory loaders

use super::{BatchLoader, CloudInfo, EvaluationSet, ValidationSource};
use crate::error::Result;
use crate::train::Batch;

/// Loader replaying a fixed list of batches every pass
#[derive(Clone, Debug, Default)]
pub struct InMemoryLoader {
    batches: Vec<Batch>,
}

impl InMemoryLoader {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }
}

impl BatchLoader for InMemoryLoader {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        Box::new(self.batches.iter().cloned().map(Ok))
    }

    fn len(&self) -> usize {
        self.batches.len()
    }
}

/// A validation cloud held in memory
#[derive(Clone, Debug)]
pub struct ValidationCloud {
    pub info: CloudInfo,
    pub labels: Vec<i32>,
    pub evaluation: Option<EvaluationSet>,
}

/// Validation source replaying fixed batches over fixed clouds
#[derive(Clone, Debug, Default)]
pub struct InMemoryValidationSource {
    loader: InMemoryLoader,
    infos: Vec<CloudInfo>,
    clouds: Vec<ValidationCloud>,
}

impl InMemoryValidationSource {
    /// Clouds must be given in id order (`clouds[i].info.id == i`).
    pub fn new(batches: Vec<Batch>, clouds: Vec<ValidationCloud>) -> Self {
        let infos = clouds.iter().map(|c| c.info.clone()).collect();
        Self { loader: InMemoryLoader::new(batches), infos, clouds }
    }
}

impl BatchLoader for InMemoryValidationSource {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        self.loader.batches()
    }

    fn len(&self) -> usize {
        self.loader.len()
    }
}

impl ValidationSource for InMemoryValidationSource {
    fn clouds(&self) -> &[CloudInfo] {
        &self.infos
    }

    fn validation_labels(&self, cloud_id: usize) -> Option<&[i32]> {
        self.clouds.get(cloud_id).map(|c| c.labels.as_slice())
    }

    fn evaluation_set(&self, cloud_id: usize) -> Option<&EvaluationSet> {
        self.clouds.get(cloud_id).and_then(|c| c.evaluation.as_ref())
    }
}
