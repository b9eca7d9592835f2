//! Model registry.
//!
//! Loads the four frozen artifacts from the model directory by their
//! well-known file names. A missing or unreadable artifact is skipped and
//! logged, never fatal: downstream callers treat the absent entry as
//! "model unavailable" and degrade that one prediction.

use std::path::Path;

use ahash::AHashMap;
use mane_core::ModelKind;
use tracing::{info, warn};

use crate::artifact::{CategoryLookup, ModelArtifact, OnnxClassifier};

/// The loaded artifacts, keyed by model kind. Built once at startup,
/// immutable and shared read-only afterwards.
#[derive(Debug, Default)]
pub struct ModelSet {
    models: AHashMap<ModelKind, ModelArtifact>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ModelKind, artifact: ModelArtifact) {
        self.models.insert(kind, artifact);
    }

    /// `None` means the model is unavailable for this process.
    pub fn get(&self, kind: ModelKind) -> Option<&ModelArtifact> {
        self.models.get(&kind)
    }

    pub fn contains(&self, kind: ModelKind) -> bool {
        self.models.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

pub struct ModelRegistry;

impl ModelRegistry {
    /// Load every known artifact from the model directory.
    pub fn load(model_dir: &Path) -> ModelSet {
        Self::load_kinds(model_dir, &ModelKind::ALL)
    }

    /// Load the named artifacts, skipping (not failing on) any whose
    /// backing file is absent or unreadable.
    pub fn load_kinds(model_dir: &Path, kinds: &[ModelKind]) -> ModelSet {
        let mut set = ModelSet::new();
        for &kind in kinds {
            let path = model_dir.join(kind.artifact_file());
            if !path.exists() {
                warn!(model = %kind, path = %path.display(), "model artifact missing, skipping");
                continue;
            }
            let loaded = match kind {
                ModelKind::Dnn => OnnxClassifier::load(&path).map(ModelArtifact::Tabular),
                ModelKind::Disease => OnnxClassifier::load(&path).map(ModelArtifact::Image),
                ModelKind::Porosity | ModelKind::Breakage => {
                    CategoryLookup::load(&path).map(ModelArtifact::Lookup)
                }
            };
            match loaded {
                Ok(artifact) => {
                    info!(model = %kind, "model artifact loaded");
                    set.insert(kind, artifact);
                }
                Err(e) => {
                    warn!(model = %kind, error = %e, "failed to load model artifact, skipping");
                }
            }
        }
        set
    }
}
