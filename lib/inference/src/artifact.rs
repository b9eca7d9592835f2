//! Frozen prediction artifacts.
//!
//! Each artifact exposes one capability: map its input to a class index.
//! Two flavors exist - ONNX sessions for the neural models, and a plain
//! category table for the two lookup-style classifiers. All artifacts are
//! loaded once and shared read-only; inference never mutates them.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use mane_core::{Error, Result};
use ndarray::{Array2, Array4};
use ort::session::{Session, SessionInputValue, SessionOutputs};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An ONNX classifier session. The session handle requires exclusive
/// access to run, so it sits behind a mutex; the artifact itself stays
/// logically immutable and can be shared across request handlers.
pub struct OnnxClassifier {
    session: Mutex<Session>,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ArtifactUnavailable(path.display().to_string()));
        }
        let session = Session::builder()
            .map_err(|e| Error::Inference(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| Error::Inference(e.to_string()))?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Classify one encoded survey row; returns the arg-max class index.
    pub fn predict_row(&self, features: &[f32]) -> Result<usize> {
        let tensor = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| Error::Inference(e.to_string()))?;
        let value = ort::value::Value::from_array(tensor)
            .map_err(|e| Error::Inference(e.to_string()))?;
        self.run_argmax(SessionInputValue::from(value))
    }

    /// Classify one preprocessed image tensor (NCHW `[1, 3, H, W]`).
    pub fn predict_image(&self, tensor: Array4<f32>) -> Result<usize> {
        let value = ort::value::Value::from_array(tensor)
            .map_err(|e| Error::Inference(e.to_string()))?;
        self.run_argmax(SessionInputValue::from(value))
    }

    fn run_argmax(&self, input: SessionInputValue<'_>) -> Result<usize> {
        let inputs: Vec<(Cow<'_, str>, SessionInputValue<'_>)> =
            vec![(Cow::Borrowed("input"), input)];

        let mut session = self.session.lock();
        let outputs: SessionOutputs = session
            .run(inputs)
            .map_err(|e| Error::Inference(e.to_string()))?;

        let output = outputs
            .get("output")
            .ok_or_else(|| Error::Inference("no output tensor".to_string()))?;
        let (_, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(e.to_string()))?;

        argmax(scores).ok_or_else(|| Error::Inference("empty output tensor".to_string()))
    }
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier").finish_non_exhaustive()
    }
}

/// First maximum wins, matching the arg-max convention the labels were
/// assigned under.
fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// A lookup-style classifier: the artifact's own categorical transform,
/// a fitted category-to-class-index table stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryLookup {
    classes: HashMap<String, usize>,
}

impl CategoryLookup {
    pub fn new<I>(classes: I) -> Self
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        Self {
            classes: classes
                .into_iter()
                .map(|(category, class)| (category.trim().to_lowercase(), class))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let classes: HashMap<String, usize> =
            serde_json::from_slice(&bytes).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self::new(classes))
    }

    /// Map a raw survey value to its class index; `None` for a category
    /// the artifact was not fitted on.
    pub fn transform(&self, raw: &str) -> Option<usize> {
        let class = self.classes.get(&raw.trim().to_lowercase()).copied();
        if class.is_none() {
            debug!(category = raw, "category not in lookup artifact");
        }
        class
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// One of the four frozen model artifacts.
#[derive(Debug)]
pub enum ModelArtifact {
    /// Tabular classifier over the encoded survey vector.
    Tabular(OnnxClassifier),
    /// Image classifier over the preprocessed photo tensor.
    Image(OnnxClassifier),
    /// Categorical lookup classifier over a single survey field.
    Lookup(CategoryLookup),
}

impl ModelArtifact {
    pub fn as_tabular(&self) -> Option<&OnnxClassifier> {
        match self {
            ModelArtifact::Tabular(classifier) => Some(classifier),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&OnnxClassifier> {
        match self {
            ModelArtifact::Image(classifier) => Some(classifier),
            _ => None,
        }
    }

    pub fn as_lookup(&self) -> Option<&CategoryLookup> {
        match self {
            ModelArtifact::Lookup(lookup) => Some(lookup),
            _ => None,
        }
    }
}
