//! # mane Inference
//!
//! Inference layer for the mane recommendation engine.
//!
//! - [`ModelRegistry`] / [`ModelSet`] - load and hold the four frozen
//!   artifacts, skipping absent ones
//! - [`ModelArtifact`] - ONNX sessions for the neural models,
//!   [`CategoryLookup`] tables for the lookup classifiers
//! - [`predict_survey`], [`predict_condition_image`],
//!   [`predict_porosity`], [`predict_breakage`] - the pure per-model
//!   prediction functions, each degrading independently to `None`

pub mod artifact;
pub mod image;
pub mod pipeline;
pub mod registry;

pub use artifact::{CategoryLookup, ModelArtifact, OnnxClassifier};
pub use image::{load_survey_image, preprocess_image, survey_image_path, IMAGE_SIZE};
pub use pipeline::{
    inference_vector, predict_breakage, predict_condition_image, predict_porosity,
    predict_survey, BREAKAGE_FIELD, POROSITY_FIELD,
};
pub use registry::{ModelRegistry, ModelSet};
