//! # mane
//!
//! An explainable haircare recommendation engine.
//!
//! mane turns a structured questionnaire response (plus an optional scalp
//! photo) into ranked, explainable product-ingredient recommendations:
//! survey answers are encoded into a fixed-layout feature vector, four
//! frozen classifiers predict independently, rule payloads explain each
//! prediction, and a TF-IDF similarity index over the product catalog
//! ranks ingredients per predicted condition. Negative feedback advances
//! a per-recommendation iteration counter that pages the ranking forward
//! without retraining anything.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! cargo install mane
//! mane --data-dir ./data --model-dir ./models recommend --survey-id 42
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mane::prelude::*;
//!
//! let store = Arc::new(MemoryStore::new());
//! let encoder = FeatureEncoder::new(FeatureSchema::questionnaire_v1());
//! let models = ModelRegistry::load(std::path::Path::new("./models"));
//!
//! let service = RecommendationService::new(store, encoder, models, "./uploads").unwrap();
//! let bundle = service.build(42).unwrap();
//! println!("{}", serde_json::to_string_pretty(&bundle).unwrap());
//! ```
//!
//! ## Crate Structure
//!
//! mane is composed of several crates:
//!
//! - [`mane-core`](https://docs.rs/mane-core) - Survey model, feature
//!   encoder, label configuration, error taxonomy
//! - [`mane-inference`](https://docs.rs/mane-inference) - Model registry,
//!   ONNX/lookup artifacts, prediction pipeline
//! - [`mane-recommend`](https://docs.rs/mane-recommend) - TF-IDF catalog
//!   index, similarity ranking, rule resolution, feedback iteration
//! - [`mane-storage`](https://docs.rs/mane-storage) - Store traits,
//!   in-memory reference store, atomic snapshots

// Re-export core types
pub use mane_core::{
    EncoderState, Error, FeatureEncoder, FeatureSchema, FieldLookup, ModelKind, Result,
    SurveyRecord, ORDINAL_UNKNOWN,
};

// Re-export inference
pub use mane_inference::{
    predict_breakage, predict_condition_image, predict_porosity, predict_survey, CategoryLookup,
    ModelArtifact, ModelRegistry, ModelSet,
};

// Re-export recommendation
pub use mane_recommend::{
    CatalogIndex, ContentRecommender, FeedbackTracker, PerModel, RankOutcome, RankedIngredient,
    RecommendationBundle, RecommendationService, Recommendations, RuleResolver, TfIdfVectorizer,
};

// Re-export storage
pub use mane_storage::{
    seed_from_dir, CatalogRow, DataStore, MemoryStore, NewRecommendation, RecommendationRow,
    SnapshotPersistence,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CatalogIndex, CatalogRow, ContentRecommender, DataStore, EncoderState, Error,
        FeatureEncoder, FeatureSchema, FeedbackTracker, FieldLookup, MemoryStore, ModelKind,
        ModelRegistry, ModelSet, RankOutcome, RecommendationBundle, RecommendationService, Result,
        SnapshotPersistence, SurveyRecord,
    };
}
