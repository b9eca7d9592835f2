//! # mane Recommend
//!
//! Recommendation layer for the mane engine.
//!
//! - [`CatalogIndex`] - the TF-IDF term-vector index over the product
//!   catalog, built once at startup and shared read-only
//! - [`ContentRecommender`] - cosine-similarity ranking with a fixed
//!   candidate pool, per-function grouping and iteration windowing
//! - [`RuleResolver`] - (model, class index) to explanatory rule payload
//! - [`RecommendationBundle`] - the assembled per-survey result in its
//!   exact wire shape
//! - [`FeedbackTracker`] - advances a recommendation's iteration on
//!   negative feedback
//! - [`RecommendationService`] - the process-wide object wiring all of
//!   the above to a store

pub mod bundle;
pub mod catalog;
pub mod feedback;
pub mod recommender;
pub mod rules;
pub mod service;
pub mod tfidf;

pub use bundle::{PerModel, RecommendationBundle, Recommendations};
pub use catalog::{CatalogEntry, CatalogIndex};
pub use feedback::{FeedbackTracker, RATING_DOWN};
pub use recommender::{
    normalize_targets, ContentRecommender, RankOutcome, RankedIngredient, CANDIDATE_POOL,
    DEFAULT_PAGE_SIZE,
};
pub use rules::RuleResolver;
pub use service::RecommendationService;
pub use tfidf::{sparse_dot, tokenize, SparseVector, TfIdfVectorizer};
