//! Store traits and row types.
//!
//! The persistence engine itself (schema creation, migrations, connection
//! handling) is an external collaborator; the engine boundary is this set
//! of traits. The core only needs the handful of operations declared here,
//! and any backend that provides them plugs in.

use chrono::{DateTime, Utc};
use mane_core::{Result, SurveyRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One persisted recommendation: the payload for a single model of a
/// single bundle. Rows are append-only; regeneration writes new rows and
/// feedback mutates only the iteration counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRow {
    pub rec_id: i64,
    pub survey_id: i64,
    pub user_id: i64,
    pub model_id: i64,
    /// Page counter driving re-ranking after negative feedback; starts at 1.
    pub iteration: i64,
    pub model_prediction: Option<String>,
    pub recommendation_json: Value,
    pub created_at: DateTime<Utc>,
}

/// A recommendation row about to be inserted; the store assigns the id and
/// the timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecommendation {
    pub survey_id: i64,
    pub user_id: i64,
    pub model_id: i64,
    pub iteration: i64,
    pub model_prediction: Option<String>,
    pub recommendation_json: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub feedback_id: i64,
    pub user_id: i64,
    pub rec_id: i64,
    /// 0 = thumbs down; anything else leaves the iteration untouched.
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

/// One product-catalog entry: an ingredient and its comma-separated
/// function tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub ingredient: String,
    pub functions: String,
}

pub trait SurveyStore: Send + Sync {
    fn survey(&self, survey_id: i64) -> Result<Option<SurveyRecord>>;
    fn latest_survey_for_user(&self, user_id: i64) -> Result<Option<SurveyRecord>>;
}

pub trait RuleStore: Send + Sync {
    /// The rule payload stored under a model's rule name, if any.
    fn rule(&self, rule_name: &str) -> Result<Option<Value>>;
}

pub trait RecommendationStore: Send + Sync {
    /// Insert all rows of one bundle, or none of them.
    fn append_bundle(&self, rows: Vec<NewRecommendation>) -> Result<Vec<i64>>;

    fn recommendation(&self, rec_id: i64) -> Result<Option<RecommendationRow>>;

    /// The newest row per model id for a user, ordered by model id.
    fn latest_per_model(&self, user_id: i64) -> Result<Vec<RecommendationRow>>;

    /// Bump a row's iteration counter by one as a single atomic
    /// read-modify-write. Returns the new value.
    fn increment_iteration(&self, rec_id: i64) -> Result<i64>;
}

pub trait FeedbackStore: Send + Sync {
    fn append_feedback(&self, user_id: i64, rec_id: i64, rating: i32) -> Result<i64>;
}

pub trait CatalogSource: Send + Sync {
    fn catalog_rows(&self) -> Result<Vec<CatalogRow>>;
}

/// Everything the recommendation service needs from a backend.
pub trait DataStore:
    SurveyStore + RuleStore + RecommendationStore + FeedbackStore + CatalogSource
{
}

impl<T> DataStore for T where
    T: SurveyStore + RuleStore + RecommendationStore + FeedbackStore + CatalogSource
{
}
