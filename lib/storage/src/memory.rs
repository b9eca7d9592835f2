//! In-memory reference store.
//!
//! Implements every store trait behind a single `RwLock`, which makes each
//! trait method one atomic step: `append_bundle` inserts all rows of a
//! bundle under one write-lock acquisition, and `increment_iteration`
//! performs its read-modify-write without releasing the lock in between,
//! so racing feedback events cannot lose updates.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use mane_core::{Error, Result, SurveyRecord};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{
    CatalogRow, CatalogSource, FeedbackEvent, FeedbackStore, NewRecommendation,
    RecommendationRow, RecommendationStore, RuleStore, SurveyStore,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
    pub surveys: HashMap<i64, SurveyRecord>,
    pub rules: HashMap<String, Value>,
    pub catalog: Vec<CatalogRow>,
    pub recommendations: BTreeMap<i64, RecommendationRow>,
    pub feedback: Vec<FeedbackEvent>,
    pub next_rec_id: i64,
    pub next_feedback_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_survey(&self, survey: SurveyRecord) {
        self.state.write().surveys.insert(survey.survey_id, survey);
    }

    pub fn insert_rule(&self, rule_name: &str, rule_json: Value) {
        self.state.write().rules.insert(rule_name.to_string(), rule_json);
    }

    pub fn set_catalog(&self, rows: Vec<CatalogRow>) {
        self.state.write().catalog = rows;
    }

    pub fn recommendation_count(&self) -> usize {
        self.state.read().recommendations.len()
    }

    pub fn feedback_count(&self) -> usize {
        self.state.read().feedback.len()
    }

    pub(crate) fn export_state(&self) -> StoreState {
        self.state.read().clone()
    }

    pub(crate) fn from_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

impl SurveyStore for MemoryStore {
    fn survey(&self, survey_id: i64) -> Result<Option<SurveyRecord>> {
        Ok(self.state.read().surveys.get(&survey_id).cloned())
    }

    fn latest_survey_for_user(&self, user_id: i64) -> Result<Option<SurveyRecord>> {
        let state = self.state.read();
        Ok(state
            .surveys
            .values()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| s.survey_id)
            .cloned())
    }
}

impl RuleStore for MemoryStore {
    fn rule(&self, rule_name: &str) -> Result<Option<Value>> {
        Ok(self.state.read().rules.get(rule_name).cloned())
    }
}

impl RecommendationStore for MemoryStore {
    fn append_bundle(&self, rows: Vec<NewRecommendation>) -> Result<Vec<i64>> {
        let mut state = self.state.write();
        let created_at = Utc::now();
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            state.next_rec_id += 1;
            let rec_id = state.next_rec_id;
            state.recommendations.insert(
                rec_id,
                RecommendationRow {
                    rec_id,
                    survey_id: row.survey_id,
                    user_id: row.user_id,
                    model_id: row.model_id,
                    iteration: row.iteration,
                    model_prediction: row.model_prediction,
                    recommendation_json: row.recommendation_json,
                    created_at,
                },
            );
            ids.push(rec_id);
        }
        Ok(ids)
    }

    fn recommendation(&self, rec_id: i64) -> Result<Option<RecommendationRow>> {
        Ok(self.state.read().recommendations.get(&rec_id).cloned())
    }

    fn latest_per_model(&self, user_id: i64) -> Result<Vec<RecommendationRow>> {
        let state = self.state.read();
        let mut latest: BTreeMap<i64, RecommendationRow> = BTreeMap::new();
        // Newest row wins per model id.
        for row in state.recommendations.values().rev() {
            if row.user_id == user_id && !latest.contains_key(&row.model_id) {
                latest.insert(row.model_id, row.clone());
            }
        }
        Ok(latest.into_values().collect())
    }

    fn increment_iteration(&self, rec_id: i64) -> Result<i64> {
        let mut state = self.state.write();
        let row = state
            .recommendations
            .get_mut(&rec_id)
            .ok_or(Error::RecommendationNotFound(rec_id))?;
        // Legacy rows may carry 0; they read as iteration 1.
        row.iteration = row.iteration.max(1) + 1;
        Ok(row.iteration)
    }
}

impl FeedbackStore for MemoryStore {
    fn append_feedback(&self, user_id: i64, rec_id: i64, rating: i32) -> Result<i64> {
        let mut state = self.state.write();
        state.next_feedback_id += 1;
        let feedback_id = state.next_feedback_id;
        state.feedback.push(FeedbackEvent {
            feedback_id,
            user_id,
            rec_id,
            rating,
            created_at: Utc::now(),
        });
        Ok(feedback_id)
    }
}

impl CatalogSource for MemoryStore {
    fn catalog_rows(&self) -> Result<Vec<CatalogRow>> {
        Ok(self.state.read().catalog.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn new_row(user_id: i64, model_id: i64) -> NewRecommendation {
        NewRecommendation {
            survey_id: 1,
            user_id,
            model_id,
            iteration: 1,
            model_prediction: Some("Healthy".to_string()),
            recommendation_json: json!({"tip": "hydrate"}),
        }
    }

    #[test]
    fn test_append_bundle_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let ids = store
            .append_bundle(vec![new_row(7, 1), new_row(7, 2)])
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(store.recommendation_count(), 2);
    }

    #[test]
    fn test_latest_per_model_picks_newest() {
        let store = MemoryStore::new();
        store.append_bundle(vec![new_row(7, 1), new_row(7, 2)]).unwrap();
        store.append_bundle(vec![new_row(7, 1)]).unwrap();

        let latest = store.latest_per_model(7).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].model_id, 1);
        assert_eq!(latest[0].rec_id, 3);
        assert_eq!(latest[1].model_id, 2);
        assert_eq!(latest[1].rec_id, 2);
    }

    #[test]
    fn test_increment_iteration() {
        let store = MemoryStore::new();
        let ids = store.append_bundle(vec![new_row(7, 1)]).unwrap();
        assert_eq!(store.increment_iteration(ids[0]).unwrap(), 2);
        assert_eq!(store.increment_iteration(ids[0]).unwrap(), 3);
        assert!(matches!(
            store.increment_iteration(999),
            Err(Error::RecommendationNotFound(999))
        ));
    }

    #[test]
    fn test_concurrent_increments_do_not_lose_updates() {
        let store = Arc::new(MemoryStore::new());
        let ids = store.append_bundle(vec![new_row(7, 1)]).unwrap();
        let rec_id = ids[0];

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.increment_iteration(rec_id).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let row = store.recommendation(rec_id).unwrap().unwrap();
        assert_eq!(row.iteration, 801);
    }

    #[test]
    fn test_latest_survey_for_user() {
        let store = MemoryStore::new();
        store.insert_survey(SurveyRecord::new(1, 7));
        store.insert_survey(SurveyRecord::new(5, 7));
        store.insert_survey(SurveyRecord::new(3, 8));

        let latest = store.latest_survey_for_user(7).unwrap().unwrap();
        assert_eq!(latest.survey_id, 5);
        assert!(store.latest_survey_for_user(99).unwrap().is_none());
    }
}
