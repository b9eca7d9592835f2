//! Feedback-driven iteration tracking.
//!
//! Every persisted recommendation carries an iteration counter starting
//! at 1. A thumbs-down advances it by one through the store's atomic
//! read-modify-write; any other rating records the event and leaves the
//! counter alone. The counter has no terminal state: once it pages past
//! the candidate pool, ranking degrades to empty results.

use std::sync::Arc;

use mane_core::{Error, Result};
use mane_storage::{FeedbackStore, RecommendationStore};
use tracing::info;

/// Rating value that counts as negative feedback.
pub const RATING_DOWN: i32 = 0;

pub struct FeedbackTracker<S: RecommendationStore + FeedbackStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RecommendationStore + FeedbackStore + ?Sized> FeedbackTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record one feedback event for a recommendation. Returns the
    /// recommendation's iteration after the event: bumped for a
    /// thumbs-down, unchanged otherwise.
    pub fn submit(&self, user_id: i64, rec_id: i64, rating: i32) -> Result<i64> {
        let row = self
            .store
            .recommendation(rec_id)?
            .ok_or(Error::RecommendationNotFound(rec_id))?;

        self.store.append_feedback(user_id, rec_id, rating)?;

        if rating == RATING_DOWN {
            let iteration = self.store.increment_iteration(rec_id)?;
            info!(rec_id, iteration, "negative feedback advanced iteration");
            Ok(iteration)
        } else {
            Ok(row.iteration.max(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mane_storage::{MemoryStore, NewRecommendation};
    use serde_json::json;

    fn store_with_rec() -> (Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let ids = store
            .append_bundle(vec![NewRecommendation {
                survey_id: 1,
                user_id: 7,
                model_id: 1,
                iteration: 1,
                model_prediction: Some("Healthy".to_string()),
                recommendation_json: json!({}),
            }])
            .unwrap();
        (store, ids[0])
    }

    #[test]
    fn test_thumbs_down_advances_iteration() {
        let (store, rec_id) = store_with_rec();
        let tracker = FeedbackTracker::new(store.clone());

        assert_eq!(tracker.submit(7, rec_id, RATING_DOWN).unwrap(), 2);
        let row = store.recommendation(rec_id).unwrap().unwrap();
        assert_eq!(row.iteration, 2);
        assert_eq!(store.feedback_count(), 1);
    }

    #[test]
    fn test_positive_feedback_leaves_iteration() {
        let (store, rec_id) = store_with_rec();
        let tracker = FeedbackTracker::new(store.clone());

        tracker.submit(7, rec_id, RATING_DOWN).unwrap();
        // A thumbs-up on an iteration-2 recommendation keeps it at 2.
        assert_eq!(tracker.submit(7, rec_id, 1).unwrap(), 2);
        let row = store.recommendation(rec_id).unwrap().unwrap();
        assert_eq!(row.iteration, 2);
        assert_eq!(store.feedback_count(), 2);
    }

    #[test]
    fn test_unknown_recommendation_fails() {
        let (store, _) = store_with_rec();
        let tracker = FeedbackTracker::new(store);
        assert!(matches!(
            tracker.submit(7, 999, RATING_DOWN),
            Err(Error::RecommendationNotFound(999))
        ));
    }
}
