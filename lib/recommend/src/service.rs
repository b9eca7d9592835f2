//! The recommendation service.
//!
//! The one process-wide object: encoder state, model set, catalog index
//! and store handle, constructed explicitly at startup and immutable
//! afterwards. Every request handler works through a shared reference to
//! it; the only mutation it ever performs goes through the store.

use std::path::PathBuf;
use std::sync::Arc;

use mane_core::{Error, FeatureEncoder, ModelKind, Result, SurveyRecord};
use mane_inference::{
    predict_breakage, predict_condition_image, predict_porosity, predict_survey, ModelSet,
};
use mane_storage::{DataStore, NewRecommendation, RecommendationStore, SurveyStore};
use serde_json::Value;
use tracing::info;

use crate::bundle::{PerModel, RecommendationBundle, Recommendations};
use crate::catalog::CatalogIndex;
use crate::feedback::FeedbackTracker;
use crate::recommender::{ContentRecommender, RankOutcome, DEFAULT_PAGE_SIZE};
use crate::rules::RuleResolver;

pub struct RecommendationService<S: DataStore> {
    store: Arc<S>,
    encoder: FeatureEncoder,
    models: ModelSet,
    recommender: ContentRecommender,
    resolver: RuleResolver<S>,
    uploads_dir: PathBuf,
    page_size: usize,
}

impl<S: DataStore> RecommendationService<S> {
    /// Build the service: loads the catalog from the store and indexes it
    /// once. Construct before serving traffic.
    pub fn new(
        store: Arc<S>,
        encoder: FeatureEncoder,
        models: ModelSet,
        uploads_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let index = Arc::new(CatalogIndex::from_source(store.as_ref())?);
        info!(
            models = models.len(),
            catalog_entries = index.len(),
            encoder_fitted = encoder.is_fitted(),
            "recommendation service ready"
        );
        Ok(Self {
            recommender: ContentRecommender::new(index),
            resolver: RuleResolver::new(store.clone()),
            store,
            encoder,
            models,
            uploads_dir: uploads_dir.into(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn recommender(&self) -> &ContentRecommender {
        &self.recommender
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Build, persist and return a fresh bundle for a survey. All four
    /// recommendations start at iteration 1.
    pub fn build(&self, survey_id: i64) -> Result<RecommendationBundle> {
        let survey = self
            .store
            .survey(survey_id)?
            .ok_or(Error::SurveyNotFound(survey_id))?;
        let iterations = PerModel::uniform(1i64);
        let bundle = self.assemble(&survey, &iterations)?;
        self.persist(&survey, &bundle, &iterations)?;
        Ok(bundle)
    }

    /// Regenerate for a user's newest survey, paging the ranked model by
    /// each recommendation's current stored iteration. New rows are
    /// appended; history stays untouched for audit and feedback linkage.
    pub fn rebuild_latest(&self, user_id: i64) -> Result<RecommendationBundle> {
        let survey = self
            .store
            .latest_survey_for_user(user_id)?
            .ok_or_else(|| Error::Storage(format!("no surveys for user {}", user_id)))?;

        let mut iterations = PerModel::uniform(1i64);
        for row in self.store.latest_per_model(user_id)? {
            if let Some(kind) = ModelKind::from_model_id(row.model_id) {
                *iterations.get_mut(kind) = row.iteration.max(1);
            }
        }

        let bundle = self.assemble(&survey, &iterations)?;
        self.persist(&survey, &bundle, &iterations)?;
        Ok(bundle)
    }

    /// Record feedback for a recommendation; a thumbs-down advances its
    /// iteration so the next rebuild serves the following page.
    pub fn submit_feedback(&self, user_id: i64, rec_id: i64, rating: i32) -> Result<i64> {
        FeedbackTracker::new(self.store.clone()).submit(user_id, rec_id, rating)
    }

    /// The ranked-ingredient payload for a tabular prediction at a given
    /// iteration: rule targets through the resolver, then the catalog
    /// ranking. A missing rule becomes the explicit no-rule payload.
    pub fn ranked_recommendation(
        &self,
        class_index: Option<usize>,
        iteration: i64,
    ) -> Result<RankOutcome> {
        match self.resolver.resolve(ModelKind::Dnn, class_index)? {
            Some(targets) => Ok(self.recommender.rank(&targets, iteration, self.page_size)),
            None => Ok(RankOutcome::no_rule(display_class(class_index))),
        }
    }

    fn assemble(
        &self,
        survey: &SurveyRecord,
        iterations: &PerModel<i64>,
    ) -> Result<RecommendationBundle> {
        let dnn = predict_survey(&self.models, &self.encoder, survey)?;
        let porosity = predict_porosity(&self.models, survey);
        let breakage = predict_breakage(&self.models, survey);
        let disease = predict_condition_image(&self.models, &self.uploads_dir, survey.survey_id);

        let classes = PerModel {
            dnn,
            porosity,
            breakage,
            disease,
        };
        let labels = PerModel {
            dnn: label_of(ModelKind::Dnn, dnn),
            porosity: label_of(ModelKind::Porosity, porosity),
            breakage: label_of(ModelKind::Breakage, breakage),
            disease: label_of(ModelKind::Disease, disease),
        };

        let recommendations = Recommendations {
            dnn: self.ranked_recommendation(dnn, iterations.dnn)?,
            porosity: self.resolver.resolve(ModelKind::Porosity, porosity)?,
            breakage: self.resolver.resolve(ModelKind::Breakage, breakage)?,
            disease: self.resolver.resolve(ModelKind::Disease, disease)?,
        };

        Ok(RecommendationBundle {
            classes,
            labels,
            recommendations,
        })
    }

    /// One row per model with a payload; the store inserts all rows of
    /// the bundle or none of them.
    fn persist(
        &self,
        survey: &SurveyRecord,
        bundle: &RecommendationBundle,
        iterations: &PerModel<i64>,
    ) -> Result<Vec<i64>> {
        let mut rows = Vec::with_capacity(ModelKind::ALL.len());
        for kind in ModelKind::ALL {
            let payload: Option<Value> = match kind {
                ModelKind::Dnn => Some(
                    serde_json::to_value(&bundle.recommendations.dnn)
                        .map_err(|e| Error::Serialization(e.to_string()))?,
                ),
                ModelKind::Porosity => bundle.recommendations.porosity.clone(),
                ModelKind::Breakage => bundle.recommendations.breakage.clone(),
                ModelKind::Disease => bundle.recommendations.disease.clone(),
            };
            let Some(recommendation_json) = payload else {
                continue;
            };
            rows.push(NewRecommendation {
                survey_id: survey.survey_id,
                user_id: survey.user_id,
                model_id: kind.model_id(),
                iteration: *iterations.get(kind),
                model_prediction: bundle.labels.get(kind).clone(),
                recommendation_json,
            });
        }
        self.store.append_bundle(rows)
    }
}

fn label_of(kind: ModelKind, class_index: Option<usize>) -> Option<String> {
    class_index
        .and_then(|c| kind.label_for(c))
        .map(str::to_string)
}

fn display_class(class_index: Option<usize>) -> String {
    match class_index {
        Some(class) => class.to_string(),
        None => "unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mane_core::FeatureSchema;
    use mane_inference::{CategoryLookup, ModelArtifact, POROSITY_FIELD};
    use mane_storage::{CatalogRow, MemoryStore, RecommendationStore};
    use serde_json::json;

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_survey(SurveyRecord::new(1, 7).with_field(POROSITY_FIELD, "low"));
        store.insert_rule(
            "porosity_model",
            json!({"low": {"care_tips": ["seal with oil"]}}),
        );
        store.insert_rule("dnn_model", json!({"Healthy": ["moisture", "shine"]}));
        store.set_catalog(vec![
            CatalogRow {
                ingredient: "Aloe Vera".to_string(),
                functions: "moisture, shine".to_string(),
            },
            CatalogRow {
                ingredient: "Shea Butter".to_string(),
                functions: "moisture, shine".to_string(),
            },
            CatalogRow {
                ingredient: "Keratin".to_string(),
                functions: "repair".to_string(),
            },
        ]);
        store
    }

    fn service(store: Arc<MemoryStore>) -> RecommendationService<MemoryStore> {
        let mut models = ModelSet::new();
        models.insert(
            ModelKind::Porosity,
            ModelArtifact::Lookup(CategoryLookup::new([
                ("low".to_string(), 0),
                ("medium".to_string(), 1),
                ("high".to_string(), 2),
            ])),
        );
        let encoder = FeatureEncoder::new(FeatureSchema::default());
        let dir = std::env::temp_dir();
        RecommendationService::new(store, encoder, models, dir)
            .unwrap()
            .with_page_size(2)
    }

    #[test]
    fn test_build_degrades_per_model() {
        let store = seeded_store();
        let service = service(store.clone());

        let bundle = service.build(1).unwrap();

        // Porosity resolved through the lookup artifact and rule store.
        assert_eq!(bundle.classes.porosity, Some(0));
        assert_eq!(bundle.labels.porosity.as_deref(), Some("low"));
        assert_eq!(
            bundle.recommendations.porosity.as_ref().unwrap()["care_tips"][0],
            "seal with oil"
        );

        // The unavailable models degrade without failing the bundle.
        assert_eq!(bundle.classes.dnn, None);
        assert!(bundle.recommendations.dnn.is_no_rule());
        assert_eq!(bundle.classes.disease, None);
        assert_eq!(bundle.recommendations.disease, None);
        assert_eq!(bundle.labels.disease, None);

        // Persisted rows: the ranked model always writes, rule models
        // only with a payload.
        assert_eq!(store.recommendation_count(), 2);
    }

    #[test]
    fn test_unknown_survey_fails() {
        let service = service(seeded_store());
        assert!(matches!(
            service.build(99),
            Err(Error::SurveyNotFound(99))
        ));
    }

    #[test]
    fn test_ranked_recommendation_uses_shared_label_map() {
        let service = service(seeded_store());

        // Class 3 resolves to "Healthy" through the same table the bundle
        // labels come from, and the rule row is keyed by that label.
        let outcome = service.ranked_recommendation(Some(3), 1).unwrap();
        match &outcome {
            RankOutcome::Ranked(groups) => {
                assert_eq!(
                    groups["moisture"]
                        .iter()
                        .map(|i| i.ingredient.as_str())
                        .collect::<Vec<_>>(),
                    vec!["Aloe Vera", "Shea Butter"]
                );
            }
            RankOutcome::NoRule { .. } => panic!("expected ranked outcome"),
        }
    }

    #[test]
    fn test_ranked_recommendation_without_rule_row() {
        let store = seeded_store();
        let service = service(store);
        // Class 1 -> label "Dry", which has no entry in the rule row.
        let outcome = service.ranked_recommendation(Some(1), 1).unwrap();
        assert!(outcome.is_no_rule());
    }

    #[test]
    fn test_feedback_pages_next_rebuild() {
        let store = seeded_store();
        let service = service(store.clone());

        let _ = service.build(1).unwrap();
        let latest = store.latest_per_model(7).unwrap();
        let porosity_rec = latest
            .iter()
            .find(|r| r.model_id == ModelKind::Porosity.model_id())
            .unwrap();

        // Thumbs-down advances the stored iteration.
        assert_eq!(
            service.submit_feedback(7, porosity_rec.rec_id, 0).unwrap(),
            2
        );

        // The rebuild carries the stored iteration into the new rows.
        let _ = service.rebuild_latest(7).unwrap();
        let latest = store.latest_per_model(7).unwrap();
        let porosity_rec = latest
            .iter()
            .find(|r| r.model_id == ModelKind::Porosity.model_id())
            .unwrap();
        assert_eq!(porosity_rec.iteration, 2);

        // Positive feedback leaves it alone.
        assert_eq!(
            service.submit_feedback(7, porosity_rec.rec_id, 1).unwrap(),
            2
        );
    }

    #[test]
    fn test_ranked_iteration_pages_are_disjoint() {
        let service = service(seeded_store());

        let page1 = service.ranked_recommendation(Some(3), 1).unwrap();
        let page2 = service.ranked_recommendation(Some(3), 2).unwrap();

        let names = |outcome: &RankOutcome| -> Vec<String> {
            match outcome {
                RankOutcome::Ranked(groups) => groups
                    .get("moisture")
                    .map(|items| items.iter().map(|i| i.ingredient.clone()).collect())
                    .unwrap_or_default(),
                RankOutcome::NoRule { .. } => panic!("expected ranked outcome"),
            }
        };
        let first = names(&page1);
        let second = names(&page2);
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|i| !second.contains(i)));
    }
}
