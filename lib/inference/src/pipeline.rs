//! The prediction pipeline.
//!
//! One function per model, each pure given (models, survey state): the
//! survey is only read through [`FieldLookup`], artifacts are never
//! mutated. An unavailable artifact, missing photo or failed inference
//! degrades that one prediction to `None`; the only hard failure is using
//! an unfitted encoder, which is a programming-sequence bug.

use std::path::Path;

use mane_core::{FeatureEncoder, FieldLookup, ModelKind, Result};
use tracing::warn;

use crate::image::load_survey_image;
use crate::registry::ModelSet;

/// Survey field read by the porosity lookup classifier.
pub const POROSITY_FIELD: &str = "hair_porosity";
/// Survey field read by the breakage lookup classifier.
pub const BREAKAGE_FIELD: &str = "hair_breakage";

/// Encode a survey for the tabular classifier: the canonical column
/// layout with the target column dropped if it survived encoding.
pub fn inference_vector(encoder: &FeatureEncoder, survey: &dyn FieldLookup) -> Result<Vec<f32>> {
    let mut features = encoder.transform(survey)?;
    if let Some(target) = encoder.schema().target.clone() {
        let columns = encoder.feature_columns()?;
        if let Some(position) = columns.iter().position(|c| *c == target) {
            features.remove(position);
        }
    }
    Ok(features)
}

/// Tabular hair-health prediction over the encoded survey.
///
/// Returns `Ok(None)` when the artifact is unavailable or inference
/// fails; propagates only the not-fitted encoder error.
pub fn predict_survey(
    models: &ModelSet,
    encoder: &FeatureEncoder,
    survey: &dyn FieldLookup,
) -> Result<Option<usize>> {
    let classifier = match models.get(ModelKind::Dnn).and_then(|a| a.as_tabular()) {
        Some(classifier) => classifier,
        None => return Ok(None),
    };

    let features = inference_vector(encoder, survey)?;
    match classifier.predict_row(&features) {
        Ok(class) => Ok(Some(class)),
        Err(e) => {
            warn!(model = %ModelKind::Dnn, error = %e, "inference failed, degrading to None");
            Ok(None)
        }
    }
}

/// Scalp-condition prediction over the survey's uploaded photo.
pub fn predict_condition_image(
    models: &ModelSet,
    uploads_dir: &Path,
    survey_id: i64,
) -> Option<usize> {
    let classifier = models.get(ModelKind::Disease).and_then(|a| a.as_image())?;

    let tensor = match load_survey_image(uploads_dir, survey_id) {
        Ok(Some(tensor)) => tensor,
        Ok(None) => return None,
        Err(e) => {
            warn!(model = %ModelKind::Disease, survey_id, error = %e, "unreadable photo, degrading to None");
            return None;
        }
    };

    match classifier.predict_image(tensor) {
        Ok(class) => Some(class),
        Err(e) => {
            warn!(model = %ModelKind::Disease, error = %e, "inference failed, degrading to None");
            None
        }
    }
}

/// Porosity prediction from its single categorical survey field.
pub fn predict_porosity(models: &ModelSet, survey: &dyn FieldLookup) -> Option<usize> {
    predict_lookup(models, ModelKind::Porosity, POROSITY_FIELD, survey)
}

/// Breakage prediction from its single categorical survey field.
pub fn predict_breakage(models: &ModelSet, survey: &dyn FieldLookup) -> Option<usize> {
    predict_lookup(models, ModelKind::Breakage, BREAKAGE_FIELD, survey)
}

fn predict_lookup(
    models: &ModelSet,
    kind: ModelKind,
    field: &str,
    survey: &dyn FieldLookup,
) -> Option<usize> {
    let lookup = models.get(kind).and_then(|a| a.as_lookup())?;
    let raw = survey.field_text(field)?;
    lookup.transform(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{CategoryLookup, ModelArtifact};
    use mane_core::{FeatureSchema, SurveyRecord};
    use serde_json::json;

    fn lookup_models() -> ModelSet {
        let mut set = ModelSet::new();
        set.insert(
            ModelKind::Porosity,
            ModelArtifact::Lookup(CategoryLookup::new([
                ("low".to_string(), 0),
                ("medium".to_string(), 1),
                ("high".to_string(), 2),
            ])),
        );
        set.insert(
            ModelKind::Breakage,
            ModelArtifact::Lookup(CategoryLookup::new([
                ("low breakage".to_string(), 3),
                ("medium breakage".to_string(), 4),
            ])),
        );
        set
    }

    #[test]
    fn test_lookup_prediction_on_both_representations() {
        let models = lookup_models();

        let record = SurveyRecord::new(1, 1).with_field(POROSITY_FIELD, "High");
        assert_eq!(predict_porosity(&models, &record), Some(2));

        // The raw mapping representation goes through the same accessor.
        let raw = json!({ POROSITY_FIELD: "low", BREAKAGE_FIELD: "Medium Breakage" });
        assert_eq!(predict_porosity(&models, &raw), Some(0));
        assert_eq!(predict_breakage(&models, &raw), Some(4));
    }

    #[test]
    fn test_lookup_prediction_missing_field_is_none() {
        let models = lookup_models();
        let record = SurveyRecord::new(1, 1);
        assert_eq!(predict_porosity(&models, &record), None);
    }

    #[test]
    fn test_lookup_prediction_missing_artifact_is_none() {
        let models = ModelSet::new();
        let record = SurveyRecord::new(1, 1).with_field(POROSITY_FIELD, "low");
        assert_eq!(predict_porosity(&models, &record), None);
    }

    #[test]
    fn test_predict_survey_without_artifact_is_none() {
        let models = ModelSet::new();
        let encoder = FeatureEncoder::new(FeatureSchema::default());
        let record = SurveyRecord::new(1, 1);
        // No artifact means the encoder is never consulted.
        assert_eq!(predict_survey(&models, &encoder, &record).unwrap(), None);
    }

    #[test]
    fn test_inference_vector_drops_target_column() {
        let schema = FeatureSchema {
            numeric: vec![],
            ordinal: vec!["condition".to_string(), "porosity".to_string()],
            nominal: vec![],
            binary: vec![],
            target: Some("condition".to_string()),
        };
        let rows = vec![
            SurveyRecord::new(1, 1)
                .with_field("condition", "dry")
                .with_field("porosity", "low"),
            SurveyRecord::new(2, 1)
                .with_field("condition", "healthy")
                .with_field("porosity", "high"),
        ];
        let mut encoder = FeatureEncoder::new(schema);
        encoder.fit(&rows).unwrap();

        assert_eq!(encoder.feature_columns().unwrap().len(), 2);
        let vector = inference_vector(&encoder, &rows[0]).unwrap();
        assert_eq!(vector.len(), 1);
    }

    #[test]
    fn test_condition_image_without_artifact_is_none() {
        let models = ModelSet::new();
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(predict_condition_image(&models, dir.path(), 1), None);
    }
}
