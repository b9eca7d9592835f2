//! The assembled recommendation bundle and its wire shape.

use mane_core::ModelKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::recommender::RankOutcome;

/// One value per model, serialized under the model's bundle key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerModel<T> {
    pub dnn: T,
    pub porosity: T,
    pub breakage: T,
    pub disease: T,
}

impl<T> PerModel<T> {
    pub fn get(&self, kind: ModelKind) -> &T {
        match kind {
            ModelKind::Dnn => &self.dnn,
            ModelKind::Porosity => &self.porosity,
            ModelKind::Breakage => &self.breakage,
            ModelKind::Disease => &self.disease,
        }
    }

    pub fn get_mut(&mut self, kind: ModelKind) -> &mut T {
        match kind {
            ModelKind::Dnn => &mut self.dnn,
            ModelKind::Porosity => &mut self.porosity,
            ModelKind::Breakage => &mut self.breakage,
            ModelKind::Disease => &mut self.disease,
        }
    }
}

impl<T: Clone> PerModel<T> {
    pub fn uniform(value: T) -> Self {
        Self {
            dnn: value.clone(),
            porosity: value.clone(),
            breakage: value.clone(),
            disease: value,
        }
    }
}

/// Per-model recommendation payloads: ranked ingredient pages for the
/// tabular model, rule payloads (or `null`) for the other three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub dnn: RankOutcome,
    pub porosity: Option<Value>,
    pub breakage: Option<Value>,
    pub disease: Option<Value>,
}

/// One assembled result for a survey across all four models.
///
/// Serializes to the exact wire shape consumed downstream:
///
/// ```json
/// {
///   "classes": {"dnn": 3, "porosity": 0, "breakage": null, "disease": null},
///   "labels": {"dnn": "Healthy", "porosity": "low", "breakage": null, "disease": null},
///   "recommendations": {
///     "dnn": {"Moisturizing": [{"Ingredient": "Aloe Vera", "Score": 0.713}]},
///     "porosity": {"care_tips": ["seal with oil"]},
///     "breakage": null,
///     "disease": null
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub classes: PerModel<Option<usize>>,
    pub labels: PerModel<Option<String>>,
    pub recommendations: Recommendations,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let bundle = RecommendationBundle {
            classes: PerModel {
                dnn: Some(3),
                porosity: Some(0),
                breakage: None,
                disease: None,
            },
            labels: PerModel {
                dnn: Some("Healthy".to_string()),
                porosity: Some("low".to_string()),
                breakage: None,
                disease: None,
            },
            recommendations: Recommendations {
                dnn: RankOutcome::Ranked(
                    [(
                        "Moisturizing".to_string(),
                        vec![crate::recommender::RankedIngredient {
                            ingredient: "Aloe Vera".to_string(),
                            score: 0.713,
                        }],
                    )]
                    .into_iter()
                    .collect(),
                ),
                porosity: Some(json!({"care_tips": ["seal with oil"]})),
                breakage: None,
                disease: None,
            },
        };

        let wire = serde_json::to_value(&bundle).unwrap();
        assert_eq!(
            wire,
            json!({
                "classes": {"dnn": 3, "porosity": 0, "breakage": null, "disease": null},
                "labels": {"dnn": "Healthy", "porosity": "low", "breakage": null, "disease": null},
                "recommendations": {
                    "dnn": {"Moisturizing": [{"Ingredient": "Aloe Vera", "Score": 0.713}]},
                    "porosity": {"care_tips": ["seal with oil"]},
                    "breakage": null,
                    "disease": null
                }
            })
        );
    }

    #[test]
    fn test_no_rule_wire_shape() {
        let outcome = RankOutcome::no_rule(2);
        let wire = serde_json::to_value(&outcome).unwrap();
        assert_eq!(wire, json!({"error": "No ingredient rules found for: 2"}));
    }

    #[test]
    fn test_per_model_access() {
        let mut values = PerModel::uniform(0i64);
        *values.get_mut(ModelKind::Disease) = 7;
        assert_eq!(*values.get(ModelKind::Disease), 7);
        assert_eq!(*values.get(ModelKind::Dnn), 0);
    }
}
