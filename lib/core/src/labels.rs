//! Model naming, label maps and id assignments.
//!
//! This is the single source of truth for everything keyed by model: the
//! class-index to label tables, the rule-store row names, the artifact file
//! names and the numeric model ids persisted with recommendation rows.
//! Earlier revisions of the system kept two independently maintained label
//! tables that had started to drift; every call site now reads this one.

use serde::{Deserialize, Serialize};

/// The four frozen classifiers in the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Tabular hair-health classifier over the encoded survey.
    Dnn,
    /// Porosity lookup classifier over a single survey field.
    Porosity,
    /// Breakage lookup classifier over a single survey field.
    Breakage,
    /// Scalp-condition image classifier over the uploaded photo.
    Disease,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Dnn,
        ModelKind::Porosity,
        ModelKind::Breakage,
        ModelKind::Disease,
    ];

    /// Row key in the rule store.
    pub fn rule_name(&self) -> &'static str {
        match self {
            ModelKind::Dnn => "dnn_model",
            ModelKind::Porosity => "porosity_model",
            ModelKind::Breakage => "breakage_model",
            ModelKind::Disease => "disease_model",
        }
    }

    /// Well-known artifact file name under the model directory.
    pub fn artifact_file(&self) -> &'static str {
        match self {
            ModelKind::Dnn => "hair_health_dnn_v1.onnx",
            ModelKind::Porosity => "porosity_v1.json",
            ModelKind::Breakage => "breakage_v1.json",
            ModelKind::Disease => "scalp_condition_cnn_v1.onnx",
        }
    }

    /// Key under `classes` / `labels` / `recommendations` in the bundle.
    pub fn bundle_key(&self) -> &'static str {
        match self {
            ModelKind::Dnn => "dnn",
            ModelKind::Porosity => "porosity",
            ModelKind::Breakage => "breakage",
            ModelKind::Disease => "disease",
        }
    }

    /// Numeric id used by recommendation rows.
    //
    // TODO: confirm the disease id with the product owner. Historical rows
    // were written with 5 while the generating code used 4; until that is
    // resolved this table stays the only place the number appears.
    pub fn model_id(&self) -> i64 {
        match self {
            ModelKind::Dnn => 1,
            ModelKind::Porosity => 2,
            ModelKind::Breakage => 3,
            ModelKind::Disease => 4,
        }
    }

    pub fn from_model_id(id: i64) -> Option<ModelKind> {
        ModelKind::ALL.iter().copied().find(|k| k.model_id() == id)
    }

    /// Human label for a predicted class index, `None` for an index the
    /// model never emits.
    pub fn label_for(&self, class_index: usize) -> Option<&'static str> {
        let label = match self {
            ModelKind::Dnn => match class_index {
                0 => "Damaged",
                1 => "Dry",
                2 => "Moisturized",
                3 => "Healthy",
                _ => return None,
            },
            ModelKind::Porosity => match class_index {
                0 => "low",
                1 => "medium",
                2 => "high",
                _ => return None,
            },
            ModelKind::Breakage => match class_index {
                0 => "Extreme- High Breakage",
                1 => "Extreme- Low Breakage",
                2 => "High Breakage",
                3 => "Low Breakage",
                4 => "Medium Breakage",
                _ => return None,
            },
            ModelKind::Disease => match class_index {
                0 => "Alopecia Areata",
                1 => "Contact Dermatitis",
                2 => "Folliculitis",
                3 => "Head Lice",
                4 => "Lichen Planus",
                5 => "Male Pattern Baldness",
                6 => "Psoriasis",
                7 => "Seborrheic Dermatitis",
                8 => "Telogen Effluvium",
                9 => "Tinea Capitis",
                _ => return None,
            },
        };
        Some(label)
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.rule_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup() {
        assert_eq!(ModelKind::Dnn.label_for(3), Some("Healthy"));
        assert_eq!(ModelKind::Porosity.label_for(0), Some("low"));
        assert_eq!(ModelKind::Breakage.label_for(4), Some("Medium Breakage"));
        assert_eq!(ModelKind::Disease.label_for(9), Some("Tinea Capitis"));
        assert_eq!(ModelKind::Dnn.label_for(4), None);
    }

    #[test]
    fn test_model_id_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(ModelKind::from_model_id(kind.model_id()), Some(kind));
        }
        assert_eq!(ModelKind::from_model_id(99), None);
    }

    #[test]
    fn test_rule_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            ModelKind::ALL.iter().map(|k| k.rule_name()).collect();
        assert_eq!(names.len(), 4);
    }
}
