//! Survey feature encoding.
//!
//! Turns a raw questionnaire record into the fixed-order numeric vector the
//! tabular classifier was trained on. The fitted transform (scaler
//! parameters, category tables, canonical column order) is captured in
//! [`EncoderState`], which is immutable after fitting and persisted as a
//! binary blob so every inference call reproduces the exact training-time
//! column layout.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;

use ahash::AHashMap;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::survey::FieldLookup;

/// Code emitted for an ordinal category unseen at fit time.
pub const ORDINAL_UNKNOWN: f32 = -1.0;

/// Which survey fields are encoded, and how.
///
/// Free-text fields are simply not listed here; they are excluded from
/// encoding altogether.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Continuous fields, standard-scored.
    pub numeric: Vec<String>,
    /// Ordered categorical fields, mapped to integer codes.
    pub ordinal: Vec<String>,
    /// Unordered categorical fields, binarized into indicator columns.
    pub nominal: Vec<String>,
    /// Two-valued fields, binarized like nominal fields.
    pub binary: Vec<String>,
    /// The training label field; its encoded column is dropped before
    /// inference if it survived encoding.
    pub target: Option<String>,
}

impl FeatureSchema {
    /// The production questionnaire layout the shipped encoder state was
    /// fitted with.
    pub fn questionnaire_v1() -> Self {
        let s = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            numeric: s(&["consumed_water_per_day_l"]),
            ordinal: s(&[
                "current_hair_condition",
                "age",
                "hair_porosity",
                "hair_texture",
                "hair_density",
                "hairline_condition",
                "hair_breakage",
                "hair_loss_state",
                "current_hair_length",
                "hair_goal",
                "country",
                "hair_type",
                "heat_styling_frequency",
                "tight_hairstyle_frequency",
                "hair_moisturizer_frequency",
                "scalp_massage_frequency",
                "hair_wash_frequency",
                "breakage_occurrence",
            ]),
            nominal: s(&[
                "race",
                "gender",
                "hair_edges_condition",
                "hair_look",
                "scalp_condition",
                "chemically_treated",
                "professional_treatments",
                "protective_hairstyle_primary",
                "protective_hairstyle_secondary",
                "protective_hairstyle_condition",
                "protective_hairstyle_maintenance",
                "breakage_causes",
                "comb_type",
                "detangling_style",
                "eating_diet",
            ]),
            binary: s(&[
                "keratin_treatment",
                "family_history_hair_loss",
                "satin_scarf_or_pillowcase",
            ]),
            target: Some("current_hair_condition".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    mean: f64,
    /// Population standard deviation; 1.0 when the column is constant.
    scale: f64,
}

/// Per-column indicator encoding over a fitted, sorted class list.
///
/// Two-class columns collapse to a single indicator named after the second
/// class (drop-first behavior); larger vocabularies get one column per
/// class. A category unseen at fit time is remapped to the first known
/// class, which is a deliberate fallback rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LabelBinarizer {
    classes: Vec<String>,
}

impl LabelBinarizer {
    fn fit<I: IntoIterator<Item = String>>(values: I) -> Self {
        let classes: BTreeSet<String> =
            values.into_iter().map(|v| normalize_category(&v)).collect();
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    fn column_names(&self, column: &str) -> Vec<String> {
        if self.classes.len() == 2 {
            vec![format!("{}_{}", column, self.classes[1])]
        } else {
            self.classes
                .iter()
                .map(|class| format!("{}_{}", column, class))
                .collect()
        }
    }

    fn encode(&self, column: &str, raw: &str) -> Vec<f32> {
        let value = normalize_category(raw);
        let value = if self.classes.iter().any(|c| *c == value) {
            value
        } else {
            debug!(column, category = %raw, "unseen category, remapping to first known class");
            match self.classes.first() {
                Some(first) => first.clone(),
                None => return Vec::new(),
            }
        };

        if self.classes.len() == 2 {
            vec![if value == self.classes[1] { 1.0 } else { 0.0 }]
        } else {
            self.classes
                .iter()
                .map(|class| if *class == value { 1.0 } else { 0.0 })
                .collect()
        }
    }
}

fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// The fitted transform. Immutable once constructed; safe to share
/// read-only across concurrent inference calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderState {
    schema: FeatureSchema,
    scalers: HashMap<String, ScalerParams>,
    ordinal_categories: HashMap<String, Vec<String>>,
    binarizers: HashMap<String, LabelBinarizer>,
    feature_columns: Vec<String>,
}

impl EncoderState {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Canonical output column order, fixed at fit time.
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Encode one record into the canonical column layout.
    ///
    /// Reindex-with-fill-zero semantics: a canonical column this record
    /// produced no value for is 0.0, and any derived column outside the
    /// canonical layout is dropped.
    pub fn transform(&self, record: &dyn FieldLookup) -> Vec<f32> {
        let mut derived: AHashMap<String, f32> =
            AHashMap::with_capacity(self.feature_columns.len());

        for column in &self.schema.numeric {
            let raw = record.field_numeric(column).unwrap_or(0.0);
            if let Some(params) = self.scalers.get(column) {
                let scaled = (raw - params.mean) / params.scale;
                derived.insert(column.clone(), scaled as f32);
            }
        }

        for column in &self.schema.ordinal {
            let code = match record.field_text(column) {
                Some(raw) => {
                    let categories = self.ordinal_categories.get(column);
                    match categories.and_then(|c| c.iter().position(|v| *v == raw)) {
                        Some(code) => code as f32,
                        None => {
                            debug!(column = %column, category = %raw, "unseen ordinal category, using unknown code");
                            ORDINAL_UNKNOWN
                        }
                    }
                }
                None => ORDINAL_UNKNOWN,
            };
            derived.insert(column.clone(), code);
        }

        for column in self.schema.nominal.iter().chain(&self.schema.binary) {
            if let Some(binarizer) = self.binarizers.get(column) {
                let raw = record.field_text(column).unwrap_or_default();
                let values = binarizer.encode(column, &raw);
                for (name, value) in binarizer.column_names(column).into_iter().zip(values) {
                    derived.insert(name, value);
                }
            }
        }

        self.feature_columns
            .iter()
            .map(|column| derived.get(column).copied().unwrap_or(0.0))
            .collect()
    }
}

/// Stateful encoder: fit once on training rows, transform forever after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    state: Option<EncoderState>,
}

impl FeatureEncoder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            state: None,
        }
    }

    pub fn from_state(state: EncoderState) -> Self {
        Self {
            schema: state.schema.clone(),
            state: Some(state),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn state(&self) -> Result<&EncoderState> {
        self.state.as_ref().ok_or(Error::NotFitted)
    }

    pub fn feature_columns(&self) -> Result<&[String]> {
        Ok(self.state()?.feature_columns())
    }

    /// Compute per-field statistics and mappings plus the canonical output
    /// column layout from the training rows.
    pub fn fit<R: FieldLookup>(&mut self, rows: &[R]) -> Result<()> {
        if rows.is_empty() {
            return Err(Error::InvalidConfig(
                "cannot fit encoder on an empty training set".to_string(),
            ));
        }

        let mut scalers = HashMap::new();
        for column in &self.schema.numeric {
            let values: Vec<f64> = rows
                .iter()
                .map(|r| r.field_numeric(column).unwrap_or(0.0))
                .collect();
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let variance =
                values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
            let scale = variance.sqrt();
            let scale = if scale == 0.0 { 1.0 } else { scale };
            scalers.insert(column.clone(), ScalerParams { mean, scale });
        }

        let mut ordinal_categories = HashMap::new();
        for column in &self.schema.ordinal {
            let categories: BTreeSet<String> =
                rows.iter().filter_map(|r| r.field_text(column)).collect();
            ordinal_categories.insert(column.clone(), categories.into_iter().collect());
        }

        let mut binarizers = HashMap::new();
        for column in self.schema.nominal.iter().chain(&self.schema.binary) {
            let values = rows.iter().filter_map(|r| r.field_text(column));
            binarizers.insert(column.clone(), LabelBinarizer::fit(values));
        }

        // One pass over the derived layout records the canonical column
        // order every future transform must reproduce.
        let mut feature_columns =
            Vec::with_capacity(self.schema.numeric.len() + self.schema.ordinal.len());
        feature_columns.extend(self.schema.numeric.iter().cloned());
        feature_columns.extend(self.schema.ordinal.iter().cloned());
        for column in self.schema.nominal.iter().chain(&self.schema.binary) {
            if let Some(binarizer) = binarizers.get(column) {
                feature_columns.extend(binarizer.column_names(column));
            }
        }

        self.state = Some(EncoderState {
            schema: self.schema.clone(),
            scalers,
            ordinal_categories,
            binarizers,
            feature_columns,
        });
        Ok(())
    }

    /// Encode one record; fails with [`Error::NotFitted`] before `fit`.
    pub fn transform(&self, record: &dyn FieldLookup) -> Result<Vec<f32>> {
        Ok(self.state()?.transform(record))
    }

    pub fn fit_transform<R: FieldLookup>(&mut self, rows: &[R]) -> Result<Vec<Vec<f32>>> {
        self.fit(rows)?;
        let state = self.state()?;
        Ok(rows.iter().map(|r| state.transform(r)).collect())
    }

    /// Persist the fitted encoder as a binary blob, atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if !self.is_fitted() {
            return Err(Error::NotFitted);
        }
        let bytes = bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))?;
        let file = AtomicFile::new(path, OverwriteBehavior::AllowOverwrite);
        file.write(|f| f.write_all(&bytes))
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(())
    }

    /// Restore a previously saved encoder with full fidelity.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        bincode::deserialize(&bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}
