//! Store snapshots.
//!
//! The reference store can be written to disk as one gzip-compressed JSON
//! snapshot and restored from it at startup. The write goes through a
//! temporary file and an atomic replace, so a crash mid-write can never
//! leave a partial snapshot behind.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use mane_core::{Error, Result, SurveyRecord};
use tracing::info;

use crate::memory::{MemoryStore, StoreState};
use crate::store::CatalogRow;

pub struct SnapshotPersistence {
    path: PathBuf,
}

impl SnapshotPersistence {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the store state as a compressed snapshot, atomically.
    pub fn save(&self, store: &MemoryStore) -> Result<()> {
        let state = store.export_state();
        let json = serde_json::to_vec(&state).map_err(|e| Error::Serialization(e.to_string()))?;

        let file = AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite);
        file.write(|f| {
            let mut encoder = GzEncoder::new(f, Compression::default());
            encoder.write_all(&json)?;
            encoder.finish().map(|_| ())
        })
        .map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(())
    }

    /// Restore a store from the snapshot, or `None` when no snapshot file
    /// exists yet.
    pub fn load(&self) -> Result<Option<MemoryStore>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(&self.path)?;
        let mut decoder = GzDecoder::new(file);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json)?;

        let state: StoreState =
            serde_json::from_slice(&json).map_err(|e| Error::Serialization(e.to_string()))?;
        info!(
            surveys = state.surveys.len(),
            recommendations = state.recommendations.len(),
            "snapshot loaded"
        );
        Ok(Some(MemoryStore::from_state(state)))
    }
}

/// Seed a fresh store from plain JSON files in a data directory:
/// `surveys.json` (array of survey records), `rules.json` (object keyed by
/// rule name) and `catalog.json` (array of catalog rows). Missing files
/// seed nothing for that section.
pub fn seed_from_dir(dir: &Path) -> Result<MemoryStore> {
    let store = MemoryStore::new();

    let surveys_path = dir.join("surveys.json");
    if surveys_path.exists() {
        let surveys: Vec<SurveyRecord> = read_json(&surveys_path)?;
        info!(count = surveys.len(), "seeding surveys");
        for survey in surveys {
            store.insert_survey(survey);
        }
    }

    let rules_path = dir.join("rules.json");
    if rules_path.exists() {
        let rules: serde_json::Map<String, serde_json::Value> = read_json(&rules_path)?;
        info!(count = rules.len(), "seeding rules");
        for (name, payload) in rules {
            store.insert_rule(&name, payload);
        }
    }

    let catalog_path = dir.join("catalog.json");
    if catalog_path.exists() {
        let rows: Vec<CatalogRow> = read_json(&catalog_path)?;
        info!(count = rows.len(), "seeding catalog");
        store.set_catalog(rows);
    }

    Ok(store)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CatalogSource, NewRecommendation, RecommendationStore, RuleStore, SurveyStore};
    use serde_json::json;

    #[test]
    fn test_snapshot_round_trip() {
        let store = MemoryStore::new();
        store.insert_survey(SurveyRecord::new(1, 7).with_field("hair_porosity", "low"));
        store.insert_rule("porosity_model", json!({"low": {"care_tips": ["seal ends"]}}));
        store
            .append_bundle(vec![NewRecommendation {
                survey_id: 1,
                user_id: 7,
                model_id: 2,
                iteration: 1,
                model_prediction: Some("low".to_string()),
                recommendation_json: json!({"care_tips": ["seal ends"]}),
            }])
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let persistence = SnapshotPersistence::new(dir.path().join("store.snapshot"));
        assert!(!persistence.exists());
        persistence.save(&store).unwrap();
        assert!(persistence.exists());

        let restored = persistence.load().unwrap().unwrap();
        assert_eq!(restored.recommendation_count(), 1);
        let survey = restored.survey(1).unwrap().unwrap();
        assert_eq!(survey.user_id, 7);
        let rule = restored.rule("porosity_model").unwrap().unwrap();
        assert_eq!(rule["low"]["care_tips"][0], "seal ends");

        // Ids keep advancing past the restored ones.
        let ids = restored
            .append_bundle(vec![NewRecommendation {
                survey_id: 1,
                user_id: 7,
                model_id: 1,
                iteration: 1,
                model_prediction: None,
                recommendation_json: json!({}),
            }])
            .unwrap();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_load_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = SnapshotPersistence::new(dir.path().join("absent.snapshot"));
        assert!(persistence.load().unwrap().is_none());
    }

    #[test]
    fn test_seed_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rules.json"),
            serde_json::to_vec(&json!({"dnn_model": {"Healthy": ["Moisturizing"]}})).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("catalog.json"),
            serde_json::to_vec(&json!([
                {"ingredient": "Aloe Vera", "functions": "Moisturizing, Soothing"}
            ]))
            .unwrap(),
        )
        .unwrap();

        let store = seed_from_dir(dir.path()).unwrap();
        assert!(store.rule("dnn_model").unwrap().is_some());
        assert_eq!(store.catalog_rows().unwrap().len(), 1);
    }
}
