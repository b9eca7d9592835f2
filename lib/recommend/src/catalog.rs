//! The in-memory catalog index.
//!
//! Built exactly once at process startup from the external product
//! catalog and shared read-only for the process lifetime: construct it
//! before serving traffic, pass it by handle to every call site, tear it
//! down at process exit. Per-call similarity scores are never written
//! back here.

use ahash::AHashSet;
use mane_core::Result;
use mane_storage::{CatalogRow, CatalogSource};
use rayon::prelude::*;
use tracing::info;

use crate::tfidf::{SparseVector, TfIdfVectorizer};

/// One deduplicated catalog entry: an ingredient and its comma-separated
/// function tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub ingredient: String,
    pub functions: String,
}

/// The static term-vector index over the catalog. Entry order is the
/// catalog's own order, which makes every ranking tie-break reproducible.
#[derive(Debug)]
pub struct CatalogIndex {
    vectorizer: TfIdfVectorizer,
    entries: Vec<CatalogEntry>,
    vectors: Vec<SparseVector>,
}

impl CatalogIndex {
    /// Build the index: drop rows with empty ingredient or function text,
    /// deduplicate (ingredient, functions) pairs keeping the first
    /// occurrence, fit the vectorizer and vectorize every entry.
    pub fn build(rows: Vec<CatalogRow>) -> Self {
        let mut seen: AHashSet<(String, String)> = AHashSet::new();
        let mut entries = Vec::new();
        for row in rows {
            let ingredient = row.ingredient.trim();
            let functions = row.functions.trim();
            if ingredient.is_empty() || functions.is_empty() {
                continue;
            }
            if seen.insert((ingredient.to_string(), functions.to_string())) {
                entries.push(CatalogEntry {
                    ingredient: ingredient.to_string(),
                    functions: functions.to_string(),
                });
            }
        }

        let documents: Vec<&str> = entries.iter().map(|e| e.functions.as_str()).collect();
        let vectorizer = TfIdfVectorizer::fit(&documents);
        let vectors: Vec<SparseVector> = entries
            .par_iter()
            .map(|entry| vectorizer.transform(&entry.functions))
            .collect();

        info!(
            entries = entries.len(),
            vocabulary = vectorizer.vocabulary_len(),
            "catalog index built"
        );

        Self {
            vectorizer,
            entries,
            vectors,
        }
    }

    pub fn from_source(source: &dyn CatalogSource) -> Result<Self> {
        Ok(Self::build(source.catalog_rows()?))
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
