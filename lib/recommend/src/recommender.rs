//! Content-based ingredient ranking.
//!
//! Given the target function tags resolved for a prediction, ranks every
//! catalog entry by cosine similarity in the TF-IDF space, keeps a fixed
//! candidate pool, groups the pool by function, and returns the window
//! of each group selected by the iteration counter.

use std::collections::BTreeMap;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::catalog::CatalogIndex;
use crate::tfidf::sparse_dot;

/// Highest-similarity entries considered before grouping and paging,
/// independent of the page size.
pub const CANDIDATE_POOL: usize = 50;

/// Default page size per function group.
pub const DEFAULT_PAGE_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedIngredient {
    #[serde(rename = "Ingredient")]
    pub ingredient: String,
    /// Cosine similarity, rounded to three decimals on the wire.
    #[serde(rename = "Score")]
    pub score: f64,
}

/// The ranking result: either per-function pages, or an explicit
/// "no rule found" payload when no target functions could be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RankOutcome {
    NoRule { error: String },
    Ranked(BTreeMap<String, Vec<RankedIngredient>>),
}

impl RankOutcome {
    pub fn no_rule(condition: impl std::fmt::Display) -> Self {
        RankOutcome::NoRule {
            error: format!("No ingredient rules found for: {}", condition),
        }
    }

    pub fn is_no_rule(&self) -> bool {
        matches!(self, RankOutcome::NoRule { .. })
    }
}

/// Normalize a rule payload into a list of target function tags. Accepts
/// a JSON array of strings, a JSON-encoded array inside a string, or a
/// comma-separated string.
pub fn normalize_targets(payload: &Value) -> Vec<String> {
    match payload {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(text) => {
            if let Ok(parsed) = serde_json::from_str::<Value>(text) {
                if parsed.is_array() {
                    return normalize_targets(&parsed);
                }
            }
            text.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Ranks catalog entries against target functions. Holds only a handle to
/// the shared index; all per-call state lives on the call stack.
#[derive(Debug, Clone)]
pub struct ContentRecommender {
    index: Arc<CatalogIndex>,
}

impl ContentRecommender {
    pub fn new(index: Arc<CatalogIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Rank and page the catalog for the given target functions.
    ///
    /// `iteration` selects the page within each function group:
    /// `[(iteration - 1) * page_size .. iteration * page_size]`. A window
    /// past the available items yields an empty list for that function,
    /// which is the exhaustion boundary, not an error.
    pub fn rank(&self, target_functions: &Value, iteration: i64, page_size: usize) -> RankOutcome {
        let targets = normalize_targets(target_functions);
        if targets.is_empty() {
            return RankOutcome::no_rule(compact(target_functions));
        }
        let iteration = iteration.max(1) as usize;

        // Similarity scores live in this call frame only; the shared
        // index must never see them.
        let query = self.index.vectorizer().transform(&targets.join(" "));
        let scores: Vec<f32> = self
            .index
            .vectors()
            .iter()
            .map(|vector| sparse_dot(&query, vector))
            .collect();

        // Top candidates by score; the stable sort keeps catalog order
        // as the tie-break, so rankings are exactly reproducible.
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(scores[i])));
        order.truncate(CANDIDATE_POOL);

        let mut groups: BTreeMap<String, Vec<RankedIngredient>> = BTreeMap::new();
        for &i in &order {
            let entry = &self.index.entries()[i];
            for function in entry.functions.split(", ") {
                if targets.iter().any(|t| t == function) {
                    groups.entry(function.to_string()).or_default().push(
                        RankedIngredient {
                            ingredient: entry.ingredient.clone(),
                            score: scores[i] as f64,
                        },
                    );
                }
            }
        }
        debug!(
            targets = targets.len(),
            matched_functions = groups.len(),
            iteration,
            "ranked catalog pool"
        );

        let start = (iteration - 1) * page_size;
        let paged = groups
            .into_iter()
            .map(|(function, mut items)| {
                items.sort_by_key(|item| std::cmp::Reverse(OrderedFloat(item.score)));
                let page = items
                    .into_iter()
                    .skip(start)
                    .take(page_size)
                    .map(|mut item| {
                        item.score = round3(item.score);
                        item
                    })
                    .collect();
                (function, page)
            })
            .collect();

        RankOutcome::Ranked(paged)
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
