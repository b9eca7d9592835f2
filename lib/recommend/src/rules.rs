//! Rule resolution.
//!
//! Maps a (model, class index) pair to its explanatory rule payload: the
//! class index becomes a human label through the shared label map, then
//! the model's rule row is probed by label and by stringified class
//! index, first non-null hit wins. This is deliberately the only
//! resolution path in the tree; an earlier revision carried two
//! identical copies of it that had begun to drift.

use std::sync::Arc;

use mane_core::{ModelKind, Result};
use mane_storage::RuleStore;
use serde_json::Value;
use tracing::debug;

pub struct RuleResolver<S: RuleStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RuleStore + ?Sized> RuleResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The rule payload for a prediction, or `None` when the class is
    /// unavailable, the rule row is missing, or no lookup variant
    /// matches. Callers treat `None` as "no recommendation available",
    /// never as an error.
    pub fn resolve(&self, kind: ModelKind, class_index: Option<usize>) -> Result<Option<Value>> {
        let Some(class) = class_index else {
            return Ok(None);
        };
        let label = kind.label_for(class);

        let Some(row) = self.store.rule(kind.rule_name())? else {
            debug!(model = %kind, "no rule row in store");
            return Ok(None);
        };

        let hit = label
            .and_then(|l| row.get(l))
            .filter(|v| !v.is_null())
            .or_else(|| row.get(class.to_string()).filter(|v| !v.is_null()));

        if hit.is_none() {
            debug!(model = %kind, class, label, "rule row has no entry for prediction");
        }
        Ok(hit.cloned())
    }
}
