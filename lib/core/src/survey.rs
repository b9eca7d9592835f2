use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw questionnaire response: a flat field-name to value mapping plus
/// the identifiers the rest of the system keys on.
///
/// The record is owned by the caller. The encoder and the prediction
/// pipeline only ever read it through [`FieldLookup`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub survey_id: i64,
    pub user_id: i64,
    /// Unix seconds; zero when the source did not record one.
    #[serde(default)]
    pub created_at: u64,
    /// Raw answers keyed by question field name.
    pub fields: Map<String, Value>,
}

impl SurveyRecord {
    pub fn new(survey_id: i64, user_id: i64) -> Self {
        Self {
            survey_id,
            user_id,
            created_at: 0,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}

/// Read-only access to a survey field by name.
///
/// A survey reaches the pipeline either as a typed [`SurveyRecord`] or as a
/// raw JSON mapping (e.g. straight off a request body or a store row). Both
/// representations implement this one capability, and everything downstream
/// depends only on it.
pub trait FieldLookup {
    fn field(&self, name: &str) -> Option<&Value>;

    /// The field rendered as text: strings pass through, numbers and bools
    /// are formatted, null and missing are `None`.
    fn field_text(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The field coerced to a number; non-numeric input coerces to `None`.
    fn field_numeric(&self, name: &str) -> Option<f64> {
        match self.field(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl FieldLookup for SurveyRecord {
    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl FieldLookup for Value {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl FieldLookup for Map<String, Value> {
    fn field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}
