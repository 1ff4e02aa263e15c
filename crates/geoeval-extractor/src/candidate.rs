//! Turn a round object into a candidate item

use geoeval_domain::Candidate;
use serde_json::{Map, Value};

/// Extracts at most one candidate from a round object
pub trait CandidateExtractor {
    /// Return the candidate, or `None` when the round has no usable key
    fn extract(&self, round: &Map<String, Value>) -> Option<Candidate>;
}

impl<F> CandidateExtractor for F
where
    F: Fn(&Map<String, Value>) -> Option<Candidate>,
{
    fn extract(&self, round: &Map<String, Value>) -> Option<Candidate> {
        self(round)
    }
}

/// Reads a key field and a fixed list of value fields from each round
///
/// The key must be a string or a number. Missing or null value fields become
/// empty cells so every row has the same width.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    key_field: String,
    value_fields: Vec<String>,
}

impl FieldExtractor {
    /// Create an extractor for `key_field` and the given value fields
    pub fn new<I, S>(key_field: impl Into<String>, value_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_field: key_field.into(),
            value_fields: value_fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl CandidateExtractor for FieldExtractor {
    fn extract(&self, round: &Map<String, Value>) -> Option<Candidate> {
        let key = match round.get(&self.key_field)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let values = self
            .value_fields
            .iter()
            .map(|field| render_cell(round.get(field)))
            .collect();

        Some(Candidate::new(key, values))
    }
}

/// Render a JSON value as a CSV cell
pub fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}
