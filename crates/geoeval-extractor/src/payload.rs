//! Decode embedded JSON payloads into rounds

use serde_json::{Map, Value};

/// A decoded payload column
///
/// Undecodable payloads are a variant rather than an error so the scan can
/// skip them without unwinding.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadDocument {
    /// The payload could not be decoded; carries the reason
    Invalid(String),
    /// The payload decoded and its rounds were located
    Document {
        /// Rounds in document order
        rounds: Vec<RoundVariant>,
    },
}

/// One entry of the rounds array
#[derive(Debug, Clone, PartialEq)]
pub enum RoundVariant {
    /// A JSON object; the only shape candidates are extracted from
    Mapping(Map<String, Value>),
    /// Anything else (number, string, array, null)
    NotAMapping,
}

impl From<Value> for RoundVariant {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RoundVariant::Mapping(map),
            _ => RoundVariant::NotAMapping,
        }
    }
}

impl PayloadDocument {
    /// Decode a raw payload string, locating its rounds with `selector`
    pub fn decode<S>(raw: &str, selector: &S) -> Self
    where
        S: RoundSelector + ?Sized,
    {
        let root: Value = match serde_json::from_str(raw) {
            Ok(root) => root,
            Err(e) => return PayloadDocument::Invalid(format!("JSON parse error: {}", e)),
        };

        match selector.select(root) {
            Ok(rounds) => PayloadDocument::Document {
                rounds: rounds.into_iter().map(RoundVariant::from).collect(),
            },
            Err(reason) => PayloadDocument::Invalid(reason),
        }
    }
}

/// Locates the rounds inside a decoded document
pub trait RoundSelector {
    /// Return the rounds, or the reason the document has the wrong shape
    fn select(&self, root: Value) -> Result<Vec<Value>, String>;
}

impl<F> RoundSelector for F
where
    F: Fn(Value) -> Result<Vec<Value>, String>,
{
    fn select(&self, root: Value) -> Result<Vec<Value>, String> {
        self(root)
    }
}

/// Selects the array found at a dotted field path, e.g. `rounds` or
/// `game.rounds`
///
/// A missing or null field yields no rounds; a non-object document or a
/// non-array field makes the payload invalid.
#[derive(Debug, Clone)]
pub struct RoundsField {
    path: Vec<String>,
}

impl RoundsField {
    /// Create a selector for the given dotted path
    pub fn new(path: &str) -> Self {
        Self {
            path: path.split('.').map(str::to_string).collect(),
        }
    }
}

impl Default for RoundsField {
    fn default() -> Self {
        Self::new("rounds")
    }
}

impl RoundSelector for RoundsField {
    fn select(&self, root: Value) -> Result<Vec<Value>, String> {
        let mut current = root;
        for segment in &self.path {
            let mut obj = match current {
                Value::Object(obj) => obj,
                _ => return Err(format!("expected a JSON object above '{}'", segment)),
            };
            current = match obj.remove(segment) {
                Some(value) => value,
                None => return Ok(Vec::new()),
            };
        }

        match current {
            Value::Array(rounds) => Ok(rounds),
            Value::Null => Ok(Vec::new()),
            _ => Err(format!("'{}' is not an array", self.path.join("."))),
        }
    }
}
