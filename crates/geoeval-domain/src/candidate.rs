//! Candidate module - one extracted item from a payload round

use std::fmt;

/// A candidate item: the classification key plus its value fields
///
/// Values are kept as already-rendered strings so the output table can be
/// written without knowing the payload's original types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// Classification key (e.g. a country name)
    pub key: String,

    /// Value fields, in the configured column order
    pub values: Vec<String>,
}

impl Candidate {
    /// Create a new candidate
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    /// Flatten into an output row, key first
    pub fn into_row(self) -> Vec<String> {
        let mut row = Vec::with_capacity(self.values.len() + 1);
        row.push(self.key);
        row.extend(self.values);
        row
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        for value in &self.values {
            write!(f, ", {}", value)?;
        }
        Ok(())
    }
}
