//! Configuration for the Extractor

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A value field pulled from each round, and the column it is written under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueField {
    /// Field name inside the round object (e.g. "panoId")
    pub field: String,

    /// Output column header; defaults to the field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl ValueField {
    /// A field written under its own name
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header: None,
        }
    }

    /// A field written under a different column header
    pub fn renamed(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header: Some(header.into()),
        }
    }

    /// The output column header
    pub fn header(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.field)
    }
}

/// Configuration for one bounded scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// CSV file to scan
    pub input_path: PathBuf,

    /// CSV file the collected rows are written to
    pub output_path: PathBuf,

    /// Column holding the embedded JSON document
    #[serde(default = "default_payload_column")]
    pub payload_column: String,

    /// Dotted path to the rounds array inside the document
    #[serde(default = "default_rounds_field")]
    pub rounds_field: String,

    /// Round field used as the classification key
    #[serde(default = "default_key_field")]
    pub key_field: String,

    /// Output header for the key column; defaults to `key_field`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_header: Option<String>,

    /// Keys to collect samples for
    #[serde(default)]
    pub keys_of_interest: Vec<String>,

    /// Maximum rows retained per key
    #[serde(default = "default_quota")]
    pub quota: usize,

    /// Records between progress log lines (0 disables)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Round fields copied into each output row
    #[serde(default)]
    pub value_fields: Vec<ValueField>,
}

fn default_payload_column() -> String {
    "data".to_string()
}

fn default_rounds_field() -> String {
    "rounds".to_string()
}

fn default_key_field() -> String {
    "nation".to_string()
}

fn default_quota() -> usize {
    160
}

fn default_progress_interval() -> u64 {
    100_000
}

impl ExtractorConfig {
    /// Output header for the key column
    pub fn key_header(&self) -> &str {
        self.key_header.as_deref().unwrap_or(&self.key_field)
    }

    /// All output headers, key column first
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![self.key_header().to_string()];
        headers.extend(self.value_fields.iter().map(|f| f.header().to_string()));
        headers
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.input_path.as_os_str().is_empty() {
            return Err("input_path must not be empty".to_string());
        }
        if self.output_path.as_os_str().is_empty() {
            return Err("output_path must not be empty".to_string());
        }
        if self.quota == 0 {
            return Err("quota must be greater than 0".to_string());
        }
        if self.payload_column.is_empty() {
            return Err("payload_column must not be empty".to_string());
        }
        if self.key_field.is_empty() {
            return Err("key_field must not be empty".to_string());
        }
        if self.value_fields.iter().any(|f| f.field.is_empty()) {
            return Err("value field names must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for header in self.headers() {
            if !seen.insert(header.clone()) {
                return Err(format!("duplicate output column '{}'", header));
            }
        }
        Ok(())
    }

    /// Collector for panorama ids: `nation, panoID`
    pub fn panoids(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        keys_of_interest: Vec<String>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            payload_column: default_payload_column(),
            rounds_field: default_rounds_field(),
            key_field: default_key_field(),
            key_header: None,
            value_fields: vec![ValueField::renamed("panoId", "panoID")],
            keys_of_interest,
            quota: default_quota(),
            progress_interval: default_progress_interval(),
        }
    }

    /// Collector for panorama ids with coordinates: `nation, panoID, lat, lng`
    pub fn panoids_with_coords(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        keys_of_interest: Vec<String>,
    ) -> Self {
        let mut config = Self::panoids(input_path, output_path, keys_of_interest);
        config.value_fields.push(ValueField::new("lat"));
        config.value_fields.push(ValueField::new("lng"));
        config
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExtractorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExtractorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents).map_err(ExtractorError::Config)?;
        config.validate().map_err(ExtractorError::Config)?;
        Ok(config)
    }
}
