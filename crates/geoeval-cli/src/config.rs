//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External service endpoints
    #[serde(default)]
    pub services: Services,

    /// Retry limits for completion-backed commands
    #[serde(default)]
    pub retry: Retry,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// External service settings.
///
/// API keys are never stored here, only the names of the environment
/// variables that hold them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Services {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_completion_endpoint")]
    pub completion_endpoint: String,

    /// Completion model
    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    /// Embedding model used by the similarity metric
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Environment variable holding the completion API key
    #[serde(default = "default_completion_key_env")]
    pub completion_key_env: String,

    /// Base URL of the Google Maps APIs
    #[serde(default = "default_geocode_endpoint")]
    pub geocode_endpoint: String,

    /// Environment variable holding the Google Maps API key
    #[serde(default = "default_geocode_key_env")]
    pub geocode_key_env: String,
}

/// Retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retry {
    /// Attempts per prediction or rubric dimension
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".geoeval").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist; a missing file at the default path
    /// yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Config file '{}' not found",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::default_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(CliError::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.services.completion_model.is_empty() {
            return Err(CliError::Config("services.completion_model must not be empty".into()));
        }
        if self.services.embedding_model.is_empty() {
            return Err(CliError::Config("services.embedding_model must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for Services {
    fn default() -> Self {
        Self {
            completion_endpoint: default_completion_endpoint(),
            completion_model: default_completion_model(),
            embedding_model: default_embedding_model(),
            completion_key_env: default_completion_key_env(),
            geocode_endpoint: default_geocode_endpoint(),
            geocode_key_env: default_geocode_key_env(),
        }
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_completion_endpoint() -> String {
    geoeval_llm::openai::DEFAULT_ENDPOINT.to_string()
}

fn default_completion_model() -> String {
    geoeval_llm::openai::DEFAULT_MODEL.to_string()
}

fn default_embedding_model() -> String {
    geoeval_llm::openai::DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_completion_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_geocode_endpoint() -> String {
    geoeval_geocode::google::DEFAULT_ENDPOINT.to_string()
}

fn default_geocode_key_env() -> String {
    "GOOGLE_MAPS_API_KEY".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.services.completion_key_env, "OPENAI_API_KEY");
        assert_eq!(config.services.geocode_key_env, "GOOGLE_MAPS_API_KEY");
        assert_eq!(config.services.embedding_model, "text-embedding-3-small");
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[retry]\nmax_attempts = 5\n\n[settings]\nformat = \"json\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert!(config.settings.color);
        assert_eq!(config.services.completion_model, "gpt-4o");
    }

    #[test]
    fn test_service_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[services]\ncompletion_model = \"gpt-4o-mini\"\ngeocode_key_env = \"MAPS_KEY\"\n",
        )
        .unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.services.completion_model, "gpt-4o-mini");
        assert_eq!(loaded.services.geocode_key_env, "MAPS_KEY");
        assert_eq!(loaded.services.completion_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_empty_model_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[services]\ncompletion_model = \"\"\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(CliError::Config(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = Config::load(Some(Path::new("/nonexistent/geoeval.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(CliError::Config(_))));
    }
}
