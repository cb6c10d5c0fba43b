//! KGQ Configuration Management
//!
//! Handles configuration from environment variables and config files,
//! with sensible defaults for local use.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Triple store locations
    pub store: StoreConfig,

    /// Extraction pipeline configuration
    pub extraction: ExtractionConfig,

    /// Linguistic annotation service
    pub annotator: AnnotatorConfig,

    /// Knowledge graph display configuration
    pub display: DisplayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    /// Parse TOML content; missing sections and keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Store
        if let Some(path) = lookup("KGQ_DATABASE_PATH") {
            self.store.database_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("KGQ_SESSION_DIR") {
            self.store.session_dir = PathBuf::from(dir);
        }
        if let Some(topic) = lookup("KGQ_TOPIC") {
            self.store.default_topic = topic;
        }

        // Extraction
        if let Some(path) = lookup("KGQ_COMPOUND_KEYWORDS") {
            self.extraction.compound_keywords = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("KGQ_SIMPLE_KEYWORDS") {
            self.extraction.simple_keywords = Some(PathBuf::from(path));
        }

        // Annotator
        if let Some(url) = lookup("KGQ_ANNOTATOR_URL") {
            self.annotator.url = url;
        }
        if let Some(timeout) = lookup("KGQ_ANNOTATOR_TIMEOUT") {
            self.annotator.timeout_secs =
                timeout.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "KGQ_ANNOTATOR_TIMEOUT".to_string(),
                    value: timeout,
                })?;
        }

        // Display
        if let Some(cap) = lookup("KGQ_RELATION_CAP") {
            self.display.relation_cap = cap.parse().map_err(|_| ConfigError::InvalidValue {
                key: "KGQ_RELATION_CAP".to_string(),
                value: cap,
            })?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.default_topic.trim().is_empty() {
            return Err(ConfigError::MissingRequired("store.default_topic".to_string()));
        }
        if self.annotator.url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("annotator.url".to_string()));
        }
        Ok(())
    }
}

/// Triple store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Shared JSON database file
    pub database_path: PathBuf,

    /// Directory for per-session private stores
    pub session_dir: PathBuf,

    /// Topic used when none is given
    pub default_topic: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/triples.json"),
            session_dir: std::env::temp_dir().join("kgq-sessions"),
            default_topic: "finance".to_string(),
        }
    }
}

/// Extraction pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Multi-word keyword list, one term per line
    pub compound_keywords: Option<PathBuf>,

    /// Single-word keyword list, one term per line
    pub simple_keywords: Option<PathBuf>,

    /// Also match plural forms of simple keywords
    pub include_plurals: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            compound_keywords: None,
            simple_keywords: None,
            include_plurals: true,
        }
    }
}

/// Annotation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Endpoint accepting `{"text": ...}` and returning an annotated document
    pub url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8765/annotate".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Knowledge graph display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Maximum distinct relation nodes per panel
    pub relation_cap: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { relation_cap: 3 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.display.relation_cap, 3);
        assert_eq!(config.store.default_topic, "finance");
        assert!(config.extraction.include_plurals);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [store]
            database_path = "/var/lib/kgq/db.json"

            [display]
            relation_cap = 5
            "#,
        )
        .unwrap();

        assert_eq!(
            config.store.database_path,
            PathBuf::from("/var/lib/kgq/db.json")
        );
        assert_eq!(config.store.default_topic, "finance");
        assert_eq!(config.display.relation_cap, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(AppConfig::from_toml_str("[display]\nrelation_cap = \"many\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default()
            .with_overrides(lookup(&[
                ("KGQ_TOPIC", "economy"),
                ("KGQ_RELATION_CAP", "4"),
                ("KGQ_ANNOTATOR_URL", "http://nlp:9000/parse"),
                ("LOG_LEVEL", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.store.default_topic, "economy");
        assert_eq!(config.display.relation_cap, 4);
        assert_eq!(config.annotator.url, "http://nlp:9000/parse");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_override_invalid_number() {
        let err = AppConfig::default()
            .with_overrides(lookup(&[("KGQ_ANNOTATOR_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_empty_topic_rejected() {
        let err = AppConfig::default()
            .with_overrides(lookup(&[("KGQ_TOPIC", " ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }
}
