//! YAML configuration for shinglecheck.
//!
//! One file configures every stage: normalization, shingling, matching, the
//! fingerprint store, the analyzer and logging. Every section is optional and
//! falls back to the library defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! canonical:
//!   version: 1
//!   normalize_unicode: true
//!   strip_markup: true
//!   min_token_chars: 3
//!   extra_stop_words: ["также"]
//!
//! shingle:
//!   version: 1
//!   n: 4
//!   seed: 0
//!   use_parallel: false
//!
//! matcher:
//!   min_similarity_percent: 5.0
//!   source_label_prefix: "Document"
//!
//! store:
//!   backend: "redb"
//!   path: "/var/lib/shinglecheck/shingles.redb"
//!   compression: "zstd"
//!   level: 3
//!
//! analysis:
//!   store_timeout_ms: 30000
//!
//! logging:
//!   level: "info"
//!   json: false
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use canonical::NormalizeConfig;
use index::{BackendConfig, CompressionCodec, CompressionConfig, StoreConfig};
use matcher::{AnalyzerConfig, MatchConfig};
use serde::{Deserialize, Serialize};
use shingle::ShingleConfig;
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ShingleCheckConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub canonical: NormalizeConfig,

    #[serde(default)]
    pub shingle: ShingleConfig,

    #[serde(default)]
    pub matcher: MatchConfig,

    #[serde(default)]
    pub store: StoreYamlConfig,

    #[serde(default)]
    pub analysis: AnalysisYamlConfig,

    #[serde(default)]
    pub logging: LoggingYamlConfig,
}

impl ShingleCheckConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: ShingleCheckConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.canonical
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("canonical: {e}")))?;
        self.shingle
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("shingle: {e}")))?;
        self.matcher
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("matcher: {e}")))?;
        self.store.validate()?;
        self.analysis.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    /// Analyzer settings assembled from the stage sections.
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::new()
            .with_normalize(self.canonical.clone())
            .with_shingle(self.shingle.clone())
            .with_matching(self.matcher.clone())
            .with_store_timeout(Duration::from_millis(self.analysis.store_timeout_ms))
    }

    /// Store settings; call [`StoreConfig::build`] to open the backend.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigLoadError> {
        self.store.to_store_config()
    }
}

impl Default for ShingleCheckConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            canonical: NormalizeConfig::default(),
            shingle: ShingleConfig::default(),
            matcher: MatchConfig::default(),
            store: StoreYamlConfig::default(),
            analysis: AnalysisYamlConfig::default(),
            logging: LoggingYamlConfig::default(),
        }
    }
}

/// Fingerprint store YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreYamlConfig {
    /// `in_memory` or `redb`
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Database file, required for `redb`
    #[serde(default)]
    pub path: Option<String>,

    /// `none` or `zstd`
    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default = "default_compression_level")]
    pub level: i32,
}

impl StoreYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.backend.as_str() {
            "in_memory" => {}
            "redb" => {
                let has_path = self.path.as_deref().is_some_and(|p| !p.trim().is_empty());
                if !has_path {
                    return Err(ConfigLoadError::MissingField("store.path".to_string()));
                }
            }
            other => {
                return Err(ConfigLoadError::Validation(format!(
                    "store.backend must be one of: in_memory, redb (got '{other}')"
                )))
            }
        }
        match self.compression.as_str() {
            "none" => {}
            "zstd" => {
                if !(1..=22).contains(&self.level) {
                    return Err(ConfigLoadError::Validation(
                        "store.level must be between 1 and 22 for zstd".to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigLoadError::Validation(format!(
                    "store.compression must be one of: none, zstd (got '{other}')"
                )))
            }
        }
        Ok(())
    }

    fn to_store_config(&self) -> Result<StoreConfig, ConfigLoadError> {
        self.validate()?;
        let backend = match (self.backend.as_str(), &self.path) {
            ("redb", Some(path)) => BackendConfig::redb(path.clone()),
            _ => BackendConfig::in_memory(),
        };
        let codec = match self.compression.as_str() {
            "none" => CompressionCodec::None,
            _ => CompressionCodec::Zstd,
        };
        Ok(StoreConfig::new()
            .with_backend(backend)
            .with_compression(CompressionConfig::new(codec, self.level)))
    }
}

impl Default for StoreYamlConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
            compression: default_compression(),
            level: default_compression_level(),
        }
    }
}

/// Analyzer YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisYamlConfig {
    /// Upper bound for each store call, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl AnalysisYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.store_timeout_ms == 0 {
            return Err(ConfigLoadError::Validation(
                "analysis.store_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalysisYamlConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

/// Logging YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingYamlConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl LoggingYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingYamlConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_backend() -> String {
    "in_memory".to_string()
}
fn default_compression() -> String {
    "zstd".to_string()
}
fn default_compression_level() -> i32 {
    3
}
fn default_store_timeout_ms() -> u64 {
    30_000
}
fn default_log_level() -> String {
    "info".to_string()
}
