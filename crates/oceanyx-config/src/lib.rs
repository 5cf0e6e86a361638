//! Configuration loading for Oceanyx.
//! Reads oceanyx.toml from the current directory or the path in the OCEANYX_CONFIG env var.
//! YAML and JSON files are accepted by extension.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const CONFIG_ENV_VAR: &str = "OCEANYX_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "oceanyx.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub diversity: DiversityConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16    { 3001 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "oceanyx=debug,info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Largest artifact accepted at registration.
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,
    /// Deadline for one sequence analysis run.
    #[serde(default = "default_analysis_timeout_secs")]
    pub analysis_timeout_secs: u64,
    /// Capacity of the job event broadcast channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_max_artifact_bytes()    -> u64   { 512 * 1024 * 1024 }
fn default_analysis_timeout_secs() -> u64   { 120 }
fn default_event_buffer()          -> usize { 256 }

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_artifact_bytes: default_max_artifact_bytes(),
            analysis_timeout_secs: default_analysis_timeout_secs(),
            event_buffer: default_event_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Matches below this confidence are discarded.
    #[serde(default = "default_min_confidence")]
    pub min_confidence_percent: f64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Fraction of the reference length an alignment may fall short by and still count as complete.
    #[serde(default = "default_coverage_tolerance")]
    pub coverage_tolerance: f64,
    /// Word size for the built-in k-mer scorer.
    #[serde(default = "default_kmer_size")]
    pub kmer_size: usize,
    /// A read at or above this identity counts as a supporting sequence.
    #[serde(default = "default_min_read_identity")]
    pub min_read_identity_percent: f64,
}

fn default_min_confidence()     -> f64   { 50.0 }
fn default_top_k()              -> usize { 10 }
fn default_coverage_tolerance() -> f64   { 0.05 }
fn default_kmer_size()          -> usize { 8 }
fn default_min_read_identity()  -> f64   { 80.0 }

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_confidence_percent: default_min_confidence(),
            top_k: default_top_k(),
            coverage_tolerance: default_coverage_tolerance(),
            kmer_size: default_kmer_size(),
            min_read_identity_percent: default_min_read_identity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityConfig {
    /// Relative abundance below which a species counts as rare.
    #[serde(default = "default_rarity_threshold")]
    pub rarity_threshold: f64,
}

fn default_rarity_threshold() -> f64 { 0.01 }

impl Default for DiversityConfig {
    fn default() -> Self {
        Self { rarity_threshold: default_rarity_threshold() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

fn default_catalog_path() -> String { "data/catalog.yaml".to_string() }

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { path: default_catalog_path() }
    }
}

impl Config {
    /// Load configuration.
    /// Checks OCEANYX_CONFIG first, then oceanyx.toml in the current directory.
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_path(&path),
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_path(DEFAULT_CONFIG_FILE),
            Err(_) => {
                warn!("No {DEFAULT_CONFIG_FILE} found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a config file, picking the format from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let parse_err = |message: String| ConfigError::Parse { path: path.to_path_buf(), message };
        let config: Config = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
            "json"         => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
            _              => toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        };

        config.validate()?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.matching;
        if !(0.0..=100.0).contains(&m.min_confidence_percent) {
            return Err(ConfigError::Invalid {
                field: "matching.min_confidence_percent",
                message: format!("{} not in [0, 100]", m.min_confidence_percent),
            });
        }
        if m.top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "matching.top_k",
                message: "must be at least 1".to_string(),
            });
        }
        if !(0.0..1.0).contains(&m.coverage_tolerance) {
            return Err(ConfigError::Invalid {
                field: "matching.coverage_tolerance",
                message: format!("{} not in [0, 1)", m.coverage_tolerance),
            });
        }
        if m.kmer_size == 0 {
            return Err(ConfigError::Invalid {
                field: "matching.kmer_size",
                message: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&m.min_read_identity_percent) {
            return Err(ConfigError::Invalid {
                field: "matching.min_read_identity_percent",
                message: format!("{} not in [0, 100]", m.min_read_identity_percent),
            });
        }
        let r = self.diversity.rarity_threshold;
        if !(r > 0.0 && r < 1.0) {
            return Err(ConfigError::Invalid {
                field: "diversity.rarity_threshold",
                message: format!("{r} not in (0, 1)"),
            });
        }
        if self.ingestion.event_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "ingestion.event_buffer",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
