use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::app::retry::RetryPolicy;
use crate::common::constants::{
    DEFAULT_API_KEY_ENV, DEFAULT_CONFIG_PATH, DEFAULT_EXTRACTION_ENDPOINT, DEFAULT_EXTRACTION_MODEL,
    DEFAULT_INITIAL_DELAY_MS, DEFAULT_RETRIES, DEFAULT_STORE_PATH, DEFAULT_TIMEOUT_SECONDS,
};
use crate::common::error::{Result, TrafficError};
use crate::pipeline::dedup::DedupPolicy;

pub const CONFIG_PATH_ENV: &str = "AAT_CONFIG";
pub const STORE_PATH_ENV: &str = "AAT_STORE_PATH";
pub const TEXT_ENDPOINT_ENV: &str = "AAT_TEXT_ENDPOINT";
pub const EXTRACTION_MODEL_ENV: &str = "AAT_EXTRACTION_MODEL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub text: TextConfig,
    pub store: StoreConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_seconds: u64,
    /// Retries after the first failed call, for transient failures only
    pub retries: u32,
    pub initial_delay_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EXTRACTION_ENDPOINT.to_string(),
            model: DEFAULT_EXTRACTION_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            retries: DEFAULT_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
        }
    }
}

impl ExtractionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_millis(self.initial_delay_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn api_key(&self) -> Result<String> {
        env::var(&self.api_key_env).map_err(|_| {
            TrafficError::Config(format!(
                "API key not found: set the {} environment variable",
                self.api_key_env
            ))
        })
    }
}

/// Optional document-to-text service for PDFs and workbooks
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub policy: DedupPolicy,
}

impl Config {
    /// Load configuration from `path`, or from `AAT_CONFIG` / the default
    /// location when no path is given.
    ///
    /// An explicitly named file must exist; a missing default file yields
    /// the built-in defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No config file found, using defaults");
                    Config::default()
                }
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TrafficError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = env::var(STORE_PATH_ENV) {
            self.store.path = PathBuf::from(path);
        }
        if let Ok(endpoint) = env::var(TEXT_ENDPOINT_ENV) {
            self.text.endpoint = Some(endpoint);
        }
        if let Ok(model) = env::var(EXTRACTION_MODEL_ENV) {
            self.extraction.model = model;
        }
    }
}
