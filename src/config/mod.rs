//! # Configuration Management Module
//!
//! Typed configuration for arcdex, loaded from a TOML file. Every section and
//! field has a default, so an empty file (or no `[section]` at all) is valid.
//!
//! ## Configuration Structure
//!
//! - [`SourceConfig`] - where the datasets are downloaded from
//! - [`RetryConfig`] - attempt budget and backoff base for failed downloads
//! - [`CacheConfig`] - TTL and backing store for downloaded datasets
//! - [`SearchConfig`] - match mode, display language, result limit
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arcdex::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Datasets from: {}", config.source.base_url);
//!
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [source]
//! base_url = "https://data.example.org/arc/"
//! timeout_seconds = 10
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 1000
//!
//! [cache]
//! ttl_seconds = 300
//! backend = "file"
//! dir = ".arcdex-cache"
//!
//! [search]
//! mode = "name"
//! language = "en"
//! limit = 25
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

use crate::catalog::search::{MatchMode, QueryMatcher};
use crate::fetch::RetryPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL the dataset file names are appended to.
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/data/".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per download, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    pub ttl_seconds: u64,
    pub backend: CacheBackendKind,
    /// Directory for the file backend; ignored by the memory backend.
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            backend: CacheBackendKind::File,
            dir: ".arcdex-cache".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: MatchMode,
    /// Language used for matching and display; English is the fallback.
    pub language: String,
    /// Maximum results printed by the CLI (0 = unlimited)
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: MatchMode::Name,
            language: "en".to_string(),
            limit: 25,
        }
    }
}

impl SearchConfig {
    pub fn matcher(&self) -> QueryMatcher {
        QueryMatcher::new(self.mode, &self.language)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown values fall back to `info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.source.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(anyhow!(
                "source.base_url must be an http(s) URL, got '{}'",
                self.source.base_url
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }
        if self.source.timeout_seconds == 0 {
            return Err(anyhow!("source.timeout_seconds must be at least 1"));
        }
        if self.cache.backend == CacheBackendKind::File && self.cache.dir.trim().is_empty() {
            return Err(anyhow!("cache.dir must be set for the file backend"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.retry.policy(), RetryPolicy::default());
        assert_eq!(config.search.mode, MatchMode::Name);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let raw = r#"
            [cache]
            backend = "memory"

            [search]
            mode = "name_and_description"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.cache.backend, CacheBackendKind::Memory);
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.search.mode, MatchMode::NameAndDescription);
        assert_eq!(config.search.language, "en");
    }

    #[test]
    fn default_config_survives_toml_round_trip() {
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = Config::default();
        config.source.base_url = "ftp://example.org/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let logging = LoggingConfig {
            level: "loud".to_string(),
            file: None,
        };
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
    }

    #[tokio::test]
    async fn create_default_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded, Config::default());
    }
}
