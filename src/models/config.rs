//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::PageSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client and remote site settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Pacing between requests and collections
    #[serde(default)]
    pub sync: SyncConfig,

    /// Chunk partitioning settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Storage locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// CSS selectors used by the HTML parser
    #[serde(default)]
    pub selectors: PageSelectors,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.crawler.base_url)
            .map_err(|e| AppError::validation(format!("crawler.base_url: {e}")))?;
        if self.sync.delay_min_ms > self.sync.delay_max_ms {
            return Err(AppError::validation(
                "sync.delay_min_ms must not exceed sync.delay_max_ms",
            ));
        }
        if self.sync.save_every == 0 {
            return Err(AppError::validation("sync.save_every must be > 0"));
        }
        if self.chunking.chunk_size == 0 {
            return Err(AppError::validation("chunking.chunk_size must be > 0"));
        }
        if self.paths.data_dir.as_os_str().is_empty() {
            return Err(AppError::validation("paths.data_dir is empty"));
        }
        Ok(())
    }
}

/// HTTP client and remote site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Site root; search, listing and record URLs are built from it
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    #[serde(default = "defaults::accept")]
    pub accept: String,

    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Referer header, defaults to the site root
    #[serde(default = "defaults::referer")]
    pub referer: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            accept: defaults::accept(),
            accept_language: defaults::accept_language(),
            referer: defaults::referer(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Lower bound of the random delay between records
    #[serde(default = "defaults::delay_min")]
    pub delay_min_ms: u64,

    /// Upper bound of the random delay between records
    #[serde(default = "defaults::delay_max")]
    pub delay_max_ms: u64,

    /// Pause between collections in a batch run
    #[serde(default = "defaults::inter_collection_pause")]
    pub inter_collection_pause_secs: u64,

    /// Written records between intermediate saves of the collection file
    #[serde(default = "defaults::save_every")]
    pub save_every: usize,
}

impl SyncConfig {
    pub fn inter_collection_pause(&self) -> Duration {
        Duration::from_secs(self.inter_collection_pause_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            delay_min_ms: defaults::delay_min(),
            delay_max_ms: defaults::delay_max(),
            inter_collection_pause_secs: defaults::inter_collection_pause(),
            save_every: defaults::save_every(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Records per chunk file
    #[serde(default = "defaults::chunk_size")]
    pub chunk_size: usize,

    /// Collections below this size are left unchunked by batch chunking
    #[serde(default = "defaults::min_records")]
    pub min_records: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::chunk_size(),
            min_records: defaults::min_records(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root directory holding one subdirectory per collection
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn base_url() -> String {
        "https://www.examtopics.com".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
    }
    pub fn accept() -> String {
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into()
    }
    pub fn accept_language() -> String {
        "en-US,en;q=0.9".into()
    }
    pub fn referer() -> String {
        "https://www.examtopics.com/".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Sync defaults
    pub fn delay_min() -> u64 {
        3000
    }
    pub fn delay_max() -> u64 {
        7000
    }
    pub fn inter_collection_pause() -> u64 {
        15
    }
    pub fn save_every() -> usize {
        25
    }

    // Chunking defaults
    pub fn chunk_size() -> usize {
        50
    }
    pub fn min_records() -> usize {
        100
    }

    // Path defaults
    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_delay_window() {
        let mut config = Config::default();
        config.sync.delay_min_ms = 5000;
        config.sync.delay_max_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_save_interval() {
        let mut config = Config::default();
        config.sync.save_every = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            delay_min_ms = 10
            delay_max_ms = 20

            [paths]
            data_dir = "/tmp/exams"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.delay_max_ms, 20);
        assert_eq!(config.sync.inter_collection_pause_secs, 15);
        assert_eq!(config.sync.save_every, 25);
        assert_eq!(config.chunking.chunk_size, 50);
        assert_eq!(config.paths.data_dir, PathBuf::from("/tmp/exams"));
        assert_eq!(config.crawler.base_url, "https://www.examtopics.com");
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.chunking.min_records, 100);
    }
}
