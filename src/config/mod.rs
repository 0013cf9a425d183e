//! Configuration management for the schedule scraper
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser-like identification sent with every schedule request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Leading non-informative cells the source site renders before the week
///
/// Observed value: the empty corner cell plus six weekday headers. The site
/// does not document it, so it stays configurable.
pub const DEFAULT_LEADING_PLACEHOLDERS: usize = 7;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source site configuration
    pub source: SourceConfig,

    /// Grid extraction parameters
    pub extraction: ExtractionConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Source site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the schedule site
    pub base_url: String,

    /// Domain every target URL must belong to
    pub allowed_domain: String,

    /// User agent string
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Rate limit for directory crawling (requests per second)
    pub requests_per_second: u32,
}

/// Grid extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum number of leading placeholder cells to drop
    pub leading_placeholders: usize,

    /// Time rows per day
    pub rows: usize,

    /// Days per week shown in the grid
    pub days_per_week: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the cached JSON files
    pub data_dir: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Directory with the browser UI, served as static files
    pub public_dir: Option<PathBuf>,

    /// Wall-clock budget of one refresh request in seconds
    pub refresh_timeout_secs: u64,

    /// Enable CORS for API
    pub enable_cors: bool,

    /// Enable request logging
    pub enable_request_logging: bool,

    /// Maximum results per directory search list
    pub search_limit: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://ssau.ru"),
            allowed_domain: String::from("ssau.ru"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            requests_per_second: 2,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            leading_placeholders: DEFAULT_LEADING_PLACEHOLDERS,
            rows: 8,
            days_per_week: 6,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            public_dir: None,
            refresh_timeout_secs: 120,
            enable_cors: true,
            enable_request_logging: true,
            search_limit: 40,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            extraction: ExtractionConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base_url =
            std::env::var("RASP_BASE_URL").unwrap_or(defaults.source.base_url.clone());

        let allowed_domain = std::env::var("RASP_ALLOWED_DOMAIN")
            .unwrap_or(defaults.source.allowed_domain.clone());

        let user_agent =
            std::env::var("RASP_USER_AGENT").unwrap_or(defaults.source.user_agent.clone());

        let request_timeout_secs = env_parse("RASP_REQUEST_TIMEOUT")
            .unwrap_or(defaults.source.request_timeout_secs);

        let requests_per_second =
            env_parse("RASP_RATE_LIMIT").unwrap_or(defaults.source.requests_per_second);

        let leading_placeholders = env_parse("RASP_LEADING_PLACEHOLDERS")
            .unwrap_or(defaults.extraction.leading_placeholders);

        let data_dir = std::env::var("RASP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage.data_dir.clone());

        let bind_address = match std::env::var("RASP_BIND_ADDRESS") {
            Ok(addr) => addr
                .parse()
                .with_context(|| format!("Invalid RASP_BIND_ADDRESS: {addr}"))?,
            Err(_) => defaults.server.bind_address,
        };

        let public_dir = std::env::var("RASP_PUBLIC_DIR").ok().map(PathBuf::from);

        let refresh_timeout_secs = env_parse("RASP_REFRESH_TIMEOUT")
            .unwrap_or(defaults.server.refresh_timeout_secs);

        let log_level = std::env::var("RASP_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format = std::env::var("RASP_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            source: SourceConfig {
                base_url,
                allowed_domain,
                user_agent,
                request_timeout_secs,
                requests_per_second,
            },
            extraction: ExtractionConfig {
                leading_placeholders,
                ..defaults.extraction
            },
            storage: StorageConfig { data_dir },
            server: ServerConfig {
                bind_address,
                public_dir,
                refresh_timeout_secs,
                ..defaults.server
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.source.base_url).is_err() {
            anyhow::bail!("base_url is not a valid URL: {}", self.source.base_url);
        }

        if self.source.allowed_domain.trim().is_empty() {
            anyhow::bail!("allowed_domain must not be empty");
        }

        if self.source.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.source.requests_per_second == 0 {
            anyhow::bail!("requests_per_second must be greater than 0");
        }

        if self.extraction.rows == 0 || self.extraction.days_per_week == 0 {
            anyhow::bail!("rows and days_per_week must be greater than 0");
        }

        if self.server.refresh_timeout_secs == 0 {
            anyhow::bail!("refresh_timeout_secs must be greater than 0");
        }

        if self.extraction.leading_placeholders != DEFAULT_LEADING_PLACEHOLDERS {
            tracing::warn!(
                configured = self.extraction.leading_placeholders,
                observed = DEFAULT_LEADING_PLACEHOLDERS,
                "leading_placeholders differs from the value observed on the source site"
            );
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.request_timeout_secs)
    }

    /// Get refresh budget as Duration
    #[must_use]
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.server.refresh_timeout_secs)
    }
}
