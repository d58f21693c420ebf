// promdump-config - Configuration for the dump tool
//
// Supports configuration from multiple sources:
// 1. CLI flags (highest priority, applied by the binary)
// 2. Environment variables (PROMDUMP_* prefix)
// 3. Config file path from PROMDUMP_CONFIG env var or --config
// 4. Default config file location (./promdump.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};

/// Main runtime configuration, resolved once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub dump: DumpConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Prometheus server to query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9090".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// What to dump and how to split it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Metric selector, may include label matchers
    #[serde(default)]
    pub metric: String,

    /// Output file prefix; files are named `<out>.00000`, `<out>.00001`, ...
    #[serde(default)]
    pub out: String,

    /// Total period to dump, ending at `timestamp`
    #[serde(default = "default_period")]
    pub period: String,

    /// Lookback of each individual query
    #[serde(default = "default_batch")]
    pub batch: String,

    #[serde(default = "default_batches_per_file")]
    pub batches_per_file: u64,

    /// RFC3339 end of the dumped period; defaults to now
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

fn default_period() -> String {
    "7d".to_string()
}

fn default_batch() -> String {
    "24h".to_string()
}

fn default_batches_per_file() -> u64 {
    1
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            metric: String::new(),
            out: String::new(),
            period: default_period(),
            batch: default_batch(),
            batches_per_file: default_batches_per_file(),
            timestamp: None,
        }
    }
}

impl DumpConfig {
    pub fn period(&self) -> Result<Duration> {
        parse_duration(&self.period).context("Invalid dump.period")
    }

    pub fn batch(&self) -> Result<Duration> {
        parse_duration(&self.batch).context("Invalid dump.batch")
    }

    /// End of the dumped period, falling back to `now` when no timestamp is set.
    pub fn end_time(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match &self.timestamp {
            Some(ts) => parse_timestamp(ts),
            None => Ok(now),
        }
    }
}

/// Parse a Prometheus duration string such as `7d`, `24h` or `1h30m`.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    promql_parser::util::parse_duration(raw.trim())
        .map_err(|e| anyhow::anyhow!("Invalid duration '{}': {}", raw, e))
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("Invalid RFC3339 timestamp '{}'", raw))
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

fn default_backend() -> StorageBackend {
    StorageBackend::Fs
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Fs,
            fs: Some(FsConfig::default()),
            s3: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    S3,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: fs, s3", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    /// Directory that relative output prefixes are resolved against
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl RuntimeConfig {
    /// Load configuration from the default file locations and environment
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from an explicit file, then apply environment overrides
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
