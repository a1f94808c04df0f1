//! Sync configuration module
//!
//! Provides the configuration types for the synchronization core. The
//! transport mode is a static choice made once at startup; nothing here can
//! be switched while an engine is running.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default local storage proxy endpoint
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://127.0.0.1:4000/api/data";

/// Which backend the transport adapter talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    /// Whole-snapshot JSON endpoint (GET/POST)
    #[default]
    Local,
    /// Remote table store with per-row writes
    RemoteTable,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Local => f.write_str("local"),
            TransportMode::RemoteTable => f.write_str("remote-table"),
        }
    }
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(TransportMode::Local),
            "remote-table" | "remote_table" | "remote" => Ok(TransportMode::RemoteTable),
            other => Err(ConfigError::InvalidValue {
                key: "mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Remote table store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Project URL; REST lives under `/rest/v1`, storage under `/storage/v1`
    pub url: String,
    /// Anonymous API key sent as `apikey` and bearer token
    pub api_key: Option<String>,
    pub members_table: String,
    pub photos_table: String,
    /// Column photos are ordered by, newest first
    pub photos_order_column: String,
    /// Storage bucket for uploaded avatars and gallery images
    pub media_bucket: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            members_table: "members".to_string(),
            photos_table: "photos".to_string(),
            photos_order_column: "uploadDate".to_string(),
            media_bucket: "media".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url.trim_end_matches('/'))
    }

    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.url.trim_end_matches('/'))
    }
}

/// Synchronization core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub mode: TransportMode,
    pub local_endpoint: String,
    pub remote: Option<RemoteConfig>,
    /// Server-sent change stream; `None` means polling only
    pub realtime_url: Option<String>,
    pub poll_interval_ms: u64,
    pub load_attempts: u32,
    pub load_initial_delay_ms: u64,
    pub subscribe_attempts: u32,
    pub subscribe_delay_ms: u64,
    /// Size of the error log kept for the UI
    pub max_error_records: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Local,
            local_endpoint: DEFAULT_LOCAL_ENDPOINT.to_string(),
            remote: None,
            realtime_url: None,
            poll_interval_ms: 5_000,
            load_attempts: 3,
            load_initial_delay_ms: 1_000,
            subscribe_attempts: 3,
            subscribe_delay_ms: 5_000,
            max_error_records: 20,
        }
    }
}

impl SyncConfig {
    /// Create a new SyncConfigBuilder
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            TransportMode::Local => check_url(&self.local_endpoint)?,
            TransportMode::RemoteTable => {
                let remote = self
                    .remote
                    .as_ref()
                    .ok_or(ConfigError::MissingValue("remote.url"))?;
                if remote.url.trim().is_empty() {
                    return Err(ConfigError::MissingValue("remote.url"));
                }
                check_url(&remote.url)?;
            }
        }
        if let Some(realtime_url) = &self.realtime_url {
            check_url(realtime_url)?;
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_ms",
                value: "0".to_string(),
            });
        }
        if self.load_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "load_attempts",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Poll period, never shorter than 1 ms
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn load_initial_delay(&self) -> Duration {
        Duration::from_millis(self.load_initial_delay_ms)
    }

    pub fn subscribe_delay(&self) -> Duration {
        Duration::from_millis(self.subscribe_delay_ms)
    }
}

fn check_url(value: &str) -> Result<(), ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::InvalidUrl(value.to_string()))?;
    Ok(())
}

/// Builder for SyncConfig
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn mode(mut self, mode: TransportMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the local storage proxy endpoint
    pub fn local_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.local_endpoint = url.into();
        self
    }

    pub fn remote(mut self, remote: RemoteConfig) -> Self {
        self.config.remote = Some(remote);
        self
    }

    pub fn realtime_url(mut self, url: impl Into<String>) -> Self {
        self.config.realtime_url = Some(url.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Retry budget for idempotent reads
    pub fn load_retry(mut self, attempts: u32, initial_delay: Duration) -> Self {
        self.config.load_attempts = attempts;
        self.config.load_initial_delay_ms = initial_delay.as_millis() as u64;
        self
    }

    /// Fixed-delay budget for change-feed subscription setup
    pub fn subscribe_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.config.subscribe_attempts = attempts;
        self.config.subscribe_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn max_error_records(mut self, max: usize) -> Self {
        self.config.max_error_records = max;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}
