// File: poolside/src/config.rs
// Purpose: Configuration parsing from poolside.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use poolside_fetch::{AuthToken, HttpTransport, RequestOptions, RequestTarget, RetryPolicy, StatusPolicy};
use poolside_storage::StorageConfig;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PoolsideConfig {
    #[serde(default)]
    pub request: RequestConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Request defaults applied to every controller built from this config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestConfig {
    /// Base URL that relative targets are resolved against
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Lowest status treated as a server failure
    #[serde(default = "default_error_status_from")]
    pub error_status_from: u16,

    /// Bearer token attached to targets built by [`RequestConfig::target`]
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

// Default values
fn default_timeout_ms() -> u64 {
    30_000
}

fn default_error_status_from() -> u16 {
    400
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    500
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: default_timeout_ms(),
            error_status_from: default_error_status_from(),
            auth_token: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RequestConfig {
    pub fn to_options(&self) -> RequestOptions {
        RequestOptions::default()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_error_status(StatusPolicy::threshold(self.error_status_from))
    }

    /// GET target for `url`, carrying the configured auth token
    pub fn target(&self, url: impl Into<String>) -> RequestTarget {
        let target = RequestTarget::get(url);
        match &self.auth_token {
            Some(token) => target.with_auth(AuthToken::new(token.clone())),
            None => target,
        }
    }

    /// HTTP transport resolving relative URLs against `base_url`
    pub fn transport(&self) -> Result<HttpTransport> {
        match &self.base_url {
            Some(base_url) => HttpTransport::with_base_url(base_url)
                .with_context(|| format!("Invalid base_url: {}", base_url)),
            None => Ok(HttpTransport::new()),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.delay_ms))
    }
}

impl PoolsideConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            tracing::debug!(?path, "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: PoolsideConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./poolside.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("poolside.toml")
    }
}
