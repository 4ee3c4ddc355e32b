//! Runtime configuration loaded from `config.toml`.
//!
//! Every key is optional; when no config file is present the built-in
//! defaults are used.
//!
//! ```toml
//! proxy_url = "https://proxy.example.com"
//! batch_size = 16
//! request_timeout_secs = 30
//! deadline_secs = 600
//!
//! [retry]
//! max_attempts = 10
//! initial_backoff_ms = 100
//! max_backoff_ms = 5000
//! multiplier = 2.0
//!
//! [query]
//! with_logs = true
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::fetcher::FetcherConfig;
use crate::query::HyperBlockQueryOptions;
use crate::retry::{DEFAULT_MAX_ATTEMPTS, RetryConfig};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the proxy API.
    pub proxy_url: String,
    /// Blocks fetched concurrently by `range`.
    pub batch_size: usize,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Upper bound on a whole fetch, retries included.
    pub deadline_secs: Option<u64>,
    /// Per-block retry policy.
    pub retry: RetrySettings,
    /// Default query options.
    pub query: HyperBlockQueryOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: "http://127.0.0.1:8079".to_owned(),
            batch_size: 10,
            request_timeout_secs: 30,
            deadline_secs: None,
            retry: RetrySettings::default(),
            query: HyperBlockQueryOptions::default(),
        }
    }
}

/// `[retry]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts per block, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; `0` retries immediately.
    pub initial_backoff_ms: u64,
    /// Cap on any single delay.
    pub max_backoff_ms: u64,
    /// Growth factor between delays.
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: 100,
            max_backoff_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            multiplier: settings.multiplier,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns [`Config::default`] if the file does not exist,
    /// allowing the binary to work without any config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Per-request timeout for the HTTP transport.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry and deadline policy for the fetcher.
    #[must_use]
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            retry: RetryConfig::from(&self.retry),
            deadline: self.deadline_secs.map(Duration::from_secs),
        }
    }
}
