//! Runtime configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{Result, SelfdashError};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// HTTP request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Snapshot TTL in seconds (5 minutes)
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Parallel per-repository calls per user
const DEFAULT_MAX_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Optional credential; omitted calls are anonymous
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub max_concurrency: usize,
    /// Retries for transport failures only. Off by default.
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_retries: 0,
            user_agent: concat!("selfdash/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(SelfdashError::Config("api_base_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(SelfdashError::Config(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(SelfdashError::Config(
                "max_concurrency must be positive".into(),
            ));
        }
        Ok(())
    }
}
