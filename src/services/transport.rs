//! HTTP transport for the upstream API
//!
//! Every call is timeout-bounded and comes back as a typed result;
//! nothing raised by reqwest escapes this module.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::types::{FetchError, Result};

/// Items requested per list call; the upstream caps pages at this size
pub const PAGE_SIZE: u32 = 100;

const GITHUB_JSON: &str = "application/vnd.github+json";

/// Account names: ASCII letters, digits and hyphens
pub fn is_valid_username(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Repository names: ASCII letters, digits, `-`, `_` and `.`, but never a
/// bare `.` or `..` segment
pub fn is_valid_repository_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET a path relative to the API root, or an absolute URL
    async fn get(&self, path: &str) -> std::result::Result<Value, FetchError>;
}

pub struct GithubTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    max_retries: u32,
}

impl GithubTransport {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            max_retries: config.max_retries,
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    async fn get_once(&self, path: &str) -> std::result::Result<Value, FetchError> {
        let mut request = self.client.get(self.url_for(path)).header(ACCEPT, GITHUB_JSON);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(path, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamRejection {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::parse(path, e.to_string())
            } else {
                transport_error(path, &e)
            }
        })
    }
}

#[async_trait]
impl HttpTransport for GithubTransport {
    async fn get(&self, path: &str) -> std::result::Result<Value, FetchError> {
        let mut attempt = 0;
        loop {
            match self.get_once(path).await {
                Err(e) if e.is_transport() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(path, attempt, error = %e, "retrying upstream call");
                }
                Err(e) => {
                    debug!(path, error = %e, "upstream call failed");
                    return Err(e);
                }
                Ok(body) => return Ok(body),
            }
        }
    }
}

fn transport_error(path: &str, err: &reqwest::Error) -> FetchError {
    FetchError::Transport {
        path: path.to_string(),
        message: err.to_string(),
        timed_out: err.is_timeout(),
    }
}
