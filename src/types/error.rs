use thiserror::Error;

/// Outcome classification for a single upstream call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Endpoint unreachable, connection reset, or timed out
    #[error("transport failure on {path}: {message}")]
    Transport {
        path: String,
        message: String,
        timed_out: bool,
    },

    /// Endpoint answered with a non-2xx status
    #[error("upstream rejected {path} with status {status}")]
    UpstreamRejection { path: String, status: u16 },

    /// Payload or a field inside it had an unexpected shape
    #[error("parse failure on {path}: {message}")]
    Parse { path: String, message: String },

    /// Name cannot be used as a path segment; no call was made
    #[error("invalid name {name:?}")]
    InvalidName { name: String },
}

impl FetchError {
    pub fn parse(path: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Path or URL of the call that failed, or the rejected name
    pub fn path(&self) -> &str {
        match self {
            Self::Transport { path, .. }
            | Self::UpstreamRejection { path, .. }
            | Self::Parse { path, .. } => path,
            Self::InvalidName { name } => name,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamRejection { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// selfdash error types
#[derive(Error, Debug)]
pub enum SelfdashError {
    /// HTTP client could not be built
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Upstream fetch failed on a load-bearing call
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for selfdash
pub type Result<T> = std::result::Result<T, SelfdashError>;
