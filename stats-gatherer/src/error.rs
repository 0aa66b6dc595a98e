//! # Error Types
//!
//! Every failure the gatherer can run into while walking the Graphite tree. The walker decides per traversal level
//! whether an error is fatal (server discovery) or only becomes a diagnostic (metric discovery, sample fetch,
//! reduction).

use reqwest::StatusCode;

pub type Result<T, E = GatherError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum GatherError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status code {status} from {url}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("failed to parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no data points found")]
    EmptyInput,
}

impl GatherError {
    /// Connection failures and non-2xx responses.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}
