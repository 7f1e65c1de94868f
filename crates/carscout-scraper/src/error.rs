use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {host} (retry after {retry_after_secs}s)")]
    RateLimited {
        host: String,
        /// `Retry-After` seconds from the response; `0` when absent.
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("could not decode page {page}: {source}")]
    Decode {
        page: u32,
        #[source]
        source: DecodeError,
    },

    #[error("invalid search endpoint \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to persist listings to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize listings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure to turn a response body into a JSON document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("body is not valid JSON after {stage}: {source}")]
    Parse {
        stage: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{encoding} decompression failed: {source}")]
    Decompress {
        encoding: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("body is not JSON and content encoding {encoding:?} is not supported")]
    UnknownEncoding { encoding: Option<String> },

    #[error("body is {codec}-compressed but this build has no {codec} decoder")]
    MissingCodec { codec: &'static str },
}

impl DecodeError {
    /// Corrupt or truncated bodies may come back clean on a second request;
    /// an unsupported encoding will not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Decompress { .. })
    }
}
