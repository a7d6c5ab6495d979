use thiserror::Error;

/// Failures of a single chat turn
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("HTTP error! status: {status}")]
    Status { status: reqwest::StatusCode },

    #[error("stream interrupted: {0}")]
    StreamRead(#[source] reqwest::Error),

    #[error("malformed event {line:?}: {source}")]
    MalformedEvent {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;
