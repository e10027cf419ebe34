//! Error types for the Prometheus client and the query strategies

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PromError>;

#[derive(Debug, Error)]
pub enum PromError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode {context}: {reason}")]
    Decode { context: &'static str, reason: String },

    /// Backend answered with `status == "error"`; `message` is the server text verbatim
    #[error("prometheus query failed: {message}")]
    Server {
        error_type: Option<String>,
        message: String,
    },

    #[error("unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("unsupported result type: {0}")]
    UnsupportedResultType(String),

    #[error("invalid query type: {index}, expected 0..{count}")]
    InvalidQueryType { index: usize, count: usize },

    #[error("label [{0}] is missing")]
    MissingLabel(String),

    #[error("invalid sample value: {0}")]
    InvalidValue(String),

    #[error("malformed uid [{uid}]: {reason}")]
    MalformedUid { uid: String, reason: String },
}

impl PromError {
    pub(crate) fn decode(context: &'static str, err: impl std::fmt::Display) -> Self {
        PromError::Decode {
            context,
            reason: err.to_string(),
        }
    }

    pub(crate) fn malformed_uid(uid: &str, reason: impl Into<String>) -> Self {
        PromError::MalformedUid {
            uid: uid.to_string(),
            reason: reason.into(),
        }
    }

    /// Server-supplied message, when the backend rejected the request
    pub fn server_message(&self) -> Option<&str> {
        match self {
            PromError::Server { message, .. } => Some(message),
            _ => None,
        }
    }
}
