//! Fetch errors.

use std::fmt;
use std::time::Duration;

use hyperblock::api::ResponseError;
use hyperblock::{CodecError, MapError};
use thiserror::Error;

use crate::transport::TransportError;

/// The block a fetch was aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Block requested by nonce.
    Nonce(u64),
    /// Block requested by hash.
    Hash(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nonce(nonce) => write!(f, "nonce {nonce}"),
            Self::Hash(hash) => write!(f, "hash {hash}"),
        }
    }
}

/// Errors returned by the hyperblock fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// `start > end`; no request is made.
    #[error("invalid nonce interval: start {start} is greater than end {end}")]
    InvalidInterval {
        /// First nonce requested.
        start: u64,
        /// Last nonce requested.
        end: u64,
    },

    /// Batch size of zero; no request is made.
    #[error("invalid batch size: must be greater than zero")]
    InvalidBatchSize,

    /// Block hash is not 64 hex characters; no request is made.
    #[error("invalid block hash {hash:?}: expected 64 hex characters")]
    InvalidHash {
        /// The rejected hash.
        hash: String,
    },

    /// The request produced no response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The proxy answered with a status other than `200`.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Start of the response body.
        body: String,
    },

    /// The proxy answered with an error envelope.
    #[error("proxy returned code {code:?}: {message}")]
    Api {
        /// Proxy result code.
        code: String,
        /// Proxy error message.
        message: String,
    },

    /// The body is not a valid hyperblock response.
    #[error("malformed response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The hyperblock could not be mapped to its canonical record.
    #[error(transparent)]
    Mapping(#[from] MapError),

    /// The canonical record could not be encoded.
    #[error("encoding failed: {0}")]
    Codec(#[from] CodecError),

    /// A fetch task panicked.
    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The overall deadline expired.
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// A block still failed after every allowed attempt.
    #[error("{target}: failed after {attempts} attempts: {source}")]
    Exhausted {
        /// Block that failed.
        target: Target,
        /// Attempts made.
        attempts: u32,
        /// Error of the last attempt.
        #[source]
        source: Box<FetchError>,
    },

    /// A block failed with an error no retry can fix.
    #[error("{target}: failed on attempt {attempts}: {source}")]
    Failed {
        /// Block that failed.
        target: Target,
        /// Attempts made, the failing one included.
        attempts: u32,
        /// The non-retryable error.
        #[source]
        source: Box<FetchError>,
    },

    /// First definitive failure of an interval fetch.
    #[error("one or more errors occurred: {0}")]
    Batch(#[source] Box<FetchError>),
}

impl FetchError {
    /// Whether a fresh attempt could succeed.
    ///
    /// Network, status, envelope, body and mapping failures are retryable.
    /// Codec and request validation failures are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Status { .. }
                | Self::Api { .. }
                | Self::Decode(_)
                | Self::Mapping(_)
        )
    }

    /// The block this error is about, if it concerns one block.
    #[must_use]
    pub fn target(&self) -> Option<&Target> {
        match self {
            Self::Exhausted { target, .. } | Self::Failed { target, .. } => Some(target),
            Self::Batch(inner) => inner.target(),
            _ => None,
        }
    }
}

impl From<ResponseError> for FetchError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::Json(e) => Self::Decode(e),
            ResponseError::Api { code, message } => Self::Api { code, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_batch_error_names_the_nonce() {
        let err = FetchError::Batch(Box::new(FetchError::Exhausted {
            target: Target::Nonce(17),
            attempts: 10,
            source: Box::new(FetchError::Status {
                status: 503,
                body: String::new(),
            }),
        }));
        let message = err.to_string();
        assert!(message.starts_with("one or more errors occurred"), "{message}");
        assert!(message.contains("nonce 17"), "{message}");
        assert!(message.contains("10 attempts"), "{message}");
        assert_eq!(err.target(), Some(&Target::Nonce(17)), "target");
    }

    #[test]
    fn codec_errors_are_not_retried() {
        let codec = FetchError::Codec(CodecError::TrailingBytes { remaining: 1 });
        assert!(!codec.is_retryable(), "codec");
        let mapping = FetchError::Mapping(MapError::InvalidAmount {
            field: "balance",
            value: "x".to_owned(),
        });
        assert!(mapping.is_retryable(), "mapping");
        assert!(!FetchError::InvalidBatchSize.is_retryable(), "validation");
    }

    #[test]
    fn failed_block_keeps_its_target() {
        let err = FetchError::Batch(Box::new(FetchError::Failed {
            target: Target::Hash("ab".repeat(32)),
            attempts: 1,
            source: Box::new(FetchError::Codec(CodecError::TrailingBytes { remaining: 2 })),
        }));
        let message = err.to_string();
        assert!(message.contains("hash abab"), "{message}");
        assert!(message.contains("attempt 1"), "{message}");
        assert!(!err.is_retryable(), "definitive");
        assert_eq!(err.target(), Some(&Target::Hash("ab".repeat(32))), "target");
    }
}
