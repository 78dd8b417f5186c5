use thiserror::Error;

use crate::transport::TransportError;

/// Failure while assembling a message or attachment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing required field `{0}`")]
    MissingRequiredField(&'static str),
    #[error("unknown severity `{0}` (expected good, warning or danger)")]
    UnknownSeverity(String),
}

/// Outcome of a failed [`crate::notifier::Notifier::send`].
///
/// Every variant is recoverable: the caller decides whether to log it,
/// surface it or ignore it.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("remote rejected message: {reason}")]
    RemoteRejected { reason: String },
    #[error("encoding message: {0}")]
    Encode(#[from] serde_json::Error),
}
