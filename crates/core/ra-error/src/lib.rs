//! Error types and classification for the read accelerator.
//!
//! This crate provides:
//! - [`RaError`] - Error enum shared by every layer of the read pipeline
//! - [`ErrorCategory`] for telling transient transport failures apart from permanent ones
//! - [`classify_error`] to derive the category of an error
//!
//! `RaError` is `Clone` because a single failed fetch is observed by every
//! reader attached to it.

use std::sync::Arc;
use thiserror::Error;

/// Top-level error type for the read accelerator.
#[derive(Error, Debug, Clone)]
pub enum RaError {
    /// Negative or out-of-range offsets, lengths or tail sizes.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The object does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Any other failure reported by the transport client.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Columnar footer could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation attempted on a closed stream or factory.
    #[error("Closed: {0}")]
    Closed(String),

    /// Failure of detached asynchronous work, wrapping the underlying cause.
    #[error("Prefetch failed: {0}")]
    Prefetch(Arc<RaError>),
}

impl RaError {
    /// Wrap an error into the completion-failure variant used by detached tasks.
    ///
    /// Errors that are already wrapped are returned unchanged.
    pub fn into_prefetch(self) -> Self {
        match self {
            RaError::Prefetch(_) => self,
            other => RaError::Prefetch(Arc::new(other)),
        }
    }

    /// The innermost error, looking through [`RaError::Prefetch`] wrappers.
    pub fn root_cause(&self) -> &RaError {
        match self {
            RaError::Prefetch(inner) => inner.root_cause(),
            other => other,
        }
    }

    /// Short, stable name of the variant, used as a metric attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            RaError::InvalidArgument(_) => "invalid_argument",
            RaError::NotFound(_) => "not_found",
            RaError::Transport(_) => "transport",
            RaError::Parse(_) => "parse",
            RaError::Config(_) => "config",
            RaError::Closed(_) => "closed",
            RaError::Prefetch(_) => "prefetch",
        }
    }
}

/// Error classification used when recording failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient error - a later attempt may succeed
    ///
    /// Examples: network timeout, S3 throttling, short body
    Transient,

    /// Permanent error - retrying cannot help
    ///
    /// Examples: object not found, invalid position, corrupt footer
    Permanent,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// Classifies an error to determine whether it is worth retrying.
///
/// Prefetch wrappers are classified by their cause.
pub fn classify_error(error: &RaError) -> ErrorCategory {
    match error {
        RaError::InvalidArgument(_) => ErrorCategory::Permanent,
        RaError::NotFound(_) => ErrorCategory::Permanent,
        RaError::Transport(_) => ErrorCategory::Transient,
        RaError::Parse(_) => ErrorCategory::Permanent,
        RaError::Config(_) => ErrorCategory::Permanent,
        RaError::Closed(_) => ErrorCategory::Permanent,
        RaError::Prefetch(inner) => classify_error(inner),
    }
}

/// Result type alias using RaError.
pub type Result<T> = std::result::Result<T, RaError>;
