//! Error types for the collection pipeline.
//!
//! Only transport and encoding failures ever reach the caller of a submission
//! cycle. Everything a collector hits internally is folded into an
//! "unsupported" signal before it leaves the collector.

use std::time::Duration;

/// A host capability is absent, blocked, or threw while in use.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CapabilityError {
    /// The API does not exist on this host.
    #[error("capability unavailable: {0}")]
    Unavailable(String),
    /// The API exists but refused or failed the operation.
    #[error("capability failed: operation='{operation}', reason='{reason}'")]
    Failed { operation: String, reason: String },
}

impl CapabilityError {
    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::Unavailable(what.into())
    }

    pub fn failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Scoped storage is disabled or the operation failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("storage disabled")]
    Disabled,
    #[error("storage error: operation='{operation}', reason='{reason}'")]
    Io { operation: String, reason: String },
}

/// Canonicalization or signing failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignError {
    #[error("signing key is empty")]
    EmptyKey,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("payload serialization failed: {0}")]
    Serialization(String),
}

/// A single submission attempt did not complete successfully.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The call exceeded the configured timeout.
    #[error("transport timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("transport network error: {0}")]
    Network(String),
    /// The gateway answered with a non-success status.
    #[error("gateway error ({status}): {message}")]
    Server { status: u16, message: String },
    /// The gateway answered 2xx but the receipt could not be parsed.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
    /// The transmission was abandoned because the page unloaded.
    #[error("transmission aborted by unload")]
    Aborted,
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Errors surfaced from a submission cycle.
#[derive(Debug, thiserror::Error)]
pub enum ScrybeError {
    #[error("encoding failure: {0}")]
    Encoding(#[from] SignError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
