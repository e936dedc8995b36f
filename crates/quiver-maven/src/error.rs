//! Engine error types

use quiver_auth::AuthError;
use thiserror::Error;

/// Metadata generation and snapshot resolution failures
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata not found: {0}")]
    NotFound(String),

    #[error("invalid metadata path: {0}")]
    InvalidPath(String),

    #[error("not a snapshot artifact: {0}")]
    NotSnapshotArtifact(String),

    #[error("no snapshot build in {0}")]
    NoSnapshotBuild(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Failure to resolve the repository or authorize the caller
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
}

/// Failure of a single upstream request
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Connection refused, timeout, DNS failure, broken body
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// Anything else; aborts the proxy chain
    #[error("upstream protocol error: {0}")]
    Protocol(String),
}

impl UpstreamError {
    /// Whether the chain may move on to the next upstream
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Terminal failure of a proxied lookup
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The lookup stopped before any upstream succeeded
    #[error("proxied lookup of {uri} cancelled: {reason}")]
    Cancelled { uri: String, reason: String },
}

impl ProxyError {
    pub fn cancelled(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}
