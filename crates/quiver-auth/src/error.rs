//! Authentication error types

use thiserror::Error;

/// Authentication and authorization errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("invalid authorization header format")]
    InvalidAuthHeader,

    #[error("unsupported authorization scheme: {0}")]
    UnsupportedScheme(String),

    #[error("token not found: {0}")]
    TokenNotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("path not permitted: {0}")]
    PathNotPermitted(String),

    #[error("token storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Whether the caller supplied credentials at all
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::MissingCredentials)
    }
}
