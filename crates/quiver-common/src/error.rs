//! Error types for Quiver
//!
//! This module defines the common error types used throughout the system.

use crate::types::{QuotaSpecError, RepositoryNameError};
use thiserror::Error;

/// Common result type for Quiver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for Quiver
#[derive(Debug, Error)]
pub enum Error {
    // Storage errors
    #[error("disk I/O error: {0}")]
    DiskIo(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("invalid repository name: {0}")]
    InvalidRepositoryName(#[from] RepositoryNameError),

    #[error("invalid disk quota: {0}")]
    InvalidQuota(#[from] QuotaSpecError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
