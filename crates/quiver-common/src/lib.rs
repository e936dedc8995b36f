//! Quiver Common - Shared types and utilities
//!
//! This crate provides the configuration model, error definitions and
//! small value types used across all Quiver components.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ProxyConfig, RepositoryConfig};
pub use error::{Error, Result};
pub use types::*;
