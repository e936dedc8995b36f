//! Core value types for Quiver
//!
//! Repository names and disk quota declarations as they appear in
//! configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of a configured repository (first URI segment)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Create a new repository name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, RepositoryNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Get the repository name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), RepositoryNameError> {
        if name.is_empty() {
            return Err(RepositoryNameError::Empty);
        }

        // A name doubles as a directory under the storage root
        if name == "." || name == ".." {
            return Err(RepositoryNameError::Reserved(name.to_string()));
        }

        for c in name.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
                return Err(RepositoryNameError::InvalidChar(c));
            }
        }

        Ok(())
    }
}

impl TryFrom<String> for RepositoryName {
    type Error = RepositoryNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RepositoryName> for String {
    fn from(name: RepositoryName) -> Self {
        name.0
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepositoryName({:?})", self.0)
    }
}

/// Errors that can occur when creating a repository name
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryNameError {
    #[error("repository name must not be empty")]
    Empty,
    #[error("repository name is reserved: {0}")]
    Reserved(String),
    #[error("repository name contains invalid character: {0}")]
    InvalidChar(char),
}

/// Disk quota declaration
///
/// Accepts an absolute size (`"10GB"`, `"512MB"`, `"4096"`), a share of the
/// volume's free space (`"85%"`) or `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaSpec {
    /// Fixed ceiling in bytes
    Bytes(u64),
    /// Percentage (1-100) of the free space available at startup
    Percentage(u8),
    /// No ceiling
    Unlimited,
}

impl FromStr for QuotaSpec {
    type Err = QuotaSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();

        if spec.is_empty()
            || spec.eq_ignore_ascii_case("unlimited")
            || spec.eq_ignore_ascii_case("none")
        {
            return Ok(Self::Unlimited);
        }

        if let Some(percentage) = spec.strip_suffix('%') {
            let value: u8 = percentage
                .trim()
                .parse()
                .map_err(|_| QuotaSpecError::Malformed(s.to_string()))?;
            if value == 0 || value > 100 {
                return Err(QuotaSpecError::PercentageOutOfRange(value));
            }
            return Ok(Self::Percentage(value));
        }

        let upper = spec.to_ascii_uppercase();
        let split = upper
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(upper.len());
        let (digits, unit) = upper.split_at(split);

        let value: u64 = digits
            .parse()
            .map_err(|_| QuotaSpecError::Malformed(s.to_string()))?;

        let multiplier: u64 = match unit.trim() {
            "" | "B" => 1,
            "KB" | "K" => 1024,
            "MB" | "M" => 1024 * 1024,
            "GB" | "G" => 1024 * 1024 * 1024,
            "TB" | "T" => 1024 * 1024 * 1024 * 1024,
            other => return Err(QuotaSpecError::UnknownUnit(other.to_string())),
        };

        value
            .checked_mul(multiplier)
            .map(Self::Bytes)
            .ok_or_else(|| QuotaSpecError::Malformed(s.to_string()))
    }
}

impl fmt::Display for QuotaSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "{bytes}B"),
            Self::Percentage(pct) => write!(f, "{pct}%"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// Errors that can occur when parsing a quota declaration
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuotaSpecError {
    #[error("malformed quota: {0}")]
    Malformed(String),
    #[error("unknown size unit: {0}")]
    UnknownUnit(String),
    #[error("quota percentage must be between 1 and 100, got {0}")]
    PercentageOutOfRange(u8),
}
