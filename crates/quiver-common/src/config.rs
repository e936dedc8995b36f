//! Configuration types for Quiver
//!
//! The configuration is read from an optional TOML file and overlaid by
//! `QUIVER__*` environment variables (`QUIVER__PORT=8080`,
//! `QUIVER__PROXY__WORKERS=8`, ...).

use crate::error::{Error, Result};
use crate::types::{QuotaSpec, RepositoryName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration for Quiver
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hostname or address to bind
    pub hostname: String,
    /// Port to bind
    pub port: u16,
    /// Directory holding repositories without an explicit path
    pub storage_dir: PathBuf,
    /// Token file location
    pub tokens_file: PathBuf,
    /// Local repositories, in declaration order
    pub repositories: Vec<RepositoryConfig>,
    /// Repository used when the first URI segment names no repository
    /// (defaults to the first declared one)
    pub default_repository: Option<String>,
    /// Require a token for every repository, not only private ones
    pub full_auth: bool,
    /// Route requests without a repository prefix to the default repository
    pub rewrite_paths: bool,
    /// Global disk quota (`"10GB"`, `"85%"`, `"unlimited"`)
    pub disk_quota: String,
    /// Upstream repository base URLs, in priority order
    pub proxied: Vec<String>,
    /// Persist artifacts fetched from upstreams
    pub store_proxied: bool,
    /// Upstream client configuration
    pub proxy: ProxyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: 8080,
            storage_dir: PathBuf::from("repositories"),
            tokens_file: PathBuf::from("tokens.json"),
            repositories: vec![
                RepositoryConfig::new("releases"),
                RepositoryConfig::new("snapshots"),
            ],
            default_repository: None,
            full_auth: false,
            rewrite_paths: true,
            disk_quota: "85%".to_string(),
            proxied: Vec::new(),
            store_proxied: true,
            proxy: ProxyConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("QUIVER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants
    pub fn validate(&self) -> Result<()> {
        if self.repositories.is_empty() {
            return Err(Error::configuration("at least one repository is required"));
        }

        let mut seen = HashSet::new();
        for repository in &self.repositories {
            RepositoryName::new(repository.name.clone())?;
            if !seen.insert(repository.name.as_str()) {
                return Err(Error::configuration(format!(
                    "duplicate repository: {}",
                    repository.name
                )));
            }
            if let Some(quota) = &repository.quota {
                quota.parse::<QuotaSpec>()?;
            }
        }

        if let Some(default) = &self.default_repository {
            if !seen.contains(default.as_str()) {
                return Err(Error::RepositoryNotFound(default.clone()));
            }
        }

        self.disk_quota.parse::<QuotaSpec>()?;

        for base in &self.proxied {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(Error::configuration(format!(
                    "proxied repository must be an http(s) URL: {base}"
                )));
            }
        }

        if self.proxy.workers == 0 {
            return Err(Error::configuration("proxy.workers must be at least 1"));
        }

        Ok(())
    }

    /// Name of the repository that receives rewritten paths
    #[must_use]
    pub fn primary_repository(&self) -> Option<&str> {
        self.default_repository
            .as_deref()
            .or_else(|| self.repositories.first().map(|r| r.name.as_str()))
    }

    /// Root directory for a repository
    #[must_use]
    pub fn repository_root(&self, repository: &RepositoryConfig) -> PathBuf {
        repository
            .path
            .clone()
            .unwrap_or_else(|| self.storage_dir.join(&repository.name))
    }

    /// Parsed global quota
    pub fn quota(&self) -> Result<QuotaSpec> {
        Ok(self.disk_quota.parse()?)
    }

    /// Socket address to listen on
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.hostname, self.port)
            .parse()
            .map_err(|e| Error::configuration(format!("invalid listen address: {e}")))
    }
}

/// A single local repository
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Unique name, also the first URI segment
    pub name: String,
    /// Storage root (defaults to `storage_dir/<name>`)
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Require a token to read from this repository
    #[serde(default)]
    pub private: bool,
    /// Per-repository quota, checked together with the global one
    #[serde(default)]
    pub quota: Option<String>,
}

impl RepositoryConfig {
    /// Public repository stored under the storage directory
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            private: false,
            quota: None,
        }
    }
}

/// Upstream client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Maximum concurrent proxied lookups
    pub workers: usize,
    /// Connect timeout per upstream (milliseconds)
    pub connect_timeout_ms: u64,
    /// Read timeout per upstream (milliseconds)
    pub read_timeout_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            workers: 32,
            connect_timeout_ms: 3_000,
            read_timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.primary_repository(), Some("releases"));
        assert_eq!(config.proxy.connect_timeout_ms, 3_000);
        assert_eq!(config.proxy.read_timeout_ms, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_repository_root() {
        let mut config = Config::default();
        config.storage_dir = PathBuf::from("/srv/quiver");
        let releases = config.repositories[0].clone();
        assert_eq!(
            config.repository_root(&releases),
            PathBuf::from("/srv/quiver/releases")
        );

        let mut custom = RepositoryConfig::new("mirror");
        custom.path = Some(PathBuf::from("/mnt/mirror"));
        assert_eq!(config.repository_root(&custom), PathBuf::from("/mnt/mirror"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut config = Config::default();
        config.repositories.push(RepositoryConfig::new("releases"));
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_default() {
        let config = Config {
            default_repository: Some("missing".into()),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::RepositoryNotFound(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_quota() {
        let config = Config {
            disk_quota: "lots".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidQuota(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiver.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
port = 9100
proxied = ["https://repo.maven.apache.org/maven2"]
store_proxied = false

[[repositories]]
name = "releases"

[[repositories]]
name = "private"
private = true
quota = "1GB"
"#
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.repositories.len(), 2);
        assert!(config.repositories[1].private);
        assert_eq!(config.proxied.len(), 1);
        assert!(!config.store_proxied);
        assert!(config.rewrite_paths);
    }
}
