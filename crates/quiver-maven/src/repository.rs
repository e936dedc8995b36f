//! Configured repositories
//!
//! A [`RepositorySet`] is built once at startup and is read-only afterwards,
//! except for the quota counters it owns.

use crate::quota::{DiskQuota, usage_of};
use quiver_common::{Config, Error, QuotaSpec, RepositoryName, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// A local repository
#[derive(Debug)]
pub struct Repository {
    name: RepositoryName,
    root: PathBuf,
    private: bool,
    quota: Option<DiskQuota>,
}

impl Repository {
    pub fn new(name: RepositoryName, root: impl Into<PathBuf>) -> Self {
        Self {
            name,
            root: root.into(),
            private: false,
            quota: None,
        }
    }

    #[must_use]
    pub const fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    #[must_use]
    pub fn with_quota(mut self, quota: DiskQuota) -> Self {
        self.quota = Some(quota);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.private
    }

    #[must_use]
    pub const fn quota(&self) -> Option<&DiskQuota> {
        self.quota.as_ref()
    }

    /// Location of `segments` under the repository root
    ///
    /// Returns `None` for segments that could escape the root.
    #[must_use]
    pub fn file<S: AsRef<str>>(&self, segments: &[S]) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains(['/', '\\', '\0'])
            {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }

    /// Whether the repository's own quota allows another write
    pub fn has_usable_space(&self) -> bool {
        self.quota.as_ref().is_none_or(DiskQuota::has_usable_space)
    }
}

/// All configured repositories plus the upstream proxy chain
#[derive(Debug)]
pub struct RepositorySet {
    /// Repositories in declaration order
    repositories: Vec<Arc<Repository>>,
    /// Index of the default (primary) repository
    primary: usize,
    /// Global quota over every repository
    disk_quota: DiskQuota,
    /// Upstream base URLs, in priority order
    proxied: Vec<String>,
}

impl RepositorySet {
    /// Assemble a set; `primary` defaults to the first repository
    pub fn new(
        repositories: Vec<Repository>,
        primary: Option<&str>,
        disk_quota: DiskQuota,
        proxied: Vec<String>,
    ) -> Result<Self> {
        if repositories.is_empty() {
            return Err(Error::configuration("at least one repository is required"));
        }

        let primary = match primary {
            Some(name) => repositories
                .iter()
                .position(|r| r.name() == name)
                .ok_or_else(|| Error::RepositoryNotFound(name.to_string()))?,
            None => 0,
        };

        Ok(Self {
            repositories: repositories.into_iter().map(Arc::new).collect(),
            primary,
            disk_quota,
            proxied,
        })
    }

    /// Build from configuration, creating repository roots and counting
    /// their current usage
    pub fn from_config(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.storage_dir)?;

        let mut repositories = Vec::with_capacity(config.repositories.len());
        let mut roots = Vec::with_capacity(config.repositories.len());

        for repository_config in &config.repositories {
            let name = RepositoryName::new(repository_config.name.clone())?;
            let root = config.repository_root(repository_config);
            std::fs::create_dir_all(&root)?;

            let mut repository =
                Repository::new(name, root.clone()).with_private(repository_config.private);

            if let Some(spec) = &repository_config.quota {
                let spec: QuotaSpec = spec.parse()?;
                repository = repository.with_quota(DiskQuota::from_spec(
                    spec,
                    &root,
                    usage_of(&root),
                )?);
            }

            info!(
                "Repository {} at {}{}",
                repository.name(),
                root.display(),
                if repository.is_private() { " (private)" } else { "" }
            );
            repositories.push(repository);
            roots.push(root);
        }

        let used = roots.iter().map(|root| usage_of(root)).sum();
        let disk_quota = DiskQuota::from_spec(config.quota()?, &config.storage_dir, used)?;
        info!(
            "Disk quota: {} bytes used of {}",
            disk_quota.used(),
            config.disk_quota
        );

        Self::new(
            repositories,
            config.primary_repository(),
            disk_quota,
            config.proxied.clone(),
        )
    }

    /// Repository by name
    pub fn get(&self, name: &str) -> Option<Arc<Repository>> {
        self.repositories
            .iter()
            .find(|repository| repository.name() == name)
            .cloned()
    }

    /// Repository receiving requests without a repository prefix
    pub fn primary(&self) -> Arc<Repository> {
        self.repositories[self.primary].clone()
    }

    pub fn repositories(&self) -> &[Arc<Repository>] {
        &self.repositories
    }

    pub fn disk_quota(&self) -> &DiskQuota {
        &self.disk_quota
    }

    /// Upstream base URLs, in priority order
    pub fn proxied(&self) -> &[String] {
        &self.proxied
    }
}
