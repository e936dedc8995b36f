//! Write-through cache for proxied artifacts
//!
//! A fetched body lands in the repository named by the request path, at the
//! same path shape, so the next lookup is a local hit.

use crate::authenticator::split_segments;
use crate::error::ProxyError;
use crate::repository::{Repository, RepositorySet};
use crate::storage::Storage;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where a proxied body ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult {
    /// Written to disk; carries the bytes read back from the file
    Stored(Bytes),
    /// Not written; carries the upstream bytes unchanged
    Skipped(Bytes),
}

impl CacheResult {
    /// Bytes to send to the client
    #[must_use]
    pub fn into_body(self) -> Bytes {
        match self {
            Self::Stored(body) | Self::Skipped(body) => body,
        }
    }
}

pub struct CacheStore {
    repositories: Arc<RepositorySet>,
    storage: Arc<dyn Storage>,
    rewrite_paths: bool,
}

impl CacheStore {
    pub fn new(repositories: Arc<RepositorySet>, storage: Arc<dyn Storage>, rewrite_paths: bool) -> Self {
        Self {
            repositories,
            storage,
            rewrite_paths,
        }
    }

    /// Store `body` fetched for `uri`
    ///
    /// Blocks on filesystem I/O. Quota exhaustion and unknown repositories
    /// skip the write but still hand the bytes back.
    pub fn store(&self, uri: &str, body: Bytes) -> Result<CacheResult, ProxyError> {
        if !self.repositories.disk_quota().has_usable_space() {
            warn!("Out of disk space - Cannot store proxied artifact {}", uri);
            return Ok(CacheResult::Skipped(body));
        }

        let Some((repository, path)) = self.target(uri) else {
            debug!("No repository for proxied artifact {}, not storing", uri);
            return Ok(CacheResult::Skipped(body));
        };

        if !repository.has_usable_space() {
            warn!(
                "Repository {} is out of quota - Cannot store proxied artifact {}",
                repository.name(),
                uri
            );
            return Ok(CacheResult::Skipped(body));
        }

        let Some(file) = repository.file(&path).filter(|_| !path.is_empty()) else {
            warn!("Cannot store proxied artifact {}: invalid path", uri);
            return Ok(CacheResult::Skipped(body));
        };

        let written = self.storage.write(&file, &body).map_err(|e| {
            error!("Cannot store proxied artifact at {}: {}", file.display(), e);
            ProxyError::cancelled(uri, e.to_string())
        })?;

        let stored = self.storage.read(&file).map_err(|e| {
            error!("Cannot read back proxied artifact at {}: {}", file.display(), e);
            ProxyError::cancelled(uri, e.to_string())
        })?;

        self.repositories.disk_quota().allocate(written);
        if let Some(quota) = repository.quota() {
            quota.allocate(written);
        }

        info!("Stored proxied /{}/{}", repository.name(), path.join("/"));
        Ok(CacheResult::Stored(stored))
    }

    /// Repository and in-repository path for `uri`
    fn target(&self, uri: &str) -> Option<(Arc<Repository>, Vec<String>)> {
        let mut segments = split_segments(uri);

        if let Some(repository) = segments.first().and_then(|name| self.repositories.get(name)) {
            segments.remove(0);
            return Some((repository, segments));
        }

        self.rewrite_paths
            .then(|| (self.repositories.primary(), segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::DiskQuota;
    use crate::storage::LocalStorage;
    use crate::storage::memory::MemoryStorage;
    use quiver_common::RepositoryName;
    use std::path::Path;

    fn repositories(global: DiskQuota, releases_quota: Option<DiskQuota>) -> Arc<RepositorySet> {
        let mut releases = Repository::new(RepositoryName::new("releases").unwrap(), "/srv/releases");
        if let Some(quota) = releases_quota {
            releases = releases.with_quota(quota);
        }
        let snapshots = Repository::new(RepositoryName::new("snapshots").unwrap(), "/srv/snapshots");
        Arc::new(RepositorySet::new(vec![releases, snapshots], None, global, Vec::new()).unwrap())
    }

    fn store(
        repositories: Arc<RepositorySet>,
        storage: Arc<MemoryStorage>,
        rewrite_paths: bool,
    ) -> CacheStore {
        CacheStore::new(repositories, storage, rewrite_paths)
    }

    #[test]
    fn test_stores_under_named_repository() {
        let storage = Arc::new(MemoryStorage::new());
        let set = repositories(DiskQuota::of_capacity(1024, 0), None);
        let cache = store(set.clone(), storage.clone(), true);

        let result = cache
            .store("/snapshots/g/a/1.0/a-1.0.jar", Bytes::from_static(b"jar"))
            .unwrap();

        assert_eq!(result, CacheResult::Stored(Bytes::from_static(b"jar")));
        assert!(storage.contains(Path::new("/srv/snapshots/g/a/1.0/a-1.0.jar")));
        assert_eq!(set.disk_quota().used(), 3);
    }

    #[test]
    fn test_rewrites_to_primary() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = store(repositories(DiskQuota::unlimited(), None), storage.clone(), true);

        cache
            .store("/g/a/1.0/a-1.0.jar", Bytes::from_static(b"jar"))
            .unwrap();
        assert!(storage.contains(Path::new("/srv/releases/g/a/1.0/a-1.0.jar")));
    }

    #[test]
    fn test_unknown_repository_without_rewrite() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = store(repositories(DiskQuota::unlimited(), None), storage.clone(), false);

        let result = cache
            .store("/g/a/1.0/a-1.0.jar", Bytes::from_static(b"jar"))
            .unwrap();
        assert_eq!(result, CacheResult::Skipped(Bytes::from_static(b"jar")));
        assert!(!storage.contains(Path::new("/srv/releases/g/a/1.0/a-1.0.jar")));
    }

    #[test]
    fn test_full_quota_skips_write() {
        let storage = Arc::new(MemoryStorage::new());
        let set = repositories(DiskQuota::of_capacity(10, 10), None);
        let cache = store(set.clone(), storage.clone(), true);

        let result = cache
            .store("/releases/g/a/1.0/a-1.0.jar", Bytes::from_static(b"jar"))
            .unwrap();
        assert_eq!(result.into_body(), Bytes::from_static(b"jar"));
        assert!(!storage.contains(Path::new("/srv/releases/g/a/1.0/a-1.0.jar")));
        assert_eq!(set.disk_quota().used(), 10);
    }

    #[test]
    fn test_repository_quota_checked_and_charged() {
        let storage = Arc::new(MemoryStorage::new());
        let set = repositories(DiskQuota::unlimited(), Some(DiskQuota::of_capacity(4, 0)));
        let cache = store(set.clone(), storage.clone(), true);

        cache
            .store("/releases/g/a/1.0/a-1.0.jar", Bytes::from_static(b"12345"))
            .unwrap();
        let releases = set.get("releases").unwrap();
        assert_eq!(releases.quota().unwrap().used(), 5);

        let second = cache
            .store("/releases/g/a/1.1/a-1.1.jar", Bytes::from_static(b"x"))
            .unwrap();
        assert!(matches!(second, CacheResult::Skipped(_)));
    }

    #[test]
    fn test_write_failure_cancels() {
        let storage = Arc::new(MemoryStorage::failing_writes());
        let cache = store(repositories(DiskQuota::unlimited(), None), storage, true);

        let result = cache.store("/releases/g/a/1.0/a-1.0.jar", Bytes::from_static(b"jar"));
        assert!(matches!(result, Err(ProxyError::Cancelled { .. })));
    }

    fn local_repositories(root: &Path) -> Arc<RepositorySet> {
        let releases = Repository::new(RepositoryName::new("releases").unwrap(), root.join("releases"))
            .with_quota(DiskQuota::of_capacity(1 << 30, 0));
        Arc::new(
            RepositorySet::new(vec![releases], None, DiskQuota::of_capacity(1 << 30, 0), Vec::new())
                .unwrap(),
        )
    }

    #[test]
    fn test_concurrent_stores_charge_each_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let set = local_repositories(dir.path());
        let cache = CacheStore::new(set.clone(), Arc::new(LocalStorage), false);

        let sizes: Vec<usize> = (1..=16).map(|i| i * 1000).collect();
        std::thread::scope(|scope| {
            for (i, size) in sizes.iter().enumerate() {
                let cache = &cache;
                scope.spawn(move || {
                    let uri = format!("/releases/g/a/{i}.0/a-{i}.0.jar");
                    let body = Bytes::from(vec![b'x'; *size]);
                    let result = cache.store(&uri, body.clone()).unwrap();
                    assert_eq!(result, CacheResult::Stored(body));
                });
            }
        });

        let total: u64 = sizes.iter().map(|size| *size as u64).sum();
        assert_eq!(set.disk_quota().used(), total);
        assert_eq!(set.get("releases").unwrap().quota().unwrap().used(), total);
        for (i, size) in sizes.iter().enumerate() {
            let file = dir.path().join(format!("releases/g/a/{i}.0/a-{i}.0.jar"));
            assert_eq!(std::fs::metadata(file).unwrap().len(), *size as u64);
        }
    }

    #[test]
    fn test_concurrent_stores_of_same_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(local_repositories(dir.path()), Arc::new(LocalStorage), false);
        let body = Bytes::from(
            (0..1 << 20).map(|i: u32| (i % 251) as u8).collect::<Vec<u8>>(),
        );

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let cache = &cache;
                let body = body.clone();
                scope.spawn(move || {
                    let result = cache.store("/releases/g/a/1.0/a-1.0.jar", body.clone()).unwrap();
                    assert_eq!(result, CacheResult::Stored(body));
                });
            }
        });

        let stored = std::fs::read(dir.path().join("releases/g/a/1.0/a-1.0.jar")).unwrap();
        assert_eq!(stored, body.as_ref());
    }
}
