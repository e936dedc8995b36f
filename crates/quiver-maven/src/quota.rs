//! Disk quota for cached artifacts
//!
//! The quota is soft: usage is recorded after a write completes, so the
//! counter may briefly exceed the ceiling. Writes are refused once
//! `used >= capacity`.
//!
//! A percentage quota is sized once from the free space on the volume when
//! the quota is built at startup. Later changes in free space do not move
//! its ceiling.

use quiver_common::{Error, QuotaSpec, Result};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Byte ceiling with a concurrent usage counter
#[derive(Debug)]
pub struct DiskQuota {
    /// Maximum allowed bytes
    capacity: u64,
    /// Bytes consumed so far
    used: AtomicU64,
}

impl DiskQuota {
    /// Quota with a fixed ceiling
    #[must_use]
    pub const fn of_capacity(capacity: u64, used: u64) -> Self {
        Self {
            capacity,
            used: AtomicU64::new(used),
        }
    }

    /// Quota without a ceiling
    #[must_use]
    pub const fn unlimited() -> Self {
        Self::of_capacity(u64::MAX, 0)
    }

    /// Quota sized as a share of the free space on the volume holding `path`
    pub fn of_percentage(path: &Path, percentage: u8, used: u64) -> Result<Self> {
        let available = available_space(path)?;
        let capacity = available / 100 * u64::from(percentage);
        debug!(
            "Disk quota for {}: {}% of {} bytes available = {} bytes",
            path.display(),
            percentage,
            available,
            capacity
        );
        Ok(Self::of_capacity(capacity, used))
    }

    /// Build a quota from its configured declaration
    pub fn from_spec(spec: QuotaSpec, path: &Path, used: u64) -> Result<Self> {
        match spec {
            QuotaSpec::Bytes(capacity) => Ok(Self::of_capacity(capacity, used)),
            QuotaSpec::Percentage(percentage) => Self::of_percentage(path, percentage, used),
            QuotaSpec::Unlimited => Ok(Self::of_capacity(u64::MAX, used)),
        }
    }

    /// Whether another write may start
    pub fn has_usable_space(&self) -> bool {
        self.used.load(Ordering::Acquire) < self.capacity
    }

    /// Record `bytes` written
    pub fn allocate(&self, bytes: u64) {
        let previous = self.used.fetch_add(bytes, Ordering::AcqRel);
        if previous < self.capacity && previous.saturating_add(bytes) >= self.capacity {
            warn!(
                "Disk quota reached: {} of {} bytes used",
                previous.saturating_add(bytes),
                self.capacity
            );
        }
    }

    /// Replace the usage counter with a fresh recount of `roots`
    pub fn recount<'a>(&self, roots: impl IntoIterator<Item = &'a Path>) {
        let total = roots.into_iter().map(usage_of).sum();
        self.used.store(total, Ordering::Release);
    }

    pub fn used(&self) -> u64 {
        self.used.load(Ordering::Acquire)
    }

    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }
}

/// Total size of every file under `root`
pub fn usage_of(root: &Path) -> u64 {
    WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

#[cfg(unix)]
#[allow(clippy::unnecessary_cast)]
fn available_space(path: &Path) -> Result<u64> {
    let stat = nix::sys::statvfs::statvfs(path)
        .map_err(|e| Error::storage(format!("statvfs {}: {e}", path.display())))?;
    Ok(stat.blocks_available() as u64 * stat.fragment_size() as u64)
}

#[cfg(not(unix))]
fn available_space(path: &Path) -> Result<u64> {
    Err(Error::configuration(format!(
        "percentage quotas are not supported on this platform ({})",
        path.display()
    )))
}
