//! Filesystem capability used by the resolvers
//!
//! Every disk access of the engine goes through [`Storage`], so tests can
//! swap the local filesystem for an in-memory tree.

use bytes::Bytes;
use std::io::{self, Write};
use std::path::Path;

/// Kind of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File { len: u64 },
    Directory,
}

/// Single entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}

/// Disk access for repositories
pub trait Storage: Send + Sync {
    /// Kind of the entry at `path`, `None` if absent
    fn entry(&self, path: &Path) -> Option<EntryKind>;

    /// Entries directly under `dir`
    fn list(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    /// Full contents of a file
    fn read(&self, path: &Path) -> io::Result<Bytes>;

    /// Write `data` to `path`, creating parent directories
    ///
    /// Returns the size of the file after the write.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<u64>;
}

/// [`Storage`] backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn entry(&self, path: &Path) -> Option<EntryKind> {
        let metadata = std::fs::metadata(path).ok()?;
        if metadata.is_dir() {
            Some(EntryKind::Directory)
        } else {
            Some(EntryKind::File {
                len: metadata.len(),
            })
        }
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            let kind = if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File {
                    len: metadata.len(),
                }
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Bytes> {
        std::fs::read(path).map(Bytes::from)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<u64> {
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
        std::fs::create_dir_all(parent)?;

        // Each writer stages into its own file; readers only see complete artifacts
        let mut staging = tempfile::NamedTempFile::new_in(parent)?;
        staging.write_all(data)?;
        staging.as_file().sync_all()?;
        staging.persist(path).map_err(|e| e.error)?;

        Ok(data.len() as u64)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory [`Storage`] for tests

    use super::{DirEntry, EntryKind, Storage};
    use bytes::Bytes;
    use parking_lot::RwLock;
    use std::collections::BTreeMap;
    use std::io;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    pub struct MemoryStorage {
        files: RwLock<BTreeMap<PathBuf, Bytes>>,
        fail_writes: bool,
    }

    impl MemoryStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_writes() -> Self {
            Self {
                fail_writes: true,
                ..Self::default()
            }
        }

        pub fn put(&self, path: impl Into<PathBuf>, data: impl Into<Bytes>) {
            self.files.write().insert(path.into(), data.into());
        }

        pub fn contains(&self, path: &Path) -> bool {
            self.files.read().contains_key(path)
        }

        fn is_dir(&self, path: &Path) -> bool {
            self.files
                .read()
                .keys()
                .any(|file| file != path && file.starts_with(path))
        }
    }

    impl Storage for MemoryStorage {
        fn entry(&self, path: &Path) -> Option<EntryKind> {
            if let Some(data) = self.files.read().get(path) {
                return Some(EntryKind::File {
                    len: data.len() as u64,
                });
            }
            self.is_dir(path).then_some(EntryKind::Directory)
        }

        fn list(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
            if !self.is_dir(dir) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
            }

            let files = self.files.read();
            let mut entries: BTreeMap<String, EntryKind> = BTreeMap::new();
            for (path, data) in files.iter() {
                let Ok(relative) = path.strip_prefix(dir) else {
                    continue;
                };
                let mut components = relative.components();
                let Some(first) = components.next() else {
                    continue;
                };
                let name = first.as_os_str().to_string_lossy().into_owned();
                let kind = if components.next().is_some() {
                    EntryKind::Directory
                } else {
                    EntryKind::File {
                        len: data.len() as u64,
                    }
                };
                entries.insert(name, kind);
            }

            Ok(entries
                .into_iter()
                .map(|(name, kind)| DirEntry { name, kind })
                .collect())
        }

        fn read(&self, path: &Path) -> io::Result<Bytes> {
            self.files
                .read()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }

        fn write(&self, path: &Path, data: &[u8]) -> io::Result<u64> {
            if self.fail_writes {
                return Err(io::Error::other("disk on fire"));
            }
            self.put(path.to_path_buf(), Bytes::copy_from_slice(data));
            Ok(data.len() as u64)
        }
    }
}
