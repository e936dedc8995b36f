//! Maven metadata generation and snapshot resolution
//!
//! Metadata documents are derived from the directory layout on every
//! request; nothing is cached between requests:
//! - `group/artifact/maven-metadata.xml` lists the version directories
//! - `group/artifact/1.0-SNAPSHOT/maven-metadata.xml` lists the concrete
//!   snapshot builds found in that version directory

pub mod snapshot;
pub mod types;

pub use snapshot::{SNAPSHOT_SUFFIX, SnapshotFile, base_version};
pub use types::{Metadata, Snapshot, SnapshotVersion, SnapshotVersions, Versioning, Versions};

use crate::error::MetadataError;
use crate::repository::Repository;
use crate::storage::Storage;
use crate::version;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Name of the pseudo-file answered with a generated document
pub const METADATA_FILE: &str = "maven-metadata.xml";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Builds metadata documents from repository directories
pub struct MetadataResolver {
    storage: Arc<dyn Storage>,
}

impl MetadataResolver {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Generate the document answering `segments` (ending in
    /// `maven-metadata.xml`)
    pub fn generate<S: AsRef<str>>(
        &self,
        repository: &Repository,
        segments: &[S],
    ) -> Result<String, MetadataError> {
        let segments: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
        let Some((_, directory)) = segments.split_last() else {
            return Err(MetadataError::InvalidPath(String::new()));
        };

        let path = repository
            .file(directory)
            .ok_or_else(|| MetadataError::InvalidPath(directory.join("/")))?;

        let document = match directory {
            [group @ .., artifact, version] if version.ends_with(SNAPSHOT_SUFFIX) => {
                self.snapshot_metadata(&path, group, artifact, version)?
            }
            [group @ .., artifact] => self.artifact_metadata(&path, group, artifact)?,
            [] => return Err(MetadataError::InvalidPath(String::new())),
        };

        render(&document)
    }

    /// Names of the version directories under `directory`, newest first
    ///
    /// A missing directory has no versions.
    #[must_use]
    pub fn versions(&self, directory: &Path) -> Vec<String> {
        let mut versions: Vec<String> = self
            .storage
            .list(directory)
            .map(|entries| {
                entries
                    .into_iter()
                    .filter(crate::storage::DirEntry::is_dir)
                    .map(|entry| entry.name)
                    .collect()
            })
            .unwrap_or_default();
        version::sort_descending(&mut versions);
        versions
    }

    /// Map a logical snapshot file name to the newest concrete build
    ///
    /// Only builds that carry a file with the requested classifier and
    /// extension are candidates.
    ///
    /// `[.., artifact, 1.0-SNAPSHOT, artifact-1.0-SNAPSHOT-sources.jar]`
    /// resolves to `artifact-1.0-<timestamp>-<build>-sources.jar`.
    pub fn resolve_snapshot_file<S: AsRef<str>>(
        &self,
        repository: &Repository,
        segments: &[S],
    ) -> Result<String, MetadataError> {
        let segments: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
        let [directory @ .., artifact, version, file_name] = segments.as_slice() else {
            return Err(MetadataError::InvalidPath(segments.join("/")));
        };

        if !version.ends_with(SNAPSHOT_SUFFIX) {
            return Err(MetadataError::InvalidPath(segments.join("/")));
        }

        let suffix = file_name
            .strip_prefix(&format!("{artifact}-{version}"))
            .ok_or_else(|| MetadataError::NotSnapshotArtifact((*file_name).to_string()))?;

        let mut version_directory: Vec<&str> = directory.to_vec();
        version_directory.extend([*artifact, *version]);
        let path = repository
            .file(&version_directory)
            .ok_or_else(|| MetadataError::InvalidPath(segments.join("/")))?;

        let base = base_version(version);
        let newest = self
            .snapshot_files(&path, artifact, base)
            .into_iter()
            .filter(|file| file.suffix() == suffix)
            .max_by(SnapshotFile::cmp_build)
            .ok_or_else(|| MetadataError::NoSnapshotBuild(version_directory.join("/")))?;

        Ok(format!("{artifact}-{}{suffix}", newest.value(base)))
    }

    fn artifact_metadata(
        &self,
        path: &Path,
        group: &[&str],
        artifact: &str,
    ) -> Result<Metadata, MetadataError> {
        let versions = self.versions(path);
        if versions.is_empty() {
            return Err(MetadataError::NotFound(path.display().to_string()));
        }

        Ok(Metadata {
            model_version: None,
            group_id: group_id(group),
            artifact_id: artifact.to_string(),
            version: None,
            versioning: Versioning {
                latest: version::latest(&versions).map(str::to_string),
                release: version::latest_release(&versions).map(str::to_string),
                versions: Some(Versions { version: versions }),
                last_updated: now(),
                ..Versioning::default()
            },
        })
    }

    fn snapshot_metadata(
        &self,
        path: &Path,
        group: &[&str],
        artifact: &str,
        version: &str,
    ) -> Result<Metadata, MetadataError> {
        let entries = self
            .storage
            .list(path)
            .map_err(|_| MetadataError::NotFound(path.display().to_string()))?;
        if entries.is_empty() {
            return Err(MetadataError::NotFound(path.display().to_string()));
        }

        let base = base_version(version);
        let builds: Vec<SnapshotFile> = self
            .snapshot_files(path, artifact, base)
            .into_iter()
            .filter(|file| !file.is_sidecar())
            .collect();

        let newest = builds.iter().max_by(|a, b| a.cmp_build(b));

        // Newest build per (classifier, extension)
        let mut by_kind: BTreeMap<(Option<String>, String), &SnapshotFile> = BTreeMap::new();
        for build in &builds {
            by_kind
                .entry((build.classifier.clone(), build.extension.clone()))
                .and_modify(|current| {
                    if build.cmp_build(current).is_gt() {
                        *current = build;
                    }
                })
                .or_insert(build);
        }

        let snapshot_versions: Vec<SnapshotVersion> = by_kind
            .into_values()
            .map(|build| SnapshotVersion {
                classifier: build.classifier.clone(),
                extension: build.extension.clone(),
                value: build.value(base),
                updated: build.updated(),
            })
            .collect();

        Ok(Metadata {
            model_version: Some("1.1.0".to_string()),
            group_id: group_id(group),
            artifact_id: artifact.to_string(),
            version: Some(version.to_string()),
            versioning: Versioning {
                snapshot: newest.map(|build| Snapshot {
                    timestamp: build.timestamp.clone(),
                    build_number: build.build_number,
                }),
                last_updated: newest.map_or_else(now, SnapshotFile::updated),
                snapshot_versions: (!snapshot_versions.is_empty()).then_some(SnapshotVersions {
                    snapshot_version: snapshot_versions,
                }),
                ..Versioning::default()
            },
        })
    }

    fn snapshot_files(&self, path: &Path, artifact: &str, base: &str) -> Vec<SnapshotFile> {
        self.storage
            .list(path)
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| !entry.is_dir())
            .filter_map(|entry| SnapshotFile::parse(&entry.name, artifact, base))
            .collect()
    }
}

fn group_id(group: &[&str]) -> Option<String> {
    (!group.is_empty()).then(|| group.join("."))
}

fn now() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S").to_string()
}

fn render(document: &Metadata) -> Result<String, MetadataError> {
    let mut xml = String::from(XML_DECLARATION);
    let mut serializer = quick_xml::se::Serializer::new(&mut xml);
    serializer.indent(' ', 2);
    document
        .serialize(serializer)
        .map_err(|e| MetadataError::Serialization(e.to_string()))?;
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use quiver_common::RepositoryName;

    fn fixture() -> (Arc<MemoryStorage>, MetadataResolver, Repository) {
        let storage = Arc::new(MemoryStorage::new());
        let resolver = MetadataResolver::new(storage.clone());
        let repository = Repository::new(RepositoryName::new("releases").unwrap(), "/repo");
        (storage, resolver, repository)
    }

    #[test]
    fn test_artifact_metadata() {
        let (storage, resolver, repository) = fixture();
        storage.put("/repo/com/example/lib/1.0/lib-1.0.jar", "a");
        storage.put("/repo/com/example/lib/1.2/lib-1.2.jar", "b");
        storage.put("/repo/com/example/lib/2.0-SNAPSHOT/lib-2.0-SNAPSHOT.jar", "c");

        let xml = resolver
            .generate(&repository, &["com", "example", "lib", METADATA_FILE])
            .unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<groupId>com.example</groupId>"));
        assert!(xml.contains("<artifactId>lib</artifactId>"));
        assert!(xml.contains("<release>1.2</release>"));
        assert!(xml.contains("<latest>2.0-SNAPSHOT</latest>"));

        let first = xml.find("<version>2.0-SNAPSHOT</version>").unwrap();
        let second = xml.find("<version>1.2</version>").unwrap();
        let third = xml.find("<version>1.0</version>").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_missing_or_empty_directory() {
        let (storage, resolver, repository) = fixture();
        assert!(matches!(
            resolver.generate(&repository, &["com", "example", "lib", METADATA_FILE]),
            Err(MetadataError::NotFound(_))
        ));

        // Files only, no version directories
        storage.put("/repo/com/example/lib/maven-metadata.xml.sha1", "x");
        assert!(matches!(
            resolver.generate(&repository, &["com", "example", "lib", METADATA_FILE]),
            Err(MetadataError::NotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_metadata() {
        let (storage, resolver, repository) = fixture();
        let dir = "/repo/com/example/lib/1.0-SNAPSHOT";
        storage.put(format!("{dir}/lib-1.0-20240101.100000-1.jar"), "1");
        storage.put(format!("{dir}/lib-1.0-20240101.110000-2.jar"), "2");
        storage.put(format!("{dir}/lib-1.0-20240101.120000-3.jar"), "3");
        storage.put(format!("{dir}/lib-1.0-20240101.120000-3.jar.sha1"), "s");
        storage.put(format!("{dir}/lib-1.0-20240101.120000-3.pom"), "p");

        let xml = resolver
            .generate(
                &repository,
                &["com", "example", "lib", "1.0-SNAPSHOT", METADATA_FILE],
            )
            .unwrap();

        assert!(xml.contains("modelVersion=\"1.1.0\""));
        assert!(xml.contains("<version>1.0-SNAPSHOT</version>"));
        assert!(xml.contains("<timestamp>20240101.120000</timestamp>"));
        assert!(xml.contains("<buildNumber>3</buildNumber>"));
        assert!(xml.contains("<value>1.0-20240101.120000-3</value>"));
        assert!(xml.contains("<extension>pom</extension>"));
        assert!(!xml.contains("sha1"));
        assert!(!xml.contains("1.0-20240101.100000-1"));
        assert!(xml.contains("<lastUpdated>20240101120000</lastUpdated>"));
    }

    #[test]
    fn test_resolve_snapshot_selects_newest_build() {
        let (storage, resolver, repository) = fixture();
        let dir = "/repo/com/example/lib/1.0-SNAPSHOT";
        storage.put(format!("{dir}/lib-1.0-20240101.100000-1.jar"), "1");
        storage.put(format!("{dir}/lib-1.0-20240101.120000-3.jar"), "3");
        storage.put(format!("{dir}/lib-1.0-20240101.110000-2.jar"), "2");

        let resolved = resolver
            .resolve_snapshot_file(
                &repository,
                &["com", "example", "lib", "1.0-SNAPSHOT", "lib-1.0-SNAPSHOT.jar"],
            )
            .unwrap();
        assert_eq!(resolved, "lib-1.0-20240101.120000-3.jar");
    }

    #[test]
    fn test_resolve_snapshot_matches_classifier_and_extension() {
        let (storage, resolver, repository) = fixture();
        let dir = "/repo/com/example/lib/1.0-SNAPSHOT";
        storage.put(format!("{dir}/lib-1.0-20240101.100000-1-sources.jar"), "s1");
        storage.put(format!("{dir}/lib-1.0-20240101.100000-1.jar"), "1");
        storage.put(format!("{dir}/lib-1.0-20240101.100000-1.jar.sha1"), "h1");
        storage.put(format!("{dir}/lib-1.0-20240101.120000-2.jar"), "2");

        let resolve = |file_name: &str| {
            resolver.resolve_snapshot_file(
                &repository,
                &["com", "example", "lib", "1.0-SNAPSHOT", file_name],
            )
        };

        assert_eq!(
            resolve("lib-1.0-SNAPSHOT-sources.jar").unwrap(),
            "lib-1.0-20240101.100000-1-sources.jar"
        );
        assert_eq!(
            resolve("lib-1.0-SNAPSHOT.jar").unwrap(),
            "lib-1.0-20240101.120000-2.jar"
        );
        assert_eq!(
            resolve("lib-1.0-SNAPSHOT.jar.sha1").unwrap(),
            "lib-1.0-20240101.100000-1.jar.sha1"
        );
        assert!(matches!(
            resolve("lib-1.0-SNAPSHOT.pom"),
            Err(MetadataError::NoSnapshotBuild(_))
        ));
    }

    #[test]
    fn test_resolve_snapshot_without_builds() {
        let (storage, resolver, repository) = fixture();
        storage.put(
            "/repo/com/example/lib/1.0-SNAPSHOT/lib-1.0-SNAPSHOT.jar",
            "legacy",
        );

        assert!(matches!(
            resolver.resolve_snapshot_file(
                &repository,
                &["com", "example", "lib", "1.0-SNAPSHOT", "lib-1.0-SNAPSHOT.jar"],
            ),
            Err(MetadataError::NoSnapshotBuild(_))
        ));
        assert!(matches!(
            resolver.resolve_snapshot_file(
                &repository,
                &["com", "example", "lib", "1.0-SNAPSHOT", "other-1.0-SNAPSHOT.jar"],
            ),
            Err(MetadataError::NotSnapshotArtifact(_))
        ));
    }
}
