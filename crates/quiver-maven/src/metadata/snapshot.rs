//! Concrete snapshot build file names
//!
//! A deployed snapshot file is named
//! `<artifactId>-<base>-<yyyyMMdd.HHmmss>-<buildNumber>[-<classifier>].<ext>`
//! where `<base>` is the version without its `-SNAPSHOT` suffix.

use std::cmp::Ordering;

pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Extensions that describe another file rather than being an artifact
const SIDECAR_EXTENSIONS: [&str; 5] = ["md5", "sha1", "sha256", "sha512", "asc"];

/// One concrete build file of a snapshot version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// `yyyyMMdd.HHmmss`
    pub timestamp: String,
    pub build_number: u32,
    pub classifier: Option<String>,
    pub extension: String,
}

impl SnapshotFile {
    /// Parse a file name from a snapshot version directory
    pub fn parse(file_name: &str, artifact_id: &str, base_version: &str) -> Option<Self> {
        let rest = file_name
            .strip_prefix(artifact_id)?
            .strip_prefix('-')?
            .strip_prefix(base_version)?
            .strip_prefix('-')?;

        let timestamp = rest.get(..15)?;
        if !is_timestamp(timestamp) {
            return None;
        }

        let rest = rest[15..].strip_prefix('-')?;
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let build_number = rest[..digits].parse().ok()?;
        let rest = &rest[digits..];

        let (classifier, extension) = if let Some(tail) = rest.strip_prefix('-') {
            let (classifier, extension) = tail.split_once('.')?;
            (Some(classifier.to_string()), extension)
        } else {
            (None, rest.strip_prefix('.')?)
        };

        if extension.is_empty() || classifier.as_deref() == Some("") {
            return None;
        }

        Some(Self {
            timestamp: timestamp.to_string(),
            build_number,
            classifier,
            extension: extension.to_string(),
        })
    }

    /// Concrete version string, e.g. `1.0-20240101.120000-3`
    #[must_use]
    pub fn value(&self, base_version: &str) -> String {
        format!("{base_version}-{}-{}", self.timestamp, self.build_number)
    }

    /// File name tail after the build number, e.g. `-sources.jar`
    #[must_use]
    pub fn suffix(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("-{classifier}.{}", self.extension),
            None => format!(".{}", self.extension),
        }
    }

    /// Timestamp as `yyyyMMddHHmmss`
    #[must_use]
    pub fn updated(&self) -> String {
        self.timestamp.replace('.', "")
    }

    /// Checksums and signatures of another build file
    #[must_use]
    pub fn is_sidecar(&self) -> bool {
        self.extension
            .rsplit('.')
            .next()
            .is_some_and(|last| SIDECAR_EXTENSIONS.contains(&last))
    }

    /// Order by (timestamp, build number)
    #[must_use]
    pub fn cmp_build(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.build_number.cmp(&other.build_number))
    }
}

/// Version with the `-SNAPSHOT` marker removed
#[must_use]
pub fn base_version(version: &str) -> &str {
    version.strip_suffix(SNAPSHOT_SUFFIX).unwrap_or(version)
}

fn is_timestamp(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'.'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let file = SnapshotFile::parse("lib-1.0-20240101.120000-3.jar", "lib", "1.0").unwrap();
        assert_eq!(file.timestamp, "20240101.120000");
        assert_eq!(file.build_number, 3);
        assert_eq!(file.classifier, None);
        assert_eq!(file.extension, "jar");
        assert_eq!(file.value("1.0"), "1.0-20240101.120000-3");
        assert_eq!(file.updated(), "20240101120000");
        assert_eq!(file.suffix(), ".jar");
    }

    #[test]
    fn test_parse_classifier_and_sidecar() {
        let file =
            SnapshotFile::parse("lib-1.0-20240101.120000-12-sources.jar", "lib", "1.0").unwrap();
        assert_eq!(file.build_number, 12);
        assert_eq!(file.classifier.as_deref(), Some("sources"));
        assert_eq!(file.extension, "jar");
        assert!(!file.is_sidecar());
        assert_eq!(file.suffix(), "-sources.jar");

        let sha = SnapshotFile::parse("lib-1.0-20240101.120000-12.pom.sha1", "lib", "1.0").unwrap();
        assert_eq!(sha.extension, "pom.sha1");
        assert!(sha.is_sidecar());
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert!(SnapshotFile::parse("maven-metadata.xml", "lib", "1.0").is_none());
        assert!(SnapshotFile::parse("lib-1.0-SNAPSHOT.jar", "lib", "1.0").is_none());
        assert!(SnapshotFile::parse("other-1.0-20240101.120000-1.jar", "lib", "1.0").is_none());
        assert!(SnapshotFile::parse("lib-1.0-2024010.1120000-1.jar", "lib", "1.0").is_none());
        assert!(SnapshotFile::parse("lib-1.0-20240101.120000-1", "lib", "1.0").is_none());
    }

    #[test]
    fn test_cmp_build() {
        let older = SnapshotFile::parse("a-1-20240101.120000-9.jar", "a", "1").unwrap();
        let newer = SnapshotFile::parse("a-1-20240102.000000-1.jar", "a", "1").unwrap();
        let same_ts = SnapshotFile::parse("a-1-20240102.000000-2.jar", "a", "1").unwrap();
        assert_eq!(older.cmp_build(&newer), Ordering::Less);
        assert_eq!(same_ts.cmp_build(&newer), Ordering::Greater);
    }

    #[test]
    fn test_base_version() {
        assert_eq!(base_version("1.0-SNAPSHOT"), "1.0");
        assert_eq!(base_version("1.0"), "1.0");
    }
}
