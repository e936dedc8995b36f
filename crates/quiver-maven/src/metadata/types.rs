//! `maven-metadata.xml` document model

use serde::Serialize;

/// Root `<metadata>` element
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "metadata")]
pub struct Metadata {
    #[serde(rename = "@modelVersion", skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(rename = "artifactId")]
    pub artifact_id: String,
    /// Set only for a snapshot version document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub versioning: Versioning,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Versioning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<Versions>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    #[serde(rename = "snapshotVersions", skip_serializing_if = "Option::is_none")]
    pub snapshot_versions: Option<SnapshotVersions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Versions {
    pub version: Vec<String>,
}

/// Newest build of a snapshot version
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub timestamp: String,
    #[serde(rename = "buildNumber")]
    pub build_number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotVersions {
    #[serde(rename = "snapshotVersion")]
    pub snapshot_version: Vec<SnapshotVersion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotVersion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    pub extension: String,
    pub value: String,
    pub updated: String,
}
