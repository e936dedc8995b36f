//! Local artifact resolution
//!
//! Serves artifacts straight from a repository root and answers the
//! `maven-metadata.xml` and `latest` pseudo-files. Runs synchronously on the
//! calling thread.

use crate::metadata::{METADATA_FILE, MetadataResolver, SNAPSHOT_SUFFIX};
use crate::outcome::{Method, OCTET_STREAM, Outcome, Served};
use crate::repository::Repository;
use crate::storage::{EntryKind, Storage};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

const LATEST_FILE: &str = "latest";

/// Resolves authorized request paths against local storage
pub struct LocalResolver {
    storage: Arc<dyn Storage>,
    metadata: MetadataResolver,
}

impl LocalResolver {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            metadata: MetadataResolver::new(storage.clone()),
            storage,
        }
    }

    /// Resolve `path` (segments after the repository name)
    pub fn resolve(&self, repository: &Repository, path: &[String], method: Method) -> Outcome {
        // Less than 'group/(artifact OR metadata)'
        let Some(requested) = path.last().filter(|_| path.len() >= 2) else {
            return Outcome::SoftError("Missing artifact identifier".to_string());
        };

        if requested == METADATA_FILE {
            return match self.metadata.generate(repository, path) {
                Ok(xml) => Outcome::Served(Served::document("text/xml", xml, method)),
                Err(e) => Outcome::TryProxy(e.to_string()),
            };
        }

        if requested.eq_ignore_ascii_case(LATEST_FILE) {
            let Some(directory) = repository.file(&path[..path.len() - 1]) else {
                return Outcome::SoftError("Invalid artifact path".to_string());
            };
            return match self.metadata.versions(&directory).into_iter().next() {
                Some(version) => Outcome::Served(Served::document("text/plain", version, method)),
                None => Outcome::NotFound("Latest version not found".to_string()),
            };
        }

        let mut target = path.to_vec();
        if requested.contains(SNAPSHOT_SUFFIX) {
            match self.metadata.resolve_snapshot_file(repository, path) {
                Ok(concrete) => {
                    debug!("Snapshot {} resolved to {}", requested, concrete);
                    if let Some(last) = target.last_mut() {
                        *last = concrete;
                    }
                }
                Err(e) => debug!("Serving {} as requested: {}", requested, e),
            }
        }

        let Some(file) = repository.file(&target) else {
            return Outcome::SoftError("Invalid artifact path".to_string());
        };

        match self.storage.entry(&file) {
            Some(EntryKind::Directory) => Outcome::SoftError("Directory access".to_string()),
            None => Outcome::TryProxy(format!("Artifact {requested} not found")),
            Some(EntryKind::File { len }) => self.serve_file(&file, len, requested, method),
        }
    }

    fn serve_file(&self, file: &Path, len: u64, requested: &str, method: Method) -> Outcome {
        let content_type = file
            .file_name()
            .and_then(|name| content_type_of(&name.to_string_lossy()))
            .unwrap_or(OCTET_STREAM);

        let (body, size) = if method.is_head() {
            (None, len)
        } else {
            match self.storage.read(file) {
                Ok(bytes) => {
                    let size = bytes.len() as u64;
                    (Some(bytes), size)
                }
                Err(e) => {
                    error!("Cannot read artifact {}: {}", file.display(), e);
                    return Outcome::InternalError("Cannot read artifact".to_string());
                }
            }
        };

        info!(
            "RESOLVED {}; mime: {}; size: {}",
            file.display(),
            content_type,
            size
        );

        Outcome::Served(Served {
            status: 200,
            content_type: content_type.to_string(),
            content_length: Some(size),
            file_name: Some(requested.to_string()),
            body,
        })
    }
}

/// Content type by file extension, `None` when unknown
#[must_use]
pub fn content_type_of(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    let content_type = match extension.to_ascii_lowercase().as_str() {
        "jar" | "war" | "ear" => "application/java-archive",
        "pom" | "xml" => "application/xml",
        "json" | "module" => "application/json",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "asc" => "application/pgp-signature",
        "md5" | "sha1" | "sha256" | "sha512" | "txt" => "text/plain",
        "html" | "htm" => "text/html",
        _ => return None,
    };
    Some(content_type)
}
