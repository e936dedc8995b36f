//! Request authorization
//!
//! Maps a raw request URI to a repository plus the remaining path segments
//! and checks the caller's token when the repository demands it.

use crate::error::AccessError;
use crate::metadata::{METADATA_FILE, SNAPSHOT_SUFFIX};
use crate::repository::{Repository, RepositorySet};
use quiver_auth::{AuthError, Credentials, TokenStore};
use std::sync::Arc;
use tracing::debug;

/// A request path the caller may read
#[derive(Debug, Clone)]
pub struct AuthorizedPath {
    pub repository: Arc<Repository>,
    /// Segments below the repository root
    pub path: Vec<String>,
}

pub struct Authenticator {
    repositories: Arc<RepositorySet>,
    tokens: Arc<TokenStore>,
    full_auth: bool,
    rewrite_paths: bool,
}

impl Authenticator {
    pub fn new(repositories: Arc<RepositorySet>, tokens: Arc<TokenStore>) -> Self {
        Self {
            repositories,
            tokens,
            full_auth: false,
            rewrite_paths: true,
        }
    }

    /// Require a token for every repository, not just private ones
    #[must_use]
    pub const fn with_full_auth(mut self, full_auth: bool) -> Self {
        self.full_auth = full_auth;
        self
    }

    /// Route paths without a known repository prefix to the primary repository
    #[must_use]
    pub const fn with_rewrite_paths(mut self, rewrite_paths: bool) -> Self {
        self.rewrite_paths = rewrite_paths;
        self
    }

    pub fn authorize(
        &self,
        uri: &str,
        credentials: Option<&Credentials>,
    ) -> Result<AuthorizedPath, AccessError> {
        let segments = split_segments(uri);
        let (repository, path) = self.select(segments)?;

        if repository.is_private() || self.full_auth {
            let credentials = credentials.ok_or(AuthError::MissingCredentials)?;
            let token = self.tokens.authenticate(credentials)?;

            let location = location(&repository, &path);
            if !token.permits(&location) {
                return Err(AuthError::PathNotPermitted(location).into());
            }
            debug!("Token {} authorized {}", token.alias, location);
        }

        Ok(AuthorizedPath { repository, path })
    }

    fn select(&self, mut segments: Vec<String>) -> Result<(Arc<Repository>, Vec<String>), AccessError> {
        if let Some(repository) = segments.first().and_then(|name| self.repositories.get(name)) {
            segments.remove(0);
            return Ok((repository, segments));
        }

        if self.rewrite_paths {
            return Ok((self.repositories.primary(), segments));
        }

        Err(AccessError::RepositoryNotFound(
            segments.first().cloned().unwrap_or_default(),
        ))
    }
}

/// Non-empty `/`-separated segments of `uri`
#[must_use]
pub fn split_segments(uri: &str) -> Vec<String> {
    uri.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `uri` asks for the metadata of a snapshot version
#[must_use]
pub fn is_snapshot_metadata(uri: &str) -> bool {
    uri.contains(SNAPSHOT_SUFFIX) && uri.ends_with(METADATA_FILE)
}

fn location(repository: &Repository, path: &[String]) -> String {
    let mut location = format!("/{}", repository.name());
    for segment in path {
        location.push('/');
        location.push_str(segment);
    }
    location
}
