//! Access token type

use base64::{Engine, engine::general_purpose::URL_SAFE};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a generated secret before encoding
const SECRET_BYTES: usize = 48;

/// Wildcard that matches any repository as the first prefix segment
const ANY_REPOSITORY: &str = "*";

/// An access token bound to a path prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Unique alias, also the Basic auth username
    pub alias: String,
    /// SHA-256 of the secret, hex encoded
    pub secret_hash: String,
    /// Permitted path prefix (e.g., "/releases/com/example" or "*/com/example")
    pub path: String,
}

impl Token {
    /// Create a token from a plaintext secret
    pub fn new(alias: impl Into<String>, path: impl Into<String>, secret: &str) -> Self {
        Self {
            alias: alias.into(),
            secret_hash: Self::hash_secret(secret),
            path: normalize_prefix(&path.into()),
        }
    }

    /// Hash a plaintext secret the way tokens store it
    #[must_use]
    pub fn hash_secret(secret: &str) -> String {
        hex::encode(Sha256::digest(secret.as_bytes()))
    }

    /// Check a plaintext secret against the stored hash
    #[must_use]
    pub fn verify(&self, secret: &str) -> bool {
        let candidate = Self::hash_secret(secret);
        constant_time_eq(candidate.as_bytes(), self.secret_hash.as_bytes())
    }

    /// Whether this token grants access to `path`
    ///
    /// Matching is segment-aware: `/releases/com` permits
    /// `/releases/com/example` but not `/releases/company`.
    #[must_use]
    pub fn permits(&self, path: &str) -> bool {
        let path = normalize_prefix(path);

        let Some(rest) = self.path.strip_prefix(ANY_REPOSITORY) else {
            return segment_prefix(&self.path, &path);
        };

        // Drop the repository segment of the requested path
        let without_repository = path
            .trim_start_matches('/')
            .split_once('/')
            .map_or_else(|| "/".to_string(), |(_, tail)| format!("/{tail}"));

        segment_prefix(&normalize_prefix(rest), &without_repository)
    }
}

/// Generate a fresh URL-safe secret
#[must_use]
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}

fn normalize_prefix(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') || trimmed.starts_with(ANY_REPOSITORY) {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn segment_prefix(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() || prefix == "/" {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|tail| tail.starts_with('/'))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
