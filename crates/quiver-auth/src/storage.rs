//! Flat-file persistence for the token set
//!
//! The file holds every token and is rewritten in full on save.

use crate::error::AuthError;
use crate::store::TokenStore;
use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokensCollection {
    #[serde(default)]
    tokens: Vec<Token>,
}

/// JSON token file
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every token from the file into `store`
    ///
    /// A missing file counts as an empty token set.
    pub fn load(&self, store: &TokenStore) -> Result<usize, AuthError> {
        let collection = match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<TokensCollection>(&bytes)
                .map_err(|e| AuthError::Storage(format!("{}: {e}", self.path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TokensCollection::default(),
            Err(e) => {
                return Err(AuthError::Storage(format!("{}: {e}", self.path.display())));
            }
        };

        let count = collection.tokens.len();
        for token in collection.tokens {
            store.add(token);
        }

        info!("Loaded tokens: {}", count);
        Ok(count)
    }

    /// Replace the file contents with the tokens currently in `store`
    pub fn save(&self, store: &TokenStore) -> Result<usize, AuthError> {
        let collection = TokensCollection {
            tokens: store.all(),
        };
        let json = serde_json::to_vec_pretty(&collection)
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .map_err(|e| AuthError::Storage(format!("{}: {e}", parent.display())))?;

        let storage_error =
            |e: std::io::Error| AuthError::Storage(format!("{}: {e}", self.path.display()));
        let mut staging = tempfile::NamedTempFile::new_in(parent).map_err(storage_error)?;
        staging.write_all(&json).map_err(storage_error)?;
        staging
            .persist(&self.path)
            .map_err(|e| storage_error(e.error))?;

        info!("Saved tokens: {}", collection.tokens.len());
        Ok(collection.tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = TokenFile::new(dir.path().join("tokens.json"));
        let store = TokenStore::new();
        assert_eq!(file.load(&store).unwrap(), 0);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_save_rewrites_whole_set() {
        let dir = tempfile::tempdir().unwrap();
        let file = TokenFile::new(dir.path().join("nested").join("tokens.json"));

        let store = TokenStore::with_tokens([
            Token::new("a", "/releases", "1"),
            Token::new("b", "/snapshots", "2"),
        ]);
        assert_eq!(file.save(&store).unwrap(), 2);

        store.remove("a");
        assert_eq!(file.save(&store).unwrap(), 1);

        let reloaded = TokenStore::new();
        assert_eq!(file.load(&reloaded).unwrap(), 1);
        let token = reloaded.lookup("b").unwrap();
        assert_eq!(token.path, "/snapshots");
        assert!(token.verify("2"));
        assert!(reloaded.lookup("a").is_none());

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["tokens.json"]);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let file = TokenFile::new(path);
        assert!(matches!(
            file.load(&TokenStore::new()),
            Err(AuthError::Storage(_))
        ));
    }
}
