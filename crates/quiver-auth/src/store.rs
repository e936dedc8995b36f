//! Token storage

use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::token::Token;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory token store
///
/// Shared between request handlers and the administrative paths; may be
/// filled from [`crate::TokenFile`] after construction.
pub struct TokenStore {
    /// Tokens indexed by alias
    tokens: RwLock<HashMap<String, Token>>,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore {
    /// Create a new empty token store
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store holding the given tokens
    pub fn with_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        let store = Self::new();
        for token in tokens {
            store.add(token);
        }
        store
    }

    /// Get token by alias
    pub fn lookup(&self, alias: &str) -> Option<Token> {
        self.tokens.read().get(alias).cloned()
    }

    /// Add or replace a token
    pub fn add(&self, token: Token) {
        self.tokens.write().insert(token.alias.clone(), token);
    }

    /// Remove a token by alias
    pub fn remove(&self, alias: &str) -> Option<Token> {
        self.tokens.write().remove(alias)
    }

    /// All tokens, sorted by alias
    pub fn all(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.tokens.read().values().cloned().collect();
        tokens.sort_by(|a, b| a.alias.cmp(&b.alias));
        tokens
    }

    /// Number of tokens
    pub fn count(&self) -> usize {
        self.tokens.read().len()
    }

    // =========== Lookup for Auth ===========

    /// Resolve credentials to the token they prove ownership of
    pub fn authenticate(&self, credentials: &Credentials) -> Result<Token, AuthError> {
        match credentials {
            Credentials::Basic { alias, secret } => {
                let token = self
                    .lookup(alias)
                    .ok_or_else(|| AuthError::TokenNotFound(alias.clone()))?;
                if token.verify(secret) {
                    Ok(token)
                } else {
                    Err(AuthError::InvalidCredentials)
                }
            }
            Credentials::Bearer(secret) => self
                .tokens
                .read()
                .values()
                .find(|token| token.verify(secret))
                .cloned()
                .ok_or(AuthError::InvalidCredentials),
        }
    }
}
