//! Credentials carried by a request

use crate::error::AuthError;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

/// Credentials extracted from an `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP Basic: token alias and plaintext secret
    Basic { alias: String, secret: String },
    /// Bearer: plaintext secret only
    Bearer(String),
}

impl Credentials {
    /// Basic credentials from parts
    pub fn basic(alias: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::Basic {
            alias: alias.into(),
            secret: secret.into(),
        }
    }

    /// Parse an `Authorization` header value
    pub fn from_header(value: &str) -> Result<Self, AuthError> {
        let (scheme, payload) = value
            .trim()
            .split_once(' ')
            .ok_or(AuthError::InvalidAuthHeader)?;
        let payload = payload.trim();

        if scheme.eq_ignore_ascii_case("basic") {
            let decoded = BASE64
                .decode(payload)
                .map_err(|_| AuthError::InvalidAuthHeader)?;
            let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidAuthHeader)?;
            let (alias, secret) = decoded
                .split_once(':')
                .ok_or(AuthError::InvalidAuthHeader)?;
            return Ok(Self::basic(alias, secret));
        }

        if scheme.eq_ignore_ascii_case("bearer") {
            if payload.is_empty() {
                return Err(AuthError::InvalidAuthHeader);
            }
            return Ok(Self::Bearer(payload.to_string()));
        }

        Err(AuthError::UnsupportedScheme(scheme.to_string()))
    }
}

// Keep secrets out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { alias, .. } => f
                .debug_struct("Basic")
                .field("alias", alias)
                .finish_non_exhaustive(),
            Self::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}
