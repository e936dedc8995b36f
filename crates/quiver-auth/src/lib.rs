//! Quiver Authentication
//!
//! This crate provides:
//! - Access tokens bound to a repository path prefix
//! - The in-memory [`TokenStore`] shared by request handlers
//! - Flat-file persistence of the token set ([`TokenFile`])
//! - Parsing of `Authorization` headers into [`Credentials`]
//!
//! # Example
//!
//! ```rust,ignore
//! use quiver_auth::{Credentials, Token, TokenStore};
//!
//! let store = TokenStore::new();
//! let secret = quiver_auth::generate_secret();
//! store.add(Token::new("ci", "/releases/com/example", &secret));
//!
//! let credentials = Credentials::basic("ci", &secret);
//! let token = store.authenticate(&credentials)?;
//! assert!(token.permits("/releases/com/example/lib/1.0/lib-1.0.jar"));
//! ```

pub mod credentials;
pub mod error;
pub mod storage;
pub mod store;
pub mod token;

pub use credentials::Credentials;
pub use error::AuthError;
pub use storage::TokenFile;
pub use store::TokenStore;
pub use token::{Token, generate_secret};
