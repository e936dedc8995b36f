//! Quiver Maven engine
//!
//! Artifact resolution and proxy caching for a Maven repository server:
//! - [`Authenticator`] maps request URIs to repositories and checks tokens
//! - [`LocalResolver`] serves files, generated metadata and `latest`
//! - [`ProxyResolver`] falls back to remote repositories and caches results
//! - [`DiskQuota`] bounds what the cache may write
//!
//! [`LookupService`] runs the whole pipeline and yields an [`Outcome`]
//! that carries no HTTP types.

pub mod authenticator;
pub mod error;
pub mod local;
pub mod lookup;
pub mod metadata;
pub mod outcome;
pub mod proxy;
pub mod quota;
pub mod repository;
pub mod storage;
pub mod version;

pub use authenticator::{AuthorizedPath, Authenticator};
pub use error::{AccessError, MetadataError, ProxyError, UpstreamError};
pub use local::LocalResolver;
pub use lookup::LookupService;
pub use metadata::MetadataResolver;
pub use outcome::{Method, Outcome, Served};
pub use proxy::{ProxyChain, ProxyDispatch, ProxyResolver, ProxyTask, Upstream};
pub use quota::DiskQuota;
pub use repository::{Repository, RepositorySet};
pub use storage::{LocalStorage, Storage};
