//! Proxy fallback to remote repositories
//!
//! A local miss is handed to [`ProxyResolver`], which walks the upstream
//! chain in priority order on a bounded pool of tasks and optionally writes
//! the first successful body through [`CacheStore`].

pub mod cache;
pub mod resolver;
pub mod upstream;

pub use cache::{CacheResult, CacheStore};
pub use resolver::{NOT_FOUND_ANYWHERE, ProxyChain, ProxyDispatch, ProxyResolver, ProxyTask};
pub use upstream::{HttpUpstream, Upstream, UpstreamResponse};
