//! Request lookup pipeline
//!
//! Authorization, then local resolution, then the proxy chain on a local
//! miss. The HTTP adapter only has to map the resulting [`Outcome`].

use crate::authenticator::{Authenticator, is_snapshot_metadata};
use crate::error::AccessError;
use crate::local::LocalResolver;
use crate::outcome::{Method, Outcome};
use crate::proxy::{CacheStore, HttpUpstream, ProxyChain, ProxyDispatch, ProxyResolver};
use crate::repository::RepositorySet;
use crate::storage::{LocalStorage, Storage};
use quiver_auth::{Credentials, TokenStore};
use quiver_common::{Config, Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

pub struct LookupService {
    repositories: Arc<RepositorySet>,
    authenticator: Authenticator,
    local: LocalResolver,
    proxy: ProxyResolver,
}

impl LookupService {
    pub fn new(
        repositories: Arc<RepositorySet>,
        authenticator: Authenticator,
        local: LocalResolver,
        proxy: ProxyResolver,
    ) -> Self {
        Self {
            repositories,
            authenticator,
            local,
            proxy,
        }
    }

    /// Wire the pipeline from configuration over the local filesystem
    pub fn from_config(config: &Config, tokens: Arc<TokenStore>) -> Result<Self> {
        let repositories = Arc::new(RepositorySet::from_config(config)?);
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage);

        let authenticator = Authenticator::new(repositories.clone(), tokens)
            .with_full_auth(config.full_auth)
            .with_rewrite_paths(config.rewrite_paths);

        let upstreams = repositories.proxied();
        let proxy = if upstreams.is_empty() {
            ProxyResolver::disabled()
        } else {
            let client = HttpUpstream::new(
                Duration::from_millis(config.proxy.connect_timeout_ms),
                Duration::from_millis(config.proxy.read_timeout_ms),
            )
            .map_err(|e| Error::configuration(e.to_string()))?;

            let mut chain = ProxyChain::new(upstreams.to_vec(), Arc::new(client));
            if config.store_proxied {
                chain = chain.with_cache(Arc::new(CacheStore::new(
                    repositories.clone(),
                    storage.clone(),
                    config.rewrite_paths,
                )));
            }

            info!(
                "Proxying to {} upstream(s) with {} workers",
                upstreams.len(),
                config.proxy.workers
            );
            ProxyResolver::new(chain, config.proxy.workers)
        };

        Ok(Self::new(
            repositories,
            authenticator,
            LocalResolver::new(storage),
            proxy,
        ))
    }

    pub fn repositories(&self) -> &RepositorySet {
        &self.repositories
    }

    /// Authorize `uri` and resolve it against local storage
    ///
    /// Blocks on filesystem I/O.
    pub fn serve_local(
        &self,
        uri: &str,
        credentials: Option<&Credentials>,
        method: Method,
    ) -> Outcome {
        let authorized = match self.authenticator.authorize(uri, credentials) {
            Ok(authorized) => authorized,
            Err(AccessError::RepositoryNotFound(name)) => {
                return Outcome::NotFound(format!("Repository {name} not found"));
            }
            Err(AccessError::Unauthorized(e)) => {
                // Deploying clients request this without credentials
                if is_snapshot_metadata(uri) {
                    return Outcome::NotFound(e.to_string());
                }
                debug!("Unauthorized access to {}: {}", uri, e);
                return Outcome::Unauthorized(e.to_string());
            }
        };

        self.local
            .resolve(&authorized.repository, &authorized.path, method)
    }

    pub fn serve_proxied(&self, uri: &str, method: Method) -> ProxyDispatch {
        self.proxy.resolve_proxied(uri, method)
    }

    /// Full lookup of `uri`
    pub async fn lookup(
        self: Arc<Self>,
        uri: String,
        credentials: Option<Credentials>,
        method: Method,
    ) -> Outcome {
        let service = self.clone();
        let target = uri.clone();
        let local = tokio::task::spawn_blocking(move || {
            service.serve_local(&target, credentials.as_ref(), method)
        })
        .await;

        let reason = match local {
            Ok(Outcome::TryProxy(reason)) => reason,
            Ok(outcome) => return outcome,
            Err(e) => {
                error!("Local lookup of {} failed: {}", uri, e);
                return Outcome::InternalError("Lookup failed".to_string());
            }
        };

        if !self.proxy.is_enabled() {
            return Outcome::NotFound(reason);
        }

        match self.serve_proxied(&uri, method) {
            ProxyDispatch::Immediate(outcome) => outcome,
            ProxyDispatch::Scheduled(task) => match task.outcome().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{}", e);
                    Outcome::InternalError(e.to_string())
                }
            },
        }
    }
}
