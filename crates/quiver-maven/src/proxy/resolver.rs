//! Sequential upstream fallback on a bounded worker pool

use super::cache::CacheStore;
use super::upstream::{Upstream, UpstreamResponse};
use crate::error::ProxyError;
use crate::outcome::{Method, OCTET_STREAM, Outcome, Served};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Message of the terminal miss after every upstream was tried
pub const NOT_FOUND_ANYWHERE: &str = "Artifact not found in local and remote repository";

/// Minimum number of `/` in a proxied URI (`/group/artifact/<content>`)
const MIN_SEPARATORS: usize = 3;

/// Ordered upstream base URLs plus the client used to reach them
pub struct ProxyChain {
    upstreams: Vec<String>,
    client: Arc<dyn Upstream>,
    cache: Option<Arc<CacheStore>>,
}

impl ProxyChain {
    pub fn new(upstreams: Vec<String>, client: Arc<dyn Upstream>) -> Self {
        Self {
            upstreams,
            client,
            cache: None,
        }
    }

    /// Write successful bodies through `cache` before serving them
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn upstreams(&self) -> &[String] {
        &self.upstreams
    }

    /// Try every upstream in order until one answers with a success status
    pub async fn fetch(&self, uri: &str, method: Method) -> Result<Outcome, ProxyError> {
        for base in &self.upstreams {
            let url = format!("{}{}", base.trim_end_matches('/'), uri);

            match self.client.get(&url, !method.is_head()).await {
                Ok(response) if response.is_success() => {
                    return self.serve(uri, method, response).await;
                }
                Ok(response) => debug!("{} answered {}", url, response.status),
                Err(e) if e.is_retryable() => {
                    warn!("Proxied repository {} is unavailable: {}", base, e);
                }
                Err(e) => {
                    error!("Proxied lookup of {} through {} failed: {}", uri, base, e);
                    return Err(ProxyError::cancelled(uri, e.to_string()));
                }
            }
        }

        Ok(Outcome::NotFound(NOT_FOUND_ANYWHERE.to_string()))
    }

    async fn serve(
        &self,
        uri: &str,
        method: Method,
        response: UpstreamResponse,
    ) -> Result<Outcome, ProxyError> {
        let content_type = response
            .content_type
            .unwrap_or_else(|| OCTET_STREAM.to_string());

        let (body, content_length) = if method.is_head() {
            (None, response.content_length)
        } else {
            let body = match &self.cache {
                Some(cache) => {
                    let cache = cache.clone();
                    let target = uri.to_string();
                    let fetched = response.body;
                    tokio::task::spawn_blocking(move || cache.store(&target, fetched))
                        .await
                        .map_err(|e| ProxyError::cancelled(uri, e.to_string()))??
                        .into_body()
                }
                None => response.body,
            };
            let len = body.len() as u64;
            (Some(body), Some(len))
        };

        Ok(Outcome::Served(Served {
            status: response.status,
            content_type,
            content_length,
            file_name: None,
            body,
        }))
    }
}

/// Handle to a proxied lookup running on the worker pool
pub struct ProxyTask {
    uri: String,
    handle: JoinHandle<Result<Outcome, ProxyError>>,
}

impl ProxyTask {
    /// Wait for the lookup; a cancelled or panicked task is a cancellation
    pub async fn outcome(self) -> Result<Outcome, ProxyError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(ProxyError::cancelled(self.uri, "proxy task panicked")),
            Err(_) => Err(ProxyError::cancelled(self.uri, "proxy task cancelled")),
        }
    }
}

/// Result of handing a URI to the proxy resolver
pub enum ProxyDispatch {
    /// Answered without touching the pool
    Immediate(Outcome),
    Scheduled(ProxyTask),
}

struct WorkerPool {
    chain: Arc<ProxyChain>,
    permits: Arc<Semaphore>,
}

/// Entry point for proxied lookups
///
/// The worker pool exists only when at least one upstream is configured.
pub struct ProxyResolver {
    pool: Option<WorkerPool>,
}

impl ProxyResolver {
    pub fn new(chain: ProxyChain, workers: usize) -> Self {
        if chain.upstreams().is_empty() {
            return Self::disabled();
        }

        Self {
            pool: Some(WorkerPool {
                chain: Arc::new(chain),
                permits: Arc::new(Semaphore::new(workers.max(1))),
            }),
        }
    }

    pub const fn disabled() -> Self {
        Self { pool: None }
    }

    pub const fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    /// Schedule a proxied lookup of `uri`
    ///
    /// Must be called within a tokio runtime.
    pub fn resolve_proxied(&self, uri: &str, method: Method) -> ProxyDispatch {
        if uri.matches('/').count() < MIN_SEPARATORS {
            return ProxyDispatch::Immediate(Outcome::SoftError(
                "Invalid proxied request".to_string(),
            ));
        }

        let Some(pool) = &self.pool else {
            return ProxyDispatch::Immediate(Outcome::NotFound(NOT_FOUND_ANYWHERE.to_string()));
        };

        let chain = pool.chain.clone();
        let permits = pool.permits.clone();
        let target = uri.to_string();

        let handle = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ProxyError::cancelled(&target, e.to_string()))?;
            chain.fetch(&target, method).await
        });

        ProxyDispatch::Scheduled(ProxyTask {
            uri: uri.to_string(),
            handle,
        })
    }
}
