//! Shared handler state

use quiver_auth::TokenStore;
use quiver_common::{Config, Result};
use quiver_maven::LookupService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<LookupService>,
}

impl AppState {
    pub fn new(lookup: LookupService) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    /// Build the lookup pipeline over `tokens`
    ///
    /// Creates repository roots and recounts disk usage, so this blocks.
    pub fn from_config(config: &Config, tokens: Arc<TokenStore>) -> Result<Self> {
        Ok(Self::new(LookupService::from_config(config, tokens)?))
    }
}
