//! Application State
//!
//! Shared handles for the HTTP handlers: configuration, token manager,
//! resilient client, entity cache, and the outstanding OAuth CSRF
//! states.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;

use qbo_core::cache::CacheStore;
use qbo_core::{Config, QboClient, TokenManager};

/// Overall connection status shown to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Client credentials are not configured.
    NotConfigured,
    /// Credentials present, but no OAuth connection yet.
    NotAuthenticated,
    /// Authenticated but the cache has never been filled.
    AuthenticatedNoData,
    /// Authenticated with cached data available.
    Connected,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenManager>,
    pub client: Arc<QboClient>,
    pub cache: Arc<CacheStore>,
    /// Outstanding OAuth CSRF states; each is valid for one callback.
    oauth_states: Mutex<HashSet<String>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        tokens: Arc<TokenManager>,
        client: Arc<QboClient>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                tokens,
                client,
                cache,
                oauth_states: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.inner.config
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.inner.tokens
    }

    pub fn client(&self) -> &Arc<QboClient> {
        &self.inner.client
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.inner.cache
    }

    /// Mint a fresh CSRF state for an authorize URL.
    pub fn generate_oauth_state(&self) -> String {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        self.inner.oauth_states.lock().insert(state.clone());
        state
    }

    /// Consume a CSRF state. Each state validates exactly once.
    pub fn validate_oauth_state(&self, state: &str) -> bool {
        self.inner.oauth_states.lock().remove(state)
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        if !self.inner.config.has_credentials() {
            return ConnectionStatus::NotConfigured;
        }
        if self.inner.tokens.snapshot().is_empty() {
            return ConnectionStatus::NotAuthenticated;
        }
        if !self.inner.cache.snapshot().has_data() {
            return ConnectionStatus::AuthenticatedNoData;
        }
        ConnectionStatus::Connected
    }
}
