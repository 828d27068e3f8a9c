//! OAuth token lifecycle.
//!
//! Owns the process-wide [`TokenState`] behind a lock and serializes
//! refreshes through a single async mutex: when several callers observe
//! a stale token at once, exactly one token endpoint call goes out and
//! the rest pick up its result after the lock is released.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use qbo_types::TokenState;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::AppResult;
use crate::oauth::{self, RefreshError, TokenResponse};
use crate::store::TokenStore;

pub struct TokenManager {
    config: Arc<Config>,
    store: Arc<dyn TokenStore>,
    /// Dedicated client for token endpoint calls; auth and data calls
    /// have different latency profiles, so separate timeouts.
    http: reqwest::Client,
    state: RwLock<TokenState>,
    /// Held for the whole check-then-refresh critical section.
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(config: Arc<Config>, store: Arc<dyn TokenStore>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.auth_timeout)
            .build()?;

        Ok(Self {
            config,
            store,
            http,
            state: RwLock::new(TokenState::default()),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Populate state from persistent storage at startup. Never fails
    /// the process: a read error is logged and state stays empty.
    pub fn load(&self) {
        match self.store.load() {
            Ok(Some(loaded)) => {
                tracing::info!(expires_at = ?loaded.expires_at, "Tokens loaded from storage");
                *self.state.write() = loaded;
            }
            Ok(None) => {
                tracing::info!("No persisted tokens found");
            }
            Err(e) => {
                tracing::error!("Error loading tokens: {}", e);
            }
        }
    }

    /// Persist the given state. Failure is logged but does not affect
    /// the in-memory copy.
    fn save(&self, state: &TokenState) {
        if let Err(e) = self.store.save(state) {
            tracing::error!("Error saving tokens: {}", e);
        }
    }

    /// Current token state (cloned snapshot).
    pub fn snapshot(&self) -> TokenState {
        self.state.read().clone()
    }

    /// True when the access token is unset or within the 5-minute
    /// safety margin of expiring.
    pub fn is_expired(&self) -> bool {
        self.state.read().is_expired()
    }

    /// Refresh the token if it is stale. Returns whether a valid token
    /// is available afterwards.
    pub async fn ensure_valid(&self) -> bool {
        if !self.is_expired() {
            return true;
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        if !self.is_expired() {
            return true;
        }

        self.refresh_locked().await.is_ok()
    }

    /// Force a refresh after the data API rejected `stale_token` with
    /// 401. Skips the endpoint call when another caller already swapped
    /// the token in.
    pub async fn force_refresh(&self, stale_token: &str) -> Result<(), RefreshError> {
        let _guard = self.refresh_lock.lock().await;

        {
            let state = self.state.read();
            if state.access_token != stale_token && !state.is_expired() {
                return Ok(());
            }
        }

        self.refresh_locked().await
    }

    /// Exchange refresh token for a new access token. Caller must hold
    /// `refresh_lock`.
    async fn refresh_locked(&self) -> Result<(), RefreshError> {
        let refresh_token = self.state.read().refresh_token.clone();
        if refresh_token.is_empty() {
            tracing::error!("No refresh token available");
            return Err(RefreshError::NoRefreshToken);
        }

        match oauth::refresh_access_token(&self.http, &self.config, &refresh_token).await {
            Ok(response) => {
                self.install(response, None);
                tracing::info!("Access token refreshed successfully");
                Ok(())
            }
            Err(RefreshError::InvalidCredentials { status, message }) => {
                // The refresh token itself is dead: wipe everything so
                // the next call fails fast instead of re-attempting a
                // doomed refresh.
                tracing::error!(status, "Refresh token rejected, clearing stored credentials");
                self.clear();
                Err(RefreshError::InvalidCredentials { status, message })
            }
            Err(e) => {
                // Transient trouble: keep state untouched, retry later.
                tracing::error!("Error refreshing token: {}", e);
                Err(e)
            }
        }
    }

    /// Complete the OAuth flow: exchange the authorization code and
    /// store the resulting credential, including the company (realm) id
    /// from the callback when present.
    pub async fn exchange_code(
        &self,
        code: &str,
        realm_id: Option<String>,
    ) -> Result<TokenResponse, RefreshError> {
        let response = oauth::exchange_code(&self.http, &self.config, code).await?;
        self.install(response.clone(), realm_id);
        tracing::info!(expires_in = response.expires_in, "OAuth code exchange successful");
        Ok(response)
    }

    /// Apply a token endpoint response to state and persist.
    fn install(&self, response: TokenResponse, realm_id: Option<String>) {
        let updated = {
            let mut state = self.state.write();
            state.access_token = response.access_token;
            if let Some(new_refresh) = response.refresh_token {
                state.refresh_token = new_refresh;
            }
            state.expires_at = Some(Utc::now() + ChronoDuration::seconds(response.expires_in));
            if realm_id.is_some() {
                state.company_id = realm_id;
            }
            state.clone()
        };
        self.save(&updated);
    }

    /// Wipe all token fields and delete the persisted record.
    pub fn clear(&self) {
        self.state.write().clear();
        if let Err(e) = self.store.clear() {
            tracing::error!("Error clearing persisted tokens: {}", e);
        }
    }
}
