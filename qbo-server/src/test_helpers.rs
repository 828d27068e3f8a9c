//! Test helpers for qbo-server unit tests.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use qbo_core::cache::CacheStore;
use qbo_core::client::{CircuitBreakerConfig, RetryPolicy};
use qbo_core::{Config, FileTokenStore, QboClient, TokenManager};

use crate::state::AppState;

/// Create a minimal `AppState` for testing, pointed at an unreachable
/// upstream.
///
/// Returns `(AppState, TempDir)` — keep `TempDir` alive for the test duration.
pub fn test_app_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let token_file = temp_dir.path().join("tokens.json");

    let config = Arc::new(Config {
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        base_url: "http://127.0.0.1:9".to_string(),
        token_url: "http://127.0.0.1:9/oauth2/v1/tokens/bearer".to_string(),
        authorize_url: "http://127.0.0.1:9/connect/oauth2".to_string(),
        redirect_uri: "http://localhost:5002/callback".to_string(),
        company_id: None,
        auth_timeout: Duration::from_secs(1),
        data_timeout: Duration::from_secs(1),
        retry: RetryPolicy {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            backoff_factor: 2.0,
        },
        breaker: CircuitBreakerConfig::default(),
        token_file: token_file.clone(),
    });

    let store = Arc::new(FileTokenStore::new(token_file));
    let tokens = Arc::new(TokenManager::new(config.clone(), store).expect("token manager"));
    let client = Arc::new(QboClient::new(config.clone(), tokens.clone()).expect("client"));
    let cache = Arc::new(CacheStore::new());

    (AppState::new(config, tokens, client, cache), temp_dir)
}

/// Collect a handler response body as JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Same state but without configured credentials.
pub fn unconfigured_app_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let token_file = temp_dir.path().join("tokens.json");

    let config = Arc::new(Config {
        client_id: String::new(),
        client_secret: String::new(),
        base_url: "http://127.0.0.1:9".to_string(),
        token_url: "http://127.0.0.1:9/oauth2/v1/tokens/bearer".to_string(),
        authorize_url: "http://127.0.0.1:9/connect/oauth2".to_string(),
        redirect_uri: "http://localhost:5002/callback".to_string(),
        company_id: None,
        auth_timeout: Duration::from_secs(1),
        data_timeout: Duration::from_secs(1),
        retry: RetryPolicy::default(),
        breaker: CircuitBreakerConfig::default(),
        token_file: token_file.clone(),
    });

    let store = Arc::new(FileTokenStore::new(token_file));
    let tokens = Arc::new(TokenManager::new(config.clone(), store).expect("token manager"));
    let client = Arc::new(QboClient::new(config.clone(), tokens.clone()).expect("client"));
    let cache = Arc::new(CacheStore::new());

    (AppState::new(config, tokens, client, cache), temp_dir)
}
