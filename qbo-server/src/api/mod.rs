//! API Routes
//!
//! REST surface of the bridge daemon: connection status, OAuth flow,
//! cached data and search, and circuit breaker control.

mod cache;
pub(crate) mod oauth;
mod resilience;

#[cfg(test)]
mod cache_tests;
#[cfg(test)]
mod resilience_tests;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use qbo_types::ApiError;
use serde::Serialize;

use crate::state::{AppState, ConnectionStatus};

pub fn router() -> Router<AppState> {
    Router::new()
        // Status
        .route("/status", get(get_status))
        .route("/health", get(get_health))
        .route("/config", get(get_config))
        // OAuth (connect / disconnect)
        .route("/auth/url", get(oauth::get_auth_url))
        .route("/disconnect", post(oauth::disconnect))
        // Cache + search
        .route("/cache/status", get(cache::get_cache_status))
        .route("/cache/refresh", post(cache::refresh_cache))
        .route("/indexes/status", get(cache::get_index_status))
        .route("/search/:index", get(cache::search_index))
        // Cached data views
        .route("/data/customers", get(cache::get_customers))
        .route("/data/vendors", get(cache::get_vendors))
        .route("/data/items", get(cache::get_items))
        .route("/data/invoices", get(cache::get_invoices))
        // Live connection test
        .route("/test", get(cache::test_connection))
        // Resilience
        .route("/circuit-breaker/status", get(resilience::get_circuit_status))
        .route("/circuit-breaker/reset", post(resilience::reset_circuit))
        // API fallback: return 404 for unknown API endpoints
        .fallback(api_not_found)
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Not found"})))
}

/// Map a client failure onto an HTTP reply: status code plus the
/// serialized error taxonomy.
pub(crate) fn error_response(err: &ApiError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        ApiError::NotAuthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ApiError::NoCompanyContext => StatusCode::BAD_REQUEST,
        ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ApiError::CircuitOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ApiError::ConnectionFailed { .. }
        | ApiError::ServerError { .. }
        | ApiError::TransientFailure { .. } => StatusCode::BAD_GATEWAY,
        ApiError::Upstream { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
    };

    let body = serde_json::json!({
        "error": err.to_string(),
        "kind": err.kind_label(),
        "details": err,
    });
    (status, Json(body))
}

#[derive(Serialize)]
struct StatusResponse {
    version: String,
    connection_status: ConnectionStatus,
    authenticated: bool,
    company_id: Option<String>,
    token_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    cache: qbo_types::CacheSnapshot,
    circuit_breaker: qbo_core::client::CircuitSnapshot,
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let token = state.tokens().snapshot();

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        connection_status: state.connection_status(),
        authenticated: !token.is_empty(),
        company_id: token.company_id,
        token_expires_at: token.expires_at,
        cache: state.cache().snapshot(),
        circuit_breaker: state.client().breaker().snapshot(),
    })
}

async fn get_health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.cache().snapshot();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "authenticated": !state.tokens().snapshot().is_empty(),
            "cache_age_minutes": snapshot.age_minutes(),
        })),
    )
}

#[derive(Serialize)]
struct ConfigResponse {
    environment: &'static str,
    client_id: Option<String>,
    company_id: Option<String>,
    redirect_uri: String,
    has_credentials: bool,
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let config = state.config();
    let environment = if config.base_url.contains("sandbox") { "sandbox" } else { "production" };

    Json(ConfigResponse {
        environment,
        client_id: config.redacted_client_id(),
        company_id: config.company_id.clone(),
        redirect_uri: config.redirect_uri.clone(),
        has_credentials: config.has_credentials(),
    })
}
