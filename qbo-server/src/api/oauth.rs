//! OAuth Flow Handlers
//!
//! Headless OAuth flow for the QuickBooks connection: mint an authorize
//! URL with a one-shot CSRF state, receive the Intuit redirect on
//! /callback, and exchange the code for tokens.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use qbo_core::{fetch, oauth};

use crate::state::AppState;

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn result_page(title: &str, detail: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>QBO Bridge</title></head>
<body style="font-family: sans-serif; text-align: center; padding: 50px;">
    <h1>{}</h1>
    <p>{}</p>
    <p>You can close this window.</p>
</body>
</html>"#,
        escape_html(title),
        escape_html(detail)
    ))
}

// ============ Response Types ============

#[derive(Serialize)]
pub struct AuthUrlResponse {
    pub url: String,
    pub redirect_uri: String,
    pub state: String,
}

// ============ Request Types ============

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Intuit sends the company id as `realmId` on the redirect.
    #[serde(rename = "realmId")]
    pub realm_id: Option<String>,
    pub error: Option<String>,
}

// ============ Handlers ============

pub async fn get_auth_url(State(state): State<AppState>) -> impl IntoResponse {
    if !state.config().has_credentials() {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "QuickBooks credentials not configured"})),
        )
            .into_response();
    }

    let csrf_state = state.generate_oauth_state();
    let url = oauth::authorize_url(state.config(), &csrf_state);

    Json(AuthUrlResponse {
        url,
        redirect_uri: state.config().redirect_uri.clone(),
        state: csrf_state,
    })
    .into_response()
}

pub async fn handle_callback(
    State(app_state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    if let Some(e) = &query.error {
        warn!(error = %e, "OAuth callback returned an error");
        return result_page("Authorization failed", e);
    }

    match &query.state {
        Some(s) if app_state.validate_oauth_state(s) => {}
        _ => {
            warn!("OAuth callback with missing or unknown state token");
            return result_page("Invalid state token", "CSRF validation failed. Please try again.");
        }
    }

    let Some(code) = &query.code else {
        return result_page("Authorization failed", "No authorization code in callback.");
    };

    match app_state.tokens().exchange_code(code, query.realm_id.clone()).await {
        Ok(_) => {
            info!(realm_id = ?query.realm_id, "QuickBooks connected");
            // A stale-upstream trip no longer applies to the fresh
            // credential.
            app_state.client().breaker().reset();

            let client = app_state.client().clone();
            let cache = app_state.cache().clone();
            tokio::spawn(async move {
                fetch::refresh_cache(&client, &cache).await;
            });

            result_page("QuickBooks connected", "Authorization complete.")
        }
        Err(e) => {
            error!("OAuth code exchange failed: {}", e);
            result_page("Authorization failed", &e.to_string())
        }
    }
}

#[derive(Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
}

pub async fn disconnect(State(state): State<AppState>) -> Json<DisconnectResponse> {
    state.tokens().clear();
    state.cache().clear();
    state.client().breaker().reset();
    info!("QuickBooks disconnected, tokens and cache cleared");

    Json(DisconnectResponse { success: true })
}
