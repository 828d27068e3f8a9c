//! Upstream OAuth token endpoint.
//!
//! Form-encoded POSTs authenticated with HTTP Basic
//! (`base64(client_id:client_secret)`), per the Intuit OAuth2 contract.
//! Failures are classified into permanent (credentials rejected) and
//! transient (network / server trouble) so the token manager knows
//! whether to clear stored state.

use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

/// Response JSON of the token endpoint. Only the consumed fields.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// The upstream may rotate the refresh token; absent means "keep
    /// the old one".
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token TTL in seconds.
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Failure of a token endpoint call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh token is stored; nothing to exchange.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The endpoint rejected the grant (400/401/403). The stored
    /// credential is dead; re-authorization is required.
    #[error("Token endpoint rejected credentials ({status}): {message}")]
    InvalidCredentials { status: u16, message: String },

    /// Timeout, connection failure, or 5xx. Worth retrying later.
    #[error("Token endpoint unavailable: {message}")]
    Transient { message: String },
}

fn basic_auth_header(config: &Config) -> String {
    let raw = format!("{}:{}", config.client_id, config.client_secret);
    format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
}

async fn post_token_request(
    http: &reqwest::Client,
    config: &Config,
    form: &[(&str, &str)],
) -> Result<TokenResponse, RefreshError> {
    let response = http
        .post(&config.token_url)
        .header(AUTHORIZATION, basic_auth_header(config))
        .header(ACCEPT, "application/json")
        .form(form)
        .send()
        .await
        .map_err(|e| RefreshError::Transient { message: e.to_string() })?;

    let status = response.status().as_u16();
    if status == 200 {
        return response
            .json::<TokenResponse>()
            .await
            .map_err(|e| RefreshError::Transient { message: format!("invalid token response: {}", e) });
    }

    let message = response.text().await.unwrap_or_default();
    match status {
        // Refresh token expired/revoked or client credentials wrong.
        400 | 401 | 403 => Err(RefreshError::InvalidCredentials { status, message }),
        _ => Err(RefreshError::Transient {
            message: format!("token endpoint returned {}: {}", status, message),
        }),
    }
}

/// Exchange the stored refresh token for a fresh access token.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    config: &Config,
    refresh_token: &str,
) -> Result<TokenResponse, RefreshError> {
    if refresh_token.is_empty() {
        return Err(RefreshError::NoRefreshToken);
    }
    post_token_request(
        http,
        config,
        &[("grant_type", "refresh_token"), ("refresh_token", refresh_token)],
    )
    .await
}

/// One-time exchange of an authorization code (OAuth callback).
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &Config,
    code: &str,
) -> Result<TokenResponse, RefreshError> {
    post_token_request(
        http,
        config,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &config.redirect_uri),
        ],
    )
    .await
}

/// Build the user-facing authorize URL with a CSRF state token.
pub fn authorize_url(config: &Config, state: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", &config.client_id)
        .append_pair("scope", "com.intuit.quickbooks.accounting")
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("state", state)
        .finish();
    format!("{}?{}", config.authorize_url, query)
}
