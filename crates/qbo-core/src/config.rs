//! Connector configuration, loaded environment-style with sane defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::{CircuitBreakerConfig, RetryPolicy};
use crate::error::{AppError, AppResult};

const DATA_DIR: &str = ".qbo_bridge";
const TOKEN_FILE: &str = "qb_tokens.json";

const DEFAULT_BASE_URL: &str = "https://sandbox-quickbooks.api.intuit.com";
const DEFAULT_TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";
const DEFAULT_AUTHORIZE_URL: &str = "https://appcenter.intuit.com/connect/oauth2";
const DEFAULT_PRODUCTION_URI: &str = "http://localhost:5002";

const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DATA_TIMEOUT_SECS: u64 = 30;

/// Full connector configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth application client id.
    pub client_id: String,
    /// OAuth application client secret.
    pub client_secret: String,
    /// Base URL of the QuickBooks data API.
    pub base_url: String,
    /// OAuth token endpoint (refresh + code exchange).
    pub token_url: String,
    /// OAuth authorize endpoint shown to the user.
    pub authorize_url: String,
    /// Redirect URI registered with the OAuth application.
    pub redirect_uri: String,
    /// Fallback company (realm) id when the token carries none.
    pub company_id: Option<String>,
    /// Timeout for token endpoint calls.
    pub auth_timeout: Duration,
    /// Timeout for data endpoint calls.
    pub data_timeout: Duration,
    /// Retry schedule for data calls.
    pub retry: RetryPolicy,
    /// Circuit breaker tuning.
    pub breaker: CircuitBreakerConfig,
    /// Location of the persisted token record.
    pub token_file: PathBuf,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    /// for everything except credentials (which stay empty and are
    /// reported by [`Config::validate`]).
    pub fn from_env() -> Self {
        let production_uri =
            env_string("PRODUCTION_URI").unwrap_or_else(|| DEFAULT_PRODUCTION_URI.to_string());

        Self {
            client_id: env_string("QUICKBOOKS_CLIENT_ID").unwrap_or_default(),
            client_secret: env_string("QUICKBOOKS_CLIENT_SECRET").unwrap_or_default(),
            base_url: env_string("QUICKBOOKS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token_url: env_string("QUICKBOOKS_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            authorize_url: env_string("QUICKBOOKS_AUTHORIZE_URL")
                .unwrap_or_else(|| DEFAULT_AUTHORIZE_URL.to_string()),
            redirect_uri: format!("{}/callback", production_uri.trim_end_matches('/')),
            company_id: env_string("QUICKBOOKS_COMPANY_ID"),
            auth_timeout: Duration::from_secs(
                env_parse("QBO_AUTH_TIMEOUT_SECS").unwrap_or(DEFAULT_AUTH_TIMEOUT_SECS),
            ),
            data_timeout: Duration::from_secs(
                env_parse("QBO_DATA_TIMEOUT_SECS").unwrap_or(DEFAULT_DATA_TIMEOUT_SECS),
            ),
            retry: RetryPolicy {
                max_retries: env_parse("QBO_MAX_RETRIES").unwrap_or(RetryPolicy::DEFAULT_MAX_RETRIES),
                initial_delay: Duration::from_millis(
                    env_parse("QBO_INITIAL_DELAY_MS")
                        .unwrap_or(RetryPolicy::DEFAULT_INITIAL_DELAY_MS),
                ),
                backoff_factor: env_parse("QBO_BACKOFF_FACTOR")
                    .unwrap_or(RetryPolicy::DEFAULT_BACKOFF_FACTOR),
            },
            breaker: CircuitBreakerConfig {
                failure_threshold: env_parse("QBO_CB_FAILURE_THRESHOLD")
                    .unwrap_or(CircuitBreakerConfig::DEFAULT_FAILURE_THRESHOLD),
                open_duration: Duration::from_secs(
                    env_parse("QBO_CB_COOLDOWN_SECS")
                        .unwrap_or(CircuitBreakerConfig::DEFAULT_COOLDOWN_SECS),
                ),
            },
            token_file: env_string("QBO_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_token_file),
        }
    }

    /// Fail when credentials are missing; the OAuth flow cannot work
    /// without them.
    pub fn validate(&self) -> AppResult<()> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(AppError::Config(
                "QUICKBOOKS_CLIENT_ID and QUICKBOOKS_CLIENT_SECRET must be set".to_string(),
            ));
        }
        Ok(())
    }

    /// True when both OAuth credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Client id with everything but the last four characters redacted.
    pub fn redacted_client_id(&self) -> Option<String> {
        if self.client_id.is_empty() {
            return None;
        }
        let tail: String = self
            .client_id
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        Some(format!("***{}", tail))
    }

    /// Log the effective configuration with secrets redacted.
    pub fn log_summary(&self) {
        tracing::info!(
            client_id = ?self.redacted_client_id(),
            company_id = ?self.company_id,
            base_url = %self.base_url,
            redirect_uri = %self.redirect_uri,
            max_retries = self.retry.max_retries,
            failure_threshold = self.breaker.failure_threshold,
            cooldown_secs = self.breaker.open_duration.as_secs(),
            "Configuration loaded"
        );
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn default_token_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DATA_DIR)
        .join(TOKEN_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_config() -> Config {
        Config {
            client_id: String::new(),
            client_secret: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            redirect_uri: format!("{}/callback", DEFAULT_PRODUCTION_URI),
            company_id: None,
            auth_timeout: Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS),
            data_timeout: Duration::from_secs(DEFAULT_DATA_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            breaker: CircuitBreakerConfig::default(),
            token_file: default_token_file(),
        }
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut config = bare_config();
        assert!(config.validate().is_err());
        assert!(!config.has_credentials());

        config.client_id = "id".to_string();
        config.client_secret = "secret".to_string();
        assert!(config.validate().is_ok());
        assert!(config.has_credentials());
    }

    #[test]
    fn test_redacted_client_id_keeps_tail() {
        let mut config = bare_config();
        assert_eq!(config.redacted_client_id(), None);

        config.client_id = "ABCDEFGH1234".to_string();
        assert_eq!(config.redacted_client_id().as_deref(), Some("***1234"));
    }

    #[test]
    fn test_default_policies() {
        let config = bare_config();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(1000));
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.open_duration, Duration::from_secs(60));
    }
}
