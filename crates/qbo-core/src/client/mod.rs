//! Resilient QuickBooks request executor.
//!
//! One logical `get()` runs, strictly in order: circuit gate,
//! precondition checks, then a bounded attempt loop with exponential
//! backoff, a single refresh-and-retry on 401, and circuit breaker
//! bookkeeping on the terminal outcome.

mod categorize;
mod circuit_breaker;
mod retry;

pub use categorize::{categorize, ErrorCategory};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState};
pub use retry::RetryPolicy;

use std::sync::Arc;

use qbo_types::{ApiError, ApiResult, CompanyInfoReply, ErrorKind, QueryReply};
use reqwest::header::ACCEPT;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::oauth::RefreshError;
use crate::token_manager::TokenManager;

/// Outcome of one attempt that did not complete the request.
enum Attempt {
    /// Non-200 status with its body text, still to be classified.
    Status(u16, String),
    /// Transport-level failure (timeout, connection error).
    Transport(reqwest::Error),
}

pub struct QboClient {
    config: Arc<Config>,
    tokens: Arc<TokenManager>,
    breaker: CircuitBreaker,
    /// Data API client; token endpoint calls use the manager's own
    /// client with the (shorter) auth timeout.
    http: reqwest::Client,
}

impl QboClient {
    pub fn new(config: Arc<Config>, tokens: Arc<TokenManager>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.data_timeout)
            .build()?;
        let breaker = CircuitBreaker::new(config.breaker.clone());

        Ok(Self { config, tokens, breaker, http })
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Authenticated GET against the data API, returning the parsed
    /// JSON body or a typed failure.
    pub async fn get(
        &self,
        endpoint: &str,
        company_id: Option<&str>,
    ) -> ApiResult<serde_json::Value> {
        let trace = uuid::Uuid::new_v4().simple().to_string();
        let trace = &trace[..8];

        // 1. Circuit gate: fail fast with no network I/O while open.
        if let Err(remaining) = self.breaker.should_allow() {
            debug!(trace, endpoint, retry_after_secs = remaining.as_secs(), "Circuit open, rejecting");
            return Err(ApiError::CircuitOpen { retry_after_secs: remaining.as_secs() });
        }

        // 2. Preconditions: token, then company id by precedence
        //    (argument, stored token, configured default).
        let token = self.tokens.snapshot();
        if token.is_empty() {
            return Err(ApiError::NotAuthenticated);
        }
        let company = company_id
            .map(str::to_string)
            .or_else(|| token.company_id.clone())
            .or_else(|| self.config.company_id.clone())
            .ok_or(ApiError::NoCompanyContext)?;

        let url = format!(
            "{}/v3/company/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            company,
            endpoint
        );

        let mut bearer = token.access_token;
        let mut refreshed = false;
        let max_attempts = self.config.retry.max_retries.max(1);

        // 3. Attempt loop.
        for attempt in 0..max_attempts {
            let last = attempt + 1 == max_attempts;

            let outcome = match self.send(&url, &bearer).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if status == 200 {
                        self.breaker.record_success();
                        return parse_body(response).await;
                    }

                    if status == 401 && !refreshed {
                        refreshed = true;
                        warn!(trace, "Access token rejected (401), attempting refresh");
                        match self.tokens.force_refresh(&bearer).await {
                            Ok(()) => {
                                bearer = self.tokens.snapshot().access_token;
                                // One bonus resend with the fresh token,
                                // not counted against the retry budget.
                                match self.send(&url, &bearer).await {
                                    Ok(retry_response) => {
                                        let retry_status = retry_response.status().as_u16();
                                        if retry_status == 200 {
                                            self.breaker.record_success();
                                            return parse_body(retry_response).await;
                                        }
                                        Attempt::Status(retry_status, body_text(retry_response).await)
                                    }
                                    Err(e) => Attempt::Transport(e),
                                }
                            }
                            Err(RefreshError::NoRefreshToken) => {
                                self.breaker.record_failure("no refresh token");
                                return Err(ApiError::NotAuthenticated);
                            }
                            Err(RefreshError::InvalidCredentials { .. }) => {
                                self.breaker.record_failure("invalid credentials");
                                return Err(ApiError::InvalidCredentials);
                            }
                            Err(RefreshError::Transient { message }) => {
                                self.breaker.record_failure("token refresh failed");
                                return Err(ApiError::TransientFailure { message });
                            }
                        }
                    } else {
                        Attempt::Status(status, body_text(response).await)
                    }
                }
                Err(e) => Attempt::Transport(e),
            };

            match outcome {
                Attempt::Status(status, body) => {
                    let category = categorize(status);

                    // A second 401 in the same call surfaces without
                    // another refresh.
                    if status == 401 {
                        self.breaker.record_failure(category.message);
                        return Err(ApiError::Upstream {
                            kind: category.kind,
                            status,
                            message: body,
                        });
                    }

                    if category.retryable && !last {
                        let delay = self.config.retry.delay_for(attempt);
                        info!(
                            trace,
                            status,
                            attempt = attempt + 1,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "Retryable upstream failure, backing off"
                        );
                        sleep(delay).await;
                        continue;
                    }

                    self.breaker.record_failure(category.message);
                    return Err(match category.kind {
                        ErrorKind::RateLimited => ApiError::RateLimited,
                        ErrorKind::ServerError | ErrorKind::ServiceUnavailable => {
                            ApiError::ServerError { status, message: body }
                        }
                        kind => ApiError::Upstream { kind, status, message: body },
                    });
                }
                Attempt::Transport(e) => {
                    let timed_out = e.is_timeout();
                    if !last {
                        let delay = self.config.retry.delay_for(attempt);
                        warn!(
                            trace,
                            attempt = attempt + 1,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            timed_out,
                            "Transport failure, backing off: {}",
                            e
                        );
                        sleep(delay).await;
                        continue;
                    }
                    return if timed_out {
                        self.breaker.record_failure("timeout");
                        Err(ApiError::Timeout)
                    } else {
                        self.breaker.record_failure("connection failed");
                        Err(ApiError::ConnectionFailed { message: e.to_string() })
                    };
                }
            }
        }

        // The loop always returns on its final attempt.
        Err(ApiError::TransientFailure { message: "retry budget exhausted".to_string() })
    }

    /// Run a QuickBooks SQL-style query for one entity type, decoding
    /// into the typed envelope. Unexpected shapes decode to empty
    /// collections.
    pub async fn query(&self, entity: &str) -> ApiResult<QueryReply> {
        let statement = format!("SELECT * FROM {} MAXRESULTS 1000", entity);
        let encoded: String = url::form_urlencoded::byte_serialize(statement.as_bytes()).collect();
        let body = self.get(&format!("query?query={}", encoded), None).await?;
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    /// Fetch company info, used by the connection test.
    pub async fn company_info(&self, company_id: &str) -> ApiResult<CompanyInfoReply> {
        let body = self
            .get(&format!("companyinfo/{}", company_id), Some(company_id))
            .await?;
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    async fn send(&self, url: &str, bearer: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .get(url)
            .bearer_auth(bearer)
            .header(ACCEPT, "application/json")
            .send()
            .await
    }
}

async fn parse_body(response: reqwest::Response) -> ApiResult<serde_json::Value> {
    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| ApiError::TransientFailure { message: format!("invalid response body: {}", e) })
}

async fn body_text(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}
