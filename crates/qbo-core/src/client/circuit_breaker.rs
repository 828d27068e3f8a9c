//! Circuit breaker for the upstream QuickBooks connection.
//!
//! After repeated terminal failures the circuit opens and requests fail
//! fast without touching the network, until a cooldown elapses and a
//! probe request is allowed through.
//!
//! States:
//! - Closed: normal operation, requests pass through
//! - Open: upstream is failing, requests fail immediately
//! - Half-Open: cooldown elapsed, testing if upstream recovered

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive terminal failures before opening the circuit.
    pub failure_threshold: u32,
    /// Cooldown before an open circuit lets a probe through.
    pub open_duration: Duration,
}

impl CircuitBreakerConfig {
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
    pub const DEFAULT_COOLDOWN_SECS: u64 = 60;
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: Self::DEFAULT_FAILURE_THRESHOLD,
            open_duration: Duration::from_secs(Self::DEFAULT_COOLDOWN_SECS),
        }
    }
}

/// State of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    last_failure_reason: Option<String>,
}

impl Default for CircuitInner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            last_failure_reason: None,
        }
    }
}

/// Single circuit guarding one upstream service.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
    /// Total trips (circuit opens) for monitoring.
    total_trips: AtomicU64,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CircuitInner::default()),
            total_trips: AtomicU64::new(0),
        }
    }

    /// Check whether a request may proceed.
    ///
    /// Returns `Ok(())` to proceed, `Err(remaining)` with the time left
    /// until the next probe when the circuit is open.
    pub fn should_allow(&self) -> Result<(), Duration> {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Open => {
                if let Some(opened_at) = inner.opened_at {
                    let elapsed = opened_at.elapsed();
                    if elapsed >= self.config.open_duration {
                        debug!("Circuit breaker transitioning to half-open");
                        inner.state = CircuitState::HalfOpen;
                        return Ok(());
                    }
                    return Err(self.config.open_duration.saturating_sub(elapsed));
                }
                // opened_at missing should not happen; fall back to full cooldown
                Err(self.config.open_duration)
            }
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
        }
    }

    /// Record a successful request.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                info!("Circuit breaker closing - upstream recovered");
                *inner = CircuitInner::default();
            }
            CircuitState::Open => {
                debug!("Unexpected success while circuit open");
            }
        }
    }

    /// Record a terminal failure (exhausted retries or non-retryable).
    pub fn record_failure(&self, reason: &str) {
        let mut inner = self.inner.lock();

        inner.consecutive_failures += 1;
        inner.last_failure_reason = Some(reason.to_string());

        match inner.state {
            CircuitState::Closed => {
                if inner.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        failures = inner.consecutive_failures,
                        reason = %reason,
                        "Circuit breaker opening - too many failures"
                    );
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    self.total_trips.fetch_add(1, Ordering::Relaxed);
                }
            }
            CircuitState::HalfOpen => {
                warn!(reason = %reason, "Circuit breaker re-opening - failure during half-open");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                self.total_trips.fetch_add(1, Ordering::Relaxed);
            }
            CircuitState::Open => {
                // Already open, just update the failure count.
            }
        }
    }

    /// Current state without side effects.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Current consecutive failure count.
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// Total number of circuit trips (for monitoring).
    pub fn total_trips(&self) -> u64 {
        self.total_trips.load(Ordering::Relaxed)
    }

    /// Reset the circuit after manual intervention or re-authentication.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            info!(previous_state = ?inner.state, "Circuit breaker reset manually");
        }
        *inner = CircuitInner::default();
    }

    /// Serializable snapshot for the status endpoint.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.lock();
        let seconds_until_probe = match (inner.state, inner.opened_at) {
            (CircuitState::Open, Some(opened_at)) => Some(
                self.config
                    .open_duration
                    .saturating_sub(opened_at.elapsed())
                    .as_secs(),
            ),
            _ => None,
        };

        CircuitSnapshot {
            state: inner.state,
            failure_count: inner.consecutive_failures,
            failure_threshold: self.config.failure_threshold,
            cooldown_secs: self.config.open_duration.as_secs(),
            seconds_until_probe,
            last_failure_reason: inner.last_failure_reason.clone(),
            total_trips: self.total_trips.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the breaker for monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
    pub seconds_until_probe: Option<u64>,
    pub last_failure_reason: Option<String>,
    pub total_trips: u64,
}
