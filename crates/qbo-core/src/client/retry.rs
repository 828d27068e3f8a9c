//! Exponential backoff schedule for retryable upstream failures.

use std::time::Duration;

/// Retry schedule: `delay(attempt) = initial_delay * backoff_factor^attempt`,
/// attempt index starting at 0.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per logical request (not counting the one bonus
    /// resend after a successful 401-triggered refresh).
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
    pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

    /// Upper bound on any single backoff sleep, whatever the
    /// configured factor and attempt count multiply out to.
    pub const MAX_DELAY: Duration = Duration::from_secs(60);

    /// Delay to sleep after the failure of `attempt` (0-based) before
    /// the next attempt, capped at [`RetryPolicy::MAX_DELAY`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(0.0).powi(attempt as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        if secs.is_finite() && secs < Self::MAX_DELAY.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            Self::MAX_DELAY
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(Self::DEFAULT_INITIAL_DELAY_MS),
            backoff_factor: Self::DEFAULT_BACKOFF_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_custom_factor() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            backoff_factor: 3.0,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(300));
        assert_eq!(policy.delay_for(2), Duration::from_millis(900));
    }

    #[test]
    fn test_extreme_settings_cap_at_max_delay() {
        let policy = RetryPolicy {
            max_retries: u32::MAX,
            initial_delay: Duration::from_secs(u64::MAX / 2),
            backoff_factor: f64::MAX,
        };
        // Overflowing schedules clamp instead of panicking.
        assert_eq!(policy.delay_for(0), RetryPolicy::MAX_DELAY);
        assert_eq!(policy.delay_for(u32::MAX), RetryPolicy::MAX_DELAY);

        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1000), RetryPolicy::MAX_DELAY);
    }
}
