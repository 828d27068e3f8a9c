//! OAuth token state for one QuickBooks company connection.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Safety margin before the real expiry at which a token is treated as
/// stale, so a token never expires mid-request.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// Current OAuth credential for the upstream service.
///
/// Invariant: a non-empty `access_token` always has `expires_at` set.
/// A token without an expiry is never usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenState {
    /// Bearer token for data calls. Empty string means "no token".
    #[serde(default)]
    pub access_token: String,
    /// Refresh token for renewing access. Empty string means "no token".
    #[serde(default)]
    pub refresh_token: String,
    /// Absolute expiry of the access token.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Company (realm) id captured from the OAuth callback.
    #[serde(default)]
    pub company_id: Option<String>,
}

impl TokenState {
    /// True when no access token is held at all.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }

    /// True when a refresh token is available.
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// True when the access token is unusable: unset, missing its
    /// expiry, or within the safety margin of expiring.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => {
                Utc::now() >= expires_at - Duration::seconds(EXPIRY_MARGIN_SECS)
            }
        }
    }

    /// Wipe all fields back to the empty state.
    pub fn clear(&mut self) {
        *self = TokenState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_is_expired() {
        let state = TokenState::default();
        assert!(state.is_empty());
        assert!(state.is_expired());
        assert!(!state.has_refresh_token());
    }

    #[test]
    fn test_expiry_margin() {
        let mut state = TokenState {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: Some(Utc::now() + Duration::seconds(3600)),
            company_id: Some("123".to_string()),
        };
        assert!(!state.is_expired());

        // Inside the 5-minute margin counts as expired.
        state.expires_at = Some(Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS - 10));
        assert!(state.is_expired());
    }

    #[test]
    fn test_clear_wipes_everything() {
        let mut state = TokenState {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: Some(Utc::now()),
            company_id: Some("123".to_string()),
        };
        state.clear();
        assert_eq!(state, TokenState::default());
    }
}
