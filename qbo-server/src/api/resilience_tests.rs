use axum::extract::State;
use axum::Json;

use qbo_core::client::CircuitState;

use super::resilience::{get_circuit_status, reset_circuit};
use super::{get_config, get_status};
use crate::state::ConnectionStatus;
use crate::test_helpers::{test_app_state, unconfigured_app_state};

#[tokio::test]
async fn test_circuit_status_starts_closed() {
    let (state, _tmp) = test_app_state();
    let Json(snapshot) = get_circuit_status(State(state)).await;
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.failure_count, 0);
    assert_eq!(snapshot.total_trips, 0);
}

#[tokio::test]
async fn test_reset_closes_tripped_circuit() {
    let (state, _tmp) = test_app_state();
    for _ in 0..state.config().breaker.failure_threshold {
        state.client().breaker().record_failure("test failure");
    }
    assert_eq!(state.client().breaker().state(), CircuitState::Open);

    let Json(response) = reset_circuit(State(state.clone())).await;
    assert!(response.success);
    assert_eq!(response.circuit.state, CircuitState::Closed);
    assert_eq!(state.client().breaker().failure_count(), 0);
}

#[tokio::test]
async fn test_status_without_tokens_is_not_authenticated() {
    let (state, _tmp) = test_app_state();
    let Json(response) = get_status(State(state)).await;
    assert_eq!(response.connection_status, ConnectionStatus::NotAuthenticated);
    assert!(!response.authenticated);
    assert_eq!(response.company_id, None);
    assert!(!response.cache.has_data());
}

#[tokio::test]
async fn test_status_without_credentials_is_not_configured() {
    let (state, _tmp) = unconfigured_app_state();
    let Json(response) = get_status(State(state)).await;
    assert_eq!(response.connection_status, ConnectionStatus::NotConfigured);
}

#[tokio::test]
async fn test_config_redacts_client_id() {
    let (state, _tmp) = test_app_state();
    let Json(response) = get_config(State(state)).await;
    assert!(response.has_credentials);
    assert_eq!(response.client_id.as_deref(), Some("***ient"));
    assert_eq!(response.environment, "production");
}
