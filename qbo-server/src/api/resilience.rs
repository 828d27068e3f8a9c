//! Circuit breaker status and control.

use axum::{extract::State, response::Json};
use qbo_core::client::CircuitSnapshot;
use serde::Serialize;

use crate::state::AppState;

pub async fn get_circuit_status(State(state): State<AppState>) -> Json<CircuitSnapshot> {
    Json(state.client().breaker().snapshot())
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub success: bool,
    #[serde(flatten)]
    pub circuit: CircuitSnapshot,
}

pub async fn reset_circuit(State(state): State<AppState>) -> Json<ResetResponse> {
    state.client().breaker().reset();

    Json(ResetResponse { success: true, circuit: state.client().breaker().snapshot() })
}
