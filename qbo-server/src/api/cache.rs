//! Cache, search, and data handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use qbo_core::cache::{SearchEntry, DEFAULT_SEARCH_LIMIT, INDEX_NAMES};
use qbo_core::fetch;
use qbo_types::CacheSnapshot;

use crate::state::AppState;

const DEFAULT_DATA_LIMIT: usize = 100;

#[derive(Serialize)]
pub struct CacheStatusResponse {
    #[serde(flatten)]
    pub snapshot: CacheSnapshot,
    pub has_data: bool,
    pub age_minutes: Option<i64>,
}

pub async fn get_cache_status(State(state): State<AppState>) -> Json<CacheStatusResponse> {
    let snapshot = state.cache().snapshot();
    Json(CacheStatusResponse {
        has_data: snapshot.has_data(),
        age_minutes: snapshot.age_minutes(),
        snapshot,
    })
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    #[serde(flatten)]
    pub snapshot: CacheSnapshot,
}

pub async fn refresh_cache(State(state): State<AppState>) -> impl IntoResponse {
    if state.tokens().snapshot().is_empty() {
        return super::error_response(&qbo_types::ApiError::NotAuthenticated).into_response();
    }

    let success = fetch::refresh_cache(state.client(), state.cache()).await;
    Json(RefreshResponse { success, snapshot: state.cache().snapshot() }).into_response()
}

#[derive(Serialize)]
pub struct IndexStatusResponse {
    pub indexes: std::collections::BTreeMap<&'static str, usize>,
    pub total_entries: usize,
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

pub async fn get_index_status(State(state): State<AppState>) -> Json<IndexStatusResponse> {
    let indexes = state.cache().index_counts();
    let total_entries = indexes.values().sum();

    Json(IndexStatusResponse {
        indexes,
        total_entries,
        last_updated: state.cache().snapshot().last_updated,
    })
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub index: String,
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchEntry>,
}

pub async fn search_index(
    State(state): State<AppState>,
    Path(index): Path<String>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Query parameter 'q' is required"})),
        )
            .into_response();
    }
    if !INDEX_NAMES.contains(&index.as_str()) {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("Unknown index '{}'", index),
                "available": INDEX_NAMES,
            })),
        )
            .into_response();
    }

    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let results = state.cache().search(&index, &query, limit);

    Json(SearchResponse { index, query, count: results.len(), results }).into_response()
}

#[derive(Deserialize)]
pub struct DataParams {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct DataResponse<T> {
    pub total_count: usize,
    pub returned: usize,
    pub items: Vec<T>,
}

fn data_response<T: Serialize>((items, total_count): (Vec<T>, usize)) -> Json<DataResponse<T>> {
    Json(DataResponse { total_count, returned: items.len(), items })
}

pub async fn get_customers(
    State(state): State<AppState>,
    Query(params): Query<DataParams>,
) -> impl IntoResponse {
    data_response(state.cache().customers(params.limit.unwrap_or(DEFAULT_DATA_LIMIT)))
}

pub async fn get_vendors(
    State(state): State<AppState>,
    Query(params): Query<DataParams>,
) -> impl IntoResponse {
    data_response(state.cache().vendors(params.limit.unwrap_or(DEFAULT_DATA_LIMIT)))
}

pub async fn get_items(
    State(state): State<AppState>,
    Query(params): Query<DataParams>,
) -> impl IntoResponse {
    data_response(state.cache().items(params.limit.unwrap_or(DEFAULT_DATA_LIMIT)))
}

pub async fn get_invoices(
    State(state): State<AppState>,
    Query(params): Query<DataParams>,
) -> impl IntoResponse {
    data_response(state.cache().invoices(params.limit.unwrap_or(DEFAULT_DATA_LIMIT)))
}

#[derive(Serialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub company_name: Option<String>,
}

/// Round-trip to the live API, exercising the full resilience path.
pub async fn test_connection(State(state): State<AppState>) -> impl IntoResponse {
    let token = state.tokens().snapshot();
    let company = match token.company_id.or_else(|| state.config().company_id.clone()) {
        Some(company) => company,
        None => {
            return super::error_response(&qbo_types::ApiError::NoCompanyContext).into_response()
        }
    };

    match state.client().company_info(&company).await {
        Ok(reply) => Json(TestConnectionResponse {
            success: true,
            company_name: reply.company_info.and_then(|c| c.company_name),
        })
        .into_response(),
        Err(e) => super::error_response(&e).into_response(),
    }
}
