use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use qbo_types::{Customer, Item};

use super::cache::{
    get_cache_status, get_customers, get_index_status, refresh_cache, search_index, DataParams,
    SearchParams,
};
use crate::test_helpers::{body_json, test_app_state};

#[tokio::test]
async fn test_cache_status_starts_empty() {
    let (state, _tmp) = test_app_state();
    let Json(response) = get_cache_status(State(state)).await;
    assert!(!response.has_data);
    assert_eq!(response.age_minutes, None);
    assert_eq!(response.snapshot.customers_count, 0);
}

#[tokio::test]
async fn test_index_status_lists_all_indexes() {
    let (state, _tmp) = test_app_state();
    let Json(response) = get_index_status(State(state)).await;
    assert_eq!(response.indexes.len(), 7);
    assert_eq!(response.total_entries, 0);
    assert!(response.indexes.contains_key("client_names"));
    assert!(response.indexes.contains_key("part_numbers"));
}

#[tokio::test]
async fn test_search_requires_query_param() {
    let (state, _tmp) = test_app_state();
    let params = SearchParams { q: None, limit: None };

    let response = search_index(State(state), Path("client_names".to_string()), Query(params))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_unknown_index_is_404() {
    let (state, _tmp) = test_app_state();
    let params = SearchParams { q: Some("acme".to_string()), limit: None };

    let response = search_index(State(state), Path("no_such_index".to_string()), Query(params))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert!(body["available"].as_array().is_some());
}

#[tokio::test]
async fn test_search_finds_cached_entries() {
    let (state, _tmp) = test_app_state();
    state.cache().install(
        vec![Customer {
            id: Some("1".to_string()),
            name: Some("Acme Machining".to_string()),
            ..Default::default()
        }],
        Vec::new(),
        vec![Item {
            id: Some("2".to_string()),
            name: Some("Bracket".to_string()),
            sku: Some("BRK-1".to_string()),
            ..Default::default()
        }],
        Vec::new(),
    );

    let params = SearchParams { q: Some("acme".to_string()), limit: None };
    let response = search_index(
        State(state.clone()),
        Path("client_names".to_string()),
        Query(params),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Acme Machining");

    // SKU search through the parts index.
    let params = SearchParams { q: Some("brk".to_string()), limit: None };
    let response = search_index(State(state), Path("part_numbers".to_string()), Query(params))
        .await
        .into_response();
    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_data_endpoint_reports_counts() {
    let (state, _tmp) = test_app_state();
    state.cache().install(
        (0..5)
            .map(|i| Customer {
                id: Some(i.to_string()),
                name: Some(format!("Customer {}", i)),
                ..Default::default()
            })
            .collect(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    );

    let response = get_customers(State(state), Query(DataParams { limit: Some(2) }))
        .await
        .into_response();
    let body = body_json(response).await;
    assert_eq!(body["total_count"], 5);
    assert_eq!(body["returned"], 2);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_refresh_requires_authentication() {
    let (state, _tmp) = test_app_state();
    let response = refresh_cache(State(state)).await.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["kind"], "not_authenticated");
}
