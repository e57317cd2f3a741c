//! Integration tests driving the router end to end.
//!
//! Requests go through the full axum stack (routing, extractors, error
//! mapping) against the in-memory repository, pinning the status-code
//! contract of the API.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use farm_monitor::db::repositories::LocalRepository;
use farm_monitor::db::repository::FarmRepository;
use farm_monitor::http::{create_router, AppState};

fn test_app() -> axum::Router {
    let state = AppState {
        repository: Arc::new(LocalRepository::new()) as Arc<dyn FarmRepository>,
        weather: None,
        http_client: reqwest::Client::new(),
    };
    create_router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_service_and_database_status() {
    let app = test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn missing_crop_returns_404_with_error_body() {
    let app = test_app();
    let response = app.oneshot(get("/crops/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn duplicate_crop_post_returns_409() {
    let app = test_app();
    let payload = json!({"crop_name": "Maize", "planting_season": "Rainy"});

    let first = app
        .clone()
        .oneshot(post_json("/crops", payload.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(post_json("/crops", payload)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body = body_json(second).await;
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn delete_returns_204_then_404() {
    let app = test_app();

    let created = app
        .clone()
        .oneshot(post_json("/crops", json!({"crop_name": "Yam"})))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let crop_id = body_json(created).await["crop_id"].as_i64().unwrap();

    let deleted = app
        .clone()
        .oneshot(delete(&format!("/crops/{}", crop_id)))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = app
        .oneshot(get(&format!("/crops/{}", crop_id)))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_through_put_clears_omitted_optional_fields() {
    let app = test_app();

    let created = app
        .clone()
        .oneshot(post_json(
            "/crops",
            json!({"crop_name": "Cassava", "planting_season": "Rainy"}),
        ))
        .await
        .unwrap();
    let crop_id = body_json(created).await["crop_id"].as_i64().unwrap();

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/crops/{}", crop_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"crop_name": "Cassava"}).to_string()))
        .unwrap();
    let updated = app.oneshot(request).await.unwrap();
    assert_eq!(updated.status(), StatusCode::OK);

    // Full-row replace: the omitted season must come back null, not stale.
    let body = body_json(updated).await;
    assert_eq!(body["planting_season"], Value::Null);
}

#[tokio::test]
async fn latest_weather_on_empty_table_returns_404() {
    let app = test_app();
    let response = app.oneshot(get("/weather/latest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn weather_ingest_without_api_key_returns_500() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/weather/fetch_and_store")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INTERNAL_ERROR");
}
