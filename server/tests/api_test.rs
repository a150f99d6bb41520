//! HTTP tests for the RPC endpoints, driven through the router in-process.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use rowset_server::config::Config;
use rowset_server::dataset::{Dataset, Fixtures};
use rowset_server::{create_router, AppState};

const SECRET: &str = "s3cret";

fn create_test_app(auth_secret: Option<&str>) -> axum::Router {
    let fixtures = Fixtures::parse(include_str!("../fixtures/demo.json")).unwrap();
    let dataset = Dataset::from_fixtures(fixtures).unwrap();
    let config = Config {
        auth_secret: auth_secret.map(str::to_string),
        ..Config::default()
    };
    create_router(AppState::new(dataset, config))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Helper to get response body as JSON.
async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Health endpoint tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(None);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["resources"], json!(["party", "sale.line"]));
}

#[tokio::test]
async fn test_root_reports_resource_count() {
    let app = create_test_app(None);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Rowset Server serving 2 resources");
}

// ============================================================================
// RPC endpoint tests
// ============================================================================

#[tokio::test]
async fn test_fields() {
    let app = create_test_app(None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/rpc/party/fields")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["name"]["type"], "char");
    assert_eq!(json["name"]["name"], "name");
    assert_eq!(json["name"]["size"], 128);
}

#[tokio::test]
async fn test_read_skips_missing_ids() {
    let app = create_test_app(None);

    let response = app
        .oneshot(post(
            "/rpc/party/read",
            json!({"ids": [2, 42, 1], "fields": ["name"]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json, json!([{"id": 2, "name": "Bob"}, {"id": 1, "name": "Alice"}]));
}

#[tokio::test]
async fn test_default_get_omits_unset() {
    let app = create_test_app(None);

    let response = app
        .oneshot(post(
            "/rpc/party/default_get",
            json!({"fields": ["name", "lang", "active"], "context": {"lang": "fr"}}),
        ))
        .await
        .unwrap();

    let json = body_json(response.into_body()).await;
    assert_eq!(json, json!({"lang": "en", "active": true}));
}

#[tokio::test]
async fn test_create_then_read() {
    let app = create_test_app(None);

    let response = app
        .clone()
        .oneshot(post(
            "/rpc/party/create",
            json!({"values": {"name": "Dave", "city": "Mons"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let id = body_json(response.into_body()).await["id"].clone();
    assert_eq!(id, json!(4));

    let response = app
        .oneshot(post(
            "/rpc/party/read",
            json!({"ids": [4], "fields": ["name", "lang"]}),
        ))
        .await
        .unwrap();
    let json = body_json(response.into_body()).await;
    assert_eq!(json[0]["name"], "Dave");
    assert_eq!(json[0]["lang"], "en");
}

#[tokio::test]
async fn test_write_rejects_invalid_value() {
    let app = create_test_app(None);

    let response = app
        .oneshot(post(
            "/rpc/sale.line/write",
            json!({"ids": [1], "values": {"quantity": "lots"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("quantity"));
}

#[tokio::test]
async fn test_delete_unknown_record() {
    let app = create_test_app(None);

    let response = app
        .oneshot(post("/rpc/party/delete", json!({"ids": [99]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_resource() {
    let app = create_test_app(None);

    let response = app
        .oneshot(post("/rpc/nothing/read", json!({"ids": [1]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_call_siblings_hook() {
    let app = create_test_app(None);

    let response = app
        .oneshot(post("/rpc/party/call/same_city", json!({"id": 3})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json, json!([1, 3]));
}

#[tokio::test]
async fn test_call_unknown_method() {
    let app = create_test_app(None);

    let response = app
        .oneshot(post("/rpc/party/call/explode", json!({"id": 1})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Auth tests
// ============================================================================

#[tokio::test]
async fn test_missing_token_rejected() {
    let app = create_test_app(Some(SECRET));

    let response = app
        .oneshot(post("/rpc/party/read", json!({"ids": [1]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let app = create_test_app(Some(SECRET));
    let mut request = post("/rpc/party/read", json!({"ids": [1]}));
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_accepted() {
    let app = create_test_app(Some(SECRET));
    let mut request = post("/rpc/party/read", json!({"ids": [1], "fields": ["name"]}));
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {SECRET}").parse().unwrap(),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = create_test_app(Some(SECRET));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
