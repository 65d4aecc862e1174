use std::sync::Arc;

use auth_gateway::{build_router, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common_token::{issue_token_at, unix_now, BEARER_PREFIX, FRESHNESS_WINDOW_SECS};
use http_body_util::BodyExt;
use tower::ServiceExt;

const SECRET: &[u8] = b"testsecretkey";

fn router() -> Router {
    let state = Arc::new(AppState {
        secret: Arc::new(SECRET.to_vec()),
    });
    build_router(state)
}

async fn get_root(router: Router, authorization: Option<String>) -> (StatusCode, String) {
    let mut builder = Request::builder().method("GET").uri("/");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let response = router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .expect("response");
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn missing_authorization_header_is_rejected() {
    let (status, body) = get_root(router(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Authorization header missing"), "body: {body}");
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    let (status, body) = get_root(router(), Some("Token xyz".to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(
        body.contains("Invalid Authorization header format"),
        "body: {body}"
    );
}

#[tokio::test]
async fn valid_token_reaches_the_protected_handler() {
    let token = issue_token_at(SECRET, unix_now()).expect("token");
    let (status, body) = get_root(router(), Some(format!("{BEARER_PREFIX}{token}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Access granted\n");
}

#[tokio::test]
async fn stale_token_is_rejected() {
    let iat = unix_now() - 2 * FRESHNESS_WINDOW_SECS;
    let token = issue_token_at(SECRET, iat).expect("token");
    let (status, body) = get_root(router(), Some(format!("{BEARER_PREFIX}{token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Token expired"), "body: {body}");
}

#[tokio::test]
async fn future_token_is_rejected() {
    let iat = unix_now() + 2 * FRESHNESS_WINDOW_SECS;
    let token = issue_token_at(SECRET, iat).expect("token");
    let (status, _) = get_root(router(), Some(format!("{BEARER_PREFIX}{token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let token = issue_token_at(SECRET, unix_now()).expect("token");
    let mut tampered = token.into_bytes();
    let index = tampered.len() - 1;
    tampered[index] ^= 0x01;
    let tampered = String::from_utf8(tampered).expect("ascii");
    let (status, body) = get_root(router(), Some(format!("{BEARER_PREFIX}{tampered}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Invalid token"), "body: {body}");
}

#[tokio::test]
async fn wrong_secret_is_rejected() {
    let token = issue_token_at(b"someotherkey", unix_now()).expect("token");
    let (status, _) = get_root(router(), Some(format!("{BEARER_PREFIX}{token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_endpoint_needs_no_token() {
    let response = router()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}
