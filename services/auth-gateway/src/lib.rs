pub mod config;
pub mod error;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use common_token::{unix_now, verify_token, BEARER_PREFIX};
use error::ApiError;
use serde_json::json;

pub const SERVICE_NAME: &str = "auth-gateway";

#[derive(Clone)]
pub struct AppState {
    /// Shared secret, loaded once at startup and read-only thereafter.
    pub secret: Arc<Vec<u8>>,
}

/// Assemble the service router. Everything except the health and info
/// endpoints sits behind the bearer-token guard.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/", get(access_granted))
        .layer(from_fn_with_state(state, auth_guard));

    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/info", get(info))
        .merge(protected)
}

/// Bearer-token gate in front of the protected routes.
///
/// Extracts the `Authorization` header, verifies the token against the
/// shared secret at the current time, and either forwards the request with
/// the decoded claims attached or short-circuits with 401. Holds no state
/// across requests.
pub async fn auth_guard(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let raw = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Err(reject(&req, ApiError::MissingHeader)),
    };

    let token = match raw.to_str().ok().and_then(|v| v.strip_prefix(BEARER_PREFIX)) {
        Some(token) => token,
        None => return Err(reject(&req, ApiError::MalformedHeader)),
    };

    match verify_token(token, &state.secret, unix_now()) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(error) => Err(reject(&req, ApiError::Token(error))),
    }
}

fn reject(req: &Request<Body>, error: ApiError) -> ApiError {
    tracing::warn!(
        event = "auth_reject",
        method = %req.method(),
        path = req.uri().path(),
        reason = error.reason(),
        "rejecting unauthenticated request"
    );
    error
}

async fn access_granted() -> &'static str {
    "Access granted\n"
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
