use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_token::VerifyError;
use serde::Serialize;
use thiserror::Error;

/// Authentication failures the gate can produce.
///
/// All of them collapse to a 401 response with the same `unauthorized` code;
/// the body message names the broad category only. The precise variant is
/// what gets logged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authorization header missing")]
    MissingHeader,
    #[error("authorization header is not a bearer credential")]
    MalformedHeader,
    #[error(transparent)]
    Token(#[from] VerifyError),
}

impl ApiError {
    /// Stable reason label for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::MissingHeader => "missing_header",
            ApiError::MalformedHeader => "malformed_header",
            ApiError::Token(VerifyError::Malformed) => "malformed_token",
            ApiError::Token(VerifyError::SignatureInvalid) => "signature_invalid",
            ApiError::Token(VerifyError::ClaimsInvalid) => "claims_invalid",
            ApiError::Token(VerifyError::StaleOrFuture { .. }) => "stale_or_future",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetails<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorDetails<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::MissingHeader => "Authorization header missing",
            ApiError::MalformedHeader => "Invalid Authorization header format",
            ApiError::Token(VerifyError::ClaimsInvalid) => "Invalid token claims",
            ApiError::Token(VerifyError::StaleOrFuture { .. }) => "Token expired",
            ApiError::Token(_) => "Invalid token",
        };

        let mut response = Json(ErrorBody {
            error: ErrorDetails {
                code: "unauthorized",
                message,
            },
        })
        .into_response();
        *response.status_mut() = StatusCode::UNAUTHORIZED;
        response
    }
}
