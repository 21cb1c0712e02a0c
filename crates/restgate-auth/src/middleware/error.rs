//! Error responses.
//!
//! Every error leaves the server as `{status, http_code, error,
//! error_description}` JSON. 401 responses also carry a `WWW-Authenticate`
//! challenge.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::{ApiError, AuthError, INVALID_CONSUMER_ORIGIN, Rejection};

/// Realm advertised in `WWW-Authenticate` challenges.
pub const REALM: &str = "restgate";

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::Api(err) => api_error_response(err),
            Rejection::AccessDenied => error_response(
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                INVALID_CONSUMER_ORIGIN,
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = error_details(&self);

        let description = if status.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        error_response(status, code, &description)
    }
}

fn api_error_response(err: ApiError) -> Response {
    let status = StatusCode::from_u16(err.http_code).unwrap_or(StatusCode::UNAUTHORIZED);
    let mut headers = HeaderMap::new();
    if status == StatusCode::UNAUTHORIZED {
        insert_challenge(&mut headers, &err.error_description);
    }
    (status, headers, Json(err)).into_response()
}

/// Builds an error body for codes outside [`ErrorCode`](crate::ErrorCode).
#[must_use]
pub fn error_response(status: StatusCode, code: &str, description: &str) -> Response {
    let body = json!({
        "status": "error",
        "http_code": status.as_u16(),
        "error": code,
        "error_description": description,
    });

    let mut headers = HeaderMap::new();
    if status == StatusCode::UNAUTHORIZED {
        insert_challenge(&mut headers, description);
    }
    (status, headers, Json(body)).into_response()
}

/// Returns (HTTP status, error code).
fn error_details(error: &AuthError) -> (StatusCode, &'static str) {
    match error {
        AuthError::ApplicationNotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        AuthError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        AuthError::Storage { .. } | AuthError::Configuration { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR")
        }
    }
}

/// Format: `Basic realm="restgate", error_description="..."`
fn build_www_authenticate_header(description: &str) -> String {
    let escaped = description.replace('"', "\\\"");
    format!("Basic realm=\"{REALM}\", error_description=\"{escaped}\"")
}

fn insert_challenge(headers: &mut HeaderMap, description: &str) {
    if let Ok(value) = HeaderValue::from_str(&build_www_authenticate_header(description)) {
        headers.insert(header::WWW_AUTHENTICATE, value);
    }
}
