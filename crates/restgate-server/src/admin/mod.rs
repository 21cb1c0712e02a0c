//! Admin API endpoints.
//!
//! Administrative REST endpoints for the application registry and the
//! authentication audit log, mounted under [`ADMIN_PREFIX`].
//!
//! # Endpoints
//!
//! ## Applications
//!
//! - `GET /applications` - List applications
//! - `POST /applications` - Create an application
//! - `GET /applications/{id}` - Read an application
//! - `PUT /applications/{id}` - Update name and method
//! - `DELETE /applications/{id}` - Delete an application
//! - `POST /applications/{id}/default` - Make it the default
//! - `POST /applications/{id}/token` - Generate a per-application token
//!
//! ## Logs
//!
//! - `GET /logs` - Filtered, paged audit entries
//! - `GET /logs/export` - Filtered CSV export
//! - `GET /logs/stats` - Store summary
//! - `GET /logs/options` - Filter option lists
//! - `DELETE /logs` - Delete every entry

pub mod applications;
pub mod audit;

pub use applications::{
    create_application, delete_application, list_applications, read_application,
    rotate_application_token, set_default_application, update_application,
};
pub use audit::{delete_logs, export_logs, list_logs, log_options, log_stats};

use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::{HeaderValue, StatusCode, header, request::Parts};
use axum::response::Response;
use axum::routing::{get, post};
use restgate_auth::middleware::error_response;
use restgate_auth::secret::secrets_match;

use crate::server::AppState;

/// Mount point of the admin API.
pub const ADMIN_PREFIX: &str = "/admin/rest-api-auth";

// =============================================================================
// Routes
// =============================================================================

/// Creates the admin routes.
///
/// All handlers require the `AdminAuth` extractor.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // Application endpoints
        .route(
            "/applications",
            get(list_applications).post(create_application),
        )
        .route(
            "/applications/{id}",
            get(read_application)
                .put(update_application)
                .delete(delete_application),
        )
        .route("/applications/{id}/default", post(set_default_application))
        .route("/applications/{id}/token", post(rotate_application_token))
        // Log endpoints
        .route("/logs", get(list_logs).delete(delete_logs))
        .route("/logs/export", get(export_logs))
        .route("/logs/stats", get(log_stats))
        .route("/logs/options", get(log_options))
}

// =============================================================================
// Admin Auth Extractor
// =============================================================================

/// Admin access guard.
///
/// Accepts `Authorization: Bearer <admin_token>` and compares the token in
/// constant time against `server.admin_token`.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(error_response(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Admin API is disabled",
            ));
        };

        let provided = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token);

        match provided {
            Some(token) if secrets_match(token, expected) => Ok(Self),
            Some(_) => {
                tracing::warn!(path = %parts.uri.path(), "Admin access denied: invalid token");
                Err(unauthorized("Invalid admin token"))
            }
            None => {
                tracing::debug!(path = %parts.uri.path(), "Admin access denied: no bearer token");
                Err(unauthorized("Missing bearer token"))
            }
        }
    }
}

fn unauthorized(description: &str) -> Response {
    let mut response = error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", description);
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
