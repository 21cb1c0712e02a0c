//! Application registry admin handlers.
//!
//! Views never include a per-application token. A token is shown once, in
//! the response of the rotation endpoint.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use restgate_auth::{Application, ApplicationDraft, AuthError, AuthMethod};
use serde::Serialize;

use super::AdminAuth;
use crate::server::AppState;

// =============================================================================
// Types
// =============================================================================

/// Application as shown to administrators.
#[derive(Debug, Serialize)]
pub struct ApplicationView {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub method: AuthMethod,
    pub method_label: &'static str,
    pub header_hint: &'static str,
    pub is_default: bool,
    /// Whether the application overrides the gateway-wide token.
    pub has_api_token: bool,
}

impl From<&Application> for ApplicationView {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id.clone(),
            name: app.name.clone(),
            method: app.method,
            method_label: app.method_label(),
            header_hint: app.header_hint(),
            is_default: app.is_default,
            has_api_token: app.api_token.is_some(),
        }
    }
}

/// Response for token rotation.
#[derive(Debug, Serialize)]
pub struct RotateTokenResponse {
    pub application_id: String,
    /// The newly generated token. Shown once.
    pub api_token: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /applications - List applications in registration order.
pub async fn list_applications(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let registry = state.gateway.registry();
    let applications: Vec<ApplicationView> = registry
        .list_all()
        .await
        .values()
        .map(ApplicationView::from)
        .collect();

    Json(serde_json::json!({
        "default_application_id": registry.default_application_id().await,
        "applications": applications,
    }))
}

/// GET /applications/{id} - Read one application.
pub async fn read_application(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationView>, AuthError> {
    let app = state.gateway.registry().resolve(&id).await?;
    Ok(Json(ApplicationView::from(&app)))
}

/// POST /applications - Register a new application with a generated id.
///
/// # Errors
///
/// - 400 Bad Request: blank name
/// - 500 Internal Server Error: registry could not be persisted
pub async fn create_application(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Json(draft): Json<ApplicationDraft>,
) -> Result<impl IntoResponse, AuthError> {
    let app = state.gateway.registry().create(draft).await?;
    Ok((StatusCode::CREATED, Json(ApplicationView::from(&app))))
}

/// PUT /applications/{id} - Replace name and method.
pub async fn update_application(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ApplicationDraft>,
) -> Result<Json<ApplicationView>, AuthError> {
    let app = state.gateway.registry().update(&id, draft).await?;
    Ok(Json(ApplicationView::from(&app)))
}

/// DELETE /applications/{id} - Remove an application.
///
/// Deleting the default leaves the registry without one.
pub async fn delete_application(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AuthError> {
    state.gateway.registry().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /applications/{id}/default - Make the application the only default.
pub async fn set_default_application(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationView>, AuthError> {
    let app = state.gateway.registry().set_default(&id).await?;
    Ok(Json(ApplicationView::from(&app)))
}

/// POST /applications/{id}/token - Generate a per-application token.
///
/// The previous token, if any, stops working immediately.
pub async fn rotate_application_token(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RotateTokenResponse>, AuthError> {
    let api_token = state.gateway.registry().rotate_token(&id).await?;
    Ok(Json(RotateTokenResponse {
        application_id: id,
        api_token,
    }))
}
