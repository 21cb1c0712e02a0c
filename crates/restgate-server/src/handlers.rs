use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use restgate_auth::Authenticated;
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Restgate",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Ready once the audit store exists; reports registry and user store sizes.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let audit_ready = state.gateway.audit().ensure_store_exists().await;
    let registry = state.gateway.registry();
    let body = json!({
        "status": if audit_ready { "ready" } else { "degraded" },
        "gateway_enabled": state.gateway.config().enabled,
        "applications": registry.len().await,
        "default_application": registry.default_application_id().await,
        "users": state.users.len(),
    });
    let status = if audit_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Sample JSON:API resource. Echoes the authenticated principal.
pub async fn jsonapi_resource(
    Authenticated(principal): Authenticated,
    Path(path): Path<String>,
) -> impl IntoResponse {
    let body = json!({
        "jsonapi": { "version": "1.0" },
        "data": {
            "type": "principal",
            "id": principal.id,
            "attributes": {
                "username": principal.username,
                "roles": principal.roles,
                "application_id": principal.application_id,
            },
        },
        "meta": { "path": format!("/jsonapi/{path}") },
    });
    (StatusCode::OK, Json(body))
}
