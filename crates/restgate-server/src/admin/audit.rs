//! Audit log admin handlers.
//!
//! Listing and export accept the same filter query parameters:
//! `username`, `client_ip`, `authentication_method`, `status`,
//! `response_code`, `date_from`, `date_to` (`YYYY-MM-DD`). Blank values are
//! ignored.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use restgate_auth::AuthError;
use restgate_auth::audit::{
    AuditFilter, AuditLogEntry, AuditStats, DEFAULT_EXPORT_LIMIT, DEFAULT_PAGE_SIZE,
    METHOD_OPTIONS, RESPONSE_CODE_OPTIONS, export_filename, status_options,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

use super::AdminAuth;
use crate::server::AppState;

/// Largest page size a listing may request.
pub const MAX_PAGE_SIZE: usize = 500;

/// Paging parameters for listings. `page` is zero-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: usize,
    pub limit: Option<usize>,
}

impl PageQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    fn offset(&self) -> usize {
        self.page.saturating_mul(self.limit())
    }
}

/// One page of audit entries.
#[derive(Debug, Serialize)]
pub struct LogPage {
    pub total: u64,
    pub page: usize,
    pub limit: usize,
    pub entries: Vec<AuditLogEntry>,
}

/// `{ value, label }` pair for filter drop-downs.
#[derive(Debug, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: &'static str,
}

/// GET /logs - Filtered audit entries, newest first.
pub async fn list_logs(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(filter): Query<AuditFilter>,
    Query(paging): Query<PageQuery>,
) -> Result<Json<LogPage>, AuthError> {
    let audit = state.gateway.audit();
    let total = audit.count(&filter).await?;
    let entries = audit
        .query(&filter, paging.limit(), paging.offset())
        .await?;

    Ok(Json(LogPage {
        total,
        page: paging.page,
        limit: paging.limit(),
        entries,
    }))
}

/// GET /logs/export - Filtered entries as a CSV attachment.
///
/// At most [`DEFAULT_EXPORT_LIMIT`] rows are written.
pub async fn export_logs(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(filter): Query<AuditFilter>,
) -> Result<impl IntoResponse, AuthError> {
    let audit = state.gateway.audit();
    let mut body: Vec<u8> = Vec::new();
    let rows = audit
        .export_csv(&filter, DEFAULT_EXPORT_LIMIT, &mut body)
        .await?;

    let now = OffsetDateTime::from_unix_timestamp(audit.now())
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let filename = export_filename(now);
    tracing::info!(rows, filename = %filename, "Audit log exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

/// GET /logs/stats - Store summary.
pub async fn log_stats(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<AuditStats>, AuthError> {
    Ok(Json(state.gateway.audit().stats().await?))
}

/// GET /logs/options - Option lists for the filter fields.
pub async fn log_options(_admin: AdminAuth) -> impl IntoResponse {
    let methods: Vec<FilterOption> = METHOD_OPTIONS
        .into_iter()
        .map(|(value, label)| FilterOption {
            value: value.to_string(),
            label,
        })
        .collect();
    let statuses: Vec<FilterOption> = status_options()
        .map(|(value, label)| FilterOption {
            value: value.to_string(),
            label,
        })
        .collect();
    let response_codes: Vec<FilterOption> = RESPONSE_CODE_OPTIONS
        .into_iter()
        .map(|(code, label)| FilterOption {
            value: code.to_string(),
            label,
        })
        .collect();

    Json(json!({
        "authentication_methods": methods,
        "statuses": statuses,
        "response_codes": response_codes,
    }))
}

/// DELETE /logs - Delete every audit entry.
pub async fn delete_logs(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AuthError> {
    let deleted = state.gateway.audit().purge_all().await?;
    Ok(Json(json!({ "deleted": deleted })))
}
