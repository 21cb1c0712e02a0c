//! HTTP Basic strategy.

use axum::http::HeaderMap;

use super::credentials::{authorization_header, parse_basic_authorization};
use super::{ValidationContext, validate_user_and_token};
use crate::error::{ErrorCode, Rejection};
use crate::storage::User;

/// Validates `Authorization: Basic base64(username:token)`.
pub async fn validate(headers: &HeaderMap, ctx: &ValidationContext<'_>) -> Result<User, Rejection> {
    let header = authorization_header(headers).ok_or(ErrorCode::MissingAuthorizationHeader)?;
    let envelope = parse_basic_authorization(&header)?;

    validate_user_and_token(ctx, &envelope.username, &envelope.secret).await
}
