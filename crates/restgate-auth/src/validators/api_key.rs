//! API-key strategy.
//!
//! In header mode the envelope travels in `api-key: base64(username:token)`.
//! In basic mode the strategy reads `Authorization` exactly like the Basic
//! strategy does.

use axum::http::HeaderMap;

use super::credentials::{api_key_header, decode_envelope};
use super::{ValidationContext, basic, validate_user_and_token};
use crate::error::{ErrorCode, Rejection};
use crate::storage::User;
use crate::types::ApiKeyMode;

pub async fn validate(
    headers: &HeaderMap,
    mode: ApiKeyMode,
    ctx: &ValidationContext<'_>,
) -> Result<User, Rejection> {
    match mode {
        ApiKeyMode::Basic => basic::validate(headers, ctx).await,
        ApiKeyMode::Header => {
            let header = api_key_header(headers).ok_or(ErrorCode::MissingApiKeyHeader)?;
            let envelope = decode_envelope(&header).ok_or(ErrorCode::InvalidApiKeyFormat)?;
            validate_user_and_token(ctx, &envelope.username, &envelope.secret).await
        }
    }
}
