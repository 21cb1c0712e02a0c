//! Credential validation strategies.
//!
//! Each enforced authentication method maps to a [`Strategy`]. A strategy
//! extracts a [`CredentialEnvelope`](crate::types::CredentialEnvelope) from the
//! request headers and hands it to [`validate_user_and_token`], which checks
//! the account and compares the secret against the expected token.
//!
//! | method | strategy |
//! |---|---|
//! | `basic` | [`Strategy::Basic`] |
//! | `api_key` | [`Strategy::ApiKey`] |
//! | `oauth`, `jwt`, `external_oauth` | [`Strategy::Unimplemented`] |

pub mod api_key;
pub mod basic;
pub mod credentials;

use axum::http::HeaderMap;

use crate::error::{ErrorCode, Rejection};
use crate::secret::secrets_match;
use crate::storage::{User, UserStorage};
use crate::types::{ApiKeyMode, AuthMethod};

/// What a strategy needs besides the request headers.
pub struct ValidationContext<'a> {
    pub users: &'a dyn UserStorage,
    /// Token envelopes must carry. `None` rejects every secret.
    pub expected_token: Option<&'a str>,
}

/// Validation strategy selected by an application's method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Basic,
    ApiKey { mode: ApiKeyMode },
    /// Methods accepted in configuration but not enforced.
    Unimplemented(AuthMethod),
}

impl Strategy {
    #[must_use]
    pub fn for_method(method: AuthMethod) -> Self {
        match method {
            AuthMethod::Basic => Self::Basic,
            AuthMethod::ApiKey { mode } => Self::ApiKey { mode },
            AuthMethod::OAuth | AuthMethod::Jwt | AuthMethod::ExternalOAuth => {
                Self::Unimplemented(method)
            }
        }
    }

    /// Returns `true` if this strategy authenticates requests.
    #[must_use]
    pub fn is_enforced(&self) -> bool {
        !matches!(self, Self::Unimplemented(_))
    }

    /// Validates the request headers, returning the authenticated user.
    ///
    /// Unimplemented strategies never authenticate anyone; callers are
    /// expected to check [`Strategy::is_enforced`] first.
    pub async fn validate(
        &self,
        headers: &HeaderMap,
        ctx: &ValidationContext<'_>,
    ) -> Result<User, Rejection> {
        match *self {
            Self::Basic => basic::validate(headers, ctx).await,
            Self::ApiKey { mode } => api_key::validate(headers, mode, ctx).await,
            Self::Unimplemented(_) => Err(Rejection::AccessDenied),
        }
    }
}

/// Checks that `username` exists and is active, then compares `provided`
/// with the expected token in constant time.
///
/// A user store failure is answered with [`Rejection::AccessDenied`].
pub async fn validate_user_and_token(
    ctx: &ValidationContext<'_>,
    username: &str,
    provided: &str,
) -> Result<User, Rejection> {
    let user = match ctx.users.find_by_username(username).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ErrorCode::UserDoesNotExist.into()),
        Err(e) => {
            tracing::error!(error = %e, username = %username, "User lookup failed");
            return Err(Rejection::AccessDenied);
        }
    };

    if user.is_blocked() {
        return Err(ErrorCode::UserBlocked.into());
    }

    match ctx.expected_token {
        Some(expected) if secrets_match(provided, expected) => Ok(user),
        _ => {
            tracing::warn!(username = %username, "Token validation failed for user");
            Err(ErrorCode::InvalidApiKey.into())
        }
    }
}
