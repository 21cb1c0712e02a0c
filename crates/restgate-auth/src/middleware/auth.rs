//! Gateway middleware and principal extractor.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use restgate_auth::middleware::{Authenticated, authenticate_request};
//!
//! async fn handler(Authenticated(principal): Authenticated) -> String {
//!     format!("Hello, {}!", principal.username)
//! }
//!
//! let app = Router::new()
//!     .route("/jsonapi/{*path}", get(handler))
//!     .layer(middleware::from_fn_with_state(gateway, authenticate_request));
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::Rejection;
use crate::gateway::{AuthGateway, GatewayOutcome, RequestInfo};
use crate::types::Principal;

/// Runs the gateway on every request.
///
/// - not applicable: the request continues untouched
/// - allowed: the [`Principal`] is inserted into the request extensions
/// - denied: the rejection is written and the inner service is never called
pub async fn authenticate_request(
    State(gateway): State<Arc<AuthGateway>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    match gateway.authenticate(&RequestInfo::from_parts(&parts)).await {
        GatewayOutcome::NotApplicable => {}
        GatewayOutcome::Allow(principal) => {
            parts.extensions.insert(principal);
        }
        GatewayOutcome::Deny(rejection) => return rejection.into_response(),
    }

    next.run(Request::from_parts(parts, body)).await
}

/// Extracts the principal inserted by [`authenticate_request`].
///
/// Rejects with the generic access-denied response when the request was not
/// authenticated, e.g. on routes the gateway does not cover.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Authenticated)
            .ok_or(Rejection::AccessDenied)
    }
}
