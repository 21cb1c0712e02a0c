//! HTTP middleware for the gateway.
//!
//! - [`authenticate_request`] runs [`AuthGateway`](crate::gateway::AuthGateway)
//!   in front of a router
//! - [`Authenticated`] hands the resolved principal to handlers
//! - `IntoResponse` for [`Rejection`](crate::error::Rejection) and
//!   [`AuthError`](crate::error::AuthError) renders JSON error bodies

pub mod auth;
pub mod error;

pub use auth::{Authenticated, authenticate_request};
pub use error::{REALM, error_response};
