//! # restgate-auth
//!
//! Request authentication gateway for REST and JSON:API endpoints.
//!
//! This crate provides:
//! - An application registry (credential tenants and the default selection)
//! - Credential validators for HTTP Basic and API-key envelopes
//! - An insert-only authentication audit log with filtering and CSV export
//! - The gateway that ties them together, plus axum middleware
//!
//! ## Overview
//!
//! A request is gated when it targets the JSON:API surface (or asks for a
//! serialization format). The gateway resolves the application named by the
//! `auth-method` header, or the default application, validates the
//! `username:token` envelope carried by the request, records the attempt and
//! either hands a [`Principal`] to the handler or answers with a structured
//! JSON error.
//!
//! ## Modules
//!
//! - [`config`] - Gateway configuration snapshot
//! - [`registry`] - Application registry
//! - [`validators`] - Credential validation strategies
//! - [`audit`] - Authentication audit logging
//! - [`gateway`] - Per-request authentication
//! - [`middleware`] - Axum middleware and error responses
//! - [`storage`] - Storage traits and in-memory backends

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod registry;
pub mod secret;
pub mod storage;
pub mod types;
pub mod validators;

pub use audit::{AuditFilter, AuditLogEntry, AuditLogger, AuditStats, AuditStatus, NewAuditEntry};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, GatewayConfig, PathRules};
pub use error::{ApiError, AuthError, ErrorCategory, ErrorCode, Rejection};
pub use gateway::{AuthGateway, GatewayOutcome, RequestInfo};
pub use middleware::{Authenticated, authenticate_request};
pub use registry::ApplicationRegistry;
pub use storage::{
    AuditStorage, JsonFileRegistryStorage, MemoryAuditStorage, MemoryRegistryStorage,
    MemoryUserStorage, RegistrySnapshot, RegistryStorage, User, UserStorage,
};
pub use types::{ApiKeyMode, Application, ApplicationDraft, AuthMethod, CredentialEnvelope, Principal};
pub use validators::Strategy;

/// Type alias for gateway results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use restgate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::audit::{AuditFilter, AuditLogEntry, AuditLogger, AuditStatus};
    pub use crate::config::{ConfigError, GatewayConfig};
    pub use crate::error::{ApiError, AuthError, ErrorCode, Rejection};
    pub use crate::gateway::{AuthGateway, GatewayOutcome};
    pub use crate::middleware::{Authenticated, authenticate_request};
    pub use crate::registry::ApplicationRegistry;
    pub use crate::storage::{AuditStorage, RegistryStorage, User, UserStorage};
    pub use crate::types::{Application, ApplicationDraft, AuthMethod, Principal};
}
